// Tests for manifest module

use std::fs;
use std::path::Path;
use tempfile::TempDir;
use verity::hash::{CancellationToken, HashUtilityError, ManifestEntry, ManifestStore, ParseMode};

#[test]
fn test_parse_line_valid() {
    let entry = ManifestStore::parse_line("abc123\tdir/file.txt").unwrap();
    assert_eq!(entry, ManifestEntry::new("abc123", "dir/file.txt"));

    // CRLF endings and extra fields
    let entry = ManifestStore::parse_line("abc123\tfile.txt\t1024\r").unwrap();
    assert_eq!(entry.relative_path, "file.txt");
}

#[test]
fn test_parse_line_rejects_malformed() {
    assert!(ManifestStore::parse_line("").is_none());
    assert!(ManifestStore::parse_line("   ").is_none());
    assert!(ManifestStore::parse_line("abc123  file.txt").is_none());
    assert!(ManifestStore::parse_line("abc123\t").is_none());
    assert!(ManifestStore::parse_line("abc123\t\t1024").is_none());
}

#[test]
fn test_parse_line_keeps_empty_hash() {
    assert_eq!(
        ManifestStore::parse_line("\tfile.txt"),
        Some(ManifestEntry::new("", "file.txt"))
    );
    assert_eq!(
        ManifestStore::parse_line("  \tfile.txt\r"),
        Some(ManifestEntry::new("", "file.txt"))
    );
}

#[test]
fn test_parse_line_keeps_path_whitespace() {
    assert_eq!(
        ManifestStore::parse_line(" abc123 \t lead.txt"),
        Some(ManifestEntry::new("abc123", " lead.txt"))
    );
    assert_eq!(
        ManifestStore::parse_line("abc123\ttrail.txt \r"),
        Some(ManifestEntry::new("abc123", "trail.txt "))
    );
    assert_eq!(
        ManifestStore::parse_line("abc123\t  \t"),
        Some(ManifestEntry::new("abc123", "  "))
    );
}

#[test]
fn test_read_skips_malformed_lines_by_default() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.sha256");
    fs::write(&path, "aa\tone.txt\nnot a manifest line\n\nbb\ttwo.txt\n").unwrap();

    let entries = ManifestStore::new(&path).read_entries(&CancellationToken::new()).unwrap();
    assert_eq!(
        entries,
        vec![ManifestEntry::new("aa", "one.txt"), ManifestEntry::new("bb", "two.txt")]
    );
}

#[test]
fn test_strict_mode_reports_line() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.sha256");
    fs::write(&path, "aa\tone.txt\n\nbroken\n").unwrap();

    let result = ManifestStore::new(&path)
        .with_parse_mode(ParseMode::Strict)
        .read_entries(&CancellationToken::new());
    match result {
        Err(HashUtilityError::ManifestParseError { line, .. }) => assert_eq!(line, 3),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_read_missing_manifest() {
    let dir = TempDir::new().unwrap();
    let store = ManifestStore::new(dir.path().join("missing.md5"));
    assert!(!store.exists());
    assert!(matches!(
        store.read_entries(&CancellationToken::new()),
        Err(HashUtilityError::ManifestNotFound { .. })
    ));
}

#[test]
fn test_read_honours_cancellation() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.sha256");
    fs::write(&path, "aa\tone.txt\n").unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let result = ManifestStore::new(&path).read_entries(&cancel);
    assert!(result.unwrap_err().is_cancelled());
}

#[test]
fn test_write_sorts_and_round_trips_unicode() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.sha256");
    let store = ManifestStore::new(&path);

    let entries = vec![
        ManifestEntry::new("03", "über/straße.txt"),
        ManifestEntry::new("01", "b.txt"),
        ManifestEntry::new("02", "日本語/ファイル.txt"),
        ManifestEntry::new("04", "a.txt"),
    ];
    store.write_all_entries(&entries).unwrap();

    let read = store.read_entries(&CancellationToken::new()).unwrap();
    let mut expected = entries.clone();
    expected.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    assert_eq!(read, expected);

    let text = fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("04\ta.txt\n01\tb.txt\n"));
}

#[test]
fn test_write_round_trips_surrounding_spaces_and_empty_hash() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.sha256");
    let store = ManifestStore::new(&path);

    let entries = vec![
        ManifestEntry::new("01", " lead.txt"),
        ManifestEntry::new("02", "trail.txt "),
        ManifestEntry::new("", "unhashed.txt"),
    ];
    store.write_all_entries(&entries).unwrap();

    let read = store.read_entries(&CancellationToken::new()).unwrap();
    assert_eq!(read, entries);
}

#[test]
fn test_write_rejects_paths_with_line_breaks_or_tabs() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.sha256");
    fs::write(&path, "aa\tkept.txt\n").unwrap();
    let store = ManifestStore::new(&path);

    for bad in ["two\nlines.txt", "tab\there.txt", "cr\r.txt"] {
        let result = store.write_all_entries(&[ManifestEntry::new("01", "ok.txt"), ManifestEntry::new("02", bad)]);
        assert!(matches!(result, Err(HashUtilityError::ManifestWriteError { .. })));
    }
    // The existing manifest is untouched
    assert_eq!(fs::read_to_string(&path).unwrap(), "aa\tkept.txt\n");
    assert!(ManifestStore::is_storable_path("über/ file .txt"));
}

#[test]
fn test_write_normalizes_backslashes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.md5");
    ManifestStore::new(&path)
        .write_all_entries(&[ManifestEntry::new("ff", "sub\\file.txt")])
        .unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "ff\tsub/file.txt\n");
}

#[test]
fn test_write_replaces_existing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("data.md5");
    fs::write(&path, "old\tstale.txt\nold\tother.txt\n").unwrap();

    ManifestStore::new(&path)
        .write_all_entries(&[ManifestEntry::new("new", "fresh.txt")])
        .unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "new\tfresh.txt\n");

    // No temp files left behind
    let leftovers = fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(leftovers, 1);
}

#[test]
fn test_infer_algorithm() {
    assert_eq!(ManifestStore::infer_algorithm(Path::new("x.md5")), "MD5");
    assert_eq!(ManifestStore::infer_algorithm(Path::new("x.SHA1")), "SHA1");
    assert_eq!(ManifestStore::infer_algorithm(Path::new("x.sha256")), "SHA256");
    assert_eq!(ManifestStore::infer_algorithm(Path::new("x.b3")), "BLAKE3");
    assert_eq!(ManifestStore::infer_algorithm(Path::new("checksums.txt")), "SHA256");
    assert_eq!(ManifestStore::infer_algorithm(Path::new("checksums")), "SHA256");
    assert_eq!(ManifestStore::algorithm_from_extension(Path::new("checksums.txt")), None);
}
