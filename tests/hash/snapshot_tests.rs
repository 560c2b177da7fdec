// Tests for snapshot path resolution

use std::path::{PathBuf, MAIN_SEPARATOR};
use verity::hash::PathSnapshotResolver;

#[cfg(unix)]
#[test]
fn test_resolves_path_on_volume() {
    let resolver = PathSnapshotResolver::new("/snapshots/vol1", "/mnt/data");
    assert_eq!(
        resolver.resolve_path(&PathBuf::from("/mnt/data/projects/report.pdf")),
        PathBuf::from("/snapshots/vol1/projects/report.pdf")
    );
    assert!(resolver.is_on_snapshot_volume(&PathBuf::from("/mnt/data/x")));
}

#[cfg(unix)]
#[test]
fn test_off_volume_path_unchanged() {
    let resolver = PathSnapshotResolver::new("/snapshots/vol1", "/mnt/data");
    let other = PathBuf::from("/mnt/database/file.db");
    assert_eq!(resolver.resolve_path(&other), other);
    assert!(!resolver.is_on_snapshot_volume(&other));
}

#[cfg(unix)]
#[test]
fn test_prefix_match_ignores_case() {
    let resolver = PathSnapshotResolver::new("/snapshots/vol1", "/mnt/Data/");
    assert_eq!(
        resolver.resolve_path(&PathBuf::from("/MNT/data/a.txt")),
        PathBuf::from("/snapshots/vol1/a.txt")
    );
}

#[cfg(unix)]
#[test]
fn test_volume_root_itself_maps_to_snapshot() {
    let resolver = PathSnapshotResolver::new("/snapshots/vol1", "/mnt/data");
    assert_eq!(
        resolver.resolve_path(&PathBuf::from("/mnt/data")),
        PathBuf::from("/snapshots/vol1")
    );
}

#[cfg(windows)]
#[test]
fn test_resolves_windows_volume() {
    let resolver = PathSnapshotResolver::new(r"\\?\GLOBALROOT\Device\HarddiskVolumeShadowCopy1", r"C:\");
    assert_eq!(
        resolver.resolve_path(&PathBuf::from(r"c:\Users\me\file.txt")),
        PathBuf::from(r"\\?\GLOBALROOT\Device\HarddiskVolumeShadowCopy1\Users\me\file.txt")
    );
}

#[test]
fn test_volume_root_gets_trailing_separator() {
    let resolver = PathSnapshotResolver::new("snap", "volume");
    assert!(resolver.volume_root().ends_with(MAIN_SEPARATOR));

    let already = PathSnapshotResolver::new("snap", format!("volume{}", MAIN_SEPARATOR));
    assert_eq!(already.volume_root(), resolver.volume_root());
}

#[test]
fn test_relative_paths_are_made_absolute() {
    let cwd = std::env::current_dir().unwrap();
    let resolver = PathSnapshotResolver::new("/snap", &cwd);
    let resolved = resolver.resolve_path(&PathBuf::from("some/file.txt"));
    assert_eq!(resolved, PathBuf::from("/snap").join("some").join("file.txt"));
}
