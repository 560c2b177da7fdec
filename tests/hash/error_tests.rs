// Tests for error module

use std::error::Error;
use std::io;
use std::path::PathBuf;
use verity::hash::HashUtilityError;

#[test]
fn test_file_not_found_error_display() {
    let error = HashUtilityError::FileNotFound {
        path: PathBuf::from("/path/to/file.txt"),
    };
    let message = format!("{}", error);
    assert!(message.contains("File not found"));
    assert!(message.contains("/path/to/file.txt"));
    assert!(message.contains("Suggestion"));
}

#[test]
fn test_manifest_errors_display() {
    let error = HashUtilityError::ManifestNotFound {
        path: PathBuf::from("data.sha256"),
    };
    let message = error.to_string();
    assert!(message.contains("Manifest file not found"));
    assert!(message.contains("data.sha256"));
    assert!(message.contains("create"));

    let error = HashUtilityError::ManifestParseError {
        path: PathBuf::from("data.sha256"),
        line: 7,
        reason: "missing tab".to_string(),
    };
    let message = error.to_string();
    assert!(message.contains("line 7"));
    assert!(message.contains("missing tab"));
    assert!(message.contains("Suggestion"));
}

#[test]
fn test_unsupported_algorithm_error_display() {
    let error = HashUtilityError::UnsupportedAlgorithm {
        algorithm: "invalid-algo".to_string(),
    };
    let message = error.to_string();
    assert!(message.contains("Unsupported hash algorithm"));
    assert!(message.contains("invalid-algo"));
    assert!(message.contains("BLAKE3"));
}

#[test]
fn test_from_io_error_maps_kinds() {
    let not_found = io::Error::new(io::ErrorKind::NotFound, "gone");

    let error = HashUtilityError::from_io_error(not_found, "scanning directory", Some(PathBuf::from("/data")));
    assert!(matches!(error, HashUtilityError::DirectoryNotFound { .. }));

    let not_found = io::Error::new(io::ErrorKind::NotFound, "gone");
    let error = HashUtilityError::from_io_error(not_found, "opening manifest", Some(PathBuf::from("m.md5")));
    assert!(matches!(error, HashUtilityError::ManifestNotFound { .. }));

    let not_found = io::Error::new(io::ErrorKind::NotFound, "gone");
    let error = HashUtilityError::from_io_error(not_found, "reading file", Some(PathBuf::from("a.txt")));
    assert!(matches!(error, HashUtilityError::FileNotFound { .. }));

    let denied = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
    let error = HashUtilityError::from_io_error(denied, "reading file", Some(PathBuf::from("a.txt")));
    match error {
        HashUtilityError::PermissionDenied { path, operation } => {
            assert_eq!(path, PathBuf::from("a.txt"));
            assert_eq!(operation, "reading file");
        }
        other => panic!("unexpected variant: {:?}", other),
    }
}

#[test]
fn test_io_error_keeps_source() {
    let io_err = io::Error::new(io::ErrorKind::Other, "disk on fire");
    let error = HashUtilityError::from_io_error(io_err, "writing report", None);

    assert!(error.to_string().contains("writing report"));
    let source = error.source().expect("io source");
    assert!(source.to_string().contains("disk on fire"));
}

#[test]
fn test_from_io_error_without_path() {
    let error: HashUtilityError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
    assert!(matches!(error, HashUtilityError::IoError { path: None, .. }));
}

#[test]
fn test_cancelled() {
    assert!(HashUtilityError::Cancelled.is_cancelled());
    assert!(!HashUtilityError::InvalidConfig { message: "x".into() }.is_cancelled());
    assert_eq!(HashUtilityError::Cancelled.to_string(), "Operation cancelled");
}
