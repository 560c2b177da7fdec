// Centralized error handling module
// Run-level errors only; per-file failures become VerificationResults instead

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for manifest and pipeline operations
/// Every message carries a suggestion line so the CLI can print it verbatim
#[derive(Debug, Error)]
pub enum HashUtilityError {
    #[error("File not found: {}\nSuggestion: Check that the file path is correct and the file exists", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Directory not found: {}\nSuggestion: Check that the directory path is correct and the directory exists", path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied while {operation} {}\nSuggestion: Check file permissions or run with appropriate privileges", path.display())]
    PermissionDenied { path: PathBuf, operation: String },

    #[error("I/O error while {operation}{}: {source}\nSuggestion: Check file permissions and disk space", display_opt_path(path))]
    IoError {
        path: Option<PathBuf>,
        operation: String,
        #[source]
        source: io::Error,
    },

    #[error("Unsupported hash algorithm: {algorithm}\nSuggestion: Use one of MD5, SHA1, SHA256, SHA384, SHA512, SHA3-256, SHA3-512, BLAKE2b, BLAKE2s, BLAKE3")]
    UnsupportedAlgorithm { algorithm: String },

    #[error("Manifest file not found: {}\nSuggestion: Create a manifest first using the 'create' command", path.display())]
    ManifestNotFound { path: PathBuf },

    #[error("Error parsing manifest {} at line {line}: {reason}\nSuggestion: Each line must be '<hash><TAB><relative path>'", path.display())]
    ManifestParseError { path: PathBuf, line: usize, reason: String },

    #[error("Failed to write manifest {}: {reason}\nSuggestion: Check disk space and write permissions", path.display())]
    ManifestWriteError { path: PathBuf, reason: String },

    #[error("Invalid configuration: {message}\nSuggestion: Run with --help to see usage information")]
    InvalidConfig { message: String },

    #[error("Operation cancelled")]
    Cancelled,
}

fn display_opt_path(path: &Option<PathBuf>) -> String {
    match path {
        Some(p) => format!(" {}", p.display()),
        None => String::new(),
    }
}

impl HashUtilityError {
    /// Create an error with context about the operation and optional path
    /// NotFound and PermissionDenied are mapped to their dedicated variants when a path is known
    pub fn from_io_error(err: io::Error, operation: &str, path: Option<PathBuf>) -> Self {
        match (err.kind(), path) {
            (io::ErrorKind::NotFound, Some(p)) => {
                if operation.contains("directory") || operation.contains("scan") {
                    HashUtilityError::DirectoryNotFound { path: p }
                } else if operation.contains("manifest") {
                    HashUtilityError::ManifestNotFound { path: p }
                } else {
                    HashUtilityError::FileNotFound { path: p }
                }
            }
            (io::ErrorKind::PermissionDenied, Some(p)) => HashUtilityError::PermissionDenied {
                path: p,
                operation: operation.to_string(),
            },
            (_, path) => HashUtilityError::IoError {
                path,
                operation: operation.to_string(),
                source: err,
            },
        }
    }

    /// True when the run was stopped by its cancellation token
    pub fn is_cancelled(&self) -> bool {
        matches!(self, HashUtilityError::Cancelled)
    }
}

impl From<io::Error> for HashUtilityError {
    fn from(err: io::Error) -> Self {
        HashUtilityError::from_io_error(err, "unknown operation", None)
    }
}

// Tests in tests/hash/error_tests.rs
