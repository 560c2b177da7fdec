// Manifest format handler module
// Reads and writes tab-separated checksum manifests: `<hash>\t<relative path>`

use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::SystemTime;

use super::error::HashUtilityError;
use super::path_utils;
use super::pipeline::CancellationToken;

/// One manifest line
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize)]
pub struct ManifestEntry {
    pub hash: String,
    pub relative_path: String,
}

impl ManifestEntry {
    pub fn new(hash: impl Into<String>, relative_path: impl Into<String>) -> Self {
        Self {
            hash: hash.into(),
            relative_path: relative_path.into(),
        }
    }
}

/// How to treat lines that are not `<hash>\t<path>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParseMode {
    /// Skip malformed lines (keeps older and newer manifests readable)
    #[default]
    Lenient,
    /// Fail on the first malformed, non-blank line
    Strict,
}

/// Reads and rewrites one manifest file
///
/// All writes through the same store are serialized by an internal lock and
/// replace the file in one step (temp file + rename), so readers never observe
/// a half-written manifest.
pub struct ManifestStore {
    path: PathBuf,
    parse_mode: ParseMode,
    write_lock: Mutex<()>,
}

impl ManifestStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            parse_mode: ParseMode::default(),
            write_lock: Mutex::new(()),
        }
    }

    /// Set how malformed lines are handled on read
    pub fn with_parse_mode(mut self, parse_mode: ParseMode) -> Self {
        self.parse_mode = parse_mode;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Parse a single manifest line
    ///
    /// Any non-blank line with a tab qualifies. The hash field is trimmed and
    /// may be empty (verification then reports the entry as an error). The
    /// path field is kept byte for byte apart from a trailing `\r`; leading and
    /// trailing spaces belong to the file name. Extra tab-separated fields
    /// after the path are ignored.
    pub fn parse_line(line: &str) -> Option<ManifestEntry> {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            return None;
        }

        let (hash, rest) = line.split_once('\t')?;
        let relative_path = rest.split_once('\t').map_or(rest, |(path, _)| path);
        if relative_path.is_empty() {
            return None;
        }
        Some(ManifestEntry::new(hash.trim(), relative_path))
    }

    /// True when `relative_path` can be stored on a single manifest line
    pub fn is_storable_path(relative_path: &str) -> bool {
        !relative_path.is_empty() && !relative_path.contains(['\t', '\n', '\r'])
    }

    /// Stream the manifest line by line into entries
    ///
    /// The file is never loaded as one string. Cancellation is checked on every
    /// line. Duplicate paths are kept as-is; merging decides what wins.
    pub fn read_entries(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<ManifestEntry>, HashUtilityError> {
        let file = File::open(&self.path).map_err(|e| {
            HashUtilityError::from_io_error(e, "opening manifest", Some(self.path.clone()))
        })?;
        let reader = BufReader::new(file);
        let mut entries = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            cancel.check()?;

            let line = line_result.map_err(|e| {
                HashUtilityError::from_io_error(e, "reading manifest", Some(self.path.clone()))
            })?;

            match Self::parse_line(&line) {
                Some(entry) => entries.push(entry),
                None if line.trim().is_empty() => {}
                None => match self.parse_mode {
                    ParseMode::Lenient => {
                        log::debug!(
                            "Skipping malformed line {} in manifest {}",
                            line_num + 1,
                            self.path.display()
                        );
                    }
                    ParseMode::Strict => {
                        return Err(HashUtilityError::ManifestParseError {
                            path: self.path.clone(),
                            line: line_num + 1,
                            reason: "expected '<hash>\\t<relative path>'".to_string(),
                        });
                    }
                },
            }
        }

        Ok(entries)
    }

    /// Replace the manifest with `entries`, sorted by relative path
    ///
    /// The collection is written to a temporary file next to the manifest and
    /// then renamed over it.
    pub fn write_all_entries(&self, entries: &[ManifestEntry]) -> Result<(), HashUtilityError> {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let write_error = |reason: String| HashUtilityError::ManifestWriteError {
            path: self.path.clone(),
            reason,
        };
        if let Some(bad) = entries.iter().find(|e| !Self::is_storable_path(&e.relative_path)) {
            return Err(write_error(format!(
                "path {:?} cannot be stored on one manifest line",
                bad.relative_path
            )));
        }

        let mut sorted: Vec<&ManifestEntry> = entries.iter().collect();
        sorted.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));

        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let temp = tempfile::NamedTempFile::new_in(&dir).map_err(|e| write_error(e.to_string()))?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            for entry in sorted {
                Self::write_entry(&mut writer, entry).map_err(|e| write_error(e.to_string()))?;
            }
            writer.flush().map_err(|e| write_error(e.to_string()))?;
        }
        temp.as_file()
            .sync_all()
            .map_err(|e| write_error(e.to_string()))?;
        temp.persist(&self.path)
            .map_err(|e| write_error(e.error.to_string()))?;

        log::debug!("Wrote {} entries to {}", entries.len(), self.path.display());
        Ok(())
    }

    /// Write a single entry line
    /// Paths are stored with forward slashes
    pub fn write_entry(writer: &mut impl Write, entry: &ManifestEntry) -> std::io::Result<()> {
        writeln!(
            writer,
            "{}\t{}",
            entry.hash,
            path_utils::to_manifest_separators(&entry.relative_path)
        )
    }

    /// Last write time of the manifest, used to tell drift from corruption
    pub fn modified(&self) -> Result<SystemTime, HashUtilityError> {
        fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .map_err(|e| {
                HashUtilityError::from_io_error(e, "reading manifest metadata", Some(self.path.clone()))
            })
    }

    /// Algorithm named by the manifest extension, if it names one
    pub fn algorithm_from_extension(path: &Path) -> Option<&'static str> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();

        match ext.as_str() {
            "md5" => Some("MD5"),
            "sha1" => Some("SHA1"),
            "sha256" => Some("SHA256"),
            "sha384" => Some("SHA384"),
            "sha512" => Some("SHA512"),
            "b3" | "blake3" => Some("BLAKE3"),
            _ => None,
        }
    }

    /// Guess the algorithm from the manifest extension
    /// Unknown or missing extensions default to SHA256
    pub fn infer_algorithm(path: &Path) -> &'static str {
        Self::algorithm_from_extension(path).unwrap_or("SHA256")
    }
}

// Tests in tests/hash/manifest_tests.rs
