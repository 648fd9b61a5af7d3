//! File identification by size and content hash.
//!
//! A game or data set is identified by a handful of files that must exist
//! with an exact size and content hash. Hashes are lowercase hex BLAKE3
//! digests.
//!
//! Manifests are plain text, one file per line:
//!
//! ```text
//! # path            size   blake3
//! DATA/SCORES.DAT   260    8f3c...
//! ```

use crate::error::{Error, Result};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};
use walkdir::WalkDir;

/// A file expected under a base directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedFile {
    /// Path relative to the base directory
    pub path: PathBuf,
    /// Exact size in bytes
    pub size: u64,
    /// Lowercase hex BLAKE3 digest of the contents
    pub hash: String,
}

impl ExpectedFile {
    /// Creates a new expectation
    pub fn new(path: impl Into<PathBuf>, size: u64, hash: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            size,
            hash: hash.into(),
        }
    }
}

/// Why an expected file failed verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// The file is absent or unreadable
    Missing {
        /// Path relative to the base directory
        path: PathBuf,
    },
    /// The file has the wrong size
    SizeMismatch {
        /// Path relative to the base directory
        path: PathBuf,
        /// Expected size
        expected: u64,
        /// Size on disk
        actual: u64,
    },
    /// The file contents hash differently
    HashMismatch {
        /// Path relative to the base directory
        path: PathBuf,
    },
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mismatch::Missing { path } => write!(f, "{}: missing", path.display()),
            Mismatch::SizeMismatch {
                path,
                expected,
                actual,
            } => write!(
                f,
                "{}: size {} (expected {})",
                path.display(),
                actual,
                expected
            ),
            Mismatch::HashMismatch { path } => {
                write!(f, "{}: content hash differs", path.display())
            }
        }
    }
}

/// Hex BLAKE3 digest of `data`
pub fn content_hash(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Returns true if every expected file exists under `base` with the expected
/// size and content hash
pub fn verify(expected: &[ExpectedFile], base: impl AsRef<Path>) -> bool {
    check(expected, base).is_ok()
}

/// Checks every expected file in order, stopping at the first mismatch
pub fn check(
    expected: &[ExpectedFile],
    base: impl AsRef<Path>,
) -> std::result::Result<(), Mismatch> {
    let base = base.as_ref();

    for file in expected {
        let full = base.join(&file.path);
        trace!("Checking {}", full.display());

        let missing = || Mismatch::Missing {
            path: file.path.clone(),
        };

        let size = fs::metadata(&full).map_err(|_| missing())?.len();
        if size != file.size {
            debug!("{}: size {} != {}", full.display(), size, file.size);
            return Err(Mismatch::SizeMismatch {
                path: file.path.clone(),
                expected: file.size,
                actual: size,
            });
        }

        let data = fs::read(&full).map_err(|_| missing())?;
        if !content_hash(&data).eq_ignore_ascii_case(&file.hash) {
            debug!("{}: content hash differs", full.display());
            return Err(Mismatch::HashMismatch {
                path: file.path.clone(),
            });
        }
    }

    Ok(())
}

/// An ordered list of expected files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// Expected files in manifest order
    pub files: Vec<ExpectedFile>,
}

impl Manifest {
    /// Parses manifest text: `path size hash` per line, `#` comments allowed.
    ///
    /// The path is everything before the last two fields, so it may contain
    /// spaces.
    pub fn parse(text: &str) -> Result<Self> {
        let mut files = Vec::new();

        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let body = line.split('#').next().unwrap_or_default().trim();
            if body.is_empty() {
                continue;
            }

            let Some(((path, size), hash)) =
                split_last(body).and_then(|(rest, hash)| Some((split_last(rest)?, hash)))
            else {
                return Err(Error::invalid_manifest(line_no, "expected 'path size hash'"));
            };

            let size = size
                .parse()
                .map_err(|_| Error::invalid_manifest(line_no, format!("invalid size '{}'", size)))?;
            if path.is_empty() {
                return Err(Error::invalid_manifest(line_no, "empty path"));
            }

            files.push(ExpectedFile::new(path, size, hash));
        }

        Ok(Self { files })
    }

    /// Reads and parses a manifest file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        Self::parse(&text)
    }

    /// Builds a manifest describing every regular file under `base`, sorted
    /// by relative path
    pub fn from_directory(base: impl AsRef<Path>) -> Result<Self> {
        let base = base.as_ref();
        let mut files = Vec::new();

        for entry in WalkDir::new(base).follow_links(false).sort_by_file_name() {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(base).to_path_buf();
                Error::file_read(path, e.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let data = fs::read(path).map_err(|e| Error::file_read(path, e))?;
            let relative = path.strip_prefix(base).unwrap_or(path).to_path_buf();
            trace!("Hashed {} ({} bytes)", relative.display(), data.len());

            files.push(ExpectedFile::new(relative, data.len() as u64, content_hash(&data)));
        }

        debug!("Manifest of {}: {} files", base.display(), files.len());
        Ok(Self { files })
    }

    /// Verifies every entry against `base`
    pub fn verify(&self, base: impl AsRef<Path>) -> bool {
        verify(&self.files, base)
    }
}

/// Splits off the last whitespace-separated token
fn split_last(s: &str) -> Option<(&str, &str)> {
    let s = s.trim_end();
    let idx = s.rfind(char::is_whitespace)?;
    Some((s[..idx].trim_end(), s[idx..].trim_start()))
}

impl fmt::Display for Manifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for file in &self.files {
            writeln!(f, "{} {} {}", file.path.display(), file.size, file.hash)?;
        }
        Ok(())
    }
}
