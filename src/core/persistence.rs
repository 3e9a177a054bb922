//! JSON record persistence shared by the configuration and history stores.
//!
//! Records are written whole: the new contents go to a temporary file in the
//! target directory which is then renamed over the old record, so a reader
//! sees either the previous record or the new one.

use crate::core::paths::path_display;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error as StdError;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug)]
pub enum PersistenceError {
    /// The record exists but could not be read.
    Read { path: PathBuf, source: io::Error },

    /// The record was read but is not valid JSON for the expected shape.
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// The record could not be written or moved into place.
    Write { path: PathBuf, source: io::Error },

    /// The in-memory value could not be encoded.
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl PersistenceError {
    /// Read and parse failures are absorbed by the stores and replaced with
    /// defaults; write failures are reported to the caller.
    pub fn is_read_failure(&self) -> bool {
        matches!(
            self,
            PersistenceError::Read { .. } | PersistenceError::Parse { .. }
        )
    }

    pub fn path(&self) -> &Path {
        match self {
            PersistenceError::Read { path, .. }
            | PersistenceError::Parse { path, .. }
            | PersistenceError::Write { path, .. }
            | PersistenceError::Serialize { path, .. } => path,
        }
    }
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PersistenceError::Read { path, source } => {
                write!(f, "Failed to read {}: {}", path_display(path), source)
            }
            PersistenceError::Parse { path, source } => {
                write!(f, "Failed to parse {}: {}", path_display(path), source)
            }
            PersistenceError::Write { path, source } => {
                write!(f, "Failed to write {}: {}", path_display(path), source)
            }
            PersistenceError::Serialize { path, source } => {
                write!(f, "Failed to encode {}: {}", path_display(path), source)
            }
        }
    }
}

impl StdError for PersistenceError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            PersistenceError::Read { source, .. } => Some(source),
            PersistenceError::Parse { source, .. } => Some(source),
            PersistenceError::Write { source, .. } => Some(source),
            PersistenceError::Serialize { source, .. } => Some(source),
        }
    }
}

/// Reads a JSON record. A missing file is `Ok(None)`, not an error.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, PersistenceError> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(PersistenceError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|source| PersistenceError::Parse {
            path: path.to_path_buf(),
            source,
        })
}

/// Replaces the record at `path` with the pretty-printed JSON encoding of
/// `value`. Non-ASCII text is written as UTF-8, never as `\u` escapes.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    let write_err = |source: io::Error| PersistenceError::Write {
        path: path.to_path_buf(),
        source,
    };

    let contents =
        serde_json::to_string_pretty(value).map_err(|source| PersistenceError::Serialize {
            path: path.to_path_buf(),
            source,
        })?;

    let parent = path.parent().filter(|dir| !dir.as_os_str().is_empty());
    if let Some(dir) = parent {
        fs::create_dir_all(dir).map_err(write_err)?;
    }

    let mut temp_file = match parent {
        Some(dir) => NamedTempFile::new_in(dir),
        None => NamedTempFile::new_in("."),
    }
    .map_err(write_err)?;

    temp_file.write_all(contents.as_bytes()).map_err(write_err)?;
    temp_file.as_file_mut().sync_all().map_err(write_err)?;
    temp_file
        .persist(path)
        .map_err(|err| write_err(err.error))?;
    Ok(())
}
