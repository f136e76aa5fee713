//! Artifact discovery in a trainer's output directory.
//!
//! The scan is non-recursive and read-only. When several files match, the
//! most recently modified one wins; equal modification times fall back to
//! the file name in ascending order, so repeated scans of an unchanged
//! directory always select the same file.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::contract::ArtifactCandidate;

/// Serialized-tensor files produced by the LoRA trainers.
pub const DEFAULT_SUFFIX: &str = ".safetensors";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotFoundKind {
    MissingDirectory,
    Unreadable,
    EmptyDirectory,
    NoMatch,
}

impl fmt::Display for NotFoundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            NotFoundKind::MissingDirectory => "directory does not exist",
            NotFoundKind::Unreadable => "directory could not be read",
            NotFoundKind::EmptyDirectory => "directory is empty",
            NotFoundKind::NoMatch => "no entry matches the expected suffix",
        };
        f.write_str(s)
    }
}

/// No candidate could be selected. A normal outcome, not a fault.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("no artifact in {}: {kind}", .directory.display())]
pub struct NotFound {
    pub directory: PathBuf,
    pub kind: NotFoundKind,
}

#[derive(Debug, Clone)]
pub struct ArtifactLocator {
    suffix: String,
}

impl Default for ArtifactLocator {
    fn default() -> Self {
        Self::new(DEFAULT_SUFFIX)
    }
}

impl ArtifactLocator {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    /// Select the best candidate among the immediate entries of `directory`.
    pub fn locate(&self, directory: &Path) -> Result<ArtifactCandidate, NotFound> {
        let not_found = |kind| NotFound {
            directory: directory.to_path_buf(),
            kind,
        };

        let entries = match fs::read_dir(directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(not_found(NotFoundKind::MissingDirectory))
            }
            Err(e) => {
                warn!(error = ?e, path = %directory.display(), "Failed to read output directory");
                return Err(not_found(NotFoundKind::Unreadable));
            }
        };

        let mut saw_entry = false;
        let mut candidates: Vec<ArtifactCandidate> = Vec::new();

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!(error = ?e, "Skipping unreadable directory entry");
                    continue;
                }
            };
            saw_entry = true;

            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                debug!(path = %entry.path().display(), "Skipping non UTF-8 file name");
                continue;
            };
            if !name.ends_with(&self.suffix) {
                continue;
            }

            let path = entry.path();
            // fs::metadata follows symlinks, DirEntry::metadata does not
            let metadata = match fs::metadata(&path) {
                Ok(m) if m.is_file() => m,
                Ok(_) => continue,
                Err(e) => {
                    debug!(error = ?e, path = %path.display(), "Skipping entry without metadata");
                    continue;
                }
            };
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            candidates.push(ArtifactCandidate::new(path, modified, metadata.len()));
        }

        if !saw_entry {
            return Err(not_found(NotFoundKind::EmptyDirectory));
        }

        candidates.sort_by(|a, b| {
            b.modified
                .cmp(&a.modified)
                .then_with(|| a.path.cmp(&b.path))
        });

        match candidates.into_iter().next() {
            Some(candidate) => {
                debug!(path = %candidate.path.display(), "Selected artifact candidate");
                Ok(candidate)
            }
            None => Err(not_found(NotFoundKind::NoMatch)),
        }
    }
}
