//! Local directory script source.

use super::ScriptSource;
use crate::catalog::RawEntry;
use crate::error::{MigrateError, Result};
use std::path::PathBuf;

/// Lists scripts from a local directory (non-recursive).
#[derive(Debug, Clone)]
pub struct DirectorySource {
    dir: PathBuf,
}

impl DirectorySource {
    /// Create a source reading from `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn discovery_error(&self, source: std::io::Error) -> MigrateError {
        MigrateError::Discovery {
            location: self.dir.display().to_string(),
            source,
        }
    }
}

impl ScriptSource for DirectorySource {
    fn entries(&self) -> Result<Vec<RawEntry>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&self.dir).map_err(|e| self.discovery_error(e))? {
            let entry = entry.map_err(|e| self.discovery_error(e))?;
            let location = entry.path();
            // follow symlinks; a dangling link is listed as a plain entry
            let is_dir = match std::fs::metadata(&location) {
                Ok(metadata) => metadata.is_dir(),
                Err(_) => entry.file_type().map_err(|e| self.discovery_error(e))?.is_dir(),
            };
            entries.push(RawEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                is_dir,
                location,
            });
        }

        // read_dir order is platform dependent
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn describe(&self) -> String {
        format!("directory {}", self.dir.display())
    }
}
