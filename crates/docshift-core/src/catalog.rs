//! Script catalog: turns a raw source listing into typed descriptors.

use crate::version::MigrationVersion;
use std::path::{Path, PathBuf};

/// Default script extension (scripts run through a JavaScript shell).
pub const DEFAULT_EXTENSION: &str = "js";

const UP_TOKEN: &str = "up";
const DOWN_TOKEN: &str = "down";

/// Direction of a migration script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Forward change.
    Up,
    /// Reverse change.
    Down,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Up => write!(f, "up"),
            Direction::Down => write!(f, "down"),
        }
    }
}

/// One entry of a script source listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    /// File name, without any directory component.
    pub name: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
    /// Where the executor can find the script.
    pub location: PathBuf,
}

impl RawEntry {
    /// A file entry.
    pub fn file(name: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            is_dir: false,
            location: location.into(),
        }
    }

    /// A directory entry.
    pub fn dir(name: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            is_dir: true,
            location: location.into(),
        }
    }
}

/// A parsed migration script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptDescriptor {
    /// Version token from the script name.
    pub version: MigrationVersion,
    /// Up or down.
    pub direction: Direction,
    /// Original file name.
    pub name: String,
    location: PathBuf,
}

impl ScriptDescriptor {
    /// Location handle passed to the executor.
    pub fn location(&self) -> &Path {
        &self.location
    }
}

/// Parses script listings according to the naming convention
/// `<version>_<description><up|down>.<ext>`.
#[derive(Debug, Clone)]
pub struct ScriptCatalog {
    extension: String,
}

impl Default for ScriptCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_EXTENSION)
    }
}

impl ScriptCatalog {
    /// Create a catalog accepting scripts with the given extension (without the dot).
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into().trim_start_matches('.').to_string(),
        }
    }

    /// Parse a listing into descriptors, keeping the listing order.
    pub fn parse(&self, entries: &[RawEntry]) -> Vec<ScriptDescriptor> {
        entries
            .iter()
            .filter_map(|entry| self.parse_entry(entry))
            .collect()
    }

    /// Parse a listing and keep only the descriptors of one direction.
    pub fn parse_direction(&self, entries: &[RawEntry], direction: Direction) -> Vec<ScriptDescriptor> {
        entries
            .iter()
            .filter_map(|entry| self.parse_entry(entry))
            .filter(|script| script.direction == direction)
            .collect()
    }

    fn parse_entry(&self, entry: &RawEntry) -> Option<ScriptDescriptor> {
        if entry.is_dir {
            return None;
        }

        let Some(stem) = self.stem(&entry.name) else {
            tracing::debug!(name = %entry.name, "skipping entry with unexpected extension");
            return None;
        };

        let Some(direction) = detect_direction(stem) else {
            tracing::debug!(name = %entry.name, "skipping entry without direction token");
            return None;
        };

        Some(ScriptDescriptor {
            version: MigrationVersion::from_script_name(&entry.name),
            direction,
            name: entry.name.clone(),
            location: entry.location.clone(),
        })
    }

    fn stem<'a>(&self, name: &'a str) -> Option<&'a str> {
        let stem = name.strip_suffix(self.extension.as_str())?;
        stem.strip_suffix('.')
    }
}

/// Direction from the `up`/`down` tokens in a name stem.
///
/// When both appear, the rightmost one wins: the convention puts the direction
/// token right before the extension, so `0002_setup_down` is a down script.
fn detect_direction(stem: &str) -> Option<Direction> {
    match (stem.rfind(UP_TOKEN), stem.rfind(DOWN_TOKEN)) {
        (None, None) => None,
        (Some(_), None) => Some(Direction::Up),
        (None, Some(_)) => Some(Direction::Down),
        (Some(up), Some(down)) if up > down => Some(Direction::Up),
        (Some(_), Some(_)) => Some(Direction::Down),
    }
}
