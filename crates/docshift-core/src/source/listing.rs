//! Fixed in-memory script listing.

use super::ScriptSource;
use crate::catalog::RawEntry;
use crate::error::Result;

/// A source backed by a fixed listing, for bundled script sets.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    entries: Vec<RawEntry>,
}

impl StaticSource {
    /// Create a source returning `entries` as-is.
    pub fn new(entries: Vec<RawEntry>) -> Self {
        Self { entries }
    }

    /// Build a listing of file entries from names; each location is the name itself.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = names
            .into_iter()
            .map(|name| {
                let name = name.into();
                RawEntry::file(name.clone(), name)
            })
            .collect();
        Self { entries }
    }

}

impl ScriptSource for StaticSource {
    fn entries(&self) -> Result<Vec<RawEntry>> {
        Ok(self.entries.clone())
    }

    fn describe(&self) -> String {
        format!("static listing ({} entries)", self.entries.len())
    }
}
