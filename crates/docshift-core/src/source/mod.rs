//! Script sources: where migration scripts are listed from.

mod directory;
mod listing;

pub use directory::DirectorySource;
pub use listing::StaticSource;

use crate::catalog::RawEntry;
use crate::error::Result;

/// Enumerates candidate script entries.
///
/// Implementations return the raw listing only; filtering and parsing are left
/// to [`ScriptCatalog`](crate::catalog::ScriptCatalog).
pub trait ScriptSource {
    /// List every entry in the source.
    fn entries(&self) -> Result<Vec<RawEntry>>;

    /// Human-readable description of where the scripts come from.
    fn describe(&self) -> String;
}
