//! Applied-migration bookkeeping.
//!
//! A [`VersionStore`] owns the lifecycle of [`MigrationRecord`]s: one record
//! per applied version, created when an up script succeeds and removed when
//! the matching down script succeeds. Records live in the same store the
//! scripts migrate, so every process pointed at that store sees one applied set.

mod mongo;
mod sled_store;

pub use mongo::MongoVersionStore;
pub use sled_store::SledVersionStore;

use crate::error::{MigrateError, Result};
use crate::version::MigrationVersion;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Default collection holding migration records.
pub const DEFAULT_COLLECTION: &str = "migrations";

/// Persisted record of an applied migration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationRecord {
    /// The applied version.
    pub version: MigrationVersion,
    /// When the up script completed.
    pub applied_at: DateTime<Utc>,
}

impl MigrationRecord {
    /// A record for `version` stamped with the current time.
    pub fn now(version: MigrationVersion) -> Self {
        Self {
            version,
            applied_at: Utc::now(),
        }
    }

    /// Encode the record as a JSON document.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self)
            .map_err(|e| MigrateError::persistence(format!("encode record {}", self.version), e))
    }

    /// Decode a record stored under `key`.
    pub fn from_bytes(key: &str, bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| MigrateError::Decode {
            key: key.to_string(),
            message: e.to_string(),
        })
    }
}

/// Reject empty namespace or collection names.
pub(crate) fn validate_names(namespace: &str, collection: &str) -> Result<()> {
    if namespace.is_empty() {
        return Err(MigrateError::configuration("namespace cannot be empty"));
    }
    if collection.is_empty() {
        return Err(MigrateError::configuration("collection cannot be empty"));
    }
    Ok(())
}

/// Persistent set of applied migration versions.
///
/// Each call is a single round trip to the backing store. Writes are durable
/// when the call returns; nothing is cached or buffered.
pub trait VersionStore {
    /// Every version that currently has a record. Empty when nothing was applied.
    fn list_applied(&self) -> Result<BTreeSet<MigrationVersion>>;

    /// Insert a record for `version` with the current timestamp.
    ///
    /// Uniqueness is the caller's responsibility.
    fn record(&self, version: &MigrationVersion) -> Result<()>;

    /// Delete the record for `version`. Missing records are not an error.
    fn remove(&self, version: &MigrationVersion) -> Result<()>;

    /// Highest applied version by version order, or `None` when empty.
    fn latest(&self) -> Result<Option<MigrationVersion>>;
}
