//! sled-backed version store.

use super::{validate_names, MigrationRecord, VersionStore, DEFAULT_COLLECTION};
use crate::error::{MigrateError, Result};
use crate::version::MigrationVersion;
use sled::{Db, Tree};
use std::collections::BTreeSet;
use std::path::Path;

/// Version store for targets that are themselves sled databases.
///
/// Records are JSON documents in the tree `<namespace>:<collection>`, keyed by
/// the version token. Share the target's [`Db`] through [`with_db`] so scripts
/// and records land in the same database. Every write is flushed before the
/// call returns.
///
/// [`with_db`]: SledVersionStore::with_db
pub struct SledVersionStore {
    tree: Tree,
}

impl SledVersionStore {
    /// Open the sled database at `path` and the `migrations` tree for `namespace`.
    pub fn open(path: impl AsRef<Path>, namespace: &str) -> Result<Self> {
        validate_names(namespace, DEFAULT_COLLECTION)?;
        let path = path.as_ref();
        let db = sled::open(path)
            .map_err(|e| MigrateError::persistence(format!("open {}", path.display()), e))?;
        Self::with_db(&db, namespace, DEFAULT_COLLECTION)
    }

    /// Use the target's already open sled database.
    pub fn with_db(db: &Db, namespace: &str, collection: &str) -> Result<Self> {
        validate_names(namespace, collection)?;
        let tree_name = format!("{namespace}:{collection}");
        let tree = db
            .open_tree(&tree_name)
            .map_err(|e| MigrateError::persistence(format!("open tree {tree_name}"), e))?;

        Ok(Self { tree })
    }

    /// Decode every stored record in one pass over the tree.
    fn scan(&self, operation: &str) -> Result<Vec<MigrationRecord>> {
        let mut records = Vec::new();
        for item in self.tree.iter() {
            let (key, value) = item.map_err(|e| MigrateError::persistence(operation, e))?;
            let key = std::str::from_utf8(&key).map_err(|e| MigrateError::Decode {
                key: String::from_utf8_lossy(&key).into_owned(),
                message: e.to_string(),
            })?;

            let record = MigrationRecord::from_bytes(key, &value)?;
            if record.version.as_str() != key {
                return Err(MigrateError::Decode {
                    key: key.to_string(),
                    message: format!("record holds version {:?}", record.version.as_str()),
                });
            }
            records.push(record);
        }
        Ok(records)
    }

    fn flush(&self, operation: &str) -> Result<()> {
        self.tree
            .flush()
            .map_err(|e| MigrateError::persistence(operation, e))?;
        Ok(())
    }
}

impl VersionStore for SledVersionStore {
    fn list_applied(&self) -> Result<BTreeSet<MigrationVersion>> {
        Ok(self
            .scan("list applied migrations")?
            .into_iter()
            .map(|record| record.version)
            .collect())
    }

    fn record(&self, version: &MigrationVersion) -> Result<()> {
        let operation = format!("record migration {version}");
        let value = MigrationRecord::now(version.clone()).to_bytes()?;
        self.tree
            .insert(version.as_str().as_bytes(), value)
            .map_err(|e| MigrateError::persistence(&operation, e))?;
        self.flush(&operation)
    }

    fn remove(&self, version: &MigrationVersion) -> Result<()> {
        let operation = format!("remove migration {version}");
        self.tree
            .remove(version.as_str().as_bytes())
            .map_err(|e| MigrateError::persistence(&operation, e))?;
        self.flush(&operation)
    }

    fn latest(&self) -> Result<Option<MigrationVersion>> {
        Ok(self
            .scan("fetch latest version")?
            .into_iter()
            .map(|record| record.version)
            .max())
    }
}
