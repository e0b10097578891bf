//! Migrator configuration.

use crate::catalog::DEFAULT_EXTENSION;
use crate::error::{MigrateError, Result};
use crate::executor::DEFAULT_SHELL;
use crate::store::DEFAULT_COLLECTION;
use std::path::PathBuf;

/// Default directory holding migration scripts.
pub const DEFAULT_SCRIPTS_DIR: &str = "./migrations";

/// Default connection URI of the target store.
pub const DEFAULT_CONNECTION_URI: &str = "mongodb://127.0.0.1:27017";

/// Configuration for [`Migrator::from_config`](crate::Migrator::from_config).
#[derive(Debug, Clone)]
pub struct MigratorConfig {
    /// Target database name; records live in its `collection`.
    pub namespace: String,

    /// Collection holding migration records.
    pub collection: String,

    /// Directory to list scripts from.
    pub scripts_dir: PathBuf,

    /// Script file extension, without the dot.
    pub extension: String,

    /// Program used to run scripts.
    pub shell: String,

    /// Target store URI, used for the version store and passed to the shell.
    pub connection_uri: String,
}

impl MigratorConfig {
    /// Create a configuration for `namespace` with default settings.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            collection: DEFAULT_COLLECTION.to_string(),
            scripts_dir: PathBuf::from(DEFAULT_SCRIPTS_DIR),
            extension: DEFAULT_EXTENSION.to_string(),
            shell: DEFAULT_SHELL.to_string(),
            connection_uri: DEFAULT_CONNECTION_URI.to_string(),
        }
    }

    /// Set the record collection.
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    /// Set the scripts directory.
    pub fn with_scripts_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scripts_dir = dir.into();
        self
    }

    /// Set the script extension.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Set the shell program.
    pub fn with_shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Set the connection URI.
    pub fn with_connection_uri(mut self, uri: impl Into<String>) -> Self {
        self.connection_uri = uri.into();
        self
    }

    /// Check the configuration before any resource is acquired.
    pub fn validate(&self) -> Result<()> {
        if self.namespace.trim().is_empty() {
            return Err(MigrateError::configuration("namespace cannot be empty"));
        }
        if self.collection.trim().is_empty() {
            return Err(MigrateError::configuration("collection cannot be empty"));
        }
        if self.extension.trim_start_matches('.').is_empty() {
            return Err(MigrateError::configuration("script extension cannot be empty"));
        }
        if self.connection_uri.trim().is_empty() {
            return Err(MigrateError::configuration("connection URI cannot be empty"));
        }
        if self.shell.is_empty() {
            return Err(MigrateError::configuration("shell program cannot be empty"));
        }
        Ok(())
    }
}

impl Default for MigratorConfig {
    fn default() -> Self {
        Self::new("")
    }
}
