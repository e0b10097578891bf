//! docshift core - versioned migration scripts for document stores.
//!
//! This crate tracks which migration scripts have been applied to a target
//! store and runs the pending ones in version order:
//!
//! - [`ScriptSource`](source::ScriptSource) lists candidate scripts
//! - [`ScriptCatalog`] parses names like `0003_add_index_up.js` into descriptors
//! - [`VersionStore`](store::VersionStore) persists one record per applied version
//! - [`ScriptExecutor`](executor::ScriptExecutor) runs a single script
//! - [`Migrator`] ties them together into `up`, `down` and `latest_version`
//!
//! # Example
//!
//! ```ignore
//! use docshift_core::{Migrator, MigratorConfig};
//!
//! let config = MigratorConfig::new("app")
//!     .with_scripts_dir("./migrations")
//!     .with_connection_uri("mongodb://127.0.0.1:27017/app");
//!
//! let mut migrator = Migrator::from_config(&config)?;
//! migrator.up()?;
//! println!("at version {:?}", migrator.latest_version()?);
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod executor;
pub mod migrator;
pub mod source;
pub mod store;
pub mod version;

pub use catalog::{Direction, RawEntry, ScriptCatalog, ScriptDescriptor};
pub use config::MigratorConfig;
pub use error::{ExecutionError, MigrateError, Result};
pub use executor::{CommandExecutor, ScriptExecutor};
pub use migrator::{Migrator, RunState};
pub use source::{DirectorySource, ScriptSource, StaticSource};
pub use store::{MigrationRecord, MongoVersionStore, SledVersionStore, VersionStore};
pub use version::MigrationVersion;
