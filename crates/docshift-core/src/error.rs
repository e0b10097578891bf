//! Error types for the migration engine.

use crate::catalog::Direction;
use crate::version::MigrationVersion;
use std::process::ExitStatus;
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, MigrateError>;

/// Errors returned by [`Migrator`](crate::Migrator) invocations and its collaborators.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// Invalid setup, detected at construction.
    #[error("configuration error: {message}")]
    Configuration {
        /// What is wrong with the configuration.
        message: String,
    },

    /// The script source could not be listed.
    #[error("failed to read scripts from {location}: {source}")]
    Discovery {
        /// Where the source was reading from.
        location: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The version store could not be read or written.
    #[error("persistence error during {operation}: {message}")]
    Persistence {
        /// The store operation that failed.
        operation: String,
        /// Error message from the backing store.
        message: String,
    },

    /// A script did not run to completion.
    #[error("{direction} migration {version} failed ({script}): {source}")]
    Execution {
        /// Version of the failing script.
        version: MigrationVersion,
        /// Direction of the failing script.
        direction: Direction,
        /// Name of the failing script.
        script: String,
        /// Failure reported by the execution engine.
        #[source]
        source: ExecutionError,
    },

    /// A persisted record could not be interpreted.
    #[error("failed to decode migration record {key:?}: {message}")]
    Decode {
        /// Store key of the malformed record.
        key: String,
        /// Description of the decoding failure.
        message: String,
    },
}

impl MigrateError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        MigrateError::Configuration {
            message: message.into(),
        }
    }

    /// Create a persistence error for the given store operation.
    pub fn persistence(operation: impl Into<String>, err: impl std::fmt::Display) -> Self {
        MigrateError::Persistence {
            operation: operation.into(),
            message: err.to_string(),
        }
    }
}

/// Failures reported by a [`ScriptExecutor`](crate::executor::ScriptExecutor).
#[derive(Debug, Error)]
pub enum ExecutionError {
    /// The execution program could not be started.
    #[error("failed to launch {program}: {source}")]
    Spawn {
        /// Program that was launched.
        program: String,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// The execution program ran but reported failure.
    #[error("{program} exited with {status}")]
    ExitStatus {
        /// Program that was launched.
        program: String,
        /// Exit status it returned.
        status: ExitStatus,
    },

    /// Engine-specific failure.
    #[error("{0}")]
    Failed(String),
}
