//! Script execution engines.

mod command;

pub use command::{CommandExecutor, DEFAULT_SHELL};

use crate::catalog::ScriptDescriptor;
use crate::error::ExecutionError;

/// Runs a single migration script against the target store.
///
/// A run is opaque and blocking: it either completes or reports failure. Any
/// partial effect of a failed script is outside the engine's accounting.
pub trait ScriptExecutor {
    /// Run `script` to completion.
    fn run(&self, script: &ScriptDescriptor) -> Result<(), ExecutionError>;
}
