//! External shell executor.

use super::ScriptExecutor;
use crate::catalog::ScriptDescriptor;
use crate::error::ExecutionError;
use std::process::Command;

/// Default shell used to run scripts.
pub const DEFAULT_SHELL: &str = "mongosh";

/// Flag passing the script file to the shell.
const FILE_FLAG: &str = "--file";

/// Runs each script through an external program:
/// `<program> [args...] --file <script path>`.
///
/// The child inherits stdout and stderr so script output reaches the operator.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    program: String,
    args: Vec<String>,
}

impl CommandExecutor {
    /// Run scripts with `program`, passing the script as `--file <path>`.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Append an argument placed before the script path.
    pub fn with_arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    fn command(&self, script: &ScriptDescriptor) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).arg(FILE_FLAG).arg(script.location());
        cmd
    }
}

impl ScriptExecutor for CommandExecutor {
    fn run(&self, script: &ScriptDescriptor) -> Result<(), ExecutionError> {
        tracing::debug!(
            program = %self.program,
            script = %script.location().display(),
            "launching script"
        );

        let status = self
            .command(script)
            .status()
            .map_err(|source| ExecutionError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ExecutionError::ExitStatus {
                program: self.program.clone(),
                status,
            })
        }
    }
}
