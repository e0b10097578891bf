//! Migrator - orchestrates up and down runs.
//!
//! A run walks `Idle -> Discovering -> Diffing -> Applying(i) -> Done`, or stops
//! in `Failed` on the first error. Scripts run one at a time; every success is
//! committed to the version store before the next script starts, so a failed
//! run leaves earlier steps recorded and can simply be re-invoked.

use crate::catalog::{Direction, ScriptCatalog, ScriptDescriptor};
use crate::config::MigratorConfig;
use crate::error::{MigrateError, Result};
use crate::executor::{CommandExecutor, ScriptExecutor};
use crate::source::{DirectorySource, ScriptSource};
use crate::store::{MongoVersionStore, VersionStore};
use crate::version::MigrationVersion;
use std::collections::BTreeSet;

/// Position of the migrator in its run state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No run started yet.
    Idle,
    /// Listing and parsing scripts.
    Discovering,
    /// Comparing scripts against the applied set.
    Diffing,
    /// Running the script at this index of the work list.
    Applying(usize),
    /// Last run completed.
    Done,
    /// Last run aborted; holds the index of the failing script, or `None`
    /// when the run stopped before any script was started.
    Failed(Option<usize>),
}

/// Applies and rolls back migration scripts.
pub struct Migrator {
    source: Box<dyn ScriptSource>,
    store: Box<dyn VersionStore>,
    executor: Box<dyn ScriptExecutor>,
    catalog: ScriptCatalog,
    state: RunState,
}

impl Migrator {
    /// Create a migrator from its collaborators.
    pub fn new(
        source: impl ScriptSource + 'static,
        store: impl VersionStore + 'static,
        executor: impl ScriptExecutor + 'static,
    ) -> Self {
        Self {
            source: Box::new(source),
            store: Box::new(store),
            executor: Box::new(executor),
            catalog: ScriptCatalog::default(),
            state: RunState::Idle,
        }
    }

    /// Wire a directory source, the target's version store and the shell
    /// executor from configuration.
    ///
    /// Records and scripts both go to the deployment at `connection_uri`, so
    /// every process pointed at the same target shares one applied set.
    pub fn from_config(config: &MigratorConfig) -> Result<Self> {
        config.validate()?;

        let store = MongoVersionStore::connect(
            &config.connection_uri,
            &config.namespace,
            &config.collection,
        )?;
        let executor = CommandExecutor::new(&config.shell).with_arg(&config.connection_uri);

        Ok(Self::new(DirectorySource::new(&config.scripts_dir), store, executor)
            .with_catalog(ScriptCatalog::new(&config.extension)))
    }

    /// Use a catalog with a different script extension.
    pub fn with_catalog(mut self, catalog: ScriptCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// State reached by the last run.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Apply every pending up script in ascending version order.
    pub fn up(&mut self) -> Result<()> {
        self.run(Direction::Up)
    }

    /// Roll back every applied version in descending version order.
    pub fn down(&mut self) -> Result<()> {
        self.run(Direction::Down)
    }

    /// Highest applied version, or `None` when nothing has been applied.
    pub fn latest_version(&self) -> Result<Option<MigrationVersion>> {
        self.store.latest()
    }

    fn run(&mut self, direction: Direction) -> Result<()> {
        match self.drive(direction) {
            Ok(executed) => {
                self.transition(RunState::Done);
                tracing::info!(%direction, executed, "migration run complete");
                Ok(())
            }
            Err(err) => {
                let step = match self.state {
                    RunState::Applying(index) => Some(index),
                    _ => None,
                };
                self.transition(RunState::Failed(step));
                tracing::warn!(%direction, step = ?step, error = %err, "migration run aborted");
                Err(err)
            }
        }
    }

    fn drive(&mut self, direction: Direction) -> Result<usize> {
        self.transition(RunState::Discovering);
        let entries = self.source.entries()?;
        let scripts = self.catalog.parse_direction(&entries, direction);
        tracing::debug!(
            source = %self.source.describe(),
            %direction,
            scripts = scripts.len(),
            "discovered scripts"
        );

        self.transition(RunState::Diffing);
        let mut applied = self.store.list_applied()?;
        let work = work_list(direction, scripts, &applied);

        let mut executed = 0;
        for (index, script) in work.iter().enumerate() {
            self.transition(RunState::Applying(index));
            if self.apply(direction, script, &mut applied)? {
                executed += 1;
            }
        }

        Ok(executed)
    }

    /// Run one script and update the store. Returns `false` when skipped.
    fn apply(
        &self,
        direction: Direction,
        script: &ScriptDescriptor,
        applied: &mut BTreeSet<MigrationVersion>,
    ) -> Result<bool> {
        let version = &script.version;

        // An earlier script in this run already handled the version.
        let handled = match direction {
            Direction::Up => applied.contains(version),
            Direction::Down => !applied.contains(version),
        };
        if handled {
            tracing::info!(
                %version,
                script = %script.name,
                "duplicate script for a version handled earlier in this run, skipping"
            );
            return Ok(false);
        }

        tracing::info!(%version, %direction, script = %script.name, "running migration script");
        self.executor
            .run(script)
            .map_err(|source| MigrateError::Execution {
                version: version.clone(),
                direction,
                script: script.name.clone(),
                source,
            })?;

        match direction {
            Direction::Up => {
                self.store.record(version)?;
                applied.insert(version.clone());
                tracing::info!(%version, "migration applied");
            }
            Direction::Down => {
                self.store.remove(version)?;
                applied.remove(version);
                tracing::info!(%version, "migration rolled back");
            }
        }

        Ok(true)
    }

    fn transition(&mut self, next: RunState) {
        tracing::debug!(from = ?self.state, to = ?next, "migrator state transition");
        self.state = next;
    }
}

/// Scripts to run for `direction`, in execution order.
///
/// Up runs pending versions ascending; down runs applied versions descending.
/// Ties keep listing order.
fn work_list(
    direction: Direction,
    scripts: Vec<ScriptDescriptor>,
    applied: &BTreeSet<MigrationVersion>,
) -> Vec<ScriptDescriptor> {
    let mut work: Vec<ScriptDescriptor> = scripts
        .into_iter()
        .filter(|script| {
            let is_applied = applied.contains(&script.version);
            match direction {
                Direction::Up if is_applied => {
                    tracing::info!(
                        version = %script.version,
                        script = %script.name,
                        "migration already applied, skipping"
                    );
                    false
                }
                Direction::Down if !is_applied => {
                    tracing::info!(
                        version = %script.version,
                        script = %script.name,
                        "migration not applied, skipping"
                    );
                    false
                }
                _ => true,
            }
        })
        .collect();

    match direction {
        Direction::Up => work.sort_by(|a, b| a.version.cmp(&b.version)),
        Direction::Down => work.sort_by(|a, b| b.version.cmp(&a.version)),
    }
    work
}
