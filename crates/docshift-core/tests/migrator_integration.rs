//! Integration tests for the migrator against a sled target database.

use docshift_core::{
    DirectorySource, ExecutionError, MigrateError, MigrationVersion, MongoVersionStore, Migrator,
    MigratorConfig, RunState, ScriptDescriptor, ScriptExecutor, SledVersionStore, StaticSource,
    VersionStore,
};
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Executor that logs script names and fails the configured ones.
#[derive(Clone, Default)]
struct FakeExecutor {
    ran: Arc<Mutex<Vec<String>>>,
    fail: Arc<Mutex<Vec<String>>>,
}

impl FakeExecutor {
    fn fail_on(&self, name: &str) {
        self.fail.lock().push(name.to_string());
    }

    fn clear_failures(&self) {
        self.fail.lock().clear();
    }

    fn take_ran(&self) -> Vec<String> {
        std::mem::take(&mut *self.ran.lock())
    }
}

impl ScriptExecutor for FakeExecutor {
    fn run(&self, script: &ScriptDescriptor) -> Result<(), ExecutionError> {
        self.ran.lock().push(script.name.clone());
        if self.fail.lock().contains(&script.name) {
            return Err(ExecutionError::Failed("script error".to_string()));
        }
        Ok(())
    }
}

struct TestContext {
    db: sled::Db,
    executor: FakeExecutor,
}

impl TestContext {
    fn new() -> Self {
        Self {
            db: sled::Config::new().temporary(true).open().unwrap(),
            executor: FakeExecutor::default(),
        }
    }

    fn store(&self) -> SledVersionStore {
        SledVersionStore::with_db(&self.db, "app", "migrations").unwrap()
    }

    fn migrator(&self, names: &[&str]) -> Migrator {
        Migrator::new(
            StaticSource::from_names(names.iter().copied()),
            self.store(),
            self.executor.clone(),
        )
    }

    fn applied(&self) -> Vec<String> {
        self.store()
            .list_applied()
            .unwrap()
            .into_iter()
            .map(|v| v.as_str().to_string())
            .collect()
    }
}

#[test]
fn test_up_is_idempotent() {
    let ctx = TestContext::new();
    let mut migrator = ctx.migrator(&["1_users_up.js", "2_orders_up.js"]);

    migrator.up().unwrap();
    assert_eq!(ctx.executor.take_ran(), vec!["1_users_up.js", "2_orders_up.js"]);

    migrator.up().unwrap();
    assert!(ctx.executor.take_ran().is_empty());
    assert_eq!(migrator.state(), RunState::Done);
    assert_eq!(ctx.applied(), vec!["1", "2"]);
}

#[test]
fn test_down_without_up_is_noop() {
    let ctx = TestContext::new();
    let mut migrator = ctx.migrator(&["1_users_up.js", "1_users_down.js"]);

    migrator.down().unwrap();
    assert!(ctx.executor.take_ran().is_empty());
    assert!(ctx.applied().is_empty());
}

#[test]
fn test_up_applies_in_numeric_order() {
    let ctx = TestContext::new();
    let mut migrator = ctx.migrator(&["10_c_up.js", "1_a_up.js", "2_b_up.js"]);

    migrator.up().unwrap();
    assert_eq!(
        ctx.executor.take_ran(),
        vec!["1_a_up.js", "2_b_up.js", "10_c_up.js"]
    );
}

#[test]
fn test_down_rolls_back_in_reverse_order() {
    let ctx = TestContext::new();
    let mut migrator = ctx.migrator(&[
        "1_a_up.js",
        "1_a_down.js",
        "2_b_up.js",
        "2_b_down.js",
        "10_c_up.js",
        "10_c_down.js",
    ]);

    migrator.up().unwrap();
    ctx.executor.take_ran();

    migrator.down().unwrap();
    assert_eq!(
        ctx.executor.take_ran(),
        vec!["10_c_down.js", "2_b_down.js", "1_a_down.js"]
    );
    assert!(ctx.applied().is_empty());
}

#[test]
fn test_latest_version() {
    let ctx = TestContext::new();
    let mut migrator = ctx.migrator(&["1_a_up.js", "3_c_up.js", "3_c_down.js"]);

    assert_eq!(migrator.latest_version().unwrap(), None);

    migrator.up().unwrap();
    assert_eq!(
        migrator.latest_version().unwrap(),
        Some(MigrationVersion::new("3"))
    );

    migrator.down().unwrap();
    assert_eq!(
        migrator.latest_version().unwrap(),
        Some(MigrationVersion::new("1"))
    );
}

#[test]
fn test_partial_failure_is_contained() {
    let ctx = TestContext::new();
    ctx.executor.fail_on("2_b_up.js");
    let mut migrator = ctx.migrator(&["1_a_up.js", "2_b_up.js", "3_c_up.js"]);

    let err = migrator.up().unwrap_err();
    match &err {
        MigrateError::Execution {
            version, script, ..
        } => {
            assert_eq!(version.as_str(), "2");
            assert_eq!(script, "2_b_up.js");
        }
        other => panic!("expected execution error, got {other:?}"),
    }
    assert_eq!(migrator.state(), RunState::Failed(Some(1)));
    assert_eq!(ctx.executor.take_ran(), vec!["1_a_up.js", "2_b_up.js"]);
    assert_eq!(ctx.applied(), vec!["1"]);

    // Re-running after the fix resumes where the run stopped.
    ctx.executor.clear_failures();
    migrator.up().unwrap();
    assert_eq!(ctx.executor.take_ran(), vec!["2_b_up.js", "3_c_up.js"]);
    assert_eq!(ctx.applied(), vec!["1", "2", "3"]);
}

#[test]
fn test_round_trip_restores_applied_set() {
    let ctx = TestContext::new();
    let mut migrator = ctx.migrator(&["1_a_up.js", "2_b_up.js", "2_b_down.js"]);

    ctx.store().record(&MigrationVersion::new("1")).unwrap();
    let before: BTreeSet<_> = ctx.store().list_applied().unwrap();

    migrator.up().unwrap();
    assert_eq!(ctx.applied(), vec!["1", "2"]);

    migrator.down().unwrap();
    assert_eq!(ctx.store().list_applied().unwrap(), before);
}

#[test]
fn test_malformed_record_aborts_before_running() {
    let ctx = TestContext::new();
    let tree = ctx.db.open_tree("app:migrations").unwrap();
    tree.insert(b"1", &br#"{"version": 1}"#[..]).unwrap();

    let mut migrator = ctx.migrator(&["1_a_up.js", "2_b_up.js"]);
    assert!(matches!(migrator.up(), Err(MigrateError::Decode { .. })));
    assert_eq!(migrator.state(), RunState::Failed(None));
    assert!(ctx.executor.take_ran().is_empty());
}

#[test]
fn test_directory_source_end_to_end() {
    let scripts = tempfile::tempdir().unwrap();
    for name in ["0002_b_up.js", "0001_a_up.js", "0001_a_down.js", "notes.txt"] {
        std::fs::write(scripts.path().join(name), "// script").unwrap();
    }
    std::fs::create_dir(scripts.path().join("0003_dir_up.js")).unwrap();

    let ctx = TestContext::new();
    let mut migrator = Migrator::new(
        DirectorySource::new(scripts.path()),
        ctx.store(),
        ctx.executor.clone(),
    );

    migrator.up().unwrap();
    assert_eq!(ctx.executor.take_ran(), vec!["0001_a_up.js", "0002_b_up.js"]);
    assert_eq!(ctx.applied(), vec!["0001", "0002"]);
}

/// Executor whose scripts write into the target database itself, counting
/// how often each script ran.
struct TargetExecutor {
    effects: sled::Tree,
}

impl ScriptExecutor for TargetExecutor {
    fn run(&self, script: &ScriptDescriptor) -> Result<(), ExecutionError> {
        self.effects
            .update_and_fetch(script.name.as_bytes(), |old| {
                let runs = old.map_or(0, |b| b[0]) + 1;
                Some(vec![runs])
            })
            .map_err(|e| ExecutionError::Failed(e.to_string()))?;
        Ok(())
    }
}

#[test]
fn test_records_live_in_target_shared_by_every_runner() {
    let target = sled::Config::new().temporary(true).open().unwrap();
    let effects = target.open_tree("app:effects").unwrap();
    let names = ["1_users_up.js", "2_orders_up.js"];

    // two independent runners pointed at the same target
    for _ in 0..2 {
        let mut migrator = Migrator::new(
            StaticSource::from_names(names),
            SledVersionStore::with_db(&target, "app", "migrations").unwrap(),
            TargetExecutor {
                effects: effects.clone(),
            },
        );
        migrator.up().unwrap();
    }

    for name in names {
        assert_eq!(effects.get(name).unwrap().unwrap().as_ref(), &[1u8]);
    }
    let store = SledVersionStore::with_db(&target, "app", "migrations").unwrap();
    assert_eq!(store.latest().unwrap(), Some(MigrationVersion::new("2")));
}

#[test]
fn test_from_config_requires_namespace() {
    let config = MigratorConfig::new("");

    assert!(matches!(
        Migrator::from_config(&config),
        Err(MigrateError::Configuration { .. })
    ));
}

#[test]
fn test_from_config_fails_when_target_is_unreachable() {
    let scripts = tempfile::tempdir().unwrap();
    let config = MigratorConfig::new("app")
        .with_scripts_dir(scripts.path())
        .with_connection_uri("mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=200");

    assert!(matches!(
        Migrator::from_config(&config),
        Err(MigrateError::Persistence { .. })
    ));
}

/// URI of a disposable MongoDB deployment for the ignored tests below.
fn live_target() -> String {
    std::env::var("DOCSHIFT_TEST_MONGO_URI")
        .unwrap_or_else(|_| "mongodb://127.0.0.1:27017".to_string())
}

#[test]
#[ignore = "requires a running MongoDB deployment"]
fn test_mongo_target_applies_each_version_once() {
    let uri = live_target();
    let namespace = format!("docshift_test_{}", std::process::id());
    let executor = FakeExecutor::default();

    for _ in 0..2 {
        let store = MongoVersionStore::connect(&uri, &namespace, "migrations").unwrap();
        let mut migrator = Migrator::new(
            StaticSource::from_names(["1_users_up.js", "1_users_down.js"]),
            store,
            executor.clone(),
        );
        migrator.up().unwrap();
    }
    assert_eq!(executor.take_ran(), vec!["1_users_up.js"]);

    let store = MongoVersionStore::connect(&uri, &namespace, "migrations").unwrap();
    assert_eq!(store.latest().unwrap(), Some(MigrationVersion::new("1")));

    let mut migrator = Migrator::new(
        StaticSource::from_names(["1_users_up.js", "1_users_down.js"]),
        store,
        executor.clone(),
    );
    migrator.down().unwrap();
    assert_eq!(executor.take_ran(), vec!["1_users_down.js"]);
    assert_eq!(migrator.latest_version().unwrap(), None);
}

#[cfg(unix)]
#[test]
#[ignore = "requires a running MongoDB deployment"]
fn test_from_config_reports_shell_failure() {
    let scripts = tempfile::tempdir().unwrap();
    std::fs::write(scripts.path().join("1_init_up.js"), "").unwrap();

    let config = MigratorConfig::new(format!("docshift_fail_{}", std::process::id()))
        .with_scripts_dir(scripts.path())
        .with_connection_uri(live_target())
        .with_shell("false");

    let mut migrator = Migrator::from_config(&config).unwrap();
    match migrator.up() {
        Err(MigrateError::Execution { source, .. }) => {
            assert!(matches!(source, ExecutionError::ExitStatus { .. }));
        }
        other => panic!("expected execution error, got {other:?}"),
    }
    assert_eq!(migrator.latest_version().unwrap(), None);
}
