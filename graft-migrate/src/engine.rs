//! Migration engine implementation.

use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::connection::{ConnectionProvider, Database, Transaction};
use crate::diff::{ConnectFailurePolicy, DryRun, SchemaDiff, SchemaDiffCapturer};
use crate::error::{MigrateResult, MigrationError};
use crate::file::{ArtifactName, ArtifactPaths, ArtifactStore, DEFAULT_EXTENSION, validate_name};
use crate::history::{LedgerEntry, last_applied};
use crate::migration::{Direction, MigrationId, MigrationUnit};
use crate::model::Model;
use crate::pair::{MigrationSet, pair_with_extension};
use crate::template::ArtifactTemplate;

/// Configuration for the migration engine.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Path to the migrations directory. It must already exist.
    pub migrations_dir: PathBuf,
    /// Artifact file extension, without the dot.
    pub extension: String,
    /// Template used to render new artifacts.
    pub template: ArtifactTemplate,
    /// Behaviour when the database is unreachable during creation.
    pub connect_failure: ConnectFailurePolicy,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            migrations_dir: PathBuf::from("./migrations"),
            extension: DEFAULT_EXTENSION.to_string(),
            template: ArtifactTemplate::default(),
            connect_failure: ConnectFailurePolicy::Degrade,
        }
    }
}

impl MigrationConfig {
    /// Create a new configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the migrations directory.
    pub fn migrations_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.migrations_dir = dir.into();
        self
    }

    /// Set the artifact extension.
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Set the artifact template.
    pub fn template(mut self, template: ArtifactTemplate) -> Self {
        self.template = template;
        self
    }

    /// Set the connection failure policy for migration creation.
    pub fn connect_failure(mut self, policy: ConnectFailurePolicy) -> Self {
        self.connect_failure = policy;
        self
    }
}

/// Result of a successful `migrate` run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Applied ids, in application order.
    pub applied: Vec<MigrationId>,
    /// Total duration in milliseconds.
    pub duration_ms: i64,
}

impl MigrationReport {
    /// Get a summary of the result.
    pub fn summary(&self) -> String {
        format!("{} applied in {}ms", self.applied.len(), self.duration_ms)
    }
}

/// Result of a successful rollback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackReport {
    /// Rolled back id.
    pub id: MigrationId,
    /// Name of the rolled back migration.
    pub name: String,
    /// Duration in milliseconds.
    pub duration_ms: i64,
}

/// A freshly written migration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedMigration {
    /// Generated id.
    pub id: MigrationId,
    /// Migration name.
    pub name: String,
    /// Paths of the written artifacts.
    pub paths: ArtifactPaths,
    /// SQL captured from the declared models.
    pub diff: SchemaDiff,
    /// Informational notices (soft failures, empty diff).
    pub notices: Vec<String>,
}

/// Migration status information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationStatus {
    /// Ledger entries, in application order.
    pub applied: Vec<LedgerEntry>,
    /// Pending ids, ascending.
    pub pending: Vec<MigrationId>,
    /// Applied ids whose apply artifact changed since it ran.
    pub modified: Vec<MigrationId>,
    /// Applied ids with no artifact on disk.
    pub missing: Vec<MigrationId>,
}

impl MigrationStatus {
    /// Check if the database is up to date with the folder.
    pub fn is_up_to_date(&self) -> bool {
        self.pending.is_empty()
    }
}

/// The main migration engine.
pub struct MigrationEngine<P: ConnectionProvider> {
    config: MigrationConfig,
    provider: P,
    store: ArtifactStore,
}

impl<P: ConnectionProvider> MigrationEngine<P> {
    /// Create a new migration engine.
    pub fn new(config: MigrationConfig, provider: P) -> Self {
        let store = ArtifactStore::new(&config.migrations_dir)
            .with_extension(config.extension.clone())
            .with_template(config.template.clone());
        Self {
            config,
            provider,
            store,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &MigrationConfig {
        &self.config
    }

    /// Get the connection provider.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Get the artifact store.
    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Read and pair every migration unit in the folder.
    pub fn discover(&self) -> MigrateResult<MigrationSet> {
        let raw = self.store.read()?;
        let set = pair_with_extension(raw, &self.config.extension)?;
        for unit in set.incomplete() {
            debug!(id = %unit.id, name = %unit.name, "Migration is missing one half, treating it as empty");
        }
        Ok(set)
    }

    fn connect(&self) -> MigrateResult<P::Connection> {
        self.provider.connect().map_err(|e| {
            error!(error = %e, "Connection to database failed");
            match e {
                MigrationError::Connection(_) => e,
                other => MigrationError::connection(other.to_string()),
            }
        })
    }

    /// Apply every pending migration in ascending id order.
    ///
    /// Each unit runs in its own transaction. When one fails, its transaction
    /// is rolled back and the run stops; units committed earlier stay applied
    /// and are listed in the returned [`MigrationError::Execution`].
    pub fn migrate(&self) -> MigrateResult<MigrationReport> {
        let start = Instant::now();

        let mut conn = self.connect()?;
        let set = self.discover()?;
        if set.is_empty() {
            return Err(MigrationError::NoMigrations);
        }

        conn.ensure_ledger()?;
        let ledger = conn.ledger()?;
        let applied_ids: HashSet<&MigrationId> = ledger.iter().map(|e| &e.id).collect();
        let pending = set.pending(&applied_ids);
        if pending.is_empty() {
            info!(discovered = set.len(), "All migrations already applied");
            return Err(MigrationError::UpToDate);
        }

        info!(count = pending.len(), "Applying pending migrations");
        let mut committed = Vec::with_capacity(pending.len());
        for unit in pending {
            if let Err(e) = run_in_transaction(&mut conn, unit, Direction::Up) {
                error!(id = %unit.id, name = %unit.name, error = %e, "Migration failed, transaction rolled back");
                return Err(MigrationError::execution(
                    unit.id.clone(),
                    e.to_string(),
                    committed,
                ));
            }
            info!(id = %unit.id, name = %unit.name, "Applied migration");
            committed.push(unit.id.clone());
        }

        let duration_ms = start.elapsed().as_millis() as i64;
        info!(count = committed.len(), duration_ms, "Migrations successful");
        Ok(MigrationReport {
            applied: committed,
            duration_ms,
        })
    }

    /// Roll back the most recently applied migration.
    pub fn rollback_last(&self) -> MigrateResult<RollbackReport> {
        let start = Instant::now();

        let mut conn = self.connect()?;
        let set = self.discover()?;

        conn.ensure_ledger()?;
        let ledger = conn.ledger()?;
        let last = last_applied(&ledger).ok_or(MigrationError::NothingToRollback)?;
        let unit = set
            .get(&last.id)
            .ok_or_else(|| MigrationError::NotFound(last.id.clone()))?;

        if let Err(e) = run_in_transaction(&mut conn, unit, Direction::Down) {
            error!(id = %unit.id, error = %e, "Rollback failed, ledger entry kept");
            return Err(MigrationError::execution(
                unit.id.clone(),
                e.to_string(),
                Vec::new(),
            ));
        }

        let duration_ms = start.elapsed().as_millis() as i64;
        info!(id = %unit.id, name = %unit.name, duration_ms, "Rollback successful");
        Ok(RollbackReport {
            id: unit.id.clone(),
            name: unit.name.clone(),
            duration_ms,
        })
    }

    /// Compare the folder with the ledger.
    pub fn status(&self) -> MigrateResult<MigrationStatus> {
        let mut conn = self.connect()?;
        let set = self.discover()?;

        conn.ensure_ledger()?;
        let applied = conn.ledger()?;
        let applied_ids: HashSet<&MigrationId> = applied.iter().map(|e| &e.id).collect();

        let pending = set
            .pending(&applied_ids)
            .into_iter()
            .map(|u| u.id.clone())
            .collect();

        let mut modified = Vec::new();
        let mut missing = Vec::new();
        for entry in &applied {
            match set.get(&entry.id) {
                Some(unit) if unit.checksum() != entry.checksum => modified.push(entry.id.clone()),
                Some(_) => {}
                None => missing.push(entry.id.clone()),
            }
        }

        Ok(MigrationStatus {
            applied,
            pending,
            modified,
            missing,
        })
    }

    /// Generate an id newer than every id already in the folder.
    fn next_id(&self) -> MigrateResult<MigrationId> {
        let generated = MigrationId::generate();
        let newest = self
            .store
            .list()?
            .iter()
            .filter_map(|file_name| {
                ArtifactName::parse(file_name, &self.config.extension)
                    .ok()
                    .flatten()
            })
            .map(|name| name.id)
            .max();

        Ok(match newest {
            Some(newest) if newest >= generated => newest.successor().unwrap_or(generated),
            _ => generated,
        })
    }
}

impl<P> MigrationEngine<P>
where
    P: ConnectionProvider,
    P::Connection: DryRun,
{
    /// Create a new migration artifact pair.
    ///
    /// The apply body is the DDL captured from `models`; the rollback body is
    /// whatever inverse DDL the driver could derive. Capture is best-effort:
    /// an unreachable database yields empty bodies and a notice unless the
    /// configured policy says otherwise.
    pub fn create_migration(&self, name: &str, models: &[Model]) -> MigrateResult<CreatedMigration> {
        validate_name(name)?;
        self.store.ensure_exists()?;

        let capture = SchemaDiffCapturer::new(self.config.connect_failure)
            .capture(&self.provider, models)?;

        let id = self.next_id()?;
        let unit = MigrationUnit::new(
            id.clone(),
            name,
            capture.diff.up.clone(),
            capture.diff.down.clone(),
        );
        let paths = self.store.write(&unit)?;

        info!(id = %id, name, "Migration '{}' created successfully.", name);
        Ok(CreatedMigration {
            id,
            name: name.to_string(),
            paths,
            diff: capture.diff,
            notices: capture.notices,
        })
    }
}

/// Run one direction of a unit inside its own transaction and update the
/// ledger in the same transaction.
fn run_in_transaction<D: Database>(
    conn: &mut D,
    unit: &MigrationUnit,
    direction: Direction,
) -> MigrateResult<()> {
    let mut tx = conn.begin()?;

    let outcome = tx
        .execute_batch(unit.sql(direction))
        .and_then(|()| match direction {
            Direction::Up => tx.record_applied(&unit.id, &unit.checksum()),
            Direction::Down => tx.remove_applied(&unit.id),
        });

    match outcome {
        Ok(()) => tx.commit(),
        Err(e) => {
            if let Err(rollback_err) = tx.rollback() {
                warn!(id = %unit.id, error = %rollback_err, "Transaction rollback failed");
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::{NOTICE_CONNECTION_FAILED, NOTICE_NO_CHANGES, StatementSink};
    use crate::error::ErrorKind;
    use crate::model::{Field, FieldType};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;

    #[derive(Default)]
    struct FakeState {
        reachable: bool,
        ledger: Vec<LedgerEntry>,
        executed: Vec<String>,
        fail_on: Option<String>,
        transactions: usize,
        connects: usize,
    }

    #[derive(Clone)]
    struct FakeProvider(Rc<RefCell<FakeState>>);

    impl FakeProvider {
        fn new() -> Self {
            Self(Rc::new(RefCell::new(FakeState {
                reachable: true,
                ..Default::default()
            })))
        }

        fn unreachable() -> Self {
            Self(Rc::new(RefCell::new(FakeState::default())))
        }

        fn ledger_ids(&self) -> Vec<String> {
            self.0
                .borrow()
                .ledger
                .iter()
                .map(|e| e.id.to_string())
                .collect()
        }

        fn executed(&self) -> Vec<String> {
            self.0.borrow().executed.clone()
        }

        fn fail_on(&self, needle: &str) {
            self.0.borrow_mut().fail_on = Some(needle.to_string());
        }
    }

    struct FakeConn(Rc<RefCell<FakeState>>);

    enum Staged {
        Record(LedgerEntry),
        Remove(MigrationId),
    }

    struct FakeTx {
        state: Rc<RefCell<FakeState>>,
        executed: Vec<String>,
        staged: Vec<Staged>,
    }

    impl ConnectionProvider for FakeProvider {
        type Connection = FakeConn;

        fn connect(&self) -> MigrateResult<FakeConn> {
            let mut state = self.0.borrow_mut();
            state.connects += 1;
            if !state.reachable {
                return Err(MigrationError::connection("connection refused"));
            }
            Ok(FakeConn(self.0.clone()))
        }
    }

    impl Database for FakeConn {
        type Transaction<'a> = FakeTx;

        fn ensure_ledger(&mut self) -> MigrateResult<()> {
            Ok(())
        }

        fn ledger(&mut self) -> MigrateResult<Vec<LedgerEntry>> {
            Ok(self.0.borrow().ledger.clone())
        }

        fn begin(&mut self) -> MigrateResult<FakeTx> {
            self.0.borrow_mut().transactions += 1;
            Ok(FakeTx {
                state: self.0.clone(),
                executed: Vec::new(),
                staged: Vec::new(),
            })
        }
    }

    impl DryRun for FakeConn {
        fn auto_migrate(&mut self, models: &[Model], sink: &mut StatementSink) -> MigrateResult<()> {
            for model in models {
                let table = model.table_name();
                sink.record(format!("SELECT count(*) FROM sqlite_master WHERE name = '{}'", table));
                let columns: Vec<String> = model
                    .fields
                    .iter()
                    .map(|f| format!("{} TEXT", f.column_name()))
                    .collect();
                sink.record_reversible(
                    format!("CREATE TABLE {} ({})", table, columns.join(", ")),
                    format!("DROP TABLE {}", table),
                );
            }
            Ok(())
        }
    }

    impl Transaction for FakeTx {
        fn execute_batch(&mut self, sql: &str) -> MigrateResult<()> {
            let fail_on = self.state.borrow().fail_on.clone();
            if let Some(needle) = fail_on {
                if sql.contains(&needle) {
                    return Err(MigrationError::database(format!("near \"{}\": syntax error", needle)));
                }
            }
            self.executed.push(sql.to_string());
            Ok(())
        }

        fn record_applied(&mut self, id: &MigrationId, checksum: &str) -> MigrateResult<()> {
            self.staged.push(Staged::Record(LedgerEntry::new(id.clone(), checksum)));
            Ok(())
        }

        fn remove_applied(&mut self, id: &MigrationId) -> MigrateResult<()> {
            self.staged.push(Staged::Remove(id.clone()));
            Ok(())
        }

        fn commit(self) -> MigrateResult<()> {
            let mut state = self.state.borrow_mut();
            state.executed.extend(self.executed);
            for change in self.staged {
                match change {
                    Staged::Record(entry) => state.ledger.push(entry),
                    Staged::Remove(id) => state.ledger.retain(|e| e.id != id),
                }
            }
            Ok(())
        }

        fn rollback(self) -> MigrateResult<()> {
            Ok(())
        }
    }

    fn write(dir: &Path, file: &str, content: &str) {
        std::fs::write(dir.join(file), content).unwrap();
    }

    fn engine(dir: &Path, provider: &FakeProvider) -> MigrationEngine<FakeProvider> {
        MigrationEngine::new(MigrationConfig::new().migrations_dir(dir), provider.clone())
    }

    fn seed_three(dir: &Path) {
        // Written out of order on purpose.
        write(dir, "3_c_up.sql", "CREATE TABLE c (x INTEGER);");
        write(dir, "3_c_down.sql", "DROP TABLE c;");
        write(dir, "1_a_up.sql", "CREATE TABLE a (x INTEGER);");
        write(dir, "1_a_down.sql", "DROP TABLE a;");
        write(dir, "2_b_up.sql", "CREATE TABLE b (x INTEGER);");
        write(dir, "2_b_down.sql", "DROP TABLE b;");
    }

    #[test]
    fn test_config_default() {
        let config = MigrationConfig::default();
        assert_eq!(config.migrations_dir, PathBuf::from("./migrations"));
        assert_eq!(config.extension, "sql");
        assert_eq!(config.connect_failure, ConnectFailurePolicy::Degrade);
    }

    #[test]
    fn test_config_builder() {
        let config = MigrationConfig::new()
            .migrations_dir("./db/migrations")
            .extension("psql")
            .connect_failure(ConnectFailurePolicy::Fail);

        assert_eq!(config.migrations_dir, PathBuf::from("./db/migrations"));
        assert_eq!(config.extension, "psql");
        assert_eq!(config.connect_failure, ConnectFailurePolicy::Fail);
    }

    #[test]
    fn test_migrate_applies_in_ascending_order() {
        let tmp = tempfile::tempdir().unwrap();
        seed_three(tmp.path());
        let provider = FakeProvider::new();

        let report = engine(tmp.path(), &provider).migrate().unwrap();

        let applied: Vec<_> = report.applied.iter().map(|id| id.to_string()).collect();
        assert_eq!(applied, vec!["1", "2", "3"]);
        assert_eq!(
            provider.executed(),
            vec![
                "CREATE TABLE a (x INTEGER);",
                "CREATE TABLE b (x INTEGER);",
                "CREATE TABLE c (x INTEGER);",
            ]
        );
        assert_eq!(provider.ledger_ids(), vec!["1", "2", "3"]);
        assert!(report.summary().starts_with("3 applied"));
    }

    #[test]
    fn test_migrate_empty_folder_is_nothing_to_do() {
        let tmp = tempfile::tempdir().unwrap();
        let provider = FakeProvider::new();

        let err = engine(tmp.path(), &provider).migrate().unwrap_err();
        assert!(matches!(err, MigrationError::NoMigrations));
        assert_eq!(err.to_string(), "no migrations to run");
        assert!(provider.ledger_ids().is_empty());
    }

    #[test]
    fn test_migrate_rerun_executes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        seed_three(tmp.path());
        let provider = FakeProvider::new();
        let engine = engine(tmp.path(), &provider);

        engine.migrate().unwrap();
        let transactions = provider.0.borrow().transactions;

        let err = engine.migrate().unwrap_err();
        assert!(matches!(err, MigrationError::UpToDate));
        assert_eq!(err.kind(), ErrorKind::NothingToDo);
        assert_eq!(provider.0.borrow().transactions, transactions);
        assert_eq!(provider.executed().len(), 3);
    }

    #[test]
    fn test_migrate_only_runs_pending() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "1_a_up.sql", "A");
        let provider = FakeProvider::new();
        let engine = engine(tmp.path(), &provider);
        engine.migrate().unwrap();

        write(tmp.path(), "2_b_up.sql", "B");
        let report = engine.migrate().unwrap();
        assert_eq!(report.applied, vec![MigrationId::parse("2").unwrap()]);
        assert_eq!(provider.executed(), vec!["A", "B"]);
    }

    #[test]
    fn test_migrate_connection_failure() {
        let tmp = tempfile::tempdir().unwrap();
        seed_three(tmp.path());
        let provider = FakeProvider::unreachable();

        let err = engine(tmp.path(), &provider).migrate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connectivity);
        assert!(err.to_string().starts_with("connection to database failed"));
    }

    #[test]
    fn test_migrate_missing_folder() {
        let tmp = tempfile::tempdir().unwrap();
        let provider = FakeProvider::new();

        let err = engine(&tmp.path().join("missing"), &provider)
            .migrate()
            .unwrap_err();
        assert!(matches!(err, MigrationError::FolderNotFound(_)));
    }

    #[test]
    fn test_migrate_duplicate_id_rejected_before_any_transaction() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "1_a_up.sql", "A");
        write(tmp.path(), "1_b_up.sql", "B");
        let provider = FakeProvider::new();

        let err = engine(tmp.path(), &provider).migrate().unwrap_err();
        assert!(matches!(err, MigrationError::DuplicateId { .. }));
        assert_eq!(provider.0.borrow().transactions, 0);
        assert!(provider.executed().is_empty());
    }

    #[test]
    fn test_migrate_failure_keeps_earlier_units() {
        let tmp = tempfile::tempdir().unwrap();
        seed_three(tmp.path());
        let provider = FakeProvider::new();
        provider.fail_on("TABLE b");

        let err = engine(tmp.path(), &provider).migrate().unwrap_err();
        match &err {
            MigrationError::Execution { id, committed, .. } => {
                assert_eq!(id.as_str(), "2");
                assert_eq!(committed, &vec![MigrationId::parse("1").unwrap()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(provider.ledger_ids(), vec!["1"]);
        assert_eq!(provider.executed(), vec!["CREATE TABLE a (x INTEGER);"]);
    }

    #[test]
    fn test_incomplete_unit_applies_as_empty_rollback() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "1_a_up.sql", "A");
        let provider = FakeProvider::new();
        let engine = engine(tmp.path(), &provider);

        engine.migrate().unwrap();
        let report = engine.rollback_last().unwrap();
        assert_eq!(report.id.as_str(), "1");
        assert_eq!(provider.executed(), vec!["A", ""]);
        assert!(provider.ledger_ids().is_empty());
    }

    #[test]
    fn test_rollback_last_removes_newest() {
        let tmp = tempfile::tempdir().unwrap();
        seed_three(tmp.path());
        let provider = FakeProvider::new();
        let engine = engine(tmp.path(), &provider);
        engine.migrate().unwrap();

        let report = engine.rollback_last().unwrap();
        assert_eq!(report.id.as_str(), "3");
        assert_eq!(report.name, "c");
        assert_eq!(provider.ledger_ids(), vec!["1", "2"]);
        assert_eq!(provider.executed().last().unwrap(), "DROP TABLE c;");

        engine.rollback_last().unwrap();
        assert_eq!(provider.ledger_ids(), vec!["1"]);
    }

    #[test]
    fn test_rollback_empty_ledger() {
        let tmp = tempfile::tempdir().unwrap();
        seed_three(tmp.path());
        let provider = FakeProvider::new();

        let err = engine(tmp.path(), &provider).rollback_last().unwrap_err();
        assert!(matches!(err, MigrationError::NothingToRollback));
        assert_eq!(err.kind(), ErrorKind::NothingToDo);
    }

    #[test]
    fn test_rollback_missing_artifact() {
        let tmp = tempfile::tempdir().unwrap();
        seed_three(tmp.path());
        let provider = FakeProvider::new();
        let engine = engine(tmp.path(), &provider);
        engine.migrate().unwrap();

        std::fs::remove_file(tmp.path().join("3_c_up.sql")).unwrap();
        std::fs::remove_file(tmp.path().join("3_c_down.sql")).unwrap();

        let err = engine.rollback_last().unwrap_err();
        assert!(matches!(err, MigrationError::NotFound(ref id) if id.as_str() == "3"));
        assert_eq!(provider.ledger_ids(), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_rollback_failure_keeps_ledger_entry() {
        let tmp = tempfile::tempdir().unwrap();
        seed_three(tmp.path());
        let provider = FakeProvider::new();
        let engine = engine(tmp.path(), &provider);
        engine.migrate().unwrap();

        provider.fail_on("DROP TABLE c");
        let err = engine.rollback_last().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Execution);
        assert_eq!(provider.ledger_ids(), vec!["1", "2", "3"]);
    }

    #[test]
    fn test_rollback_connection_failure() {
        let tmp = tempfile::tempdir().unwrap();
        let provider = FakeProvider::unreachable();
        let err = engine(tmp.path(), &provider).rollback_last().unwrap_err();
        assert!(matches!(err, MigrationError::Connection(_)));
    }

    #[test]
    fn test_status() {
        let tmp = tempfile::tempdir().unwrap();
        seed_three(tmp.path());
        let provider = FakeProvider::new();
        let engine = engine(tmp.path(), &provider);

        let status = engine.status().unwrap();
        assert_eq!(status.pending.len(), 3);
        assert!(!status.is_up_to_date());

        engine.migrate().unwrap();
        write(tmp.path(), "2_b_up.sql", "CREATE TABLE b (x INTEGER, y TEXT);");
        std::fs::remove_file(tmp.path().join("3_c_up.sql")).unwrap();
        std::fs::remove_file(tmp.path().join("3_c_down.sql")).unwrap();

        let status = engine.status().unwrap();
        assert!(status.is_up_to_date());
        assert_eq!(status.applied.len(), 3);
        assert_eq!(status.modified, vec![MigrationId::parse("2").unwrap()]);
        assert_eq!(status.missing, vec![MigrationId::parse("3").unwrap()]);
    }

    #[test]
    fn test_create_with_no_models_writes_header_only_files() {
        let tmp = tempfile::tempdir().unwrap();
        let provider = FakeProvider::new();

        let created = engine(tmp.path(), &provider)
            .create_migration("test", &[])
            .unwrap();

        let up = std::fs::read_to_string(&created.paths.up).unwrap();
        let down = std::fs::read_to_string(&created.paths.down).unwrap();
        assert_eq!(up, "-- Write your SQL command here\n");
        assert_eq!(down, "-- Write your SQL command here\n");
        assert_eq!(created.notices, vec![NOTICE_NO_CHANGES.to_string()]);
        assert_eq!(provider.0.borrow().connects, 0);
    }

    #[test]
    fn test_create_with_models_captures_ddl() {
        let tmp = tempfile::tempdir().unwrap();
        let provider = FakeProvider::new();
        let models = vec![
            Model::new("Person")
                .field(Field::new("Name", FieldType::String))
                .field(Field::new("Age", FieldType::Int)),
        ];

        let created = engine(tmp.path(), &provider)
            .create_migration("people", &models)
            .unwrap();

        let up = std::fs::read_to_string(&created.paths.up).unwrap();
        let body: Vec<_> = up.lines().skip(1).collect();
        assert_eq!(body, vec!["CREATE TABLE persons (name TEXT, age TEXT);"]);
        let down = std::fs::read_to_string(&created.paths.down).unwrap();
        assert!(down.ends_with("DROP TABLE persons;\n"));
        assert!(created.notices.is_empty());
    }

    #[test]
    fn test_create_degrades_when_unreachable() {
        let tmp = tempfile::tempdir().unwrap();
        let provider = FakeProvider::unreachable();
        let models = vec![Model::new("User").field(Field::new("id", FieldType::Int))];

        let created = engine(tmp.path(), &provider)
            .create_migration("users", &models)
            .unwrap();
        assert!(created.diff.is_empty());
        assert_eq!(created.notices, vec![NOTICE_CONNECTION_FAILED.to_string()]);
        assert!(created.paths.up.exists());
        assert!(created.paths.down.exists());
    }

    #[test]
    fn test_create_fails_when_unreachable_and_strict() {
        let tmp = tempfile::tempdir().unwrap();
        let provider = FakeProvider::unreachable();
        let models = vec![Model::new("User").field(Field::new("id", FieldType::Int))];
        let engine = MigrationEngine::new(
            MigrationConfig::new()
                .migrations_dir(tmp.path())
                .connect_failure(ConnectFailurePolicy::Fail),
            provider,
        );

        let err = engine.create_migration("users", &models).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Connectivity);
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_create_in_missing_folder_writes_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("missing");
        let provider = FakeProvider::new();

        let err = engine(&missing, &provider)
            .create_migration("test", &[])
            .unwrap_err();
        assert!(err.to_string().contains(&missing.display().to_string()));
        assert!(!missing.exists());
    }

    #[test]
    fn test_create_rejects_bad_name() {
        let tmp = tempfile::tempdir().unwrap();
        let provider = FakeProvider::new();
        let err = engine(tmp.path(), &provider)
            .create_migration("../escape", &[])
            .unwrap_err();
        assert!(matches!(err, MigrationError::InvalidName(_)));
    }

    #[test]
    fn test_create_twice_gets_increasing_ids() {
        let tmp = tempfile::tempdir().unwrap();
        let provider = FakeProvider::new();
        let engine = engine(tmp.path(), &provider);

        let first = engine.create_migration("first", &[]).unwrap();
        let second = engine.create_migration("second", &[]).unwrap();
        assert!(second.id > first.id);
        assert_eq!(engine.discover().unwrap().len(), 2);
    }

    #[test]
    fn test_create_id_follows_newest_without_reading_contents() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "99999999999999_future_up.sql", "A");
        std::fs::write(tmp.path().join("99999999999998_old_up.sql"), [0xff, 0xfe]).unwrap();
        let provider = FakeProvider::new();

        let created = engine(tmp.path(), &provider)
            .create_migration("next", &[])
            .unwrap();
        assert_eq!(created.id.as_str(), "100000000000000");
    }

    #[test]
    fn test_non_utf8_up_file_is_never_recorded() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("1_a_up.sql"), b"-- caf\xe9\nCREATE TABLE a (x INTEGER);\n")
            .unwrap();
        write(tmp.path(), "1_a_down.sql", "DROP TABLE a;");
        let provider = FakeProvider::new();

        let err = engine(tmp.path(), &provider).migrate().unwrap_err();
        assert!(matches!(err, MigrationError::InvalidArtifact { .. }));
        assert_eq!(provider.0.borrow().transactions, 0);
        assert!(provider.ledger_ids().is_empty());
    }

    #[test]
    fn test_custom_template_is_applied() {
        let tmp = tempfile::tempdir().unwrap();
        let provider = FakeProvider::new();
        let engine = MigrationEngine::new(
            MigrationConfig::new()
                .migrations_dir(tmp.path())
                .template(ArtifactTemplate::new("-- {{ name }} {{ direction }}\n{{ sql }}").unwrap()),
            provider,
        );

        let created = engine.create_migration("users", &[]).unwrap();
        assert_eq!(std::fs::read_to_string(&created.paths.up).unwrap(), "-- users up\n");
        assert_eq!(std::fs::read_to_string(&created.paths.down).unwrap(), "-- users down\n");
    }

    #[test]
    fn test_created_migration_runs() {
        let tmp = tempfile::tempdir().unwrap();
        let provider = FakeProvider::new();
        let engine = engine(tmp.path(), &provider);
        engine.create_migration("empty", &[]).unwrap();

        let report = engine.migrate().unwrap();
        assert_eq!(report.applied.len(), 1);
        assert_eq!(provider.executed(), vec!["-- Write your SQL command here\n"]);
    }
}
