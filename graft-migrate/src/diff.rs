//! Schema diff capture.
//!
//! The driver's dry-run mode reports every statement it would run to bring the
//! database in line with a set of declared models. Those statements are
//! collected in a [`StatementSink`], introspection reads are dropped, and what
//! remains becomes the body of a new migration.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::connection::ConnectionProvider;
use crate::error::{MigrateResult, MigrationError};
use crate::model::Model;

/// Notice emitted when the database cannot be reached during capture.
pub const NOTICE_CONNECTION_FAILED: &str = "Database connection failed skipping auto migration";

/// Notice emitted when the capture produced no DDL.
pub const NOTICE_NO_CHANGES: &str = "No auto changes found.";

/// A statement reported by a dry run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Statement text.
    pub sql: String,
    /// Statement undoing this one, when the driver can derive it.
    pub inverse: Option<String>,
}

/// In-process collector for dry-run output.
#[derive(Debug, Clone, Default)]
pub struct StatementSink {
    statements: Vec<Statement>,
}

impl StatementSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a statement without an inverse (reads, irreversible changes).
    pub fn record(&mut self, sql: impl Into<String>) {
        self.statements.push(Statement {
            sql: sql.into(),
            inverse: None,
        });
    }

    /// Record a statement together with the statement that undoes it.
    pub fn record_reversible(&mut self, sql: impl Into<String>, inverse: impl Into<String>) {
        self.statements.push(Statement {
            sql: sql.into(),
            inverse: Some(inverse.into()),
        });
    }

    /// Everything recorded so far, in order.
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    /// Drop introspection reads and render the remaining DDL.
    pub fn into_diff(self) -> SchemaDiff {
        let ddl: Vec<Statement> = self
            .statements
            .into_iter()
            .filter(|s| !is_introspection(&s.sql))
            .collect();

        let up = render(ddl.iter().map(|s| s.sql.as_str()));
        let down = render(
            ddl.iter()
                .rev()
                .filter_map(|s| s.inverse.as_deref())
                .filter(|sql| !is_introspection(sql)),
        );

        SchemaDiff { up, down }
    }
}

/// Driver capability: report what auto-migrating `models` would execute,
/// without committing anything.
pub trait DryRun {
    /// Emit every statement, introspection included, into `sink`.
    fn auto_migrate(&mut self, models: &[Model], sink: &mut StatementSink) -> MigrateResult<()>;
}

/// Whether a statement is an introspection read rather than DDL.
pub fn is_introspection(sql: &str) -> bool {
    sql.trim_start()
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("SELECT"))
}

fn render<'a>(statements: impl Iterator<Item = &'a str>) -> String {
    let mut out = String::new();
    for sql in statements {
        let sql = sql.trim();
        if sql.is_empty() {
            continue;
        }
        out.push_str(sql);
        if !sql.ends_with(';') {
            out.push(';');
        }
        out.push('\n');
    }
    out
}

/// SQL captured for a new migration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDiff {
    /// Forward DDL, one statement per line.
    pub up: String,
    /// Inverse DDL in reverse order, one statement per line.
    pub down: String,
}

impl SchemaDiff {
    /// Check if nothing was captured.
    pub fn is_empty(&self) -> bool {
        self.up.is_empty() && self.down.is_empty()
    }

    /// Number of forward statements.
    pub fn statement_count(&self) -> usize {
        self.up.lines().count()
    }
}

/// What to do when the database is unreachable while creating a migration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectFailurePolicy {
    /// Continue with an empty diff and emit a notice.
    #[default]
    Degrade,
    /// Fail the creation with a connection error.
    Fail,
}

/// Result of a capture: the diff plus notices for the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capture {
    /// Captured SQL.
    pub diff: SchemaDiff,
    /// Informational notices (soft failures, empty diff).
    pub notices: Vec<String>,
}

impl Capture {
    fn notice(notice: impl Into<String>) -> Self {
        Self {
            diff: SchemaDiff::default(),
            notices: vec![notice.into()],
        }
    }
}

/// Derives migration SQL from declared models via a driver dry run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaDiffCapturer {
    policy: ConnectFailurePolicy,
}

impl SchemaDiffCapturer {
    /// Create a capturer.
    pub fn new(policy: ConnectFailurePolicy) -> Self {
        Self { policy }
    }

    /// Capture the DDL needed to bring the database in line with `models`.
    ///
    /// An empty model list captures nothing and does not connect. A
    /// connection failure yields an empty diff and a notice unless the policy
    /// is [`ConnectFailurePolicy::Fail`]. A failing dry run is reported as a
    /// notice and its partial output is discarded.
    pub fn capture<P>(&self, provider: &P, models: &[Model]) -> MigrateResult<Capture>
    where
        P: ConnectionProvider,
        P::Connection: DryRun,
    {
        if models.is_empty() {
            debug!("No models declared, skipping auto migration");
            return Ok(Capture::notice(NOTICE_NO_CHANGES));
        }

        let mut conn = match provider.connect() {
            Ok(conn) => conn,
            Err(e) => {
                if self.policy == ConnectFailurePolicy::Fail {
                    return Err(match e {
                        MigrationError::Connection(_) => e,
                        other => MigrationError::connection(other.to_string()),
                    });
                }
                info!(error = %e, "{}", NOTICE_CONNECTION_FAILED);
                return Ok(Capture::notice(NOTICE_CONNECTION_FAILED));
            }
        };

        let mut sink = StatementSink::new();
        if let Err(e) = conn.auto_migrate(models, &mut sink) {
            warn!(error = %e, "Auto migration dry run failed");
            return Ok(Capture::notice(format!("Auto migration dry run failed: {}", e)));
        }

        let recorded = sink.statements().len();
        let diff = sink.into_diff();
        debug!(recorded, kept = diff.statement_count(), "Captured dry run output");

        if diff.up.is_empty() {
            info!("{}", NOTICE_NO_CHANGES);
            return Ok(Capture {
                diff,
                notices: vec![NOTICE_NO_CHANGES.to_string()],
            });
        }

        Ok(Capture {
            diff,
            notices: Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{Database, Transaction};
    use crate::history::LedgerEntry;
    use crate::migration::MigrationId;
    use crate::model::{Field, FieldType};
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    struct NoTx;

    impl Transaction for NoTx {
        fn execute_batch(&mut self, _sql: &str) -> MigrateResult<()> {
            Ok(())
        }
        fn record_applied(&mut self, _id: &MigrationId, _checksum: &str) -> MigrateResult<()> {
            Ok(())
        }
        fn remove_applied(&mut self, _id: &MigrationId) -> MigrateResult<()> {
            Ok(())
        }
        fn commit(self) -> MigrateResult<()> {
            Ok(())
        }
        fn rollback(self) -> MigrateResult<()> {
            Ok(())
        }
    }

    struct ScriptedConn {
        fail: bool,
    }

    impl Database for ScriptedConn {
        type Transaction<'a> = NoTx;

        fn ensure_ledger(&mut self) -> MigrateResult<()> {
            Ok(())
        }
        fn ledger(&mut self) -> MigrateResult<Vec<LedgerEntry>> {
            Ok(Vec::new())
        }
        fn begin(&mut self) -> MigrateResult<NoTx> {
            Ok(NoTx)
        }
    }

    impl DryRun for ScriptedConn {
        fn auto_migrate(&mut self, models: &[Model], sink: &mut StatementSink) -> MigrateResult<()> {
            for model in models {
                let table = model.table_name();
                sink.record(format!(
                    "SELECT count(*) FROM sqlite_master WHERE name = '{}'",
                    table
                ));
                sink.record_reversible(
                    format!("CREATE TABLE {} (x INTEGER)", table),
                    format!("DROP TABLE {}", table),
                );
            }
            if self.fail {
                return Err(MigrationError::database("boom"));
            }
            Ok(())
        }
    }

    struct Provider {
        reachable: bool,
        fail_dry_run: bool,
        connects: Cell<usize>,
    }

    impl Provider {
        fn new(reachable: bool) -> Self {
            Self {
                reachable,
                fail_dry_run: false,
                connects: Cell::new(0),
            }
        }
    }

    impl ConnectionProvider for Provider {
        type Connection = ScriptedConn;

        fn connect(&self) -> MigrateResult<ScriptedConn> {
            self.connects.set(self.connects.get() + 1);
            if self.reachable {
                Ok(ScriptedConn {
                    fail: self.fail_dry_run,
                })
            } else {
                Err(MigrationError::connection("refused"))
            }
        }
    }

    fn models() -> Vec<Model> {
        vec![
            Model::new("User").field(Field::new("id", FieldType::Int).primary_key()),
            Model::new("Post").field(Field::new("id", FieldType::Int).primary_key()),
        ]
    }

    #[test]
    fn test_is_introspection() {
        assert!(is_introspection("SELECT 1"));
        assert!(is_introspection("   select name from sqlite_master"));
        assert!(is_introspection("\n\tSeLeCt *"));
        assert!(!is_introspection("CREATE TABLE t (x INT)"));
        assert!(!is_introspection("SEL"));
        assert!(!is_introspection(""));
    }

    #[test]
    fn test_sink_filters_and_reverses() {
        let mut sink = StatementSink::new();
        sink.record("SELECT * FROM sqlite_master");
        sink.record_reversible("CREATE TABLE a (x INTEGER)", "DROP TABLE a");
        sink.record("  select 1;");
        sink.record_reversible("CREATE TABLE b (x INTEGER);", "DROP TABLE b;");
        sink.record("CREATE INDEX i ON a (x)");

        let diff = sink.into_diff();
        assert_eq!(
            diff.up,
            "CREATE TABLE a (x INTEGER);\nCREATE TABLE b (x INTEGER);\nCREATE INDEX i ON a (x);\n"
        );
        assert_eq!(diff.down, "DROP TABLE b;\nDROP TABLE a;\n");
        assert_eq!(diff.statement_count(), 3);
    }

    #[test]
    fn test_capture_with_models() {
        let provider = Provider::new(true);
        let capture = SchemaDiffCapturer::default()
            .capture(&provider, &models())
            .unwrap();

        assert_eq!(
            capture.diff.up,
            "CREATE TABLE users (x INTEGER);\nCREATE TABLE posts (x INTEGER);\n"
        );
        assert_eq!(capture.diff.down, "DROP TABLE posts;\nDROP TABLE users;\n");
        assert!(capture.notices.is_empty());
    }

    #[test]
    fn test_capture_without_models_does_not_connect() {
        let provider = Provider::new(true);
        let capture = SchemaDiffCapturer::default().capture(&provider, &[]).unwrap();
        assert!(capture.diff.is_empty());
        assert_eq!(capture.notices, vec![NOTICE_NO_CHANGES.to_string()]);
        assert_eq!(provider.connects.get(), 0);
    }

    #[test]
    fn test_capture_degrades_on_connection_failure() {
        let provider = Provider::new(false);
        let capture = SchemaDiffCapturer::new(ConnectFailurePolicy::Degrade)
            .capture(&provider, &models())
            .unwrap();
        assert!(capture.diff.is_empty());
        assert_eq!(capture.notices, vec![NOTICE_CONNECTION_FAILED.to_string()]);
    }

    #[test]
    fn test_capture_fails_on_connection_failure_when_strict() {
        let provider = Provider::new(false);
        let err = SchemaDiffCapturer::new(ConnectFailurePolicy::Fail)
            .capture(&provider, &models())
            .unwrap_err();
        assert!(matches!(err, MigrationError::Connection(_)));
    }

    #[test]
    fn test_capture_discards_failed_dry_run() {
        let mut provider = Provider::new(true);
        provider.fail_dry_run = true;
        let capture = SchemaDiffCapturer::default()
            .capture(&provider, &models())
            .unwrap();
        assert!(capture.diff.is_empty());
        assert!(capture.notices[0].contains("boom"));
    }
}
