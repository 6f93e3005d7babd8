//! Running a converted `Database` against a SQL backend.
//!
//! The converter never talks to a database. Callers hand the result to
//! [`execute_database`] together with a [`SqlExecutor`], which issues schema
//! statements, then every `CREATE TABLE` (parents before children), then one
//! batched insert per table. A failing statement is reported and skipped; the
//! remaining statements still run.

mod postgres;
mod recording;

pub use postgres::PostgresExecutor;
pub use recording::{RecordedStatement, RecordingExecutor};

use crate::schema::{Database, Placeholder};
use async_trait::async_trait;
use thiserror::Error;
use tracing::{Instrument, Level, event, info_span};

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Statement failed: {0}")]
    Statement(String),
}

pub type ExecResult<T> = Result<T, ExecError>;

/// A backend that can run DDL and batched parameterized inserts.
///
/// All values arrive as optional strings; the backend owns type coercion.
#[async_trait]
pub trait SqlExecutor: Send {
    /// Placeholder syntax this backend expects in insert templates.
    fn placeholder(&self) -> Placeholder {
        Placeholder::Question
    }

    /// Run a statement that returns no rows.
    async fn execute(&mut self, sql: &str) -> ExecResult<()>;

    /// Run `template` once per row; returns the number of inserted rows.
    async fn execute_batch(&mut self, template: &str, rows: &[&[Option<String>]]) -> ExecResult<u64>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOptions {
    /// `DROP SCHEMA IF EXISTS <schema> CASCADE` first
    pub drop_schema: bool,
    /// `CREATE SCHEMA IF NOT EXISTS <schema>` before the tables
    pub create_schema: bool,
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            drop_schema: false,
            create_schema: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Schema,
    CreateTable,
    Insert,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementOutcome {
    pub kind: StatementKind,
    pub sql: String,
    pub rows: u64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub statements: Vec<StatementOutcome>,
}

impl ExecutionReport {
    pub fn rows_inserted(&self) -> u64 {
        self.statements.iter().map(|s| s.rows).sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = &StatementOutcome> {
        self.statements.iter().filter(|s| s.error.is_some())
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    fn record(&mut self, kind: StatementKind, sql: String, result: ExecResult<u64>) {
        let (rows, error) = match result {
            Ok(rows) => (rows, None),
            Err(err) => {
                event!(Level::ERROR, error = %err, sql = %sql, "statement failed");
                (0, Some(err.to_string()))
            }
        };
        self.statements.push(StatementOutcome {
            kind,
            sql,
            rows,
            error,
        });
    }
}

/// Issue all DDL, then all inserts, of `db` through `executor`.
pub async fn execute_database<E>(db: &Database, executor: &mut E, options: &ExecutionOptions) -> ExecutionReport
where
    E: SqlExecutor + ?Sized,
{
    let mut report = ExecutionReport::default();
    let span = info_span!("jsonrel.execute", schema = %db.schema(), tables = db.tables().len());

    async {
        if options.drop_schema {
            let sql = format!("DROP SCHEMA IF EXISTS {} CASCADE", db.schema());
            let result = executor.execute(&sql).await.map(|_| 0);
            report.record(StatementKind::Schema, sql, result);
        }
        if options.create_schema {
            let sql = format!("CREATE SCHEMA IF NOT EXISTS {}", db.schema());
            let result = executor.execute(&sql).await.map(|_| 0);
            report.record(StatementKind::Schema, sql, result);
        }

        for sql in db.create_table_queries() {
            event!(Level::DEBUG, sql = %sql, "create table");
            let result = executor.execute(&sql).await.map(|_| 0);
            report.record(StatementKind::CreateTable, sql, result);
        }

        let placeholder = executor.placeholder();
        for batch in db.insert_batches() {
            let template = batch.template(placeholder);
            event!(Level::DEBUG, table = %batch.table.qualified_name(), rows = batch.rows.len(), "insert batch");
            let result = executor.execute_batch(&template, &batch.rows).await;
            report.record(StatementKind::Insert, template, result);
        }

        event!(
            Level::INFO,
            rows = report.rows_inserted(),
            failures = report.failures().count(),
            "execution finished"
        );
    }
    .instrument(span)
    .await;

    report
}
