use super::{ExecError, ExecResult, SqlExecutor};
use crate::schema::Placeholder;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedStatement {
    Execute(String),
    Batch {
        template: String,
        rows: Vec<Vec<Option<String>>>,
    },
}

impl RecordedStatement {
    pub fn sql(&self) -> &str {
        match self {
            Self::Execute(sql) => sql,
            Self::Batch { template, .. } => template,
        }
    }
}

/// Keeps every statement in memory instead of running it.
///
/// Used for dry runs and tests; statements containing one of the
/// configured patterns fail.
#[derive(Debug, Clone, Default)]
pub struct RecordingExecutor {
    placeholder: Placeholder,
    fail_patterns: Vec<String>,
    statements: Vec<RecordedStatement>,
}

impl RecordingExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_placeholder(mut self, placeholder: Placeholder) -> Self {
        self.placeholder = placeholder;
        self
    }

    /// Make statements containing `pattern` fail.
    pub fn fail_on(mut self, pattern: &str) -> Self {
        self.fail_patterns.push(pattern.to_string());
        self
    }

    pub fn statements(&self) -> &[RecordedStatement] {
        &self.statements
    }

    fn check(&self, sql: &str) -> ExecResult<()> {
        match self.fail_patterns.iter().find(|p| sql.contains(p.as_str())) {
            Some(pattern) => Err(ExecError::Statement(format!("rejected statement matching '{}'", pattern))),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl SqlExecutor for RecordingExecutor {
    fn placeholder(&self) -> Placeholder {
        self.placeholder
    }

    async fn execute(&mut self, sql: &str) -> ExecResult<()> {
        self.check(sql)?;
        self.statements.push(RecordedStatement::Execute(sql.to_string()));
        Ok(())
    }

    async fn execute_batch(&mut self, template: &str, rows: &[&[Option<String>]]) -> ExecResult<u64> {
        self.check(template)?;
        self.statements.push(RecordedStatement::Batch {
            template: template.to_string(),
            rows: rows.iter().map(|r| r.to_vec()).collect(),
        });
        Ok(rows.len() as u64)
    }
}
