use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while tokenizing or parsing a statement.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("unterminated string literal starting at position {0}")]
    UnterminatedString(usize),

    #[error("invalid character '{0}' at position {1}")]
    InvalidCharacter(char, usize),

    #[error("expected {expected}, found {found}")]
    Unexpected { expected: String, found: String },

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),
}

/// A well-formed command that cannot run against the current state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("no database selected")]
    NoDatabaseSelected,

    #[error("database does not exist: {0}")]
    UnknownDatabase(String),

    #[error("database already exists: {0}")]
    DatabaseExists(String),

    #[error("table does not exist: {0}")]
    UnknownTable(String),

    #[error("table already exists: {0}")]
    TableExists(String),

    #[error("column not found: {0}")]
    UnknownColumn(String),

    #[error("column already exists: {0}")]
    ColumnExists(String),

    #[error("cannot use SQL keyword as column name: {0}")]
    ReservedKeyword(String),

    #[error("cannot {0} the id column")]
    IdColumnProtected(&'static str),

    #[error("value count doesn't match column count: expected {expected}, found {found}")]
    ValueCountMismatch { expected: usize, found: usize },

    #[error("value cannot contain a tab or line break: {0:?}")]
    IllegalCellValue(String),

    #[error("row with id {0} not found")]
    UnknownRow(u64),
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("Persistence error: {context}: {source}")]
    Persistence {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("Corrupt table file {}: {reason}", path.display())]
    Corrupt { path: PathBuf, reason: String },
}

impl DbError {
    pub(crate) fn persistence(context: impl Into<String>, source: io::Error) -> Self {
        DbError::Persistence {
            context: context.into(),
            source,
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;
