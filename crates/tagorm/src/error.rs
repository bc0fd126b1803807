//! Error types for tagorm

use std::fmt;
use thiserror::Error;

/// Result type alias for tagorm operations
pub type OrmResult<T> = Result<T, OrmError>;

/// A clause that a statement kind requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Clause {
    Table,
    Select,
    Set,
    Where,
    ValuesColumn,
    Values,
}

impl Clause {
    pub fn as_str(self) -> &'static str {
        match self {
            Clause::Table => "table",
            Clause::Select => "select",
            Clause::Set => "set",
            Clause::Where => "where",
            Clause::ValuesColumn => "valuesColumn",
            Clause::Values => "values",
        }
    }
}

impl fmt::Display for Clause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error types for statement building and execution
#[derive(Debug, Error)]
pub enum OrmError {
    /// Unsupported dialect or invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A clause required by the requested statement kind is absent
    #[error("{0} not exist")]
    MissingClause(Clause),

    /// A field reference has no metadata entry in the current build
    #[error("{clause} column meta not exist")]
    UnresolvedField { clause: &'static str },

    /// A value row (or SET value) has the wrong number of items
    #[error("Arity mismatch: expected {expected} values, got {got}")]
    ArityMismatch { expected: usize, got: usize },

    /// A record type has no annotated fields
    #[error("Table '{table}' has no annotated fields")]
    NoFields { table: String },

    /// A reference cannot be reduced to a field identity
    #[error("Address error: {0}")]
    Address(String),

    /// Query execution error (passed through from the driver)
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },
}

impl OrmError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub(crate) fn unresolved(clause: &'static str) -> Self {
        Self::UnresolvedField { clause }
    }

    /// Check if this error reports the given missing clause
    pub fn is_missing_clause(&self, clause: Clause) -> bool {
        matches!(self, Self::MissingClause(c) if *c == clause)
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
