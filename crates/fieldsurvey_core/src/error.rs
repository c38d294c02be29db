//! Public failure type of the survey data-access surface.
//!
//! # Responsibility
//! - Give every caller-visible failure a typed variant.
//! - Chain transport errors (`DbError`, parse errors) through `source()`.
//!
//! # Invariants
//! - "No rows matched" is never an error; mutations report `0` instead.
//! - Icon cleanup failures are logged by the coordinator and never surface here.

use crate::db::DbError;
use crate::definition::DefinitionError;
use crate::logging::LoggingError;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by routing, query building and mutation coordination.
#[derive(Debug)]
pub enum StoreError {
    /// Path does not match any of the supported resource shapes.
    UnsupportedRoute(String),
    /// Route exists but does not accept the requested operation.
    UnsupportedOperation {
        operation: &'static str,
        target: String,
    },
    /// Aggregate segment is not one of `avg|count|max|min|total`.
    InvalidAggregate(String),
    /// Builder was executed before a table or join target was set.
    NoTableBound,
    /// Caller filter is malformed (for example arguments without clause).
    InvalidSelection(String),
    /// Projection, sort order or value key is not a plain identifier.
    InvalidIdentifier(String),
    /// Value key does not name a column of the mutated table.
    UnknownColumn {
        table: &'static str,
        column: String,
    },
    /// Required payload value is absent.
    MissingValue(&'static str),
    /// Campaign configuration or response payload could not be parsed.
    InvalidDocument(DefinitionError),
    /// Persisted row cannot be decoded into a typed model.
    InvalidData(String),
    /// Store configuration or logging bootstrap failed.
    Config(String),
    /// Storage-layer failure.
    Db(DbError),
    /// A previous holder of the store lock panicked.
    LockPoisoned,
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedRoute(path) => write!(f, "unsupported route: `{path}`"),
            Self::UnsupportedOperation { operation, target } => {
                write!(f, "{operation} is not supported for `{target}`")
            }
            Self::InvalidAggregate(name) => write!(
                f,
                "invalid aggregate `{name}`; expected avg|count|max|min|total"
            ),
            Self::NoTableBound => write!(f, "selection builder has no table bound"),
            Self::InvalidSelection(message) => write!(f, "invalid selection: {message}"),
            Self::InvalidIdentifier(value) => write!(f, "invalid identifier: `{value}`"),
            Self::UnknownColumn { table, column } => {
                write!(f, "table `{table}` has no column `{column}`")
            }
            Self::MissingValue(key) => write!(f, "missing required value `{key}`"),
            Self::InvalidDocument(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::Config(message) => write!(f, "invalid store configuration: {message}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::LockPoisoned => write!(f, "store lock poisoned by a panicked holder"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidDocument(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<DefinitionError> for StoreError {
    fn from(value: DefinitionError) -> Self {
        Self::InvalidDocument(value)
    }
}

impl From<LoggingError> for StoreError {
    fn from(value: LoggingError) -> Self {
        Self::Config(value.to_string())
    }
}

impl StoreError {
    /// Stable short code used in `error_code=` log fields.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedRoute(_) => "unsupported_route",
            Self::UnsupportedOperation { .. } => "unsupported_operation",
            Self::InvalidAggregate(_) => "invalid_aggregate",
            Self::NoTableBound => "no_table_bound",
            Self::InvalidSelection(_) => "invalid_selection",
            Self::InvalidIdentifier(_) => "invalid_identifier",
            Self::UnknownColumn { .. } => "unknown_column",
            Self::MissingValue(_) => "missing_value",
            Self::InvalidDocument(_) => "invalid_document",
            Self::InvalidData(_) => "invalid_data",
            Self::Config(_) => "config",
            Self::Db(_) => "db",
            Self::LockPoisoned => "lock_poisoned",
        }
    }
}
