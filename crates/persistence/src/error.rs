use thiserror::Error;

use crate::publisher::SubscriberError;
use crate::unique_index::{self, UniqueViolation};

/// Structured view of an error reported by the underlying database.
///
/// Both stores produce this shape so that error interpretation does not
/// depend on which backend raised it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseError {
    /// Vendor error code (SQLSTATE for PostgreSQL, error number for SQL Server).
    pub code: Option<String>,
    pub constraint: Option<String>,
    pub table: Option<String>,
    pub message: String,
    pub detail: Option<String>,
}

impl std::fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "[{code}] {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for DatabaseError {}

impl From<&(dyn sqlx::error::DatabaseError + 'static)> for DatabaseError {
    fn from(err: &(dyn sqlx::error::DatabaseError + 'static)) -> Self {
        let detail = err
            .try_downcast_ref::<sqlx::postgres::PgDatabaseError>()
            .and_then(|pg| pg.detail())
            .map(str::to_string);

        Self {
            code: err.code().map(|code| code.into_owned()),
            constraint: err.constraint().map(str::to_string),
            table: err.table().map(str::to_string),
            message: err.message().to_string(),
            detail,
        }
    }
}

/// Errors that can occur when storing entities or publishing their events.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// A write collided with a unique index.
    #[error("{message}")]
    UniqueViolation {
        table: Option<String>,
        field: String,
        value: String,
        message: String,
    },

    /// The database rejected an operation for another reason.
    #[error("Database error: {0}")]
    Database(DatabaseError),

    /// The driver failed before the database answered (pool, I/O, decoding).
    #[error("Driver error: {0}")]
    Driver(#[source] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored column holds a value the domain does not accept.
    #[error("Invalid stored value for {column}: {value}")]
    InvalidStoredValue { column: &'static str, value: String },

    /// A subscriber failed while domain events were being published.
    ///
    /// The entities are already stored and `delivered` events reached
    /// their subscribers; the queues are left intact so a retry publishes again.
    #[error("Publishing {event_type} failed after {delivered} event(s) were delivered: {source}")]
    Publish {
        event_type: &'static str,
        delivered: usize,
        #[source]
        source: SubscriberError,
    },
}

impl PersistenceError {
    /// Returns the unique-index violation, if this error is one.
    pub fn as_unique_violation(&self) -> Option<UniqueViolation> {
        match self {
            PersistenceError::UniqueViolation {
                table,
                field,
                value,
                ..
            } => Some(UniqueViolation {
                table: table.clone(),
                field: field.clone(),
                value: value.clone(),
            }),
            _ => None,
        }
    }
}

impl From<DatabaseError> for PersistenceError {
    fn from(err: DatabaseError) -> Self {
        match unique_index::interpret(&err) {
            Some(violation) => {
                tracing::debug!(
                    field = %violation.field,
                    table = ?violation.table,
                    "database reported a unique index violation"
                );
                PersistenceError::UniqueViolation {
                    message: violation.message(),
                    table: violation.table,
                    field: violation.field,
                    value: violation.value,
                }
            }
            None => PersistenceError::Database(err),
        }
    }
}

impl From<sqlx::Error> for PersistenceError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => DatabaseError::from(&*db_err).into(),
            other => PersistenceError::Driver(other),
        }
    }
}

/// Result type for persistence operations.
pub type Result<T> = std::result::Result<T, PersistenceError>;
