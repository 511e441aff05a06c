//! Core error types for Calmwave

use thiserror::Error;

/// Result type alias using `CatalogError`
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Core error type for Calmwave
///
/// Lookups return `Option` and writes return [`crate::Outcome`]; a missing row is never
/// one of these variants.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Storage unreachable (missing file, refused connection, pool closed)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Statement rejected by the storage engine
    #[error("Database error: {0}")]
    Database(String),

    /// Statement malformed before it reached the engine, or produced an impossible result
    #[error("Statement error: {0}")]
    Statement(String),

    /// Unique constraint violated
    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    /// Referenced row does not exist
    #[error("Foreign key violation: {0}")]
    ForeignKey(String),

    /// Waiting for a connection or a statement took too long
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Credential hashing or verification failed
    #[error("Credential error: {0}")]
    Credential(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be loaded or is inconsistent
    #[error("Configuration error: {0}")]
    Config(String),

    /// Schema migration failed
    #[error("Migration error: {0}")]
    Migration(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    /// Create a connection error
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Create a statement error
    pub fn statement(msg: impl Into<String>) -> Self {
        Self::Statement(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether retrying the same call later could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connection(_) | Self::Timeout(_))
    }
}

#[cfg(feature = "sqlx-support")]
impl From<sqlx::Error> for CatalogError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db) => {
                if db.is_unique_violation() {
                    Self::Duplicate(db.message().to_string())
                } else if db.is_foreign_key_violation() {
                    Self::ForeignKey(db.message().to_string())
                } else {
                    Self::Database(db.message().to_string())
                }
            }
            sqlx::Error::PoolTimedOut => Self::Timeout("waiting for a pooled connection".into()),
            sqlx::Error::PoolClosed => Self::Connection("connection pool is closed".into()),
            sqlx::Error::Io(e) => Self::Connection(e.to_string()),
            sqlx::Error::Configuration(e) => Self::Config(e.to_string()),
            sqlx::Error::Migrate(e) => Self::Migration(e.to_string()),
            other => Self::Database(other.to_string()),
        }
    }
}

#[cfg(feature = "sqlx-support")]
impl From<sqlx::migrate::MigrateError> for CatalogError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Migration(err.to_string())
    }
}
