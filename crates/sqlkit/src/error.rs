//! Error types for sqlkit

use thiserror::Error;

/// Result type alias for sqlkit operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for statement construction and execution
#[derive(Debug, Error)]
pub enum OrmError {
    /// Builder misuse detected while constructing a statement
    #[error("Validation error: {0}")]
    Validation(String),

    /// A named parameter referenced in SQL has no bound value
    #[error("Missing named parameter ':{name}'")]
    MissingParam { name: String },

    /// Operation not available for the target dialect
    #[error("{operation} is not supported by the {dialect} dialect")]
    Unsupported {
        operation: String,
        dialect: &'static str,
    },

    /// Driver name that the dialect registry does not know
    #[error("Unknown database driver: {0}")]
    UnknownDriver(String),

    /// Malformed configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Query execution error reported by the backend
    #[cfg(feature = "postgres")]
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Query execution error reported by a non-Postgres backend
    #[error("Backend error: {0}")]
    Backend(String),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Query timeout error
    #[error("Query timeout after {0:?}")]
    Timeout(std::time::Duration),
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

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an unsupported-operation error for a dialect
    pub fn unsupported(operation: impl Into<String>, dialect: &'static str) -> Self {
        Self::Unsupported {
            operation: operation.into(),
            dialect,
        }
    }

    /// Create a missing named parameter error
    pub fn missing_param(name: impl Into<String>) -> Self {
        Self::MissingParam { name: name.into() }
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Check if this error was raised while building a statement
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Parse a tokio_postgres error into a more specific OrmError
    #[cfg(feature = "postgres")]
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{}: {}", constraint, message)),
                "23503" => {
                    return Self::ForeignKeyViolation(format!("{}: {}", constraint, message));
                }
                "23514" => return Self::CheckViolation(format!("{}: {}", constraint, message)),
                _ => {}
            }
        }
        Self::Query(err)
    }
}

impl From<toml::de::Error> for OrmError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config(err.to_string())
    }
}
