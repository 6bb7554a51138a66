use thiserror::Error;

/// Errors surfaced by the store and its backends.
///
/// `NotFound` is reserved for direct reads/writes against a missing id; the
/// advisory deletion-constraint check reports absence as data instead
/// (see `office::retention`). The HTTP boundary maps `NotFound` to 404,
/// `ConstraintViolation` to 409, and `Validation` to 400.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("database connection failed: {0}")]
    Connection(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// True when the error maps to a missing row rather than a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<libsql::Error> for StoreError {
    fn from(err: libsql::Error) -> Self {
        Self::Query(err.to_string())
    }
}

/// Errors raised while resolving settings from file and environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("failed to read config file {path}: {message}")]
    File { path: String, message: String },
}
