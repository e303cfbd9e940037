use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database connection error: {0}")]
    ConnectionError(String),

    #[error("Query execution error: {0}")]
    QueryError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("Transaction error: {0}")]
    TransactionError(String),

    #[error("Integrity constraint violation: {0}")]
    IntegrityError(String),

    #[error("Conflicting update: {0}")]
    Conflict(String),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl DatabaseError {
    /// Classify a failed write by its PostgreSQL error code
    pub fn from_write(err: sqlx::Error, context: &str) -> Self {
        let code = err
            .as_database_error()
            .and_then(|db_error| db_error.code().map(|c| c.into_owned()));

        match code.as_deref() {
            Some("23505") => Self::Conflict(format!("{}: duplicate value", context)), // unique_violation
            Some("23503") => Self::NotFound(format!("{}: referenced row missing", context)), // foreign_key_violation
            Some("23514") | Some("23502") => Self::IntegrityError(format!("{}: {}", context, err)),
            Some("22003") => Self::InvalidData(format!("{}: value out of range", context)), // numeric_value_out_of_range
            _ => Self::QueryError(err),
        }
    }
}

pub type Result<T> = std::result::Result<T, DatabaseError>;
