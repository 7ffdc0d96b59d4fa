use thiserror::Error;

/// Failures of the credential store, session ledger and authenticators.
///
/// Every variant except `Database` and `PasswordHash` is a caller mistake
/// and carries a message safe to show to the client.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Conflict(String),

    /// Wrong password, unknown identity and inactive identity all collapse here
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("{message}")]
    Validation { field: &'static str, message: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),
}

impl AuthError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        AuthError::Validation {
            field,
            message: message.into(),
        }
    }
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AuthError::PasswordHash(err.to_string())
    }
}

/// Name of the column a UNIQUE violation was raised on, if that is what `err` is.
///
/// SQLite reports `UNIQUE constraint failed: users.email`; only the column
/// part is returned and it never reaches the client.
pub(crate) fn unique_violation_column(err: &sqlx::Error) -> Option<String> {
    let db_err = err.as_database_error()?;
    if !db_err.is_unique_violation() {
        return None;
    }
    let message = db_err.message();
    let target = message.rsplit(':').next()?.trim();
    let column = target.rsplit('.').next()?.trim();
    Some(column.to_string())
}
