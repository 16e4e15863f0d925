use rusqlite::ffi;
use thiserror::Error;

/// Errors returned by directory operations.
#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Raised by SQLite and passed through unchanged: constraint violations,
    /// I/O, permissions, locking.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// A lookup was requested without any filter field.
    #[error("at least one filter field must be supplied")]
    EmptyFilter,
}

impl DirectoryError {
    /// True when a UNIQUE constraint rejected the statement (duplicate email or phone number).
    pub fn is_unique_violation(&self) -> bool {
        self.extended_code() == Some(ffi::SQLITE_CONSTRAINT_UNIQUE)
    }

    /// True when a FOREIGN KEY constraint rejected the statement.
    pub fn is_foreign_key_violation(&self) -> bool {
        self.extended_code() == Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY)
    }

    fn extended_code(&self) -> Option<i32> {
        match self {
            DirectoryError::Database(rusqlite::Error::SqliteFailure(err, _)) => {
                Some(err.extended_code)
            }
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, DirectoryError>;
