use rusqlite::ffi;
use rusqlite::ErrorCode;
use thiserror::Error;

use crate::repository::RepositoryError;

/// Failures opening or migrating the database.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("migration error: {0}")]
    Migration(String),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound,
            rusqlite::Error::SqliteFailure(failure, _)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                match failure.extended_code {
                    ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                        RepositoryError::Conflict
                    }
                    ffi::SQLITE_CONSTRAINT_FOREIGNKEY => RepositoryError::NotFound,
                    _ => RepositoryError::Unavailable(err.to_string()),
                }
            }
            _ => RepositoryError::Unavailable(err.to_string()),
        }
    }
}
