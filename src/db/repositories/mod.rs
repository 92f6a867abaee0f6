pub mod facility;
pub mod report;
pub mod user;

use sea_orm::{DbErr, SqlErr};

/// Error surface for write paths where uniqueness races matter. Conflicts are
/// detected from the constraint violation itself, not only a pre-check, so a
/// losing writer still gets a clean conflict instead of a raw database error.
#[derive(Debug, thiserror::Error)]
pub enum InsertError {
    #[error("unique constraint violated")]
    Conflict,
    #[error(transparent)]
    Database(DbErr),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl InsertError {
    pub(crate) fn from_db(err: DbErr) -> Self {
        if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
            Self::Conflict
        } else {
            Self::Database(err)
        }
    }
}
