use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComplianceError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Db(#[from] tutordesk_db::DbError),
}

impl From<sqlx::Error> for ComplianceError {
    fn from(e: sqlx::Error) -> Self {
        ComplianceError::Db(tutordesk_db::DbError::Sqlx(e))
    }
}
