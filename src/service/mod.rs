pub mod account_type;
pub mod department;
pub mod employee;
pub mod manager;
pub mod profile;

use sea_orm::DbErr;
use thiserror::Error;

/// Failures surfaced by the record services. `Invalid` carries the form
/// field it belongs to so handlers can re-render with the message in
/// place; `NotFound` becomes a dashboard redirect.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("database error: {0}")]
    Db(#[from] DbErr),
    #[error("{entity} does not exist")]
    NotFound { entity: &'static str },
    #[error("{message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

impl ServiceError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}
