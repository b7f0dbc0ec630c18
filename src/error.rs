use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use log::error;
use thiserror::Error;

use crate::response;

/// Recoverable request failures. Each variant maps to a normal HTTP
/// response: a redirect with a flash message, a redirect to the login
/// prompt, or a generic 500 for unexpected storage/render failures.
/// Form validation problems never reach this type; handlers re-render
/// the form with field errors instead.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("authentication required")]
    NeedLogin,
    #[error("{message}")]
    Forbidden {
        location: &'static str,
        message: String,
    },
    #[error("{message}")]
    NotFound {
        location: &'static str,
        message: String,
    },
    #[error("database error: {0}")]
    Database(#[from] sea_orm::DbErr),
    #[error("{0}")]
    Internal(String),
    #[error("pdf rendering failed: {0}")]
    Pdf(#[from] printpdf::Error),
}

impl AppError {
    pub fn forbidden(location: &'static str, message: impl Into<String>) -> Self {
        Self::Forbidden {
            location,
            message: message.into(),
        }
    }

    pub fn not_found(location: &'static str, message: impl Into<String>) -> Self {
        Self::NotFound {
            location,
            message: message.into(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NeedLogin | Self::Forbidden { .. } | Self::NotFound { .. } => {
                StatusCode::SEE_OTHER
            }
            Self::Database(_) | Self::Pdf(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            Self::NeedLogin => response::see_other("/login"),
            Self::Forbidden { location, message } | Self::NotFound { location, message } => {
                response::see_other_with_flash(location, message)
            }
            Self::Database(err) => {
                error!("storage failure: {}", err);
                response::internal_error()
            }
            Self::Pdf(err) => {
                error!("pdf rendering failure: {}", err);
                response::internal_error()
            }
            Self::Internal(msg) => {
                error!("internal failure: {}", msg);
                response::internal_error()
            }
        }
    }
}
