pub mod account_type;
pub mod auth;
pub mod dashboard;
pub mod department;
pub mod employee;
pub mod export;
pub mod manager;
pub mod profile;

use actix_web::HttpResponse;

use crate::error::AppError;
use crate::response;
use crate::service::ServiceError;

/// Render a page, clearing the flash cookie when one was consumed.
pub(crate) fn page(flash: &Option<String>, body: String) -> HttpResponse {
    if flash.is_some() {
        response::html_clearing_flash(body)
    } else {
        response::html(body)
    }
}

/// Map non-validation service failures onto the HTTP surface. `Invalid`
/// is handled at the call site by re-rendering the form; anything that
/// slips through here is a bug, reported generically.
pub(crate) fn map_service(err: ServiceError, dashboard: &'static str) -> AppError {
    match err {
        ServiceError::Db(e) => AppError::Database(e),
        ServiceError::NotFound { entity } => {
            AppError::not_found(dashboard, format!("{} does not exist.", entity))
        }
        ServiceError::Hash(e) => AppError::Internal(format!("password hashing failed: {}", e)),
        ServiceError::Invalid { message, .. } => AppError::Internal(message),
    }
}
