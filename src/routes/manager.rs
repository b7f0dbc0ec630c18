use actix_web::{web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::auth::AdminGate;
use crate::error::AppError;
use crate::forms::{FieldErrors, FormData, ManagerForm};
use crate::response;
use crate::routes::map_service;
use crate::service::{self, ServiceError};
use crate::views;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/add_manager")
            .route(web::get().to(add_form))
            .route(web::post().to(add)),
    )
    .service(
        web::resource("/edit_manager/{id}")
            .route(web::get().to(edit_form))
            .route(web::post().to(edit)),
    )
    .service(
        web::resource("/delete_manager/{id}")
            .route(web::get().to(confirm_delete))
            .route(web::post().to(delete)),
    );
}

async fn add_form(_gate: AdminGate) -> HttpResponse {
    response::html(views::manager_form_page(
        "Add manager",
        "/add_manager",
        &ManagerForm::default(),
        &FieldErrors::default(),
        false,
    ))
}

async fn add(
    db: web::Data<DatabaseConnection>,
    _gate: AdminGate,
    form: web::Form<Vec<(String, String)>>,
) -> Result<HttpResponse, AppError> {
    let form = ManagerForm::from_data(&FormData::from_pairs(form.into_inner()));
    let input = match form.validate(true) {
        Ok(input) => input,
        Err(errors) => {
            return Ok(response::html(views::manager_form_page(
                "Add manager",
                "/add_manager",
                &form,
                &errors,
                false,
            )))
        }
    };
    match service::manager::create(db.get_ref(), input).await {
        Ok(_) => Ok(response::see_other_with_flash(
            "/admin",
            "Manager added successfully.",
        )),
        Err(ServiceError::Invalid { field, message }) => {
            let mut errors = FieldErrors::default();
            errors.add(field, message);
            Ok(response::html(views::manager_form_page(
                "Add manager",
                "/add_manager",
                &form,
                &errors,
                false,
            )))
        }
        Err(err) => Err(map_service(err, "/admin")),
    }
}

async fn edit_form(
    db: web::Data<DatabaseConnection>,
    _gate: AdminGate,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let record = service::manager::get_record(db.get_ref(), *path)
        .await
        .map_err(|e| map_service(e, "/admin"))?;
    let action = format!("/edit_manager/{}", record.id);
    Ok(response::html(views::manager_form_page(
        "Edit manager",
        &action,
        &ManagerForm::from_record(&record),
        &FieldErrors::default(),
        true,
    )))
}

async fn edit(
    db: web::Data<DatabaseConnection>,
    _gate: AdminGate,
    path: web::Path<i32>,
    form: web::Form<Vec<(String, String)>>,
) -> Result<HttpResponse, AppError> {
    let id = *path;
    let action = format!("/edit_manager/{id}");
    let form = ManagerForm::from_data(&FormData::from_pairs(form.into_inner()));
    let input = match form.validate(false) {
        Ok(input) => input,
        Err(errors) => {
            return Ok(response::html(views::manager_form_page(
                "Edit manager",
                &action,
                &form,
                &errors,
                true,
            )))
        }
    };
    match service::manager::update(db.get_ref(), id, input).await {
        Ok(()) => Ok(response::see_other_with_flash(
            "/admin",
            "Manager updated successfully.",
        )),
        Err(ServiceError::Invalid { field, message }) => {
            let mut errors = FieldErrors::default();
            errors.add(field, message);
            Ok(response::html(views::manager_form_page(
                "Edit manager",
                &action,
                &form,
                &errors,
                true,
            )))
        }
        Err(err) => Err(map_service(err, "/admin")),
    }
}

async fn confirm_delete(
    db: web::Data<DatabaseConnection>,
    gate: AdminGate,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let record = service::manager::get_record(db.get_ref(), *path)
        .await
        .map_err(|e| map_service(e, "/admin"))?;
    let subject = format!(
        "manager {} {} ({})",
        record.first_name, record.last_name, record.username
    );
    Ok(response::html(views::confirm_delete_page(
        gate.0.role,
        "Delete manager",
        &subject,
        &format!("/delete_manager/{}", record.id),
        "/admin",
    )))
}

async fn delete(
    db: web::Data<DatabaseConnection>,
    _gate: AdminGate,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    service::manager::delete(db.get_ref(), *path)
        .await
        .map_err(|e| map_service(e, "/admin"))?;
    Ok(response::see_other_with_flash(
        "/admin",
        "Manager deleted successfully.",
    ))
}
