use actix_web::{web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::auth::AdminGate;
use crate::error::AppError;
use crate::forms::{DepartmentForm, FieldErrors, FormData};
use crate::response;
use crate::routes::map_service;
use crate::service::{self, ServiceError};
use crate::views;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/add_department")
            .route(web::get().to(add_form))
            .route(web::post().to(add)),
    )
    .service(
        web::resource("/department/{id}/edit")
            .route(web::get().to(edit_form))
            .route(web::post().to(edit)),
    )
    .service(
        web::resource("/department/{id}/delete")
            .route(web::get().to(confirm_delete))
            .route(web::post().to(delete)),
    );
}

async fn add_form(_gate: AdminGate) -> HttpResponse {
    response::html(views::department_form_page(
        "Add department",
        "/add_department",
        &DepartmentForm::default(),
        &FieldErrors::default(),
    ))
}

async fn add(
    db: web::Data<DatabaseConnection>,
    _gate: AdminGate,
    form: web::Form<Vec<(String, String)>>,
) -> Result<HttpResponse, AppError> {
    let form = DepartmentForm::from_data(&FormData::from_pairs(form.into_inner()));
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(response::html(views::department_form_page(
                "Add department",
                "/add_department",
                &form,
                &errors,
            )))
        }
    };
    match service::department::create(db.get_ref(), input).await {
        Ok(_) => Ok(response::see_other_with_flash(
            "/admin",
            "Department added successfully!",
        )),
        Err(ServiceError::Invalid { field, message }) => {
            let mut errors = FieldErrors::default();
            errors.add(field, message);
            Ok(response::html(views::department_form_page(
                "Add department",
                "/add_department",
                &form,
                &errors,
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
    let model = service::department::get(db.get_ref(), *path)
        .await
        .map_err(|e| map_service(e, "/admin"))?;
    let action = format!("/department/{}/edit", model.id);
    Ok(response::html(views::department_form_page(
        "Edit department",
        &action,
        &DepartmentForm::from_name(&model.name),
        &FieldErrors::default(),
    )))
}

async fn edit(
    db: web::Data<DatabaseConnection>,
    _gate: AdminGate,
    path: web::Path<i32>,
    form: web::Form<Vec<(String, String)>>,
) -> Result<HttpResponse, AppError> {
    let id = *path;
    let action = format!("/department/{}/edit", id);
    let form = DepartmentForm::from_data(&FormData::from_pairs(form.into_inner()));
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(response::html(views::department_form_page(
                "Edit department",
                &action,
                &form,
                &errors,
            )))
        }
    };
    match service::department::update(db.get_ref(), id, input).await {
        Ok(()) => Ok(response::see_other_with_flash(
            "/admin",
            "Department updated successfully.",
        )),
        Err(ServiceError::Invalid { field, message }) => {
            let mut errors = FieldErrors::default();
            errors.add(field, message);
            Ok(response::html(views::department_form_page(
                "Edit department",
                &action,
                &form,
                &errors,
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
    let model = service::department::get(db.get_ref(), *path)
        .await
        .map_err(|e| map_service(e, "/admin"))?;
    let subject = format!("department \"{}\"", model.name);
    Ok(response::html(views::confirm_delete_page(
        gate.0.role,
        "Delete department",
        &subject,
        &format!("/department/{}/delete", model.id),
        "/admin",
    )))
}

async fn delete(
    db: web::Data<DatabaseConnection>,
    _gate: AdminGate,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    service::department::delete(db.get_ref(), *path)
        .await
        .map_err(|e| map_service(e, "/admin"))?;
    Ok(response::see_other_with_flash(
        "/admin",
        "Department deleted successfully.",
    ))
}
