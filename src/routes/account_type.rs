use actix_web::{web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::auth::AdminGate;
use crate::error::AppError;
use crate::forms::{AccountTypeForm, FieldErrors, FormData};
use crate::response;
use crate::routes::map_service;
use crate::service::{self, ServiceError};
use crate::views;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/add_account_type")
            .route(web::get().to(add_form))
            .route(web::post().to(add)),
    )
    .service(
        web::resource("/account_type/{id}/edit")
            .route(web::get().to(edit_form))
            .route(web::post().to(edit)),
    )
    .service(
        web::resource("/account_type/{id}/delete")
            .route(web::get().to(confirm_delete))
            .route(web::post().to(delete)),
    );
}

async fn add_form(_gate: AdminGate) -> HttpResponse {
    response::html(views::account_type_form_page(
        "Add account type",
        "/add_account_type",
        &AccountTypeForm::default(),
        &FieldErrors::default(),
    ))
}

async fn add(
    db: web::Data<DatabaseConnection>,
    _gate: AdminGate,
    form: web::Form<Vec<(String, String)>>,
) -> Result<HttpResponse, AppError> {
    let form = AccountTypeForm::from_data(&FormData::from_pairs(form.into_inner()));
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(response::html(views::account_type_form_page(
                "Add account type",
                "/add_account_type",
                &form,
                &errors,
            )))
        }
    };
    match service::account_type::create(db.get_ref(), input).await {
        Ok(_) => Ok(response::see_other_with_flash(
            "/admin",
            "Account type added successfully.",
        )),
        Err(err) => Err(map_service(err, "/admin")),
    }
}

async fn edit_form(
    db: web::Data<DatabaseConnection>,
    _gate: AdminGate,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let model = service::account_type::get(db.get_ref(), *path)
        .await
        .map_err(|e| map_service(e, "/admin"))?;
    let action = format!("/account_type/{}/edit", model.id);
    Ok(response::html(views::account_type_form_page(
        "Edit account type",
        &action,
        &AccountTypeForm::from_model(&model),
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
    let action = format!("/account_type/{}/edit", id);
    let form = AccountTypeForm::from_data(&FormData::from_pairs(form.into_inner()));
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(response::html(views::account_type_form_page(
                "Edit account type",
                &action,
                &form,
                &errors,
            )))
        }
    };
    match service::account_type::update(db.get_ref(), id, input).await {
        Ok(()) => Ok(response::see_other_with_flash(
            "/admin",
            "Account type updated successfully.",
        )),
        Err(ServiceError::Invalid { field, message }) => {
            let mut errors = FieldErrors::default();
            errors.add(field, message);
            Ok(response::html(views::account_type_form_page(
                "Edit account type",
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
    let model = service::account_type::get(db.get_ref(), *path)
        .await
        .map_err(|e| map_service(e, "/admin"))?;
    let subject = format!("account type \"{}\"", model.name);
    Ok(response::html(views::confirm_delete_page(
        gate.0.role,
        "Delete account type",
        &subject,
        &format!("/account_type/{}/delete", model.id),
        "/admin",
    )))
}

async fn delete(
    db: web::Data<DatabaseConnection>,
    _gate: AdminGate,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    service::account_type::delete(db.get_ref(), *path)
        .await
        .map_err(|e| map_service(e, "/admin"))?;
    Ok(response::see_other_with_flash(
        "/admin",
        "Account type deleted successfully.",
    ))
}
