use actix_web::{web, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::json;

use crate::auth::{AdminGate, ManagerGate};
use crate::error::AppError;
use crate::forms::{FieldErrors, FormData, ProfileForm};
use crate::response;
use crate::routes::map_service;
use crate::service::{self, ServiceError};
use crate::views;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/add_profile")
            .route(web::get().to(add_form))
            .route(web::post().to(add)),
    )
    .service(
        web::resource("/profile/{id}/edit")
            .route(web::get().to(edit_form))
            .route(web::post().to(edit)),
    )
    .service(
        web::resource("/profile/{id}/delete")
            .route(web::get().to(confirm_delete))
            .route(web::post().to(delete)),
    )
    .service(web::resource("/get_account_types").route(web::get().to(account_types_lookup)));
}

#[derive(Deserialize)]
struct LookupParams {
    profile_id: Option<String>,
}

/// Answers the profile selector on the employee form. A missing or
/// unparseable `profile_id` and an unknown profile all yield an empty
/// list, never an error page.
async fn account_types_lookup(
    db: web::Data<DatabaseConnection>,
    _gate: ManagerGate,
    params: web::Query<LookupParams>,
) -> Result<HttpResponse, AppError> {
    let ids = match params
        .profile_id
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i32>().ok())
    {
        Some(id) => service::profile::account_type_ids(db.get_ref(), id)
            .await
            .map_err(|e| map_service(e, "/manager"))?,
        None => Vec::new(),
    };
    Ok(HttpResponse::Ok().json(json!({ "account_types": ids })))
}

async fn add_form(
    db: web::Data<DatabaseConnection>,
    _gate: AdminGate,
) -> Result<HttpResponse, AppError> {
    let account_types = service::account_type::list(db.get_ref())
        .await
        .map_err(|e| map_service(e, "/admin"))?;
    Ok(response::html(views::profile_form_page(
        "Add profile",
        "/add_profile",
        &ProfileForm::default(),
        &account_types,
        &FieldErrors::default(),
    )))
}

async fn add(
    db: web::Data<DatabaseConnection>,
    _gate: AdminGate,
    form: web::Form<Vec<(String, String)>>,
) -> Result<HttpResponse, AppError> {
    let form = ProfileForm::from_data(&FormData::from_pairs(form.into_inner()));
    let account_types = service::account_type::list(db.get_ref())
        .await
        .map_err(|e| map_service(e, "/admin"))?;
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(response::html(views::profile_form_page(
                "Add profile",
                "/add_profile",
                &form,
                &account_types,
                &errors,
            )))
        }
    };
    match service::profile::create(db.get_ref(), input).await {
        Ok(_) => Ok(response::see_other_with_flash(
            "/admin",
            "Profile added successfully.",
        )),
        Err(ServiceError::Invalid { field, message }) => {
            let mut errors = FieldErrors::default();
            errors.add(field, message);
            Ok(response::html(views::profile_form_page(
                "Add profile",
                "/add_profile",
                &form,
                &account_types,
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
    let record = service::profile::get_record(db.get_ref(), *path)
        .await
        .map_err(|e| map_service(e, "/admin"))?;
    let account_types = service::account_type::list(db.get_ref())
        .await
        .map_err(|e| map_service(e, "/admin"))?;
    let action = format!("/profile/{}/edit", record.id);
    Ok(response::html(views::profile_form_page(
        "Edit profile",
        &action,
        &ProfileForm::from_record(&record),
        &account_types,
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
    let action = format!("/profile/{}/edit", id);
    let form = ProfileForm::from_data(&FormData::from_pairs(form.into_inner()));
    let account_types = service::account_type::list(db.get_ref())
        .await
        .map_err(|e| map_service(e, "/admin"))?;
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => {
            return Ok(response::html(views::profile_form_page(
                "Edit profile",
                &action,
                &form,
                &account_types,
                &errors,
            )))
        }
    };
    match service::profile::update(db.get_ref(), id, input).await {
        Ok(()) => Ok(response::see_other_with_flash(
            "/admin",
            "Profile updated successfully.",
        )),
        Err(ServiceError::Invalid { field, message }) => {
            let mut errors = FieldErrors::default();
            errors.add(field, message);
            Ok(response::html(views::profile_form_page(
                "Edit profile",
                &action,
                &form,
                &account_types,
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
    let record = service::profile::get_record(db.get_ref(), *path)
        .await
        .map_err(|e| map_service(e, "/admin"))?;
    let subject = format!("profile \"{}\"", record.name);
    Ok(response::html(views::confirm_delete_page(
        gate.0.role,
        "Delete profile",
        &subject,
        &format!("/profile/{}/delete", record.id),
        "/admin",
    )))
}

async fn delete(
    db: web::Data<DatabaseConnection>,
    _gate: AdminGate,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    service::profile::delete(db.get_ref(), *path)
        .await
        .map_err(|e| map_service(e, "/admin"))?;
    Ok(response::see_other_with_flash(
        "/admin",
        "Profile deleted successfully.",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth;
    use crate::test_util;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};

    macro_rules! app {
        ($db:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new(test_util::test_config()))
                    .app_data(web::Data::new($db))
                    .configure(config),
            )
            .await
        };
    }

    #[actix_web::test]
    async fn lookup_returns_bundled_ids_as_json() {
        let db = test_util::setup_db().await;
        let user = test_util::seed_user(&db, "jane", "pw", false).await;
        test_util::seed_manager(&db, user.id).await;
        let a1 = test_util::seed_account_type(&db, "VPN").await;
        let a2 = test_util::seed_account_type(&db, "Mail").await;
        let profile_id = test_util::seed_profile(&db, "Dev", &[a1, a2]).await;
        let cookie = auth::issue_session(&test_util::test_config(), user.id).unwrap();
        let app = app!(db);

        let body: serde_json::Value = test::call_and_read_body_json(
            &app,
            test::TestRequest::get()
                .uri(&format!("/get_account_types?profile_id={profile_id}"))
                .cookie(cookie)
                .to_request(),
        )
        .await;

        let mut ids: Vec<i64> = body["account_types"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_i64().unwrap())
            .collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![a1 as i64, a2 as i64]);
    }

    #[actix_web::test]
    async fn lookup_tolerates_missing_and_garbage_params() {
        let db = test_util::setup_db().await;
        let user = test_util::seed_user(&db, "jane", "pw", false).await;
        test_util::seed_manager(&db, user.id).await;
        let cookie = auth::issue_session(&test_util::test_config(), user.id).unwrap();
        let app = app!(db);

        for uri in ["/get_account_types", "/get_account_types?profile_id=abc"] {
            let body: serde_json::Value = test::call_and_read_body_json(
                &app,
                test::TestRequest::get()
                    .uri(uri)
                    .cookie(cookie.clone())
                    .to_request(),
            )
            .await;
            assert_eq!(body["account_types"], serde_json::json!([]));
        }
    }

    #[actix_web::test]
    async fn lookup_requires_a_session() {
        let db = test_util::setup_db().await;
        let app = app!(db);
        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/get_account_types?profile_id=1")
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    }
}
