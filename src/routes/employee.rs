use actix_web::{web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::auth::ManagerGate;
use crate::error::AppError;
use crate::forms::{EmployeeForm, FieldErrors, FormData};
use crate::response;
use crate::routes::map_service;
use crate::service::{self, ServiceError};
use crate::views;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/add_employee")
            .route(web::get().to(add_form))
            .route(web::post().to(add)),
    )
    .service(
        web::resource("/employee/{id}/edit")
            .route(web::get().to(edit_form))
            .route(web::post().to(edit)),
    )
    .service(
        web::resource("/employee/{id}/delete")
            .route(web::get().to(confirm_delete))
            .route(web::post().to(delete)),
    );
}

struct FormContext {
    departments: Vec<crate::entity::department::Model>,
    account_types: Vec<crate::entity::account_type::Model>,
    profiles: Vec<service::profile::ProfileRecord>,
}

async fn load_context(db: &DatabaseConnection) -> Result<FormContext, AppError> {
    Ok(FormContext {
        departments: service::department::list(db)
            .await
            .map_err(|e| map_service(e, "/manager"))?,
        account_types: service::account_type::list(db)
            .await
            .map_err(|e| map_service(e, "/manager"))?,
        profiles: service::profile::list_records(db)
            .await
            .map_err(|e| map_service(e, "/manager"))?,
    })
}

async fn add_form(
    db: web::Data<DatabaseConnection>,
    gate: ManagerGate,
) -> Result<HttpResponse, AppError> {
    let ctx = load_context(db.get_ref()).await?;
    Ok(response::html(views::employee_form_page(
        gate.0.role,
        "Add employee",
        "/add_employee",
        &EmployeeForm::default(),
        &ctx.departments,
        &ctx.account_types,
        &ctx.profiles,
        &FieldErrors::default(),
    )))
}

async fn add(
    db: web::Data<DatabaseConnection>,
    gate: ManagerGate,
    form: web::Form<Vec<(String, String)>>,
) -> Result<HttpResponse, AppError> {
    let form = EmployeeForm::from_data(&FormData::from_pairs(form.into_inner()));
    let ctx = load_context(db.get_ref()).await?;
    let render = |form: &EmployeeForm, errors: &FieldErrors| {
        response::html(views::employee_form_page(
            gate.0.role,
            "Add employee",
            "/add_employee",
            form,
            &ctx.departments,
            &ctx.account_types,
            &ctx.profiles,
            errors,
        ))
    };
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => return Ok(render(&form, &errors)),
    };
    match service::employee::create(db.get_ref(), input).await {
        Ok(_) => Ok(response::see_other_with_flash(
            "/manager",
            "Employee added successfully.",
        )),
        Err(ServiceError::Invalid { field, message }) => {
            let mut errors = FieldErrors::default();
            errors.add(field, message);
            Ok(render(&form, &errors))
        }
        Err(err) => Err(map_service(err, "/manager")),
    }
}

async fn edit_form(
    db: web::Data<DatabaseConnection>,
    gate: ManagerGate,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let record = service::employee::get_record(db.get_ref(), *path)
        .await
        .map_err(|e| map_service(e, "/manager"))?;
    let ctx = load_context(db.get_ref()).await?;
    let action = format!("/employee/{}/edit", record.id);
    Ok(response::html(views::employee_form_page(
        gate.0.role,
        "Edit employee",
        &action,
        &EmployeeForm::from_record(&record),
        &ctx.departments,
        &ctx.account_types,
        &ctx.profiles,
        &FieldErrors::default(),
    )))
}

async fn edit(
    db: web::Data<DatabaseConnection>,
    gate: ManagerGate,
    path: web::Path<i32>,
    form: web::Form<Vec<(String, String)>>,
) -> Result<HttpResponse, AppError> {
    let id = *path;
    let action = format!("/employee/{id}/edit");
    let form = EmployeeForm::from_data(&FormData::from_pairs(form.into_inner()));
    let ctx = load_context(db.get_ref()).await?;
    let render = |form: &EmployeeForm, errors: &FieldErrors| {
        response::html(views::employee_form_page(
            gate.0.role,
            "Edit employee",
            &action,
            form,
            &ctx.departments,
            &ctx.account_types,
            &ctx.profiles,
            errors,
        ))
    };
    let input = match form.validate() {
        Ok(input) => input,
        Err(errors) => return Ok(render(&form, &errors)),
    };
    match service::employee::update(db.get_ref(), id, input).await {
        Ok(()) => Ok(response::see_other_with_flash(
            "/manager",
            "Employee updated successfully.",
        )),
        Err(ServiceError::Invalid { field, message }) => {
            let mut errors = FieldErrors::default();
            errors.add(field, message);
            Ok(render(&form, &errors))
        }
        Err(err) => Err(map_service(err, "/manager")),
    }
}

async fn confirm_delete(
    db: web::Data<DatabaseConnection>,
    gate: ManagerGate,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let record = service::employee::get_record(db.get_ref(), *path)
        .await
        .map_err(|e| map_service(e, "/manager"))?;
    let subject = format!("employee {} {}", record.first_name, record.last_name);
    Ok(response::html(views::confirm_delete_page(
        gate.0.role,
        "Delete employee",
        &subject,
        &format!("/employee/{}/delete", record.id),
        "/manager",
    )))
}

async fn delete(
    db: web::Data<DatabaseConnection>,
    _gate: ManagerGate,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    service::employee::delete(db.get_ref(), *path)
        .await
        .map_err(|e| map_service(e, "/manager"))?;
    Ok(response::see_other_with_flash(
        "/manager",
        "Employee deleted successfully.",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth;
    use crate::entity::{employee, employee_account_type};
    use crate::test_util;
    use actix_web::http::{header, StatusCode};
    use actix_web::{test, App};
    use sea_orm::{EntityTrait, PaginatorTrait};

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

    async fn manager_cookie(db: &sea_orm::DatabaseConnection) -> actix_web::cookie::Cookie<'static> {
        let u = test_util::seed_user(db, "jane", "pw", false).await;
        test_util::seed_manager(db, u.id).await;
        auth::issue_session(&test_util::test_config(), u.id).unwrap()
    }

    #[actix_web::test]
    async fn manager_creates_employee_with_account_types() {
        let db = test_util::setup_db().await;
        let cookie = manager_cookie(&db).await;
        let dept = test_util::seed_department(&db, "IT").await;
        let a1 = test_util::seed_account_type(&db, "VPN").await;
        let a2 = test_util::seed_account_type(&db, "Mail").await;
        let app = app!(db.clone());

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/add_employee")
                .cookie(cookie)
                .set_form([
                    ("first_name".to_string(), "John".to_string()),
                    ("last_name".to_string(), "Doe".to_string()),
                    ("email".to_string(), "john@corp.test".to_string()),
                    ("department".to_string(), dept.to_string()),
                    ("account_types".to_string(), a1.to_string()),
                    ("account_types".to_string(), a2.to_string()),
                    ("hire_date".to_string(), "2024-02-01".to_string()),
                ])
                .to_request(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/manager");
        let row = employee::Entity::find().one(&db).await.unwrap().unwrap();
        assert_eq!(row.email, "john@corp.test");
        assert_eq!(row.department_id, Some(dept));
        assert_eq!(
            employee_account_type::Entity::find().count(&db).await.unwrap(),
            2
        );
    }

    #[actix_web::test]
    async fn invalid_email_rerenders_form() {
        let db = test_util::setup_db().await;
        let cookie = manager_cookie(&db).await;
        let app = app!(db.clone());

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/add_employee")
                .cookie(cookie)
                .set_form([
                    ("first_name", "John"),
                    ("last_name", "Doe"),
                    ("email", "not-an-email"),
                ])
                .to_request(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(employee::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[actix_web::test]
    async fn edit_of_unknown_employee_redirects_with_flash() {
        let db = test_util::setup_db().await;
        let cookie = manager_cookie(&db).await;
        let app = app!(db);

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/employee/404/edit")
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap(), "/manager");
    }

    #[actix_web::test]
    async fn delete_removes_employee_and_links() {
        let db = test_util::setup_db().await;
        let cookie = manager_cookie(&db).await;
        let a1 = test_util::seed_account_type(&db, "VPN").await;
        let emp = test_util::seed_employee(&db, "John", "Doe", "john@corp.test", None).await;
        test_util::link_employee_account(&db, emp, a1).await;
        let app = app!(db.clone());

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri(&format!("/employee/{emp}/delete"))
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(employee::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(
            employee_account_type::Entity::find().count(&db).await.unwrap(),
            0
        );
    }
}
