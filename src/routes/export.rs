use actix_web::{http::header, web, HttpResponse};
use sea_orm::DatabaseConnection;

use crate::auth::ManagerGate;
use crate::error::AppError;
use crate::report;
use crate::routes::map_service;
use crate::service;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/generate_pdf").route(web::get().to(bulk)))
        .service(web::resource("/generate_pdf/{employee_id}").route(web::get().to(single)));
}

async fn bulk(
    db: web::Data<DatabaseConnection>,
    _gate: ManagerGate,
) -> Result<HttpResponse, AppError> {
    let records = service::employee::list_records(db.get_ref())
        .await
        .map_err(|e| map_service(e, "/manager"))?;
    let bytes = report::bulk_report(&records)?;
    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header((
            header::CONTENT_DISPOSITION,
            r#"attachment; filename="employees.pdf""#,
        ))
        .body(bytes))
}

async fn single(
    db: web::Data<DatabaseConnection>,
    _gate: ManagerGate,
    path: web::Path<i32>,
) -> Result<HttpResponse, AppError> {
    let record = service::employee::get_record(db.get_ref(), *path)
        .await
        .map_err(|e| map_service(e, "/manager"))?;
    let bytes = report::employee_report(&record)?;
    let disposition = format!(
        r#"attachment; filename="{}""#,
        report::employee_report_filename(&record)
    );
    Ok(HttpResponse::Ok()
        .content_type("application/pdf")
        .insert_header((header::CONTENT_DISPOSITION, disposition))
        .body(bytes))
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
    async fn bulk_export_serves_a_pdf() {
        let db = test_util::setup_db().await;
        let u = test_util::seed_user(&db, "jane", "pw", false).await;
        test_util::seed_manager(&db, u.id).await;
        test_util::seed_employee(&db, "John", "Doe", "john@corp.test", None).await;
        let cookie = auth::issue_session(&test_util::test_config(), u.id).unwrap();
        let app = app!(db);

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/generate_pdf")
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/pdf"
        );
        let body = test::read_body(resp).await;
        assert!(body.starts_with(b"%PDF"));
    }

    #[actix_web::test]
    async fn single_export_names_the_file_after_the_employee() {
        let db = test_util::setup_db().await;
        let u = test_util::seed_user(&db, "jane", "pw", false).await;
        test_util::seed_manager(&db, u.id).await;
        let emp = test_util::seed_employee(&db, "John", "Doe", "john@corp.test", None).await;
        let cookie = auth::issue_session(&test_util::test_config(), u.id).unwrap();
        let app = app!(db);

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/generate_pdf/{emp}"))
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::OK);
        let disposition = resp
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains(&format!("John_Doe_{emp}.pdf")));
    }

    #[actix_web::test]
    async fn unknown_employee_redirects_instead_of_erroring() {
        let db = test_util::setup_db().await;
        let u = test_util::seed_user(&db, "jane", "pw", false).await;
        test_util::seed_manager(&db, u.id).await;
        let cookie = auth::issue_session(&test_util::test_config(), u.id).unwrap();
        let app = app!(db);

        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/generate_pdf/404")
                .cookie(cookie)
                .to_request(),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
    }
}
