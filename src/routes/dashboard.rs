use actix_web::{web, HttpRequest, HttpResponse};
use sea_orm::DatabaseConnection;
use serde::Deserialize;

use crate::auth::{AdminGate, ManagerGate};
use crate::error::AppError;
use crate::response;
use crate::routes::{map_service, page};
use crate::search;
use crate::service;
use crate::views;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/manager").route(web::get().to(manager_dashboard)))
        .service(web::resource("/admin").route(web::get().to(admin_dashboard)));
}

#[derive(Deserialize)]
struct SearchParams {
    q: Option<String>,
}

async fn manager_dashboard(
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    gate: ManagerGate,
    params: web::Query<SearchParams>,
) -> Result<HttpResponse, AppError> {
    let query = params.q.clone().unwrap_or_default();
    let records = service::employee::list_records(db.get_ref())
        .await
        .map_err(|e| map_service(e, "/manager"))?;
    let records = search::filter_employees(records, &query);
    let flash = response::take_flash(&req);
    let body = views::manager_dashboard(gate.0.role, &records, &query, flash.as_deref());
    Ok(page(&flash, body))
}

async fn admin_dashboard(
    req: HttpRequest,
    db: web::Data<DatabaseConnection>,
    _gate: AdminGate,
) -> Result<HttpResponse, AppError> {
    let managers = service::manager::list_records(db.get_ref())
        .await
        .map_err(|e| map_service(e, "/admin"))?;
    let departments = service::department::list(db.get_ref())
        .await
        .map_err(|e| map_service(e, "/admin"))?;
    let account_types = service::account_type::list(db.get_ref())
        .await
        .map_err(|e| map_service(e, "/admin"))?;
    let profiles = service::profile::list_records(db.get_ref())
        .await
        .map_err(|e| map_service(e, "/admin"))?;
    let flash = response::take_flash(&req);
    let body = views::admin_dashboard(
        &managers,
        &departments,
        &account_types,
        &profiles,
        flash.as_deref(),
    );
    Ok(page(&flash, body))
}
