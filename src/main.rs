mod auth;
mod config;
mod db;
mod entity;
mod error;
mod forms;
mod report;
mod response;
mod routes;
mod search;
mod service;
#[cfg(test)]
mod test_util;
mod views;

use actix_web::{middleware, web, App, HttpServer};
use config::AppConfig;
use db::connect_db;
use log::info;
use routes::{account_type, dashboard, department, employee, export, manager, profile};
use routes::auth as auth_routes;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    let config = AppConfig::from_env();
    let db = connect_db(&config).await;
    db::ensure_superuser(&db, &config).await;
    let server_port = config.server_port;

    let server = HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(config.clone()))
            .app_data(web::Data::new(db.clone()))
            .wrap(middleware::Logger::default())
            .configure(auth_routes::config)
            .configure(dashboard::config)
            .configure(department::config)
            .configure(account_type::config)
            .configure(profile::config)
            .configure(manager::config)
            .configure(employee::config)
            .configure(export::config)
    })
    .bind(("0.0.0.0", server_port))?;
    info!("server started at http://0.0.0.0:{}", server_port);
    server.run().await
}
