use actix_web::http::header;
use actix_web::{web, HttpResponse};
use bcrypt::verify;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::auth::{self, MaybeIdentity};
use crate::config::AppConfig;
use crate::entity::user;
use crate::error::AppError;
use crate::forms::FormData;
use crate::response;
use crate::views;

// Same message for unknown usernames and wrong passwords.
const INVALID_CREDENTIALS: &str = "Invalid credentials";

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(root)))
        .service(
            web::resource("/login")
                .route(web::get().to(login_form))
                .route(web::post().to(login)),
        )
        .service(web::resource("/logout").route(web::get().to(logout)));
}

async fn root(identity: MaybeIdentity) -> HttpResponse {
    match identity.0 {
        Some(identity) => response::see_other(identity.role.dashboard()),
        None => response::see_other("/login"),
    }
}

async fn login_form(identity: MaybeIdentity) -> HttpResponse {
    if let Some(identity) = identity.0 {
        return response::see_other(identity.role.dashboard());
    }
    response::html(views::login_page(None))
}

async fn login(
    db: web::Data<DatabaseConnection>,
    config: web::Data<AppConfig>,
    form: web::Form<Vec<(String, String)>>,
) -> Result<HttpResponse, AppError> {
    let data = FormData::from_pairs(form.into_inner());
    let username = data.value("username");
    let password = data.value("password");
    if username.is_empty() || password.is_empty() {
        return Ok(response::html(views::login_page(Some(INVALID_CREDENTIALS))));
    }

    let user = user::Entity::find()
        .filter(user::Column::Username.eq(username.as_str()))
        .one(db.get_ref())
        .await?;
    let user = match user {
        Some(user) => user,
        None => return Ok(response::html(views::login_page(Some(INVALID_CREDENTIALS)))),
    };

    if !verify(&password, &user.password_hash).unwrap_or(false) {
        return Ok(response::html(views::login_page(Some(INVALID_CREDENTIALS))));
    }

    let role = auth::resolve_role(db.get_ref(), &user).await?;
    let cookie = auth::issue_session(config.get_ref(), user.id)?;
    Ok(HttpResponse::SeeOther()
        .insert_header((header::LOCATION, role.dashboard()))
        .cookie(cookie)
        .finish())
}

async fn logout() -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, "/login"))
        .cookie(auth::clear_session())
        .finish()
}
