use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use chrono::{Duration, Utc};
use futures_util::future::LocalBoxFuture;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};

use crate::config::AppConfig;
use crate::entity::{manager, user};
use crate::error::AppError;

pub const SESSION_COOKIE: &str = "session";

/// Privilege tier of the session identity, computed once per request
/// from explicit fields: the superuser flag, then the presence of a
/// manager row. Never inferred from anything else.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Admin,
    Manager,
    Unprivileged,
}

impl Role {
    pub fn at_least_manager(self) -> bool {
        matches!(self, Role::Admin | Role::Manager)
    }

    /// Landing page after login. Non-superusers are sent to the manager
    /// dashboard even without a manager row (current behavior kept; the
    /// dashboard gate still rejects them).
    pub fn dashboard(self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::Manager | Role::Unprivileged => "/manager",
        }
    }
}

#[derive(Clone, Debug)]
pub struct Identity {
    pub user_id: i32,
    pub username: String,
    pub role: Role,
}

/// Identity when a valid session exists, `None` otherwise. Used by
/// pages that render for anyone but adapt to the caller.
pub struct MaybeIdentity(pub Option<Identity>);

/// Gate for operations open to managers and admins.
pub struct ManagerGate(pub Identity);

/// Gate for admin-only operations.
pub struct AdminGate(pub Identity);

#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(rename = "loginId")]
    login_id: i32,
    exp: usize,
}

pub fn issue_session(config: &AppConfig, user_id: i32) -> Result<Cookie<'static>, AppError> {
    let exp = (Utc::now() + Duration::hours(config.session_ttl_hours)).timestamp() as usize;
    let claims = Claims {
        login_id: user_id,
        exp,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.session_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("session token error: {}", e)))?;

    let mut cookie = Cookie::new(SESSION_COOKIE, token);
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    Ok(cookie)
}

pub fn clear_session() -> Cookie<'static> {
    let mut cookie = Cookie::new(SESSION_COOKIE, "");
    cookie.set_path("/");
    cookie.set_max_age(CookieDuration::ZERO);
    cookie
}

pub async fn resolve_role(db: &DatabaseConnection, user: &user::Model) -> Result<Role, AppError> {
    if user.is_superuser {
        return Ok(Role::Admin);
    }
    let is_manager = manager::Entity::find()
        .filter(manager::Column::UserId.eq(user.id))
        .one(db)
        .await?
        .is_some();
    Ok(if is_manager {
        Role::Manager
    } else {
        Role::Unprivileged
    })
}

async fn authenticate_session(
    db: &DatabaseConnection,
    config: &AppConfig,
    token: &str,
) -> Result<Identity, AppError> {
    let user_id = decode_session(config, token)?;
    let user = user::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or(AppError::NeedLogin)?;
    let role = resolve_role(db, &user).await?;
    Ok(Identity {
        user_id: user.id,
        username: user.username,
        role,
    })
}

fn decode_session(config: &AppConfig, token: &str) -> Result<i32, AppError> {
    let key = DecodingKey::from_secret(config.session_secret.as_bytes());
    let validation = Validation::new(Algorithm::HS256);
    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims.login_id)
        .map_err(|_| AppError::NeedLogin)
}

fn extract_token(req: &HttpRequest) -> Option<String> {
    req.cookie(SESSION_COOKIE)
        .map(|c| c.value().trim().to_string())
        .filter(|v| !v.is_empty())
}

fn app_state(
    req: &HttpRequest,
) -> Option<(web::Data<DatabaseConnection>, web::Data<AppConfig>)> {
    let db = req.app_data::<web::Data<DatabaseConnection>>()?.clone();
    let config = req.app_data::<web::Data<AppConfig>>()?.clone();
    Some((db, config))
}

impl FromRequest for Identity {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = app_state(req);
        let token = extract_token(req);
        Box::pin(async move {
            let (db, config) = state
                .ok_or_else(|| AppError::Internal("app state missing".to_string()))?;
            let token = token.ok_or(AppError::NeedLogin)?;
            let identity = authenticate_session(db.get_ref(), config.get_ref(), &token).await?;
            Ok(identity)
        })
    }
}

impl FromRequest for MaybeIdentity {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let state = app_state(req);
        let token = extract_token(req);
        Box::pin(async move {
            let (db, config) = match state {
                Some(state) => state,
                None => return Ok(MaybeIdentity(None)),
            };
            if let Some(token) = token {
                let identity = authenticate_session(db.get_ref(), config.get_ref(), &token)
                    .await
                    .ok();
                return Ok(MaybeIdentity(identity));
            }
            Ok(MaybeIdentity(None))
        })
    }
}

impl FromRequest for ManagerGate {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let identity = Identity::from_request(req, payload);
        Box::pin(async move {
            let identity = identity.await?;
            if !identity.role.at_least_manager() {
                return Err(AppError::forbidden(
                    "/login",
                    "You do not have permission to view this page.",
                )
                .into());
            }
            Ok(ManagerGate(identity))
        })
    }
}

impl FromRequest for AdminGate {
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let identity = Identity::from_request(req, payload);
        Box::pin(async move {
            let identity = identity.await?;
            match identity.role {
                Role::Admin => Ok(AdminGate(identity)),
                Role::Manager => Err(AppError::forbidden(
                    "/manager",
                    "Administrator access is required for that action.",
                )
                .into()),
                Role::Unprivileged => Err(AppError::forbidden(
                    "/login",
                    "You do not have permission to view this page.",
                )
                .into()),
            }
        })
    }
}
