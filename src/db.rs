use bcrypt::hash;
use log::info;
use sea_orm::{
    ColumnTrait, ConnectionTrait, Database, DatabaseConnection, EntityTrait, QueryFilter, Set,
    Statement,
};
use std::fs::{self, OpenOptions};
use std::path::Path;

use crate::config::AppConfig;
use crate::entity::user;

pub async fn connect_db(config: &AppConfig) -> DatabaseConnection {
    let url = config.database_url();
    let is_sqlite = url.starts_with("sqlite:") || url.starts_with("file:");
    if is_sqlite {
        ensure_sqlite_path(config);
    }
    let db = Database::connect(&url)
        .await
        .unwrap_or_else(|e| panic!("db connect failed: {}", e));
    if is_sqlite {
        init_sqlite_schema(&db).await;
    }
    db
}

/// Seed a superuser account so the admin dashboard is reachable on a
/// fresh database. Does nothing when any superuser already exists.
pub async fn ensure_superuser(db: &DatabaseConnection, config: &AppConfig) {
    let existing = user::Entity::find()
        .filter(user::Column::IsSuperuser.eq(true))
        .one(db)
        .await
        .unwrap_or_else(|e| panic!("superuser lookup failed: {}", e));
    if existing.is_some() {
        return;
    }

    let password_hash = hash(config.admin_password.as_str(), 10)
        .unwrap_or_else(|e| panic!("admin password hash failed: {}", e));
    let admin = user::ActiveModel {
        username: Set(config.admin_username.clone()),
        password_hash: Set(password_hash),
        first_name: Set(String::new()),
        last_name: Set(String::new()),
        email: Set(String::new()),
        is_superuser: Set(true),
        ..Default::default()
    };
    user::Entity::insert(admin)
        .exec(db)
        .await
        .unwrap_or_else(|e| panic!("superuser bootstrap failed: {}", e));
    info!("bootstrapped superuser '{}'", config.admin_username);
}

fn ensure_sqlite_path(config: &AppConfig) {
    let raw = config.database_url();
    if raw.contains(":memory:") {
        return;
    }
    let path = raw
        .strip_prefix("sqlite://")
        .or_else(|| raw.strip_prefix("sqlite:"))
        .unwrap_or(raw.as_str());
    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let _ = OpenOptions::new().create(true).write(true).open(path);
}

async fn init_sqlite_schema(db: &DatabaseConnection) {
    let backend = db.get_database_backend();
    let exists_stmt = Statement::from_string(
        backend,
        "SELECT name FROM sqlite_master WHERE type='table' AND name='t_user' LIMIT 1",
    );
    let exists = db.query_one(exists_stmt).await.ok().flatten().is_some();
    if exists {
        return;
    }
    apply_schema(db).await;
}

pub async fn apply_schema(db: &DatabaseConnection) {
    let backend = db.get_database_backend();
    let sql = include_str!("../schema-sqlite.sql");
    for stmt in split_sql(sql) {
        let _ = db.execute(Statement::from_string(backend, stmt)).await;
    }
}

fn split_sql(input: &str) -> Vec<String> {
    let mut buf = String::new();
    for line in input.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") || trimmed.is_empty() {
            continue;
        }
        buf.push_str(line);
        buf.push('\n');
    }
    buf.split(';')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}
