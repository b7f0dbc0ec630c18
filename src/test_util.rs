//! Shared fixtures for the test suites: an in-memory database with the
//! schema applied, plus row seeders for each table.

use bcrypt::hash;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};

use crate::config::AppConfig;
use crate::db;
use crate::entity::{
    account_type, department, employee, employee_account_type, manager, profile,
    profile_account_type, user,
};

/// Fresh in-memory database. The pool is capped at one connection so
/// every query sees the same memory file.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);
    let db = Database::connect(options).await.unwrap();
    db::apply_schema(&db).await;
    db
}

pub fn test_config() -> AppConfig {
    AppConfig {
        server_port: 0,
        sqlite_path: String::new(),
        database_url: Some("sqlite::memory:".to_string()),
        session_secret: "test-secret".to_string(),
        session_ttl_hours: 1,
        admin_username: "admin".to_string(),
        admin_password: "admin".to_string(),
    }
}

// Low bcrypt cost keeps the suites fast.
const TEST_BCRYPT_COST: u32 = 4;

pub async fn seed_user(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
    is_superuser: bool,
) -> user::Model {
    user::ActiveModel {
        username: Set(username.to_string()),
        password_hash: Set(hash(password, TEST_BCRYPT_COST).unwrap()),
        first_name: Set(String::new()),
        last_name: Set(String::new()),
        email: Set(format!("{}@corp.test", username)),
        is_superuser: Set(is_superuser),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
}

pub async fn seed_manager(db: &DatabaseConnection, user_id: i32) -> i32 {
    manager::ActiveModel {
        user_id: Set(user_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
    .id
}

pub async fn seed_department(db: &DatabaseConnection, name: &str) -> i32 {
    department::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
    .id
}

pub async fn seed_account_type(db: &DatabaseConnection, name: &str) -> i32 {
    account_type::ActiveModel {
        name: Set(name.to_string()),
        description: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
    .id
}

pub async fn seed_employee(
    db: &DatabaseConnection,
    first_name: &str,
    last_name: &str,
    email: &str,
    department_id: Option<i32>,
) -> i32 {
    employee::ActiveModel {
        first_name: Set(first_name.to_string()),
        last_name: Set(last_name.to_string()),
        email: Set(email.to_string()),
        department_id: Set(department_id),
        hire_date: Set(None),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap()
    .id
}

pub async fn link_employee_account(db: &DatabaseConnection, employee_id: i32, account_type_id: i32) {
    employee_account_type::ActiveModel {
        employee_id: Set(employee_id),
        account_type_id: Set(account_type_id),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();
}

pub async fn seed_profile(db: &DatabaseConnection, name: &str, account_type_ids: &[i32]) -> i32 {
    let profile = profile::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .unwrap();
    for &account_type_id in account_type_ids {
        profile_account_type::ActiveModel {
            profile_id: Set(profile.id),
            account_type_id: Set(account_type_id),
            ..Default::default()
        }
        .insert(db)
        .await
        .unwrap();
    }
    profile.id
}
