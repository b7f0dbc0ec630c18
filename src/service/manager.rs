use std::collections::HashMap;

use bcrypt::hash;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};

use super::ServiceError;
use crate::entity::{manager, user};

const BCRYPT_COST: u32 = 10;

/// Validated manager form input. `password` is `None` on edit when the
/// field was left blank, meaning "keep the stored hash". The plaintext
/// never goes further than the `hash` call below.
#[derive(Clone, Debug)]
pub struct ManagerInput {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: Option<String>,
}

#[derive(Clone, Debug)]
pub struct ManagerRecord {
    pub id: i32,
    pub user_id: i32,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

pub async fn list_records(db: &DatabaseConnection) -> Result<Vec<ManagerRecord>, ServiceError> {
    let managers = manager::Entity::find().all(db).await?;
    let users: HashMap<i32, user::Model> = user::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    let mut records = Vec::with_capacity(managers.len());
    for m in managers {
        if let Some(u) = users.get(&m.user_id) {
            records.push(ManagerRecord {
                id: m.id,
                user_id: u.id,
                username: u.username.clone(),
                first_name: u.first_name.clone(),
                last_name: u.last_name.clone(),
                email: u.email.clone(),
            });
        }
    }
    records.sort_by(|a, b| a.username.cmp(&b.username));
    Ok(records)
}

pub async fn get_record(db: &DatabaseConnection, id: i32) -> Result<ManagerRecord, ServiceError> {
    let m = manager::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Manager"))?;
    let u = user::Entity::find_by_id(m.user_id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Manager"))?;
    Ok(ManagerRecord {
        id: m.id,
        user_id: u.id,
        username: u.username,
        first_name: u.first_name,
        last_name: u.last_name,
        email: u.email,
    })
}

/// Creates the login identity and its manager role marker in one
/// transaction.
pub async fn create(db: &DatabaseConnection, input: ManagerInput) -> Result<i32, ServiceError> {
    let password = input
        .password
        .as_deref()
        .ok_or_else(|| ServiceError::invalid("password", "This field is required."))?;
    let password_hash = hash(password, BCRYPT_COST)?;

    let txn = db.begin().await?;
    ensure_username_free(&txn, &input.username, None).await?;
    let new_user = user::ActiveModel {
        username: Set(input.username),
        password_hash: Set(password_hash),
        first_name: Set(input.first_name),
        last_name: Set(input.last_name),
        email: Set(input.email),
        is_superuser: Set(false),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    let new_manager = manager::ActiveModel {
        user_id: Set(new_user.id),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    txn.commit().await?;
    Ok(new_manager.id)
}

pub async fn update(
    db: &DatabaseConnection,
    id: i32,
    input: ManagerInput,
) -> Result<(), ServiceError> {
    let existing = get_record(db, id).await?;

    let txn = db.begin().await?;
    ensure_username_free(&txn, &input.username, Some(existing.user_id)).await?;
    let mut active = user::ActiveModel {
        id: Set(existing.user_id),
        username: Set(input.username),
        first_name: Set(input.first_name),
        last_name: Set(input.last_name),
        email: Set(input.email),
        ..Default::default()
    };
    if let Some(password) = input.password.as_deref() {
        active.password_hash = Set(hash(password, BCRYPT_COST)?);
    }
    active.update(&txn).await?;
    txn.commit().await?;
    Ok(())
}

/// Deleting a manager deletes exactly its linked identity: the role
/// marker row and the user row, nothing else.
pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<(), ServiceError> {
    let existing = manager::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Manager"))?;
    let txn = db.begin().await?;
    manager::Entity::delete_by_id(existing.id).exec(&txn).await?;
    user::Entity::delete_by_id(existing.user_id).exec(&txn).await?;
    txn.commit().await?;
    Ok(())
}

async fn ensure_username_free<C: ConnectionTrait>(
    db: &C,
    username: &str,
    exclude_user_id: Option<i32>,
) -> Result<(), ServiceError> {
    let mut query = user::Entity::find().filter(user::Column::Username.eq(username));
    if let Some(id) = exclude_user_id {
        query = query.filter(user::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(ServiceError::invalid(
            "username",
            "This username is already taken.",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util;
    use bcrypt::verify;
    use sea_orm::PaginatorTrait;

    fn input(username: &str, password: Option<&str>) -> ManagerInput {
        ManagerInput {
            username: username.to_string(),
            first_name: "Jane".into(),
            last_name: "Smith".into(),
            email: "jane@corp.test".into(),
            password: password.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn create_hashes_password_and_links_user() {
        let db = test_util::setup_db().await;
        let id = create(&db, input("jane", Some("s3cret"))).await.unwrap();
        let record = get_record(&db, id).await.unwrap();
        let stored = user::Entity::find_by_id(record.user_id)
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert_ne!(stored.password_hash, "s3cret");
        assert!(verify("s3cret", &stored.password_hash).unwrap());
        assert!(!stored.is_superuser);
    }

    #[tokio::test]
    async fn create_without_password_persists_nothing() {
        let db = test_util::setup_db().await;
        let err = create(&db, input("jane", None)).await.unwrap_err();
        assert!(matches!(err, ServiceError::Invalid { field: "password", .. }));
        assert_eq!(user::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(manager::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_username_rejected() {
        let db = test_util::setup_db().await;
        create(&db, input("jane", Some("pw"))).await.unwrap();
        let err = create(&db, input("jane", Some("pw"))).await.unwrap_err();
        assert!(matches!(err, ServiceError::Invalid { field: "username", .. }));
        assert_eq!(manager::Entity::find().count(&db).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn blank_password_on_edit_keeps_hash() {
        let db = test_util::setup_db().await;
        let id = create(&db, input("jane", Some("s3cret"))).await.unwrap();
        let before = get_record(&db, id).await.unwrap();
        let hash_before = user::Entity::find_by_id(before.user_id)
            .one(&db)
            .await
            .unwrap()
            .unwrap()
            .password_hash;

        update(&db, id, input("jane", None)).await.unwrap();

        let hash_after = user::Entity::find_by_id(before.user_id)
            .one(&db)
            .await
            .unwrap()
            .unwrap()
            .password_hash;
        assert_eq!(hash_before, hash_after);
    }

    #[tokio::test]
    async fn delete_removes_exactly_the_linked_identity() {
        let db = test_util::setup_db().await;
        let keep = create(&db, input("jane", Some("pw"))).await.unwrap();
        let gone = create(&db, input("bob", Some("pw"))).await.unwrap();

        delete(&db, gone).await.unwrap();

        assert!(get_record(&db, keep).await.is_ok());
        assert!(matches!(
            get_record(&db, gone).await.unwrap_err(),
            ServiceError::NotFound { .. }
        ));
        assert_eq!(user::Entity::find().count(&db).await.unwrap(), 1);
        assert_eq!(manager::Entity::find().count(&db).await.unwrap(), 1);
    }
}
