use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use super::ServiceError;
use crate::entity::{account_type, employee_account_type, profile_account_type};

#[derive(Clone, Debug)]
pub struct AccountTypeInput {
    pub name: String,
    pub description: Option<String>,
}

pub async fn list(db: &DatabaseConnection) -> Result<Vec<account_type::Model>, ServiceError> {
    let rows = account_type::Entity::find()
        .order_by_asc(account_type::Column::Name)
        .all(db)
        .await?;
    Ok(rows)
}

pub async fn get(db: &DatabaseConnection, id: i32) -> Result<account_type::Model, ServiceError> {
    account_type::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Account type"))
}

pub async fn create(db: &DatabaseConnection, input: AccountTypeInput) -> Result<i32, ServiceError> {
    let model = account_type::ActiveModel {
        name: Set(input.name),
        description: Set(input.description),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(model.id)
}

pub async fn update(
    db: &DatabaseConnection,
    id: i32,
    input: AccountTypeInput,
) -> Result<(), ServiceError> {
    let existing = get(db, id).await?;
    account_type::ActiveModel {
        id: Set(existing.id),
        name: Set(input.name),
        description: Set(input.description),
    }
    .update(db)
    .await?;
    Ok(())
}

/// Removes the account type together with its association rows in both
/// join tables, in one transaction.
pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<(), ServiceError> {
    let existing = get(db, id).await?;
    let txn = db.begin().await?;
    employee_account_type::Entity::delete_many()
        .filter(employee_account_type::Column::AccountTypeId.eq(existing.id))
        .exec(&txn)
        .await?;
    profile_account_type::Entity::delete_many()
        .filter(profile_account_type::Column::AccountTypeId.eq(existing.id))
        .exec(&txn)
        .await?;
    account_type::Entity::delete_by_id(existing.id).exec(&txn).await?;
    txn.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util;
    use sea_orm::PaginatorTrait;

    #[tokio::test]
    async fn create_keeps_optional_description() {
        let db = test_util::setup_db().await;
        let id = create(
            &db,
            AccountTypeInput {
                name: "VPN".into(),
                description: None,
            },
        )
        .await
        .unwrap();
        let row = get(&db, id).await.unwrap();
        assert_eq!(row.name, "VPN");
        assert_eq!(row.description, None);
    }

    #[tokio::test]
    async fn delete_removes_association_rows_in_both_tables() {
        let db = test_util::setup_db().await;
        let at = test_util::seed_account_type(&db, "VPN").await;
        let other = test_util::seed_account_type(&db, "Mail").await;
        let emp = test_util::seed_employee(&db, "John", "Doe", "john@corp.test", None).await;
        test_util::link_employee_account(&db, emp, at).await;
        test_util::link_employee_account(&db, emp, other).await;
        test_util::seed_profile(&db, "Dev", &[at, other]).await;

        delete(&db, at).await.unwrap();

        let emp_links = employee_account_type::Entity::find().count(&db).await.unwrap();
        let profile_links = profile_account_type::Entity::find().count(&db).await.unwrap();
        assert_eq!(emp_links, 1);
        assert_eq!(profile_links, 1);
        assert!(matches!(
            get(&db, at).await.unwrap_err(),
            ServiceError::NotFound { .. }
        ));
    }
}
