use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use super::ServiceError;
use crate::entity::{department, employee};

#[derive(Clone, Debug)]
pub struct DepartmentInput {
    pub name: String,
}

pub async fn list(db: &DatabaseConnection) -> Result<Vec<department::Model>, ServiceError> {
    let rows = department::Entity::find()
        .order_by_asc(department::Column::Name)
        .all(db)
        .await?;
    Ok(rows)
}

pub async fn get(db: &DatabaseConnection, id: i32) -> Result<department::Model, ServiceError> {
    department::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Department"))
}

pub async fn create(db: &DatabaseConnection, input: DepartmentInput) -> Result<i32, ServiceError> {
    ensure_name_free(db, &input.name, None).await?;
    let model = department::ActiveModel {
        name: Set(input.name),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(model.id)
}

pub async fn update(
    db: &DatabaseConnection,
    id: i32,
    input: DepartmentInput,
) -> Result<(), ServiceError> {
    let existing = get(db, id).await?;
    ensure_name_free(db, &input.name, Some(existing.id)).await?;
    department::ActiveModel {
        id: Set(existing.id),
        name: Set(input.name),
    }
    .update(db)
    .await?;
    Ok(())
}

/// Deleting a department never deletes its employees: their department
/// reference is nulled out in the same transaction.
pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<(), ServiceError> {
    let existing = get(db, id).await?;
    let txn = db.begin().await?;
    employee::Entity::update_many()
        .col_expr(employee::Column::DepartmentId, Expr::value(None::<i32>))
        .filter(employee::Column::DepartmentId.eq(existing.id))
        .exec(&txn)
        .await?;
    department::Entity::delete_by_id(existing.id).exec(&txn).await?;
    txn.commit().await?;
    Ok(())
}

async fn ensure_name_free(
    db: &DatabaseConnection,
    name: &str,
    exclude_id: Option<i32>,
) -> Result<(), ServiceError> {
    let mut query = department::Entity::find().filter(department::Column::Name.eq(name));
    if let Some(id) = exclude_id {
        query = query.filter(department::Column::Id.ne(id));
    }
    if query.one(db).await?.is_some() {
        return Err(ServiceError::invalid(
            "name",
            "A department with this name already exists.",
        ));
    }
    Ok(())
}
