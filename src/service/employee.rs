use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

use super::ServiceError;
use crate::entity::{account_type, department, employee, employee_account_type};

#[derive(Clone, Debug)]
pub struct EmployeeInput {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department_id: Option<i32>,
    pub account_type_ids: Vec<i32>,
    pub hire_date: Option<NaiveDate>,
}

/// Employee row flattened for dashboards, search and export: the
/// department and account type names are resolved, so one record per
/// employee carries everything the consumers need.
#[derive(Clone, Debug, PartialEq)]
pub struct EmployeeRecord {
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub department_id: Option<i32>,
    pub department: Option<String>,
    pub account_type_ids: Vec<i32>,
    pub account_types: Vec<String>,
    pub hire_date: Option<NaiveDate>,
}

impl EmployeeRecord {
    pub fn account_types_joined(&self) -> String {
        self.account_types.join(", ")
    }
}

pub async fn list_records(db: &DatabaseConnection) -> Result<Vec<EmployeeRecord>, ServiceError> {
    let employees = employee::Entity::find()
        .order_by_asc(employee::Column::LastName)
        .order_by_asc(employee::Column::FirstName)
        .all(db)
        .await?;
    let departments: HashMap<i32, String> = department::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|d| (d.id, d.name))
        .collect();
    let account_types: HashMap<i32, String> = account_type::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|a| (a.id, a.name))
        .collect();
    let links = employee_account_type::Entity::find().all(db).await?;

    let mut by_employee: HashMap<i32, Vec<i32>> = HashMap::new();
    for link in links {
        by_employee
            .entry(link.employee_id)
            .or_default()
            .push(link.account_type_id);
    }

    Ok(employees
        .into_iter()
        .map(|e| {
            let ids = by_employee.remove(&e.id).unwrap_or_default();
            build_record(e, &departments, &account_types, ids)
        })
        .collect())
}

pub async fn get_record(db: &DatabaseConnection, id: i32) -> Result<EmployeeRecord, ServiceError> {
    let e = employee::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Employee"))?;
    let departments: HashMap<i32, String> = department::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|d| (d.id, d.name))
        .collect();
    let account_types: HashMap<i32, String> = account_type::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|a| (a.id, a.name))
        .collect();
    let ids: Vec<i32> = employee_account_type::Entity::find()
        .filter(employee_account_type::Column::EmployeeId.eq(e.id))
        .all(db)
        .await?
        .into_iter()
        .map(|l| l.account_type_id)
        .collect();
    Ok(build_record(e, &departments, &account_types, ids))
}

/// Persists the employee row and its account type association rows in
/// one transaction; a bad reference leaves nothing behind.
pub async fn create(db: &DatabaseConnection, input: EmployeeInput) -> Result<i32, ServiceError> {
    let txn = db.begin().await?;
    ensure_references(&txn, &input).await?;
    let model = employee::ActiveModel {
        first_name: Set(input.first_name),
        last_name: Set(input.last_name),
        email: Set(input.email),
        department_id: Set(input.department_id),
        hire_date: Set(input.hire_date),
        ..Default::default()
    }
    .insert(&txn)
    .await?;
    insert_links(&txn, model.id, &input.account_type_ids).await?;
    txn.commit().await?;
    Ok(model.id)
}

pub async fn update(
    db: &DatabaseConnection,
    id: i32,
    input: EmployeeInput,
) -> Result<(), ServiceError> {
    let existing = employee::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Employee"))?;
    let txn = db.begin().await?;
    ensure_references(&txn, &input).await?;
    employee::ActiveModel {
        id: Set(existing.id),
        first_name: Set(input.first_name),
        last_name: Set(input.last_name),
        email: Set(input.email),
        department_id: Set(input.department_id),
        hire_date: Set(input.hire_date),
    }
    .update(&txn)
    .await?;
    employee_account_type::Entity::delete_many()
        .filter(employee_account_type::Column::EmployeeId.eq(existing.id))
        .exec(&txn)
        .await?;
    insert_links(&txn, existing.id, &input.account_type_ids).await?;
    txn.commit().await?;
    Ok(())
}

pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<(), ServiceError> {
    let existing = employee::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Employee"))?;
    let txn = db.begin().await?;
    employee_account_type::Entity::delete_many()
        .filter(employee_account_type::Column::EmployeeId.eq(existing.id))
        .exec(&txn)
        .await?;
    employee::Entity::delete_by_id(existing.id).exec(&txn).await?;
    txn.commit().await?;
    Ok(())
}

async fn ensure_references<C: ConnectionTrait>(
    db: &C,
    input: &EmployeeInput,
) -> Result<(), ServiceError> {
    if let Some(dep_id) = input.department_id {
        let exists = department::Entity::find_by_id(dep_id).one(db).await?.is_some();
        if !exists {
            return Err(ServiceError::invalid(
                "department",
                "Selected department does not exist.",
            ));
        }
    }
    super::profile::ensure_account_types_exist(db, &input.account_type_ids).await
}

async fn insert_links<C: ConnectionTrait>(
    db: &C,
    employee_id: i32,
    ids: &[i32],
) -> Result<(), ServiceError> {
    let unique: BTreeSet<i32> = ids.iter().copied().collect();
    for account_type_id in unique {
        employee_account_type::ActiveModel {
            employee_id: Set(employee_id),
            account_type_id: Set(account_type_id),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

fn build_record(
    e: employee::Model,
    departments: &HashMap<i32, String>,
    account_types: &HashMap<i32, String>,
    mut ids: Vec<i32>,
) -> EmployeeRecord {
    ids.sort_unstable();
    let names = ids
        .iter()
        .filter_map(|id| account_types.get(id).cloned())
        .collect();
    EmployeeRecord {
        id: e.id,
        first_name: e.first_name,
        last_name: e.last_name,
        email: e.email,
        department_id: e.department_id,
        department: e.department_id.and_then(|id| departments.get(&id).cloned()),
        account_type_ids: ids,
        account_types: names,
        hire_date: e.hire_date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util;
    use sea_orm::PaginatorTrait;

    fn input(first: &str, last: &str, dep: Option<i32>, ats: Vec<i32>) -> EmployeeInput {
        EmployeeInput {
            first_name: first.to_string(),
            last_name: last.to_string(),
            email: format!("{}@corp.test", first.to_lowercase()),
            department_id: dep,
            account_type_ids: ats,
            hire_date: None,
        }
    }

    #[tokio::test]
    async fn valid_create_adds_exactly_one_row() {
        let db = test_util::setup_db().await;
        let dep = test_util::seed_department(&db, "IT").await;
        let at = test_util::seed_account_type(&db, "VPN").await;

        let id = create(&db, input("John", "Doe", Some(dep), vec![at])).await.unwrap();

        assert_eq!(employee::Entity::find().count(&db).await.unwrap(), 1);
        let record = get_record(&db, id).await.unwrap();
        assert_eq!(record.first_name, "John");
        assert_eq!(record.last_name, "Doe");
        assert_eq!(record.email, "john@corp.test");
        assert_eq!(record.department.as_deref(), Some("IT"));
        assert_eq!(record.account_types, vec!["VPN".to_string()]);
    }

    #[tokio::test]
    async fn create_with_unknown_account_type_is_atomic() {
        let db = test_util::setup_db().await;
        let err = create(&db, input("John", "Doe", None, vec![777])).await.unwrap_err();
        assert!(matches!(err, ServiceError::Invalid { field: "account_types", .. }));
        assert_eq!(employee::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(
            employee_account_type::Entity::find().count(&db).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn create_with_unknown_department_is_rejected() {
        let db = test_util::setup_db().await;
        let err = create(&db, input("John", "Doe", Some(123), vec![])).await.unwrap_err();
        assert!(matches!(err, ServiceError::Invalid { field: "department", .. }));
        assert_eq!(employee::Entity::find().count(&db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn update_replaces_account_type_set() {
        let db = test_util::setup_db().await;
        let a1 = test_util::seed_account_type(&db, "VPN").await;
        let a2 = test_util::seed_account_type(&db, "Mail").await;
        let id = create(&db, input("John", "Doe", None, vec![a1])).await.unwrap();

        update(&db, id, input("John", "Doe", None, vec![a2])).await.unwrap();

        let record = get_record(&db, id).await.unwrap();
        assert_eq!(record.account_type_ids, vec![a2]);
    }

    #[tokio::test]
    async fn delete_removes_association_rows() {
        let db = test_util::setup_db().await;
        let at = test_util::seed_account_type(&db, "VPN").await;
        let id = create(&db, input("John", "Doe", None, vec![at])).await.unwrap();

        delete(&db, id).await.unwrap();

        assert_eq!(employee::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(
            employee_account_type::Entity::find().count(&db).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn missing_employee_is_not_found() {
        let db = test_util::setup_db().await;
        assert!(matches!(
            get_record(&db, 5).await.unwrap_err(),
            ServiceError::NotFound { .. }
        ));
        assert!(matches!(
            update(&db, 5, input("J", "D", None, vec![])).await.unwrap_err(),
            ServiceError::NotFound { .. }
        ));
        assert!(matches!(
            delete(&db, 5).await.unwrap_err(),
            ServiceError::NotFound { .. }
        ));
    }
}
