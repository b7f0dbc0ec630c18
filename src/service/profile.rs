use std::collections::{BTreeSet, HashMap};

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use super::ServiceError;
use crate::entity::{account_type, profile, profile_account_type};

#[derive(Clone, Debug)]
pub struct ProfileInput {
    pub name: String,
    pub account_type_ids: Vec<i32>,
}

#[derive(Clone, Debug)]
pub struct ProfileRecord {
    pub id: i32,
    pub name: String,
    pub account_type_ids: Vec<i32>,
    pub account_type_names: Vec<String>,
}

pub async fn list_records(db: &DatabaseConnection) -> Result<Vec<ProfileRecord>, ServiceError> {
    let profiles = profile::Entity::find()
        .order_by_asc(profile::Column::Name)
        .all(db)
        .await?;
    let links = profile_account_type::Entity::find().all(db).await?;
    let names: HashMap<i32, String> = account_type::Entity::find()
        .all(db)
        .await?
        .into_iter()
        .map(|a| (a.id, a.name))
        .collect();

    let mut by_profile: HashMap<i32, Vec<i32>> = HashMap::new();
    for link in links {
        by_profile
            .entry(link.profile_id)
            .or_default()
            .push(link.account_type_id);
    }

    Ok(profiles
        .into_iter()
        .map(|p| {
            let ids = by_profile.remove(&p.id).unwrap_or_default();
            let account_type_names = ids
                .iter()
                .filter_map(|id| names.get(id).cloned())
                .collect();
            ProfileRecord {
                id: p.id,
                name: p.name,
                account_type_ids: ids,
                account_type_names,
            }
        })
        .collect())
}

pub async fn get_record(db: &DatabaseConnection, id: i32) -> Result<ProfileRecord, ServiceError> {
    let profile = profile::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Profile"))?;
    let ids = account_type_ids(db, profile.id).await?;
    let names = account_type::Entity::find()
        .filter(account_type::Column::Id.is_in(ids.clone()))
        .all(db)
        .await?
        .into_iter()
        .map(|a| a.name)
        .collect();
    Ok(ProfileRecord {
        id: profile.id,
        name: profile.name,
        account_type_ids: ids,
        account_type_names: names,
    })
}

/// Account type ids bundled by a profile. Missing profiles yield an
/// empty list rather than an error: the lookup endpoint answers
/// `{"account_types": []}` in that case.
pub async fn account_type_ids(
    db: &DatabaseConnection,
    profile_id: i32,
) -> Result<Vec<i32>, ServiceError> {
    let rows = profile_account_type::Entity::find()
        .filter(profile_account_type::Column::ProfileId.eq(profile_id))
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|r| r.account_type_id).collect())
}

pub async fn create(db: &DatabaseConnection, input: ProfileInput) -> Result<i32, ServiceError> {
    let txn = db.begin().await?;
    ensure_account_types_exist(&txn, &input.account_type_ids).await?;
    let model = profile::ActiveModel {
        name: Set(input.name),
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
    input: ProfileInput,
) -> Result<(), ServiceError> {
    let existing = profile::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Profile"))?;
    let txn = db.begin().await?;
    ensure_account_types_exist(&txn, &input.account_type_ids).await?;
    profile::ActiveModel {
        id: Set(existing.id),
        name: Set(input.name),
    }
    .update(&txn)
    .await?;
    profile_account_type::Entity::delete_many()
        .filter(profile_account_type::Column::ProfileId.eq(existing.id))
        .exec(&txn)
        .await?;
    insert_links(&txn, existing.id, &input.account_type_ids).await?;
    txn.commit().await?;
    Ok(())
}

pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<(), ServiceError> {
    let existing = profile::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Profile"))?;
    let txn = db.begin().await?;
    profile_account_type::Entity::delete_many()
        .filter(profile_account_type::Column::ProfileId.eq(existing.id))
        .exec(&txn)
        .await?;
    profile::Entity::delete_by_id(existing.id).exec(&txn).await?;
    txn.commit().await?;
    Ok(())
}

pub(super) async fn ensure_account_types_exist<C: ConnectionTrait>(
    db: &C,
    ids: &[i32],
) -> Result<(), ServiceError> {
    let unique: BTreeSet<i32> = ids.iter().copied().collect();
    if unique.is_empty() {
        return Ok(());
    }
    let found = account_type::Entity::find()
        .filter(account_type::Column::Id.is_in(unique.clone()))
        .count(db)
        .await?;
    if found as usize != unique.len() {
        return Err(ServiceError::invalid(
            "account_types",
            "One or more selected account types do not exist.",
        ));
    }
    Ok(())
}

async fn insert_links<C: ConnectionTrait>(
    db: &C,
    profile_id: i32,
    ids: &[i32],
) -> Result<(), ServiceError> {
    let unique: BTreeSet<i32> = ids.iter().copied().collect();
    for account_type_id in unique {
        profile_account_type::ActiveModel {
            profile_id: Set(profile_id),
            account_type_id: Set(account_type_id),
            ..Default::default()
        }
        .insert(db)
        .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util;

    #[tokio::test]
    async fn lookup_returns_exact_bundle() {
        let db = test_util::setup_db().await;
        let a1 = test_util::seed_account_type(&db, "VPN").await;
        let a2 = test_util::seed_account_type(&db, "Mail").await;
        let id = create(
            &db,
            ProfileInput {
                name: "Dev".into(),
                account_type_ids: vec![a1, a2],
            },
        )
        .await
        .unwrap();

        let mut ids = account_type_ids(&db, id).await.unwrap();
        ids.sort_unstable();
        assert_eq!(ids, vec![a1, a2]);
    }

    #[tokio::test]
    async fn lookup_for_missing_profile_is_empty() {
        let db = test_util::setup_db().await;
        assert!(account_type_ids(&db, 404).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_with_unknown_account_type_persists_nothing() {
        let db = test_util::setup_db().await;
        let err = create(
            &db,
            ProfileInput {
                name: "Dev".into(),
                account_type_ids: vec![9000],
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ServiceError::Invalid { .. }));
        assert_eq!(profile::Entity::find().count(&db).await.unwrap(), 0);
        assert_eq!(
            profile_account_type::Entity::find().count(&db).await.unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn update_replaces_bundle() {
        let db = test_util::setup_db().await;
        let a1 = test_util::seed_account_type(&db, "VPN").await;
        let a2 = test_util::seed_account_type(&db, "Mail").await;
        let id = create(
            &db,
            ProfileInput {
                name: "Dev".into(),
                account_type_ids: vec![a1],
            },
        )
        .await
        .unwrap();

        update(
            &db,
            id,
            ProfileInput {
                name: "Dev".into(),
                account_type_ids: vec![a2],
            },
        )
        .await
        .unwrap();

        assert_eq!(account_type_ids(&db, id).await.unwrap(), vec![a2]);
    }
}
