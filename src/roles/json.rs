use super::{now, Role, StoreError};
use crate::entities;
use crate::permissions::{Permission, PermissionSet};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

pub(super) fn to_role(model: entities::role::Model) -> Result<Role, StoreError> {
    Ok(Role {
        permissions: PermissionSet::from_json(&model.permissions)?,
        id: model.id,
        name: model.name,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

/// Read-append-write inside one transaction; no duplicate check.
pub(super) async fn append(
    db: &DatabaseConnection,
    role_id: i32,
    permission: Permission,
) -> Result<(), StoreError> {
    let txn = db.begin().await?;

    let model = entities::Role::find_by_id(role_id)
        .one(&txn)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("role {role_id}")))?;
    let mut set = PermissionSet::from_json(&model.permissions)?;
    set.push(permission);

    let mut active: entities::role::ActiveModel = model.into();
    active.permissions = Set(set.to_json()?);
    active.updated_at = Set(now());
    active.update(&txn).await?;

    txn.commit().await?;
    Ok(())
}

/// Filters out every exact match; returns the number of removed entries.
/// A missing role removes nothing.
pub(super) async fn remove(
    db: &DatabaseConnection,
    role_id: i32,
    path: &str,
    method: &str,
) -> Result<usize, StoreError> {
    let txn = db.begin().await?;

    let Some(model) = entities::Role::find_by_id(role_id).one(&txn).await? else {
        return Ok(0);
    };
    let mut set = PermissionSet::from_json(&model.permissions)?;
    let removed = set.remove_matching(path, method);
    if removed > 0 {
        let mut active: entities::role::ActiveModel = model.into();
        active.permissions = Set(set.to_json()?);
        active.updated_at = Set(now());
        active.update(&txn).await?;
    }

    txn.commit().await?;
    Ok(removed)
}

pub(super) async fn contains(
    db: &DatabaseConnection,
    role_id: i32,
    permission: &Permission,
) -> Result<bool, StoreError> {
    let model = entities::Role::find_by_id(role_id)
        .one(db)
        .await?
        .ok_or_else(|| StoreError::NotFound(format!("role {role_id}")))?;
    Ok(PermissionSet::from_json(&model.permissions)?.contains(permission))
}

/// Full overwrite of the named role's column, order and duplicates as given.
pub(super) async fn overwrite(
    db: &DatabaseConnection,
    role_name: &str,
    all: &PermissionSet,
) -> Result<(), StoreError> {
    use entities::role::{Column, Entity};

    let result = Entity::update_many()
        .col_expr(Column::Permissions, sea_orm::sea_query::Expr::value(all.to_json()?))
        .col_expr(Column::UpdatedAt, sea_orm::sea_query::Expr::value(now()))
        .filter(Column::Name.eq(role_name))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(StoreError::NotFound(format!("role {role_name}")));
    }
    Ok(())
}
