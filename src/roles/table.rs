use super::{now, Role, StoreError};
use crate::entities;
use crate::entities::role_permission::{ActiveModel, Column, Entity};
use crate::permissions::{Permission, PermissionSet};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, TransactionTrait,
};
use std::collections::{HashMap, HashSet};

fn grant(role_id: i32, permission: &Permission) -> ActiveModel {
    ActiveModel {
        role_id: Set(role_id),
        path: Set(permission.path.clone()),
        method: Set(permission.method.clone()),
        ..Default::default()
    }
}

fn unique_grant() -> OnConflict {
    OnConflict::columns([Column::RoleId, Column::Path, Column::Method])
        .do_nothing()
        .to_owned()
}

async fn touch<C: ConnectionTrait>(db: &C, role_id: i32) -> Result<(), DbErr> {
    use entities::role::{Column, Entity};

    Entity::update_many()
        .col_expr(Column::UpdatedAt, Expr::value(now()))
        .filter(Column::Id.eq(role_id))
        .exec(db)
        .await?;
    Ok(())
}

pub(super) async fn to_roles(
    db: &DatabaseConnection,
    models: Vec<entities::role::Model>,
) -> Result<Vec<Role>, StoreError> {
    let ids: Vec<i32> = models.iter().map(|m| m.id).collect();
    let mut grants: HashMap<i32, PermissionSet> = HashMap::new();
    for row in Entity::find()
        .filter(Column::RoleId.is_in(ids))
        .order_by_asc(Column::Id)
        .all(db)
        .await?
    {
        grants
            .entry(row.role_id)
            .or_default()
            .push(Permission::new(row.path, row.method));
    }

    Ok(models
        .into_iter()
        .map(|m| Role {
            permissions: grants.remove(&m.id).unwrap_or_default(),
            id: m.id,
            name: m.name,
            created_at: m.created_at,
            updated_at: m.updated_at,
        })
        .collect())
}

pub(super) async fn permissions_of(
    db: &DatabaseConnection,
    role_id: i32,
) -> Result<PermissionSet, StoreError> {
    Ok(Entity::find()
        .filter(Column::RoleId.eq(role_id))
        .order_by_asc(Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(|row| Permission::new(row.path, row.method))
        .collect())
}

/// Inserts one grant; an existing identical grant is left as is.
pub(super) async fn insert(
    db: &DatabaseConnection,
    role_id: i32,
    permission: Permission,
) -> Result<(), StoreError> {
    let txn = db.begin().await?;

    if entities::Role::find_by_id(role_id).one(&txn).await?.is_none() {
        return Err(StoreError::NotFound(format!("role {role_id}")));
    }

    match Entity::insert(grant(role_id, &permission))
        .on_conflict(unique_grant())
        .exec(&txn)
        .await
    {
        Ok(_) | Err(DbErr::RecordNotInserted) => {}
        Err(e) => return Err(e.into()),
    }
    touch(&txn, role_id).await?;

    txn.commit().await?;
    Ok(())
}

pub(super) async fn remove(
    db: &DatabaseConnection,
    role_id: i32,
    path: &str,
    method: &str,
) -> Result<usize, StoreError> {
    let txn = db.begin().await?;

    let result = Entity::delete_many()
        .filter(Column::RoleId.eq(role_id))
        .filter(Column::Path.eq(path))
        .filter(Column::Method.eq(method))
        .exec(&txn)
        .await?;
    if result.rows_affected > 0 {
        touch(&txn, role_id).await?;
    }

    txn.commit().await?;
    Ok(result.rows_affected as usize)
}

pub(super) async fn contains(
    db: &DatabaseConnection,
    role_id: i32,
    permission: &Permission,
) -> Result<bool, StoreError> {
    let row = Entity::find()
        .filter(Column::RoleId.eq(role_id))
        .filter(Column::Path.eq(permission.path.as_str()))
        .filter(Column::Method.eq(permission.method.as_str()))
        .one(db)
        .await?;
    Ok(row.is_some())
}

/// Deletes the role's grants and inserts `all` in order. Repeated entries
/// collapse onto the unique constraint.
pub(super) async fn overwrite(
    db: &DatabaseConnection,
    role_name: &str,
    all: &PermissionSet,
) -> Result<(), StoreError> {
    let txn = db.begin().await?;

    let role = {
        use entities::role::{Column, Entity};
        Entity::find()
            .filter(Column::Name.eq(role_name))
            .one(&txn)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("role {role_name}")))?
    };

    Entity::delete_many()
        .filter(Column::RoleId.eq(role.id))
        .exec(&txn)
        .await?;

    let mut seen = HashSet::new();
    let grants: Vec<ActiveModel> = all
        .iter()
        .filter(|p| seen.insert(*p))
        .map(|p| grant(role.id, p))
        .collect();
    if !grants.is_empty() {
        Entity::insert_many(grants).exec(&txn).await?;
    }
    touch(&txn, role.id).await?;

    txn.commit().await?;
    Ok(())
}
