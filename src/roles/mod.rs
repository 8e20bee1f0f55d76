//! Role store: persistent role → permission-set mapping.
//!
//! Two storage layouts are supported, picked by `authz.backend`:
//! - `json`: the permission set lives in `roles.permissions` as a JSON array.
//!   Grants are appended, so granting twice stores two copies.
//! - `table`: one `role_permissions` row per grant under a unique
//!   `(role_id, path, method)` constraint. Re-granting is a no-op.
//!
//! Every call is bounded by the configured operation timeout and is not retried.

mod json;
mod table;

use crate::entities;
use crate::identity::Actor;
use crate::permissions::{Permission, PermissionSet};
use chrono::Utc;
use miette::Diagnostic;
use sea_orm::{ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use thiserror::Error;

pub const ADMIN_ROLE: &str = "admin";
pub const GUEST_ROLE: &str = "guest";

#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("{0} not found")]
    #[diagnostic(code(agora::roles::not_found))]
    NotFound(String),

    #[error("user {user_id} has no role assigned")]
    #[diagnostic(
        code(agora::roles::no_role),
        help("Assign a role to the user; authenticated users never fall back to the guest role")
    )]
    NoRole { user_id: i32 },

    #[error("storage operation timed out after {0:?}")]
    #[diagnostic(code(agora::roles::timeout))]
    Timeout(Duration),

    #[error("permission serialization error: {0}")]
    #[diagnostic(
        code(agora::roles::serde),
        help(r#"Permissions are JSON objects of the form {{"path": "/x", "method": "GET"}}"#)
    )]
    Serialization(#[from] serde_json::Error),

    #[error("credential error: {0}")]
    #[diagnostic(code(agora::accounts::credentials))]
    Credentials(String),

    #[error("database error: {0}")]
    #[diagnostic(code(agora::roles::db))]
    Db(#[from] DbErr),
}

/// How permission sets are laid out in the database.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionBackend {
    #[default]
    Json,
    Table,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: i32,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub permissions: PermissionSet,
}

#[derive(Clone, Debug)]
pub struct RoleStore {
    db: DatabaseConnection,
    backend: PermissionBackend,
    op_timeout: Duration,
}

impl RoleStore {
    pub fn new(db: DatabaseConnection, backend: PermissionBackend, op_timeout: Duration) -> Self {
        Self {
            db,
            backend,
            op_timeout,
        }
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn backend(&self) -> PermissionBackend {
        self.backend
    }

    async fn bounded<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        tokio::time::timeout(self.op_timeout, op)
            .await
            .map_err(|_| StoreError::Timeout(self.op_timeout))?
    }

    /// One role when `id != 0`, every role when `id == 0`; ascending id.
    pub async fn list_roles(&self, id: i32) -> Result<Vec<Role>, StoreError> {
        self.bounded(async {
            use entities::role::{Column, Entity};

            let mut query = Entity::find().order_by_asc(Column::Id);
            if id != 0 {
                query = query.filter(Column::Id.eq(id));
            }
            let models = query.all(&self.db).await?;

            match self.backend {
                PermissionBackend::Json => models.into_iter().map(json::to_role).collect(),
                PermissionBackend::Table => table::to_roles(&self.db, models).await,
            }
        })
        .await
    }

    /// Appends one serialized `{"path", "method"}` object to the role's set.
    pub async fn add_permission(&self, role_id: i32, permission: &str) -> Result<(), StoreError> {
        let permission: Permission = serde_json::from_str(permission)?;
        self.bounded(async {
            match self.backend {
                PermissionBackend::Json => json::append(&self.db, role_id, permission).await,
                PermissionBackend::Table => table::insert(&self.db, role_id, permission).await,
            }
        })
        .await?;
        tracing::info!(role_id, "Permission added to role");
        Ok(())
    }

    /// Removes every grant equal to `(path, method)`. Zero removals is `NotFound`.
    pub async fn remove_permission(
        &self,
        role_id: i32,
        path: &str,
        method: &str,
    ) -> Result<(), StoreError> {
        let removed = self
            .bounded(async {
                match self.backend {
                    PermissionBackend::Json => json::remove(&self.db, role_id, path, method).await,
                    PermissionBackend::Table => table::remove(&self.db, role_id, path, method).await,
                }
            })
            .await?;

        if removed == 0 {
            return Err(StoreError::NotFound(format!(
                "permission {method} {path} on role {role_id}"
            )));
        }
        tracing::info!(role_id, removed, "Permission removed from role");
        Ok(())
    }

    /// Every entry of `all` the role has not been granted yet, in `all`'s order.
    pub async fn permissions_left(
        &self,
        role_id: i32,
        all: &PermissionSet,
    ) -> Result<PermissionSet, StoreError> {
        let granted = self.permissions_of(role_id).await?;
        Ok(all.difference(&granted))
    }

    pub async fn permissions_of(&self, role_id: i32) -> Result<PermissionSet, StoreError> {
        self.bounded(async {
            let role = entities::Role::find_by_id(role_id)
                .one(&self.db)
                .await?
                .ok_or_else(|| StoreError::NotFound(format!("role {role_id}")))?;
            match self.backend {
                PermissionBackend::Json => Ok(json::to_role(role)?.permissions),
                PermissionBackend::Table => table::permissions_of(&self.db, role.id).await,
            }
        })
        .await
    }

    /// Replaces the admin role's permission set with `all`.
    pub async fn assign_admin_all_permissions(&self, all: &PermissionSet) -> Result<(), StoreError> {
        self.bounded(async {
            match self.backend {
                PermissionBackend::Json => json::overwrite(&self.db, ADMIN_ROLE, all).await,
                PermissionBackend::Table => table::overwrite(&self.db, ADMIN_ROLE, all).await,
            }
        })
        .await
    }

    /// Containment check for the actor's role.
    ///
    /// Guests are checked against the `guest` role only. An authenticated
    /// actor whose user row is missing or has no role is an error, not a deny.
    pub async fn authorized(&self, actor: Actor, permission: &Permission) -> Result<bool, StoreError> {
        self.bounded(async {
            let role_id = match actor {
                Actor::Guest => role_id_by_name(&self.db, GUEST_ROLE).await?,
                Actor::User(user_id) => {
                    let user = entities::User::find_by_id(user_id)
                        .one(&self.db)
                        .await?
                        .ok_or_else(|| StoreError::NotFound(format!("user {user_id}")))?;
                    user.role_id.ok_or(StoreError::NoRole { user_id })?
                }
            };

            match self.backend {
                PermissionBackend::Json => json::contains(&self.db, role_id, permission).await,
                PermissionBackend::Table => table::contains(&self.db, role_id, permission).await,
            }
        })
        .await
    }
}

async fn role_id_by_name(db: &DatabaseConnection, name: &str) -> Result<i32, StoreError> {
    use entities::role::{Column, Entity};

    Entity::find()
        .filter(Column::Name.eq(name))
        .one(db)
        .await?
        .map(|role| role.id)
        .ok_or_else(|| StoreError::NotFound(format!("role {name}")))
}

fn now() -> i64 {
    Utc::now().timestamp()
}
