use sea_orm_migration::prelude::*;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::m20250301_000001_roles_users_sessions::{RolePermissions, Roles};

#[derive(DeriveMigrationName)]
pub struct Migration;

const ADMIN_ID: i32 = 1;
const GUEST_ID: i32 = 2;
const USER_ID: i32 = 3;

/// Anonymous visitors may open the home page and log in; members may open the
/// home page and log out. Everything else is granted by an admin.
const GUEST_GRANTS: &[(&str, &str)] = &[("/", "GET"), ("/login", "POST")];
const USER_GRANTS: &[(&str, &str)] = &[("/", "GET"), ("/logout", "POST")];

fn to_json(grants: &[(&str, &str)]) -> String {
    let items: Vec<String> = grants
        .iter()
        .map(|(path, method)| format!(r#"{{"path":"{path}","method":"{method}"}}"#))
        .collect();
    format!("[{}]", items.join(","))
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();

        let mut roles = Query::insert();
        roles.into_table(Roles::Table).columns([
            Roles::Id,
            Roles::Name,
            Roles::Permissions,
            Roles::CreatedAt,
            Roles::UpdatedAt,
        ]);
        for (id, name, permissions) in [
            (ADMIN_ID, "admin", "[]".to_string()),
            (GUEST_ID, "guest", to_json(GUEST_GRANTS)),
            (USER_ID, "user", to_json(USER_GRANTS)),
        ] {
            roles
                .values([
                    id.into(),
                    name.into(),
                    permissions.into(),
                    now.into(),
                    now.into(),
                ])
                .map_err(|e| DbErr::Custom(e.to_string()))?;
        }
        manager.exec_stmt(roles).await?;

        let mut grants = Query::insert();
        grants.into_table(RolePermissions::Table).columns([
            RolePermissions::RoleId,
            RolePermissions::Path,
            RolePermissions::Method,
        ]);
        for (role_id, role_grants) in [(GUEST_ID, GUEST_GRANTS), (USER_ID, USER_GRANTS)] {
            for (path, method) in role_grants {
                grants
                    .values([role_id.into(), (*path).into(), (*method).into()])
                    .map_err(|e| DbErr::Custom(e.to_string()))?;
            }
        }
        manager.exec_stmt(grants).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .exec_stmt(Query::delete().from_table(RolePermissions::Table).to_owned())
            .await?;
        manager
            .exec_stmt(Query::delete().from_table(Roles::Table).to_owned())
            .await
    }
}
