use crate::roles::{RoleStore, StoreError};
use crate::routes::RouteInventory;

/// Grants the admin role exactly the routes this binary exposes.
///
/// Overwrites rather than merges, so anything granted to admin outside the
/// inventory is dropped on every start. Must finish before the listener binds.
pub async fn reconcile_admin(roles: &RoleStore, inventory: &RouteInventory) -> Result<(), StoreError> {
    roles
        .assign_admin_all_permissions(inventory.permissions())
        .await?;
    tracing::info!(
        routes = inventory.len(),
        backend = ?roles.backend(),
        "Admin role reconciled with route inventory"
    );
    Ok(())
}
