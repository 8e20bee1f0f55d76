pub mod role;
pub mod role_permission;
pub mod session;
pub mod user;

pub use role::Entity as Role;
pub use role_permission::Entity as RolePermission;
pub use session::Entity as Session;
pub use user::Entity as User;
