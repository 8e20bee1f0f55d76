pub mod builders;
pub mod db;

pub use builders::UserBuilder;
pub use db::TestDb;

/// Role ids seeded by the migrations
pub const ADMIN_ROLE_ID: i32 = 1;
pub const GUEST_ROLE_ID: i32 = 2;
pub const USER_ROLE_ID: i32 = 3;
