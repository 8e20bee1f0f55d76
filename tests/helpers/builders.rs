use agora::accounts;
use agora::entities;
use sea_orm::DatabaseConnection;

/// Builder for creating test users, optionally with a live session
pub struct UserBuilder {
    name: String,
    password: Option<String>,
    role_id: Option<i32>,
    banned: bool,
}

impl UserBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            password: None,
            role_id: None,
            banned: false,
        }
    }

    pub fn with_role(mut self, role_id: i32) -> Self {
        self.role_id = Some(role_id);
        self
    }

    pub fn with_password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    pub fn banned(mut self) -> Self {
        self.banned = true;
        self
    }

    pub async fn create(self, db: &DatabaseConnection) -> entities::user::Model {
        let email = format!("{}@example.com", self.name);
        let user = accounts::create_user(
            db,
            &self.name,
            &email,
            self.password.as_deref(),
            self.role_id,
        )
        .await
        .expect("Failed to create test user");

        if self.banned {
            accounts::ban_user(db, user.id)
                .await
                .expect("Failed to ban test user");
        }
        user
    }

    /// Creates the user and returns a session id logged in as them
    pub async fn create_with_session(self, db: &DatabaseConnection) -> (entities::user::Model, String) {
        let user = self.create(db).await;
        let session = accounts::create_session(db, user.id, 3600)
            .await
            .expect("Failed to create test session");
        (user, session.session_id)
    }
}
