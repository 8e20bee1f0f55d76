//! Users, password credentials and login sessions.

use crate::entities;
use crate::roles::StoreError;
use base64ct::Encoding;
use chrono::Utc;
use rand::RngCore;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

/// Creates a user. Without a password the account exists but cannot log in.
pub async fn create_user(
    db: &DatabaseConnection,
    name: &str,
    email: &str,
    password: Option<&str>,
    role_id: Option<i32>,
) -> Result<entities::user::Model, StoreError> {
    use argon2::password_hash::SaltString;
    use argon2::{Argon2, PasswordHasher};

    let password_hash = match password {
        Some(password) => {
            let salt = SaltString::generate(&mut rand::rngs::OsRng);
            Argon2::default()
                .hash_password(password.as_bytes(), &salt)
                .map_err(|e| StoreError::Credentials(format!("password hashing failed: {e}")))?
                .to_string()
        }
        None => String::new(),
    };

    let user = entities::user::ActiveModel {
        name: Set(name.to_string()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        role_id: Set(role_id),
        banned: Set(0),
        created_at: Set(Utc::now().timestamp()),
        ..Default::default()
    };

    Ok(user.insert(db).await?)
}

pub async fn ban_user(db: &DatabaseConnection, user_id: i32) -> Result<(), StoreError> {
    use entities::user::{Column, Entity};

    let result = Entity::update_many()
        .col_expr(Column::Banned, sea_orm::sea_query::Expr::value(1))
        .filter(Column::Id.eq(user_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(StoreError::NotFound(format!("user {user_id}")));
    }
    Ok(())
}

/// Returns the user owning `email` when `password` matches its stored hash.
pub async fn verify_password(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> Result<Option<entities::user::Model>, StoreError> {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};
    use entities::user::{Column, Entity};

    let user = match Entity::find().filter(Column::Email.eq(email)).one(db).await? {
        Some(u) if !u.password_hash.is_empty() => u,
        _ => return Ok(None),
    };

    let parsed_hash = PasswordHash::new(&user.password_hash)
        .map_err(|e| StoreError::Credentials(format!("invalid password hash: {e}")))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
    {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

/// A missing user is not banned; the permission check reports it instead.
pub async fn is_banned(db: &DatabaseConnection, user_id: i32) -> Result<bool, StoreError> {
    Ok(entities::User::find_by_id(user_id)
        .one(db)
        .await?
        .is_some_and(|user| user.banned != 0))
}

pub async fn create_session(
    db: &DatabaseConnection,
    user_id: i32,
    ttl_secs: i64,
) -> Result<entities::session::Model, StoreError> {
    let now = Utc::now().timestamp();
    let session = entities::session::ActiveModel {
        session_id: Set(random_id()),
        user_id: Set(user_id),
        created_at: Set(now),
        expires_at: Set(now + ttl_secs),
    };

    Ok(session.insert(db).await?)
}

/// Resolves a live session to its user id; expired sessions resolve to nothing.
pub async fn session_user(
    db: &DatabaseConnection,
    session_id: &str,
) -> Result<Option<i32>, StoreError> {
    use entities::session::{Column, Entity};

    let Some(model) = Entity::find()
        .filter(Column::SessionId.eq(session_id))
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    if Utc::now().timestamp() > model.expires_at {
        return Ok(None);
    }
    Ok(Some(model.user_id))
}

pub async fn delete_session(db: &DatabaseConnection, session_id: &str) -> Result<(), StoreError> {
    use entities::session::{Column, Entity};

    Entity::delete_many()
        .filter(Column::SessionId.eq(session_id))
        .exec(db)
        .await?;

    Ok(())
}

fn random_id() -> String {
    let mut bytes = [0u8; 24];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64ct::Base64UrlUnpadded::encode_string(&bytes)
}
