//! Typed request identity.
//!
//! `identify` resolves the session cookie once per request and stores an
//! [`Identity`] in the request extensions; later middleware and handlers read
//! it from there instead of looking the session up again.

use crate::accounts;
use crate::errors::AppError;
use crate::session::SessionCookie;
use crate::web::AppState;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

/// Who is making the request. Anonymous visitors act as the `guest` role.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Actor {
    #[default]
    Guest,
    User(i32),
}

impl Actor {
    /// Actor id 0 denotes an anonymous visitor.
    pub fn from_id(id: i32) -> Self {
        if id == 0 {
            Actor::Guest
        } else {
            Actor::User(id)
        }
    }

    pub fn id(self) -> i32 {
        match self {
            Actor::Guest => 0,
            Actor::User(id) => id,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Identity {
    pub actor: Actor,
    pub session_id: Option<String>,
}

impl Identity {
    pub fn of(request: &Request) -> Identity {
        request
            .extensions()
            .get::<Identity>()
            .cloned()
            .unwrap_or_default()
    }
}

pub async fn identify(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    let identity = match SessionCookie::from_headers(request.headers()) {
        Some(cookie) => match accounts::session_user(state.roles.db(), &cookie.session_id).await {
            Ok(Some(user_id)) => Identity {
                actor: Actor::User(user_id),
                session_id: Some(cookie.session_id),
            },
            Ok(None) => Identity::default(),
            Err(e) => return AppError::from(e).into_response(),
        },
        None => Identity::default(),
    };

    request.extensions_mut().insert(identity);
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_is_guest() {
        assert_eq!(Actor::from_id(0), Actor::Guest);
        assert_eq!(Actor::from_id(7), Actor::User(7));
        assert_eq!(Actor::User(7).id(), 7);
        assert_eq!(Actor::Guest.id(), 0);
    }
}
