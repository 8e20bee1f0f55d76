//! Per-request authorization.
//!
//! Installed as a `route_layer` so the matched route pattern is known. The
//! permission checked is `(pattern, method)`, never the concrete URL: a request
//! for `/roles/3/permissions` is checked as `/roles/{id}/permissions`.
//!
//! Denied requests get `303 See Other` to `/` plus a "Not Authorized" notice
//! cookie. Banned users are sent home with a ban notice; only the home page
//! and logout stay open to them. Storage failures are returned as server
//! errors and are never turned into a denial.

use crate::accounts;
use crate::errors::AppError;
use crate::identity::{Actor, Identity};
use crate::notice::Notice;
use crate::permissions::Permission;
use crate::roles::RoleStore;
use crate::web::AppState;
use axum::extract::{MatchedPath, Request, State};
use axum::http::header::SET_COOKIE;
use axum::http::Method;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Notice),
}

/// Catch-all patterns (`/*`, `/{*rest}`) stand for "not found" and carry no
/// permission semantics.
pub fn is_catch_all(pattern: &str) -> bool {
    let last = pattern.rsplit('/').next().unwrap_or(pattern);
    last.starts_with('*') || last.starts_with("{*")
}

/// Routes a banned user may still reach: the page showing the ban notice and
/// the way out.
const BAN_EXEMPT: [(&str, &str); 2] = [("/", "GET"), ("/logout", "POST")];

fn ban_exempt(pattern: Option<&str>, method: &str) -> bool {
    pattern.is_some_and(|p| {
        BAN_EXEMPT
            .iter()
            .any(|&(path, exempt_method)| path == p && exempt_method == method)
    })
}

pub async fn decide(
    roles: &RoleStore,
    actor: Actor,
    pattern: Option<&str>,
    method: &str,
) -> Result<Decision, AppError> {
    if let Actor::User(user_id) = actor {
        if !ban_exempt(pattern, method) && accounts::is_banned(roles.db(), user_id).await? {
            tracing::info!(user_id, "Banned user turned away");
            return Ok(Decision::Deny(Notice::banned()));
        }
    }

    let Some(pattern) = pattern.filter(|p| !is_catch_all(p)) else {
        return Ok(Decision::Allow);
    };

    let permission = Permission::new(pattern, method);
    if roles.authorized(actor, &permission).await? {
        tracing::debug!(actor = actor.id(), %permission, "Authorized");
        Ok(Decision::Allow)
    } else {
        tracing::info!(actor = actor.id(), %permission, "Not authorized");
        Ok(Decision::Deny(Notice::not_authorized()))
    }
}

/// axum answers HEAD with the GET handler, so HEAD is checked as GET.
fn checked_method(method: &Method) -> &str {
    if *method == Method::HEAD {
        "GET"
    } else {
        method.as_str()
    }
}

pub fn deny(notice: &Notice) -> Response {
    (
        [(SET_COOKIE, notice.to_cookie_header())],
        Redirect::to("/"),
    )
        .into_response()
}

pub async fn authorize(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let actor = Identity::of(&request).actor;
    let pattern = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_owned());
    let method = checked_method(request.method()).to_owned();

    match decide(&state.roles, actor, pattern.as_deref(), &method).await {
        Ok(Decision::Allow) => next.run(request).await,
        Ok(Decision::Deny(notice)) => deny(&notice),
        Err(e) => e.into_response(),
    }
}
