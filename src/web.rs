use crate::accounts;
use crate::bootstrap;
use crate::errors::AppError;
use crate::gate;
use crate::identity::{self, Identity};
use crate::notice::Notice;
use crate::permissions::PermissionSet;
use crate::roles::{Role, RoleStore};
use crate::routes::{RouteInventory, RouteRegistry, INTROSPECTION_PATH};
use crate::session::SessionCookie;
use crate::settings::Settings;
use axum::body::Body;
use axum::extract::{Extension, Form, Path, Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Request, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use miette::IntoDiagnostic;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub roles: RoleStore,
    pub inventory: Arc<RouteInventory>,
}

// Security headers middleware
async fn security_headers(request: Request<Body>, next: Next) -> impl IntoResponse {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("DENY"),
    );
    headers.insert(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    response
}

/// Every permission-guarded route. Anything registered here ends up in the
/// route inventory and therefore in the admin role.
pub fn registry() -> RouteRegistry<AppState> {
    RouteRegistry::new()
        .get("/", home)
        .get("/healthcheck", healthcheck)
        .post("/login", login)
        .post("/logout", logout)
        .get("/roles", list_roles)
        .get("/roles/permissions", role_permissions)
        .post("/roles/permissions", add_role_permission)
        .delete("/roles/{id}/permissions", delete_role_permission)
        .post("/users/{id}/ban", ban_user)
}

/// Builds the router and its state. The inventory is captured before the
/// introspection route is mounted, so that route is appended by hand.
pub fn app(settings: Settings, db: DatabaseConnection) -> (Router, AppState) {
    let (router, inventory) = registry().into_parts();

    let roles = RoleStore::new(db, settings.authz.backend, settings.database.op_timeout());
    let state = AppState {
        settings: Arc::new(settings),
        roles,
        inventory: Arc::new(inventory.with_introspection()),
    };

    let router = router
        .route(INTROSPECTION_PATH, get(list_routes))
        .route_layer(middleware::from_fn_with_state(state.clone(), gate::authorize))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), identity::identify))
        .layer(middleware::from_fn(security_headers))
        .with_state(state.clone());

    (router, state)
}

pub async fn serve(settings: Settings, db: DatabaseConnection) -> miette::Result<()> {
    let (router, state) = app(settings, db);

    // Admin must never serve traffic with a stale permission set
    if let Err(e) = bootstrap::reconcile_admin(&state.roles, &state.inventory).await {
        tracing::error!(error = %e, "Failed to grant admin the route inventory");
        std::process::exit(1);
    }

    let addr: SocketAddr = format!(
        "{}:{}",
        state.settings.server.host, state.settings.server.port
    )
    .parse()
    .map_err(|e| miette::miette!("bad listen addr: {e}"))?;

    tracing::info!(%addr, "Forum listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .into_diagnostic()?;
    axum::serve(listener, router).await.into_diagnostic()?;
    Ok(())
}

async fn home(headers: HeaderMap) -> Response {
    let Some(notice) = Notice::from_headers(&headers) else {
        return Html(page("")).into_response();
    };

    let alert = format!(
        "<div class='alert'><strong>{}</strong> {}</div>",
        html_escape(&notice.title),
        html_escape(&notice.text)
    );
    (
        [(SET_COOKIE, Notice::clear_cookie_header())],
        Html(page(&alert)),
    )
        .into_response()
}

fn page(alert: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Agora</title></head>
<body>
{alert}
<h1>Agora</h1>
</body>
</html>"#
    )
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, Html(page("<p>Page not found</p>")))
}

async fn healthcheck() -> impl IntoResponse {
    Json(json!({
        "status": "available",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[derive(Debug, Deserialize)]
struct LoginForm {
    email: String,
    password: String,
}

async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let Some(user) =
        accounts::verify_password(state.roles.db(), &form.email, &form.password).await?
    else {
        tracing::info!(email = %form.email, "Login failed");
        return Ok(gate::deny(&Notice::login_failed()));
    };

    let ttl = state.settings.server.session_ttl_secs;
    let session = accounts::create_session(state.roles.db(), user.id, ttl).await?;
    tracing::info!(user_id = user.id, "User logged in");

    Ok((
        [(SET_COOKIE, SessionCookie::new(session.session_id).to_cookie_header(ttl))],
        Redirect::to("/"),
    )
        .into_response())
}

async fn logout(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> Result<Response, AppError> {
    if let Some(session_id) = identity.session_id {
        accounts::delete_session(state.roles.db(), &session_id).await?;
    }

    Ok((
        [(SET_COOKIE, SessionCookie::delete_cookie_header())],
        Redirect::to("/"),
    )
        .into_response())
}

async fn list_roles(State(state): State<AppState>) -> Result<Json<Vec<Role>>, AppError> {
    Ok(Json(state.roles.list_roles(0).await?))
}

#[derive(Debug, Deserialize)]
struct RolePermissionsQuery {
    #[serde(rename = "roleId")]
    role_id: i32,
    #[serde(default)]
    left: bool,
}

/// `left=true` lists what can still be granted; otherwise the role's own set.
async fn role_permissions(
    State(state): State<AppState>,
    Query(q): Query<RolePermissionsQuery>,
) -> Result<Json<PermissionSet>, AppError> {
    let permissions = if q.left {
        state
            .roles
            .permissions_left(q.role_id, state.inventory.permissions())
            .await?
    } else {
        state.roles.permissions_of(q.role_id).await?
    };
    Ok(Json(permissions))
}

#[derive(Debug, Deserialize)]
struct AddPermissionForm {
    #[serde(rename = "roleId")]
    role_id: i32,
    permission: String,
}

async fn add_role_permission(
    State(state): State<AppState>,
    Form(form): Form<AddPermissionForm>,
) -> Result<Response, AppError> {
    if form.permission.trim().is_empty() {
        return Err(AppError::BadRequest("permission is required".to_string()));
    }
    state
        .roles
        .add_permission(form.role_id, &form.permission)
        .await?;

    Ok((
        StatusCode::OK,
        [(HeaderName::from_static("hx-location"), "/roles")],
    )
        .into_response())
}

#[derive(Debug, Deserialize)]
struct RemovePermissionQuery {
    path: String,
    method: String,
}

async fn delete_role_permission(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Query(q): Query<RemovePermissionQuery>,
) -> Result<StatusCode, AppError> {
    state
        .roles
        .remove_permission(id, &q.path, &q.method)
        .await?;
    Ok(StatusCode::OK)
}

async fn ban_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, AppError> {
    accounts::ban_user(state.roles.db(), id).await?;
    tracing::info!(user_id = id, "User banned");
    Ok(StatusCode::OK)
}

async fn list_routes(State(state): State<AppState>) -> Json<RouteInventory> {
    Json(state.inventory.as_ref().clone())
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
