use crate::roles::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use miette::Diagnostic;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum AppError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Store(#[from] StoreError),

    #[error("Bad request: {0}")]
    #[diagnostic(code(agora::bad_request))]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::BadRequest(_) | AppError::Store(StoreError::Serialization(_)) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let not_found = AppError::from(StoreError::NotFound("role 9".into())).into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let no_role = AppError::from(StoreError::NoRole { user_id: 3 }).into_response();
        assert_eq!(no_role.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let timeout =
            AppError::from(StoreError::Timeout(std::time::Duration::from_secs(3))).into_response();
        assert_eq!(timeout.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bad = AppError::BadRequest("roleId".into()).into_response();
        assert_eq!(bad.status(), StatusCode::BAD_REQUEST);
    }
}
