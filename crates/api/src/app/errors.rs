use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use pipilica_core::DocumentId;
use pipilica_infra::StoreError;

/// Message returned whenever admin escalation is refused.
pub const ADMIN_DENIED_MESSAGE: &str = "No Access to Make Admin";

/// Handler-boundary error. Every variant becomes an explicit response.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("invalid id: {0}")]
    InvalidId(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("No Access to Make Admin")]
    AdminDenied,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
            ApiError::AdminDenied => (
                StatusCode::FORBIDDEN,
                axum::Json(json!({ "message": ADMIN_DENIED_MESSAGE })),
            )
                .into_response(),
            ApiError::Store(e) => store_error_to_response(e),
        }
    }
}

pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    match err {
        StoreError::DuplicateKey(msg) => json_error(StatusCode::CONFLICT, "duplicate_key", msg),
        StoreError::InvalidDocument(msg) => {
            json_error(StatusCode::BAD_REQUEST, "invalid_document", msg)
        }
        StoreError::UnsupportedId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        e @ StoreError::ImmutableField(_) => {
            json_error(StatusCode::BAD_REQUEST, "immutable_field", e.to_string())
        }
        StoreError::Backend(msg) => {
            tracing::error!(error = %msg, "document store operation failed");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", msg)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn parse_id(raw: &str) -> Result<DocumentId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::InvalidId(format!("'{raw}' is not a valid document id")))
}
