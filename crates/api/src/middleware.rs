use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

use pipilica_auth::{IdentityVerifier, verify_optional};

use crate::context::VerifiedRequester;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn IdentityVerifier>,
}

/// Best-effort bearer authentication.
///
/// Attaches a [`VerifiedRequester`] when the `Authorization` header carries a
/// verifiable bearer token. A missing, malformed or rejected token attaches
/// nothing. The request always continues to the handler.
pub async fn optional_auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_bearer(req.headers()) {
        if let Some(identity) = verify_optional(state.verifier.as_ref(), token).await {
            req.extensions_mut()
                .insert(VerifiedRequester::from(identity));
        }
    }

    next.run(req).await
}

/// Token part of an `Authorization: Bearer <token>` header, if any.
pub fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();

    if token.is_empty() {
        return None;
    }

    Some(token)
}

/// Ensure every request carries an `x-request-id`.
///
/// An upstream value is reused; otherwise a UUID v4 is generated. The id is
/// recorded on the current span and echoed in the response headers.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    Span::current().record("request_id", request_id.as_str());

    let mut response = next.run(request).await;

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}
