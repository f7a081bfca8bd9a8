//! HTTP application wiring (Axum router + service wiring).
//!
//! - `services.rs`: document store and identity verifier construction
//! - `routes/`: HTTP routes + handlers (one file per collection)
//! - `dto.rs`: request/response bodies that are not raw documents
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{body::Body, http::Request, routing::get, Extension, Router};
use pipilica_auth::IdentityVerifier;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{self, AuthState};

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

use services::AppServices;

/// Build the full HTTP router (public entrypoint used by `main.rs` and tests).
pub fn build_app(services: AppServices, verifier: Arc<dyn IdentityVerifier>) -> Router {
    let auth_state = AuthState { verifier };

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router(auth_state))
        .layer(Extension(Arc::new(services)))
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                        tracing::info_span!(
                            "http_request",
                            method = %req.method(),
                            uri = %req.uri(),
                            request_id = tracing::field::Empty,
                        )
                    }),
                )
                .layer(axum::middleware::from_fn(middleware::request_id_middleware))
                .layer(CorsLayer::permissive()),
        )
}
