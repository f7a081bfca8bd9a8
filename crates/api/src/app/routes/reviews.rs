use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::get,
    Json, Router,
};

use pipilica_core::{Document, InsertAck};
use pipilica_infra::Collection;

use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/reviews", get(list_reviews).post(create_review))
}

pub async fn list_reviews(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<Document>>, ApiError> {
    Ok(Json(services.list(Collection::Reviews).await?))
}

// Reviews answer 200 on create, unlike products and bookings.
pub async fn create_review(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<Document>,
) -> Result<Json<InsertAck>, ApiError> {
    Ok(Json(services.create(Collection::Reviews, body).await?))
}
