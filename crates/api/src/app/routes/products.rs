use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};

use pipilica_core::{DeleteAck, Document, InsertAck};
use pipilica_infra::Collection;

use crate::app::errors::{self, ApiError};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/:id", get(get_product))
        .route("/products/deleteProduct/:id", delete(delete_product))
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<Document>>, ApiError> {
    Ok(Json(services.list(Collection::Products).await?))
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<Document>,
) -> Result<(StatusCode, Json<InsertAck>), ApiError> {
    let ack = services.create(Collection::Products, body).await?;
    Ok((StatusCode::CREATED, Json(ack)))
}

/// Unknown ids answer `200 null`, never 404.
pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<Option<Document>>, ApiError> {
    let id = errors::parse_id(&id)?;
    Ok(Json(services.get_by_id(Collection::Products, id).await?))
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<DeleteAck>), ApiError> {
    let id = errors::parse_id(&id)?;
    let ack = services.delete_by_id(Collection::Products, id).await?;
    tracing::debug!(%id, deleted = ack.deleted_count, "product delete");
    Ok((StatusCode::CREATED, Json(ack)))
}
