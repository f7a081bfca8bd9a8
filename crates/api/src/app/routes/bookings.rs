use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    routing::{delete, get, put},
    Json, Router,
};

use pipilica_core::{DeleteAck, Document, InsertAck, UpdateAck};
use pipilica_infra::Collection;

use crate::app::dto;
use crate::app::errors::{self, ApiError};
use crate::app::services::AppServices;
use crate::context::VerifiedRequester;
use crate::middleware::{self, AuthState};

pub fn router(auth: AuthState) -> Router {
    Router::new()
        .route("/allBookings", get(list_all_bookings))
        .route(
            "/bookings",
            get(list_bookings_by_email)
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    middleware::optional_auth_middleware,
                ))
                .post(create_booking),
        )
        .route("/bookings/deleteBooking/:id", delete(delete_booking))
        .route("/bookings/updateBooking/:id", put(update_booking_status))
}

pub async fn list_all_bookings(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<Vec<Document>>, ApiError> {
    Ok(Json(services.list(Collection::Bookings).await?))
}

/// Bookings whose `email` equals the `email` query parameter.
///
/// The verified requester is logged but not enforced: any caller may list any
/// email's bookings.
pub async fn list_bookings_by_email(
    Extension(services): Extension<Arc<AppServices>>,
    requester: Option<Extension<VerifiedRequester>>,
    Query(query): Query<dto::BookingsQuery>,
) -> Result<Json<Vec<Document>>, ApiError> {
    tracing::debug!(
        requester = requester.as_ref().map(|Extension(r)| r.email()),
        email = query.email.as_deref(),
        "listing bookings by email"
    );
    Ok(Json(
        services
            .list_by_email(Collection::Bookings, query.email)
            .await?,
    ))
}

pub async fn create_booking(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<Document>,
) -> Result<(StatusCode, Json<InsertAck>), ApiError> {
    let ack = services.create(Collection::Bookings, body).await?;
    Ok((StatusCode::CREATED, Json(ack)))
}

pub async fn delete_booking(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> Result<Json<DeleteAck>, ApiError> {
    let id = errors::parse_id(&id)?;
    Ok(Json(services.delete_by_id(Collection::Bookings, id).await?))
}

/// `$set {status}` on one booking. Status values are not validated.
pub async fn update_booking_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateBookingRequest>,
) -> Result<(StatusCode, Json<UpdateAck>), ApiError> {
    let id = errors::parse_id(&id)?;

    let mut set = Document::new();
    set.insert("status".to_string(), body.status);

    let ack = services.update_by_id(Collection::Bookings, id, set).await?;
    Ok((StatusCode::CREATED, Json(ack)))
}
