use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    routing::{get, post, put},
    Json, Router,
};

use pipilica_auth::Role;
use pipilica_core::{Document, InsertAck, UpdateAck};
use pipilica_infra::Collection;

use crate::app::dto;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::authz;
use crate::context::VerifiedRequester;
use crate::middleware::{self, AuthState};

pub fn router(auth: AuthState) -> Router {
    Router::new()
        .route("/users", post(create_user).put(upsert_user))
        // The static segment shadows `:email`, so GET is routed here explicitly.
        .route(
            "/users/admin",
            put(make_admin)
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    middleware::optional_auth_middleware,
                ))
                .get(admin_status_of_literal_admin),
        )
        .route("/users/:email", get(admin_status))
}

/// `{admin: true}` iff the user with this email has `role == "admin"`.
pub async fn admin_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(email): Path<String>,
) -> Result<Json<dto::AdminStatus>, ApiError> {
    admin_status_for(&services, &email).await
}

/// `GET /users/admin`: the status of the user whose email is `admin`.
pub async fn admin_status_of_literal_admin(
    Extension(services): Extension<Arc<AppServices>>,
) -> Result<Json<dto::AdminStatus>, ApiError> {
    admin_status_for(&services, "admin").await
}

async fn admin_status_for(
    services: &AppServices,
    email: &str,
) -> Result<Json<dto::AdminStatus>, ApiError> {
    let user = services.find_user_by_email(email).await?;
    Ok(Json(dto::AdminStatus {
        admin: pipilica_auth::is_admin(user.as_ref()),
    }))
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<Document>,
) -> Result<Json<InsertAck>, ApiError> {
    Ok(Json(services.create(Collection::Users, body).await?))
}

/// Upsert keyed on the body's `email`: only submitted fields are written.
pub async fn upsert_user(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<Document>,
) -> Result<Json<UpdateAck>, ApiError> {
    Ok(Json(services.upsert_by_email(Collection::Users, body).await?))
}

/// Promote the user named in the body to admin.
///
/// Requires a verified requester whose own user document is an admin.
/// Anything else is a 403 denial and the target is left untouched.
pub async fn make_admin(
    Extension(services): Extension<Arc<AppServices>>,
    requester: Option<Extension<VerifiedRequester>>,
    Json(body): Json<dto::MakeAdminRequest>,
) -> Result<Json<UpdateAck>, ApiError> {
    let requester = requester.map(|Extension(r)| r);

    if let Err(e) = authz::require_admin(&services, requester.as_ref()).await {
        tracing::info!(error = %e, "admin escalation denied");
        return Err(e.into());
    }

    let mut set = Document::new();
    set.insert(
        "role".to_string(),
        serde_json::Value::String(Role::admin().to_string()),
    );

    let ack = services.set_by_email(Collection::Users, body.email, set).await?;
    tracing::info!(
        granted_by = requester.as_ref().map(VerifiedRequester::email),
        matched = ack.matched_count,
        "admin role granted"
    );
    Ok(Json(ack))
}
