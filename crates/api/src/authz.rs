//! Admin guard for privilege escalation.
//!
//! Checked at the handler boundary, before the target user is touched.

use thiserror::Error;

use pipilica_infra::StoreError;

use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::VerifiedRequester;

#[derive(Debug, Error)]
pub enum AdminAuthzError {
    #[error("no verified requester")]
    Unauthenticated,

    #[error("requester '{0}' is not an admin")]
    NotAdmin(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<AdminAuthzError> for ApiError {
    fn from(err: AdminAuthzError) -> Self {
        match err {
            AdminAuthzError::Unauthenticated | AdminAuthzError::NotAdmin(_) => ApiError::AdminDenied,
            AdminAuthzError::Store(e) => ApiError::Store(e),
        }
    }
}

/// Succeeds only when the requester is verified and their user document has
/// `role == "admin"`. An unauthenticated request never reaches the store.
pub async fn require_admin(
    services: &AppServices,
    requester: Option<&VerifiedRequester>,
) -> Result<(), AdminAuthzError> {
    let requester = requester.ok_or(AdminAuthzError::Unauthenticated)?;

    let user = services.find_user_by_email(requester.email()).await?;
    if pipilica_auth::is_admin(user.as_ref()) {
        return Ok(());
    }

    Err(AdminAuthzError::NotAdmin(requester.email().to_string()))
}
