//! Identity verification contract.

use async_trait::async_trait;
use thiserror::Error;

use crate::VerifiedIdentity;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("token has expired")]
    Expired,

    #[error("token header has no key id")]
    MissingKeyId,

    #[error("no signing key with id '{0}'")]
    UnknownKeyId(String),

    #[error("failed to fetch signing keys: {0}")]
    KeyFetch(String),

    #[error("token has no email claim")]
    MissingEmail,

    #[error("invalid token: {0}")]
    InvalidToken(String),
}

impl From<jsonwebtoken::errors::Error> for VerifyError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::InvalidToken(err.to_string()),
        }
    }
}

/// Turns a bearer token into a verified identity.
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, VerifyError>;
}

/// Best-effort verification: any failure becomes `None`.
///
/// Failures are logged at debug level and never propagated.
pub async fn verify_optional(
    verifier: &dyn IdentityVerifier,
    token: &str,
) -> Option<VerifiedIdentity> {
    match verifier.verify(token).await {
        Ok(identity) => Some(identity),
        Err(e) => {
            tracing::debug!(error = %e, "bearer token rejected; continuing unauthenticated");
            None
        }
    }
}
