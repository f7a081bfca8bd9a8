use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::VerifyError;

/// ID-token claims the gateway relies on once the signature has been checked.
///
/// Identity providers put many more claims in their tokens; only these are
/// read. Unknown claims are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (provider-side user id).
    pub sub: String,

    /// Email of the signed-in user. Anonymous and phone sign-ins have none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,

    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
}

/// An identity whose token has been verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub subject: String,
    pub email: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenClaims {
    /// Reduce verified claims to the identity the gateway needs.
    pub fn into_identity(self) -> Result<VerifiedIdentity, VerifyError> {
        let email = self
            .email
            .filter(|e| !e.trim().is_empty())
            .ok_or(VerifyError::MissingEmail)?;

        let expires_at = DateTime::<Utc>::from_timestamp(self.exp, 0)
            .ok_or_else(|| VerifyError::InvalidToken("exp out of range".to_string()))?;

        Ok(VerifiedIdentity {
            subject: self.sub,
            email,
            expires_at,
        })
    }
}
