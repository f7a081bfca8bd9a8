//! Shared-secret (HS256) token verifier for local development and tests.

use async_trait::async_trait;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};

use crate::{IdentityVerifier, TokenClaims, VerifiedIdentity, VerifyError};

pub struct Hs256Verifier {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256Verifier {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            key: DecodingKey::from_secret(secret.as_ref()),
            validation,
        }
    }
}

impl core::fmt::Debug for Hs256Verifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hs256Verifier").finish_non_exhaustive()
    }
}

#[async_trait]
impl IdentityVerifier for Hs256Verifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, VerifyError> {
        let data = jsonwebtoken::decode::<TokenClaims>(token, &self.key, &self.validation)?;
        data.claims.into_identity()
    }
}
