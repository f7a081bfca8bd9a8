//! Firebase ID-token verifier.
//!
//! Tokens are RS256 JWTs signed by Google's `securetoken` service account.
//! The signing keys rotate, so the published JWKS is fetched on first use and
//! re-fetched when a token names a key id that is not in the current set.
//! Re-fetches happen at most once per [`MIN_REFRESH_INTERVAL`], successful or
//! not, and only one runs at a time.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use tokio::sync::RwLock;

use crate::{IdentityVerifier, TokenClaims, VerifiedIdentity, VerifyError};

/// Google's JWKS endpoint for Firebase Auth ID tokens.
pub const FIREBASE_JWKS_URL: &str =
    "https://www.googleapis.com/service_accounts/v1/jwk/securetoken@system.gserviceaccount.com";

/// Minimum time between two key fetches.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

struct KeyCache {
    keys: JwkSet,
    fetched_at: Option<Instant>,
}

impl KeyCache {
    fn decoding_key(&self, kid: &str) -> Option<Result<DecodingKey, VerifyError>> {
        self.keys
            .find(kid)
            .map(|jwk| DecodingKey::from_jwk(jwk).map_err(VerifyError::from))
    }

    fn refreshed_recently(&self) -> bool {
        self.fetched_at
            .is_some_and(|at| at.elapsed() < MIN_REFRESH_INTERVAL)
    }
}

pub struct FirebaseVerifier {
    project_id: String,
    jwks_url: String,
    http: reqwest::Client,
    cache: RwLock<KeyCache>,
}

impl FirebaseVerifier {
    pub fn new(project_id: impl Into<String>) -> Self {
        Self::with_jwks_url(project_id, FIREBASE_JWKS_URL)
    }

    pub fn with_jwks_url(project_id: impl Into<String>, jwks_url: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            jwks_url: jwks_url.into(),
            http: reqwest::Client::new(),
            cache: RwLock::new(KeyCache {
                keys: JwkSet { keys: Vec::new() },
                fetched_at: None,
            }),
        }
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    fn issuer(&self) -> String {
        format!("https://securetoken.google.com/{}", self.project_id)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_audience(&[self.project_id.as_str()]);
        validation.set_issuer(&[self.issuer()]);
        validation.set_required_spec_claims(&["exp", "sub", "aud", "iss"]);
        validation
    }

    async fn decoding_key(&self, kid: &str) -> Result<DecodingKey, VerifyError> {
        if let Some(key) = self.cache.read().await.decoding_key(kid) {
            return key;
        }

        // Holding the write lock across the fetch serialises refreshes.
        let mut cache = self.cache.write().await;
        if let Some(key) = cache.decoding_key(kid) {
            return key;
        }
        if cache.refreshed_recently() {
            return Err(VerifyError::UnknownKeyId(kid.to_string()));
        }

        cache.fetched_at = Some(Instant::now());
        cache.keys = self.fetch_keys().await?;

        cache
            .decoding_key(kid)
            .unwrap_or_else(|| Err(VerifyError::UnknownKeyId(kid.to_string())))
    }

    async fn fetch_keys(&self) -> Result<JwkSet, VerifyError> {
        tracing::debug!(url = %self.jwks_url, "fetching identity provider signing keys");

        self.http
            .get(&self.jwks_url)
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(|e| VerifyError::KeyFetch(e.to_string()))?
            .json()
            .await
            .map_err(|e| VerifyError::KeyFetch(e.to_string()))
    }
}

impl core::fmt::Debug for FirebaseVerifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("FirebaseVerifier")
            .field("project_id", &self.project_id)
            .field("jwks_url", &self.jwks_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl IdentityVerifier for FirebaseVerifier {
    async fn verify(&self, token: &str) -> Result<VerifiedIdentity, VerifyError> {
        let header = jsonwebtoken::decode_header(token)?;
        if header.alg != Algorithm::RS256 {
            return Err(VerifyError::InvalidToken(format!(
                "unexpected algorithm {:?}",
                header.alg
            )));
        }
        let kid = header.kid.ok_or(VerifyError::MissingKeyId)?;

        let key = self.decoding_key(&kid).await?;
        let data = jsonwebtoken::decode::<TokenClaims>(token, &key, &self.validation())?;
        data.claims.into_identity()
    }
}
