use pipilica_auth::VerifiedIdentity;

/// Requester identity attached by the optional-auth middleware.
///
/// Present in the request extensions only when a bearer token was supplied
/// and verified. Handlers extract it as `Option<Extension<VerifiedRequester>>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedRequester {
    email: String,
}

impl VerifiedRequester {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl From<VerifiedIdentity> for VerifiedRequester {
    fn from(identity: VerifiedIdentity) -> Self {
        Self::new(identity.email)
    }
}
