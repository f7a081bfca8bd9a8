use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use pipilica_core::Document;

/// Role stored on a user document.
///
/// Roles are an open set of opaque strings; only [`Role::ADMIN`] carries
/// privilege.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: &'static str = "admin";

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn admin() -> Self {
        Self::new(Self::ADMIN)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_admin(&self) -> bool {
        self.as_str() == Self::ADMIN
    }

    /// Read the `role` field of a user document, if it is a string.
    pub fn of(user: &Document) -> Option<Self> {
        user.get("role")
            .and_then(|v| v.as_str())
            .map(|s| Self::new(s.to_owned()))
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a (possibly missing) user document grants admin privilege.
///
/// Privilege is exactly `role == "admin"`: a missing user, a missing role, a
/// non-string role and any other value are all non-admin.
pub fn is_admin(user: Option<&Document>) -> bool {
    user.and_then(Role::of).is_some_and(|r| r.is_admin())
}
