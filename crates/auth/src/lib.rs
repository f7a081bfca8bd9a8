//! `pipilica-auth`: identity verification and role checks.
//!
//! This crate is decoupled from HTTP and storage: it turns bearer tokens into
//! verified identities and decides privilege from a user document's `role`.

pub mod claims;
pub mod firebase;
pub mod hs256;
pub mod roles;
pub mod verifier;

pub use claims::{TokenClaims, VerifiedIdentity};
pub use firebase::FirebaseVerifier;
pub use hs256::Hs256Verifier;
pub use roles::{Role, is_admin};
pub use verifier::{IdentityVerifier, VerifyError, verify_optional};
