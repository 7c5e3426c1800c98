//! Identity provider seam.
//!
//! Token verification is delegated entirely to an external service. Nothing
//! here caches results or retries; one failure is one answer.

pub mod firebase;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

pub use firebase::FirebaseIdentity;

/// Claims returned for a token the provider accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedClaims {
    /// Provider-unique subject identifier.
    pub uid: String,
    /// Empty when the account carries no email.
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(rename = "photoURL", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    /// The provider answered and refused the token.
    #[error("token rejected: {0}")]
    Rejected(String),

    /// The provider could not be reached or failed internally.
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify(&self, token: &str) -> Result<VerifiedClaims, IdentityError>;
}
