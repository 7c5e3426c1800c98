//! Admin authorization gate.
//!
//! A request reaches an admin handler only when its bearer token verifies
//! with the identity provider *and* the token's email is on the configured
//! allow-list. An empty allow-list denies everyone.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::error::ApiError;
use crate::identity::{IdentityError, IdentityProvider};
use crate::observability::metrics;

/// Verified administrator, attached to the request by
/// [`admin_auth_middleware`] and read by handlers via `Extension`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminPrincipal {
    pub uid: String,
    /// Lower-cased, trimmed.
    pub email: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authorization header is required")]
    MissingToken,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Unauthorized: Email verification required")]
    NoVerifiableIdentity,

    #[error("Admin access is not configured")]
    AllowListUnset,

    #[error("Access denied: You do not have administrator privileges")]
    NotAdmin,

    #[error("identity provider unavailable")]
    ProviderUnavailable,
}

impl AuthError {
    fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingToken => "missing_token",
            AuthError::InvalidToken => "invalid_token",
            AuthError::NoVerifiableIdentity => "no_email",
            AuthError::AllowListUnset => "allow_list_unset",
            AuthError::NotAdmin => "not_admin",
            AuthError::ProviderUnavailable => "provider_unavailable",
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingToken => ApiError::Unauthorized("Authorization header is required"),
            AuthError::InvalidToken => ApiError::Unauthorized("Invalid token"),
            AuthError::NoVerifiableIdentity => {
                ApiError::Forbidden("Unauthorized: Email verification required")
            }
            AuthError::AllowListUnset => ApiError::Forbidden("Admin access is not configured"),
            AuthError::NotAdmin => {
                ApiError::Forbidden("Access denied: You do not have administrator privileges")
            }
            AuthError::ProviderUnavailable => ApiError::Internal,
        }
    }
}

/// Administrator emails, normalized once at startup.
#[derive(Debug, Clone, Default)]
pub struct AdminAllowList {
    emails: Vec<String>,
}

impl AdminAllowList {
    /// Parse a comma-separated list. Blank entries are dropped.
    pub fn parse(raw: &str) -> Self {
        let emails = raw
            .split(',')
            .map(normalize_email)
            .filter(|e| !e.is_empty())
            .collect();
        Self { emails }
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn contains(&self, email: &str) -> bool {
        let email = normalize_email(email);
        self.emails.iter().any(|allowed| *allowed == email)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Strip an optional `Bearer ` prefix. `None` when nothing usable remains.
pub fn bearer_token(header: &str) -> Option<&str> {
    let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
    (!token.is_empty()).then_some(token)
}

#[derive(Clone)]
pub struct AdminGate {
    provider: Arc<dyn IdentityProvider>,
    allow_list: Arc<AdminAllowList>,
}

impl AdminGate {
    pub fn new(provider: Arc<dyn IdentityProvider>, allow_list: AdminAllowList) -> Self {
        if allow_list.is_empty() {
            tracing::warn!("Admin allow-list is empty; all admin requests will be denied");
        }
        Self {
            provider,
            allow_list: Arc::new(allow_list),
        }
    }

    /// Decide on the raw `Authorization` header value.
    pub async fn authorize(&self, authorization: Option<&str>) -> Result<AdminPrincipal, AuthError> {
        let token = authorization
            .and_then(bearer_token)
            .ok_or(AuthError::MissingToken)?;

        let claims = self.provider.verify(token).await.map_err(|e| match e {
            IdentityError::Rejected(reason) => {
                tracing::debug!(%reason, "Admin token rejected");
                AuthError::InvalidToken
            }
            IdentityError::Unavailable(reason) => {
                tracing::error!(%reason, "Identity provider unavailable during admin check");
                AuthError::ProviderUnavailable
            }
        })?;

        let email = normalize_email(&claims.email);
        if email.is_empty() {
            tracing::warn!(uid = %claims.uid, "Admin request with no email claim");
            return Err(AuthError::NoVerifiableIdentity);
        }

        if self.allow_list.is_empty() {
            tracing::error!("Admin allow-list is not configured; denying admin request");
            return Err(AuthError::AllowListUnset);
        }

        if !self.allow_list.contains(&email) {
            tracing::warn!(%email, "Access denied: non-admin attempted an admin action");
            return Err(AuthError::NotAdmin);
        }

        Ok(AdminPrincipal {
            uid: claims.uid,
            email,
        })
    }
}

/// Wraps admin routes. On any failure the inner handler never runs.
pub async fn admin_auth_middleware(
    State(gate): State<AdminGate>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .map(str::to_owned);

    match gate.authorize(header.as_deref()).await {
        Ok(principal) => {
            tracing::debug!(uid = %principal.uid, email = %principal.email, "Admin authorized");
            request.extensions_mut().insert(principal);
            next.run(request).await
        }
        Err(err) => {
            metrics::record_admin_denied(err.reason());
            ApiError::from(err).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::VerifiedClaims;
    use async_trait::async_trait;

    /// Accepts `token-<email>`; `down` simulates an outage.
    struct StubProvider;

    #[async_trait]
    impl IdentityProvider for StubProvider {
        async fn verify(&self, token: &str) -> Result<VerifiedClaims, IdentityError> {
            if token == "down" {
                return Err(IdentityError::Unavailable("connection refused".into()));
            }
            let email = token
                .strip_prefix("token-")
                .ok_or_else(|| IdentityError::Rejected("bad signature".into()))?;
            Ok(VerifiedClaims {
                uid: format!("uid-{email}"),
                email: email.to_string(),
                ..VerifiedClaims::default()
            })
        }
    }

    fn gate(allow_list: &str) -> AdminGate {
        AdminGate::new(Arc::new(StubProvider), AdminAllowList::parse(allow_list))
    }

    #[tokio::test]
    async fn allow_list_match_is_case_insensitive() {
        let principal = gate("alice@x.com,bob@x.com")
            .authorize(Some("Bearer token-Alice@X.com"))
            .await
            .unwrap();
        assert_eq!(principal.email, "alice@x.com");
        assert_eq!(principal.uid, "uid-Alice@X.com");
    }

    #[tokio::test]
    async fn allow_list_entries_are_trimmed() {
        let gate = gate(" alice@x.com , BOB@x.com ,");
        assert!(gate.authorize(Some("Bearer token-bob@x.com")).await.is_ok());
    }

    #[tokio::test]
    async fn non_admin_is_forbidden() {
        let err = gate("alice@x.com,bob@x.com")
            .authorize(Some("Bearer token-carol@x.com"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::NotAdmin);
        assert_eq!(ApiError::from(err).status(), axum::http::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn empty_allow_list_fails_closed() {
        for raw in ["", " , ,"] {
            let err = gate(raw)
                .authorize(Some("Bearer token-alice@x.com"))
                .await
                .unwrap_err();
            assert_eq!(err, AuthError::AllowListUnset);
        }
    }

    #[tokio::test]
    async fn missing_email_claim_is_distinct() {
        let err = gate("alice@x.com")
            .authorize(Some("Bearer token-"))
            .await
            .unwrap_err();
        assert_eq!(err, AuthError::NoVerifiableIdentity);
    }

    #[tokio::test]
    async fn token_failures_are_unauthenticated() {
        let gate = gate("alice@x.com");
        assert_eq!(gate.authorize(None).await.unwrap_err(), AuthError::MissingToken);
        assert_eq!(
            gate.authorize(Some("Bearer ")).await.unwrap_err(),
            AuthError::MissingToken
        );
        assert_eq!(
            gate.authorize(Some("Bearer forged")).await.unwrap_err(),
            AuthError::InvalidToken
        );
        assert_eq!(
            gate.authorize(Some("down")).await.unwrap_err(),
            AuthError::ProviderUnavailable
        );
    }

    #[tokio::test]
    async fn prefix_is_optional() {
        assert!(gate("alice@x.com")
            .authorize(Some("token-alice@x.com"))
            .await
            .is_ok());
    }

    #[test]
    fn parses_allow_list() {
        let list = AdminAllowList::parse("alice@x.com,,Bob@X.com ");
        assert_eq!(list.len(), 2);
        assert!(list.contains("BOB@x.com"));
        assert!(!list.contains("carol@x.com"));
    }
}
