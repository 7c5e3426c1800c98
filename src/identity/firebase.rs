//! Firebase Authentication via the Identity Toolkit REST API.
//!
//! `accounts:lookup` validates the ID token server-side and returns the
//! account it belongs to, which gives both verification and profile claims in
//! one round-trip.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::IdentityConfig;
use crate::identity::{IdentityError, IdentityProvider, VerifiedClaims};

pub struct FirebaseIdentity {
    client: reqwest::Client,
    lookup_url: String,
    api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LookupRequest<'a> {
    id_token: &'a str,
}

#[derive(Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<LookupUser>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupUser {
    local_id: String,
    #[serde(default)]
    email: String,
    display_name: Option<String>,
    photo_url: Option<String>,
}

impl FirebaseIdentity {
    pub fn from_config(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        if config.api_key.is_empty() {
            tracing::warn!("identity.api_key is empty; every token will be rejected");
        }

        Ok(Self {
            client,
            lookup_url: format!(
                "{}/v1/accounts:lookup",
                config.endpoint.trim_end_matches('/')
            ),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn verify(&self, token: &str) -> Result<VerifiedClaims, IdentityError> {
        let response = self
            .client
            .post(&self.lookup_url)
            .query(&[("key", self.api_key.as_str())])
            .json(&LookupRequest { id_token: token })
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        let status = response.status();
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(IdentityError::Unavailable(format!("status {status}")));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body));
        }

        let lookup: LookupResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        let user = lookup
            .users
            .into_iter()
            .next()
            .ok_or_else(|| IdentityError::Rejected("no account for token".to_string()))?;

        Ok(VerifiedClaims {
            uid: user.local_id,
            email: user.email,
            display_name: user.display_name,
            photo_url: user.photo_url,
        })
    }
}

/// A bad project key fails every lookup, so it is an outage rather than a
/// verdict on the caller's token.
fn classify_failure(status: StatusCode, body: &str) -> IdentityError {
    let key_problem = ["API_KEY_INVALID", "API key not valid", "missing a valid API key"]
        .iter()
        .any(|marker| body.contains(marker));

    if key_problem {
        tracing::warn!(%status, "Identity Toolkit refused the configured API key");
        return IdentityError::Unavailable(format!("status {status}: api key refused"));
    }
    IdentityError::Rejected(format!("status {status}: {body}"))
}
