use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::admin::auth::bearer_token;
use crate::error::ApiError;
use crate::http::request::ApiJson;
use crate::http::server::AppState;
use crate::identity::{IdentityError, VerifiedClaims};

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VerifyTokenRequest {
    pub id_token: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyTokenResponse {
    pub valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<VerifiedClaims>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: &'static str,
    pub user: VerifiedClaims,
}

fn required_token(request: &VerifyTokenRequest) -> Result<&str, ApiError> {
    let token = request.id_token.trim();
    if token.is_empty() {
        return Err(ApiError::BadRequest("ID token is required".to_string()));
    }
    Ok(token)
}

/// `POST /api/auth/verify`. A rejected token is a normal answer, not an error.
pub async fn verify_token(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VerifyTokenRequest>,
) -> Result<Response, ApiError> {
    let token = required_token(&request)?;

    match state.identity.verify(token).await {
        Ok(user) => Ok(Json(VerifyTokenResponse {
            valid: true,
            user: Some(user),
            error: None,
        })
        .into_response()),
        Err(IdentityError::Rejected(reason)) => {
            tracing::debug!(%reason, "Token verification failed");
            Ok((
                StatusCode::UNAUTHORIZED,
                Json(VerifyTokenResponse {
                    valid: false,
                    user: None,
                    error: Some("Invalid token".to_string()),
                }),
            )
                .into_response())
        }
        Err(err) => Err(err.into()),
    }
}

/// `GET /api/auth/user`.
pub async fn get_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<VerifiedClaims>, ApiError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(bearer_token)
        .ok_or(ApiError::Unauthorized("Authorization header is required"))?;

    Ok(Json(state.identity.verify(token).await?))
}

/// `POST /api/auth/refresh`. Clients refresh tokens themselves; this only
/// confirms the current one still verifies.
pub async fn refresh_token(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<VerifyTokenRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let token = required_token(&request)?;
    let user = state.identity.verify(token).await?;
    Ok(Json(AuthResponse {
        success: true,
        message: "Token is valid",
        user,
    }))
}
