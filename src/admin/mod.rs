pub mod auth;
pub mod handlers;

use axum::{
    routing::{get, post},
    Router,
};

use self::handlers::*;
use crate::http::server::AppState;

pub use auth::{admin_auth_middleware, AdminAllowList, AdminGate, AdminPrincipal, AuthError};

/// Token helpers for the admin UI. Open to any caller; they gate nothing.
pub fn setup_auth_router() -> Router<AppState> {
    Router::new()
        .route("/auth/verify", post(verify_token))
        .route("/auth/user", get(get_user))
        .route("/auth/refresh", post(refresh_token))
}
