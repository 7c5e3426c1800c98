//! Response shapes shared by the content routes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// 201 with the stored record as body.
pub fn created<T: Serialize>(value: T) -> Response {
    (StatusCode::CREATED, Json(value)).into_response()
}

/// 204, used for update, delete and reorder.
pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}
