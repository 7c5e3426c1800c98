//! Request extraction and correlation.
//!
//! # Responsibilities
//! - Decode JSON bodies and path ids with `ApiError` rejections so framework
//!   rejection text never reaches clients
//! - Stamp every request with an `x-request-id` (UUID v4) and echo it back
//!
//! # Design Decisions
//! - An incoming `x-request-id` is kept as-is for end-to-end tracing

use axum::extract::{FromRequest, FromRequestParts};
use axum::http::HeaderName;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};

use crate::error::ApiError;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// `axum::Json` with a generic 400 on malformed input.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Path` answering "Invalid id" when the segment does not parse.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiError))]
pub struct ApiPath<T>(pub T);

pub fn set_request_id_layer() -> SetRequestIdLayer<MakeRequestUuid> {
    SetRequestIdLayer::new(X_REQUEST_ID, MakeRequestUuid)
}

pub fn propagate_request_id_layer() -> PropagateRequestIdLayer {
    PropagateRequestIdLayer::new(X_REQUEST_ID)
}
