//! Header hygiene and client identification.
//!
//! Anything that ends up in an outbound mail header passes through here.
//! `X-Forwarded-For` is only honoured when explicitly trusted by config.

use std::net::SocketAddr;

use axum::http::HeaderMap;

/// True when `value` could break out of a header line.
pub fn contains_crlf(value: &str) -> bool {
    value.contains(['\r', '\n'])
}

/// Replace CR/LF with spaces and trim. An empty result becomes `"Message"`
/// so a header is never emitted without content.
pub fn sanitize_header(value: &str) -> String {
    let cleaned = value.trim().replace(['\r', '\n'], " ");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        "Message".to_string()
    } else {
        cleaned.to_string()
    }
}

/// Normalize every line ending in a message body to `\n`, so a stray `\r`
/// cannot be interpreted as a line break by the relay.
pub fn normalize_body(body: &str) -> String {
    body.replace("\r\n", "\n").replace('\r', "\n")
}

/// Identifier used for per-client rate limiting.
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr, trust_forwarded_for: bool) -> String {
    if trust_forwarded_for {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| !v.is_empty());
        if let Some(ip) = forwarded {
            return ip.to_string();
        }
    }
    peer.ip().to_string()
}
