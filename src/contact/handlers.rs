//! `POST /api/contact`.

use std::fmt::Write as _;
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, State};
use axum::http::{header::USER_AGENT, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, SecondsFormat, Utc};

use crate::config::ContactConfig;
use crate::contact::types::{ContactResponse, ContactSubmission};
use crate::contact::validator::Screening;
use crate::error::ApiError;
use crate::http::request::ApiJson;
use crate::http::server::AppState;
use crate::mail::EmailMessage;
use crate::observability::metrics;
use crate::security::headers::client_ip;

const DEFAULT_SUBJECT: &str = "New contact message";

fn reply(status: StatusCode, body: ContactResponse) -> Response {
    (status, Json(body)).into_response()
}

pub async fn submit(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Result<ApiJson<ContactSubmission>, ApiError>,
) -> Response {
    let Ok(ApiJson(submission)) = body else {
        metrics::record_contact("invalid_body");
        return reply(
            StatusCode::BAD_REQUEST,
            ContactResponse::failed("Invalid request body"),
        );
    };

    let contact = &state.config.contact;
    let ip = client_ip(&headers, peer, contact.trust_forwarded_for);
    let now = Utc::now();

    match state.validator.screen(&submission, now) {
        Ok(Screening::Bot) => {
            tracing::info!(%ip, "Honeypot triggered; pretending success");
            metrics::record_contact("honeypot");
            return reply(StatusCode::OK, ContactResponse::ok("Message sent"));
        }
        Ok(Screening::Proceed) => {}
        Err(rejection) => {
            tracing::info!(%ip, reason = rejection.reason(), "Contact submission failed timing check");
            metrics::record_contact(rejection.reason());
            return reply(
                StatusCode::BAD_REQUEST,
                ContactResponse::failed(rejection.to_string()),
            );
        }
    }

    if !state.limiter.allow(&ip) {
        tracing::warn!(%ip, "Contact rate limit exceeded");
        metrics::record_contact("rate_limited");
        return reply(
            StatusCode::TOO_MANY_REQUESTS,
            ContactResponse::failed("Too many requests. Please try again later."),
        );
    }

    if let Err(rejection) = state.validator.validate(&submission) {
        tracing::debug!(%ip, reason = rejection.reason(), "Contact submission rejected");
        metrics::record_contact(rejection.reason());
        return reply(
            StatusCode::BAD_REQUEST,
            ContactResponse::failed(rejection.to_string()),
        );
    }

    let mailer = match &state.mailer {
        Some(mailer) if !contact.to.trim().is_empty() && !contact.from.trim().is_empty() => mailer,
        _ => {
            tracing::error!("Contact email is not configured (smtp.host, contact.to, contact.from)");
            metrics::record_contact("not_configured");
            return reply(
                StatusCode::INTERNAL_SERVER_ERROR,
                ContactResponse::failed("Server not configured for contact email"),
            );
        }
    };

    let user_agent = headers.get(USER_AGENT).and_then(|v| v.to_str().ok());
    let message = compose(contact, &submission, &ip, user_agent, now);

    if let Err(err) = mailer.send(message).await {
        tracing::error!(error = %err, %ip, "Failed to send contact email");
        metrics::record_contact("send_failed");
        return reply(
            StatusCode::INTERNAL_SERVER_ERROR,
            ContactResponse::failed("Failed to send message. Please try again later."),
        );
    }

    tracing::info!(%ip, "Contact message delivered");
    metrics::record_contact("sent");
    reply(StatusCode::OK, ContactResponse::ok("Message sent! Thank you."))
}

/// Build the outbound message for an accepted submission.
pub fn compose(
    contact: &ContactConfig,
    submission: &ContactSubmission,
    ip: &str,
    user_agent: Option<&str>,
    now: DateTime<Utc>,
) -> EmailMessage {
    let email = submission.email.trim();
    let subject = submission.subject.trim();

    let mut full_subject = if subject.is_empty() {
        DEFAULT_SUBJECT.to_string()
    } else {
        subject.to_string()
    };
    let prefix = contact.subject_prefix.trim();
    if !prefix.is_empty() {
        full_subject = format!("{prefix} {full_subject}");
    }

    EmailMessage {
        from: contact.from.trim().to_string(),
        to: vec![contact.to.trim().to_string()],
        reply_to: Some(email.to_string()),
        subject: full_subject,
        text_body: body(submission, ip, user_agent, now),
    }
}

fn body(
    submission: &ContactSubmission,
    ip: &str,
    user_agent: Option<&str>,
    now: DateTime<Utc>,
) -> String {
    let mut b = String::new();
    // Writing into a String cannot fail.
    let _ = writeln!(b, "{DEFAULT_SUBJECT}\n");
    let _ = writeln!(b, "Name: {}", submission.name.trim());
    let _ = writeln!(b, "Email: {}", submission.email.trim());
    let subject = submission.subject.trim();
    if !subject.is_empty() {
        let _ = writeln!(b, "Subject: {subject}");
    }
    let _ = writeln!(b, "\nMessage:\n{}", submission.message.trim());
    let _ = writeln!(b, "\n---");
    let _ = writeln!(b, "IP: {ip}");
    if let Some(ua) = user_agent.map(str::trim).filter(|ua| !ua.is_empty()) {
        let _ = writeln!(b, "User-Agent: {ua}");
    }
    let _ = writeln!(b, "Time: {}", now.to_rfc3339_opts(SecondsFormat::Secs, true));
    b
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn submission() -> ContactSubmission {
        ContactSubmission {
            name: " Ada ".into(),
            email: "ada@example.com ".into(),
            subject: String::new(),
            message: "  Hello there, engines!  ".into(),
            ..ContactSubmission::default()
        }
    }

    fn config() -> ContactConfig {
        ContactConfig {
            to: "owner@example.com".into(),
            from: "site@example.com".into(),
            ..ContactConfig::default()
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn default_subject_and_reply_to() {
        let message = compose(&config(), &submission(), "203.0.113.7", None, now());
        assert_eq!(message.subject, "New contact message");
        assert_eq!(message.reply_to.as_deref(), Some("ada@example.com"));
        assert_eq!(message.to, vec!["owner@example.com".to_string()]);
        assert_eq!(message.from, "site@example.com");
    }

    #[test]
    fn prefix_is_joined_with_a_space() {
        let config = ContactConfig {
            subject_prefix: " [Site] ".into(),
            ..config()
        };
        let sub = ContactSubmission {
            subject: " Collaboration ".into(),
            ..submission()
        };
        assert_eq!(
            compose(&config, &sub, "ip", None, now()).subject,
            "[Site] Collaboration"
        );
    }

    #[test]
    fn body_lists_fields_and_footer() {
        let message = compose(&config(), &submission(), "203.0.113.7", Some("curl/8.0"), now());
        let expected = "New contact message\n\n\
                        Name: Ada\n\
                        Email: ada@example.com\n\
                        \nMessage:\nHello there, engines!\n\
                        \n---\n\
                        IP: 203.0.113.7\n\
                        User-Agent: curl/8.0\n\
                        Time: 2026-03-01T12:00:00Z\n";
        assert_eq!(message.text_body, expected);
    }

    #[test]
    fn subject_line_only_when_present() {
        let sub = ContactSubmission {
            subject: "Engines".into(),
            ..submission()
        };
        let body = compose(&config(), &sub, "ip", None, now()).text_body;
        assert!(body.contains("Subject: Engines\n"));
        assert!(!body.contains("User-Agent"));
    }
}
