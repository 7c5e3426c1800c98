//! Shared utilities for integration testing.
//!
//! Each test spawns the real router on an ephemeral port with in-process
//! collaborators: the in-memory store, an identity provider that accepts
//! `token-<email>`, and a mailer that records instead of sending.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::net::TcpListener;

use site_backend::admin::{AdminAllowList, AdminGate};
use site_backend::config::AppConfig;
use site_backend::contact::{ContactPolicy, ContactValidator};
use site_backend::http::{AppState, HttpServer};
use site_backend::identity::{IdentityError, IdentityProvider, VerifiedClaims};
use site_backend::mail::{EmailMessage, MailError, Mailer};
use site_backend::security::SlidingWindowLimiter;
use site_backend::storage::Store;

pub const ADMIN_EMAIL: &str = "admin@example.com";

/// Accepts `token-<email>`; `token-` alone carries no email, `down`
/// simulates a provider outage.
pub struct FakeIdentity;

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn verify(&self, token: &str) -> Result<VerifiedClaims, IdentityError> {
        if token == "down" {
            return Err(IdentityError::Unavailable("connection refused".into()));
        }
        let email = token
            .strip_prefix("token-")
            .ok_or_else(|| IdentityError::Rejected("INVALID_ID_TOKEN".into()))?;
        Ok(VerifiedClaims {
            uid: format!("uid-{email}"),
            email: email.to_string(),
            display_name: Some("Test User".into()),
            photo_url: None,
        })
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
    fail: AtomicBool,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_next(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        if self.fail.swap(false, Ordering::SeqCst) {
            return Err(MailError::Address {
                address: message.from,
                reason: "relay refused".into(),
            });
        }
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

pub struct TestApp {
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    pub mailer: Arc<RecordingMailer>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}/api{}", self.addr, path)
    }

    pub fn admin_token(&self) -> String {
        format!("Bearer token-{ADMIN_EMAIL}")
    }
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.admin.emails = format!("{ADMIN_EMAIL},editor@example.com");
    config.contact.to = "owner@example.com".into();
    config.contact.from = "site@example.com".into();
    config.contact.subject_prefix = "[Site]".into();
    config
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config(), true).await
}

/// `with_mailer = false` mimics a deployment without an SMTP relay.
pub async fn spawn_app_with(config: AppConfig, with_mailer: bool) -> TestApp {
    let mailer = Arc::new(RecordingMailer::default());
    let identity: Arc<dyn IdentityProvider> = Arc::new(FakeIdentity);

    let state = AppState {
        admin: AdminGate::new(identity.clone(), AdminAllowList::parse(&config.admin.emails)),
        limiter: Arc::new(SlidingWindowLimiter::from_config(&config.contact.rate_limit)),
        validator: Arc::new(ContactValidator::new(ContactPolicy::from_config(&config.contact))),
        mailer: with_mailer.then(|| mailer.clone() as Arc<dyn Mailer>),
        store: Store::memory(),
        identity,
        config: Arc::new(config),
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = HttpServer::new(state);

    tokio::spawn(async move {
        let _ = server.run_until(listener, std::future::pending()).await;
    });

    TestApp {
        addr,
        client: reqwest::Client::new(),
        mailer,
    }
}
