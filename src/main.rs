//! Content site backend.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ /api/contact ──▶ screen ──▶ rate limit ──▶ validate ──▶ mail
//!                         │
//!                         ├──────────▶ /api/{content} GET ──▶ storage
//!                         │
//!                         └──────────▶ /api/{content} write ──▶ admin gate ──▶ storage
//!                                                                   │
//!                                                                   ▼
//!                                                           identity provider
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use site_backend::admin::{AdminAllowList, AdminGate};
use site_backend::config::{load_config, AppConfig, StorageBackend};
use site_backend::contact::{ContactPolicy, ContactValidator};
use site_backend::http::{AppState, HttpServer};
use site_backend::identity::{FirebaseIdentity, IdentityProvider};
use site_backend::mail::{Mailer, SmtpMailer};
use site_backend::observability::{logging, metrics};
use site_backend::security::SlidingWindowLimiter;
use site_backend::storage::{PgStore, Store};

#[derive(Parser)]
#[command(name = "site-backend")]
#[command(about = "REST backend for the content site", long_about = None)]
struct Cli {
    /// TOML configuration file. Environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address, overriding `server.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.server.bind_address = bind;
    }

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "site-backend starting");

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let state = build_state(config).await?;
    let bind_address = state.config.server.bind_address.clone();

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    HttpServer::new(state).run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn build_state(config: AppConfig) -> Result<AppState, Box<dyn std::error::Error>> {
    let store = match config.storage.backend {
        StorageBackend::Postgres => {
            let pg = PgStore::connect(&config.storage).await?;
            pg.ensure_schema().await?;
            Store::postgres(pg)
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; content is lost on restart");
            Store::memory()
        }
    };

    let identity: Arc<dyn IdentityProvider> = Arc::new(FirebaseIdentity::from_config(&config.identity)?);
    let allow_list = AdminAllowList::parse(&config.admin.emails);
    let admins = allow_list.len();
    let admin = AdminGate::new(identity.clone(), allow_list);

    let mailer: Option<Arc<dyn Mailer>> = if config.smtp.is_configured() {
        Some(Arc::new(SmtpMailer::from_config(&config.smtp)?))
    } else {
        tracing::warn!("smtp.host is not set; contact form submissions will fail");
        None
    };

    let limiter = Arc::new(SlidingWindowLimiter::from_config(&config.contact.rate_limit));
    let validator = Arc::new(ContactValidator::new(ContactPolicy::from_config(&config.contact)));

    tracing::info!(
        backend = ?config.storage.backend,
        admins,
        rate_limit = config.contact.rate_limit.limit,
        window_secs = config.contact.rate_limit.window_secs,
        "Configuration loaded"
    );

    Ok(AppState {
        config: Arc::new(config),
        store,
        identity,
        admin,
        limiter,
        validator,
        mailer,
    })
}
