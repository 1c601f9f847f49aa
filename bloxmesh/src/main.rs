#![deny(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

mod config;
mod error;
mod routes;
mod state;

use bloxmesh_core::{
    audit::{AuditSink, DiscordAuditor, NoopAuditor},
    suspensions::{FailurePolicy, Sweeper},
};
use bloxmesh_database::{Database, DocumentStore, MemoryStore, PostgresStore};
use bloxmesh_roblox::{GroupMembership, RobloxClient};
use std::{error::Error, net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{config::Config, state::AppState};

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!(err = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(err = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    tracing::info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bloxmesh=info,bloxmesh_core=info,tower_http=info".into()),
        )
        .init();

    let config = Config::load()?;

    let store: Arc<dyn DocumentStore> = if let Some(url) = &config.database.url {
        let store = PostgresStore::connect(url, config.database.max_connections).await?;
        tracing::info!("connected to postgres");
        Arc::new(store)
    } else {
        tracing::warn!("no database url configured, automation documents are kept in memory");
        Arc::new(MemoryStore::new())
    };
    let database = Database::new(store);

    if config.roblox.cookie.is_empty() {
        tracing::warn!("no roblox cookie configured, role changes will be rejected");
    }
    let roblox: Arc<dyn GroupMembership> = Arc::new(RobloxClient::new(
        &config.roblox.cookie,
        config.roblox.proxy_url.clone(),
        Duration::from_secs(config.roblox.timeout_secs),
    )?);

    let audit: Arc<dyn AuditSink> = match config.audit.webhook_url.as_deref() {
        Some(url) => {
            if let Some(auditor) = DiscordAuditor::from_url(url) {
                Arc::new(auditor)
            } else {
                tracing::warn!("audit webhook url is not a discord webhook, audit logs are disabled");
                Arc::new(NoopAuditor)
            }
        }
        None => Arc::new(NoopAuditor),
    };

    let policy = if config.sweeper.retain_failed_restores {
        FailurePolicy::Retain
    } else {
        FailurePolicy::Drop
    };
    let sweeper = Sweeper::new(roblox.clone(), database.clone(), audit.clone(), policy);
    let sweeper_handle = config.sweeper.enabled.then(|| {
        let interval = Duration::from_secs(config.sweeper.interval_secs.max(1));
        tracing::info!(interval = ?interval, "starting suspension sweeper");
        sweeper.clone().spawn(interval)
    });

    let state = AppState {
        roblox,
        database,
        audit,
        sweeper,
        cron_secret: config.cron.secret.as_deref().map(Into::into),
    };
    let app = routes::router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Some(handle) = sweeper_handle {
        handle.shutdown().await;
    }
    Ok(())
}
