//! Jenkins exporter
//!
//! Polls a Jenkins server in the background and serves the latest results
//! as Prometheus metrics.

use jenkins_exporter::cache::SnapshotCache;
use jenkins_exporter::config::ServerConfig;
use jenkins_exporter::jenkins::JenkinsClient;
use jenkins_exporter::scheduler::Scheduler;
use jenkins_exporter::web::Server;

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env()
            .add_directive("jenkins_exporter=info".parse()?))
        .init();

    // Load configuration
    let cfg = ServerConfig::load();
    tracing::info!(
        "Starting jenkins_exporter {} for {}",
        env!("CARGO_PKG_VERSION"),
        cfg.jenkins_url
    );

    let api = Arc::new(JenkinsClient::new(
        &cfg.jenkins_url,
        &cfg.jenkins_username,
        &cfg.jenkins_password,
        cfg.jenkins_timeout,
    )?);
    let cache = Arc::new(SnapshotCache::new());

    // Start polling
    let scheduler = Arc::new(Scheduler::new(
        api,
        Arc::clone(&cache),
        cfg.run_interval,
        cfg.fetch_concurrency,
    ));
    scheduler.start();

    // Serve until a signal arrives; the poller is stopped before the server.
    let shutdown = {
        let scheduler = Arc::clone(&scheduler);
        async move {
            shutdown_signal().await;
            scheduler.stop().await;
        }
    };

    let server = Server::new(cfg, cache);
    if let Err(e) = server.start(shutdown).await {
        scheduler.stop().await;
        return Err(e);
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, going to shutdown"),
        _ = terminate => tracing::info!("Received SIGTERM, going to shutdown"),
    }
}
