use std::sync::Arc;

use clap::Parser;
use markstash::config::{Cli, Config, default_config_dir, default_config_path};
use markstash::db::Database;
use markstash::handler::AppState;
use markstash::identity::IdentityVerifier;
use markstash::routes::app;
use markstash::s3::ObjectStorage;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let args = Cli::parse();

    // --config puts data (database, replica state) next to the config file;
    // otherwise both live in ~/.markstash/
    let (config_path, data_dir) = match args.config_path {
        Some(path) => {
            let path = std::path::PathBuf::from(path);
            let dir = path
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_else(|| std::path::PathBuf::from("."));
            (path, dir)
        }
        None => (default_config_path(), default_config_dir()),
    };

    if let Err(e) = std::fs::create_dir_all(&data_dir) {
        eprintln!("failed to create data directory {:?}: {}", data_dir, e);
        std::process::exit(1);
    }

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    tracing::info!("markstash.svc starting");

    let cfg = Config::new(&config_path.to_string_lossy()).unwrap_or_else(|e| {
        tracing::error!(error = %e, path = ?config_path, "failed to load config file");
        std::process::exit(1);
    });
    let db = Arc::new(Database::new(&cfg, &data_dir).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup database");
        std::process::exit(1);
    }));
    let s3 = Arc::new(ObjectStorage::new(&cfg).await.unwrap_or_else(|e| {
        tracing::error!(error = %markstash::unpack_error(&e), "failed to setup object storage");
        std::process::exit(1);
    }));

    if cfg.auth.jwt_secret().is_none() {
        tracing::warn!("no auth.jwt_secret configured, bearer tokens are decoded without verification");
    }
    let state = AppState::new(db.clone(), s3, IdentityVerifier::new(cfg.auth.jwt_secret()));

    let address = format!("0.0.0.0:{}", cfg.app.get_port());
    let cancellation_token = CancellationToken::new();

    // Periodic replica sync; a no-op for plain local databases.
    if Database::is_replica(&cfg.app.turso_url, &cfg.app.turso_auth_token) {
        let sync_db = db.clone();
        let sync_token = cancellation_token.clone();
        let every = std::time::Duration::from_secs(cfg.app.sync_interval_seconds);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        if let Err(e) = sync_db.sync().await {
                            tracing::warn!("failed to sync database replica: {}", e);
                        }
                    }
                    _ = sync_token.cancelled() => {
                        tracing::info!("replica sync task shutting down");
                        break;
                    }
                }
            }
        });
    }

    let shutdown_token = cancellation_token.clone();
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl+c");
            return;
        }
        tracing::info!("ctrl+c signal received, preparing to shutdown");
        shutdown_token.cancel();
    });

    let listener = tokio::net::TcpListener::bind(&address).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup tcp listener");
        std::process::exit(1);
    });

    tracing::info!("markstash.svc running on {}", &address);
    let serve = axum::serve(listener, app(state))
        .with_graceful_shutdown(async move { cancellation_token.cancelled().await });
    if let Err(err) = serve.await {
        tracing::error!(error = %err, "server exited with error");
        std::process::exit(1);
    }

    if let Err(e) = db.sync().await {
        tracing::warn!("final replica sync failed: {}", e);
    }
    tracing::info!("markstash.svc going off, graceful shutdown complete");
}
