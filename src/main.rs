use std::time::Duration;
use tokio::net::TcpListener;
use wastenet::{config, model, observability, server, uploads};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Init
    observability::init_tracing(observability::Environment::from_env());
    let metrics = observability::install_metrics()?;
    model::loader::init_ort();

    // 2. Load Config
    let config = config::AppConfig::load(config::AppConfig::path_from_env())?;

    let uploads = uploads::UploadStore::open(&config.uploads.dir)?;
    let _sweeper = uploads.spawn_sweeper(
        Duration::from_secs(config.uploads.retention_secs),
        Duration::from_secs(config.uploads.sweep_interval_secs),
    );

    // 3. Provision the model; failure leaves the server up but unhealthy
    let classifier = model::provisioner::provision(&config.model).await;
    if classifier.is_none() {
        tracing::warn!("model failed to load, /upload will redirect and /model-status reports error");
    }

    // 4. Create Router
    let state = server::types::AppState::new(classifier, uploads).with_metrics(metrics);
    let app = server::routes::create_router(state, config.server.body_limit);

    // 5. Bind & Serve
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
