use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const UPLOADS_TOTAL: &str = "uploads_total";
pub const PREDICTIONS_TOTAL: &str = "predictions_total";
pub const INFERENCE_DURATION_SECONDS: &str = "inference_duration_seconds";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    /// Reads `ENVIRONMENT`; anything other than `production`/`prod` is development.
    pub fn from_env() -> Self {
        Self::parse(&std::env::var("ENVIRONMENT").unwrap_or_default())
    }

    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }
}

/// Installs the global tracing subscriber. `RUST_LOG` filters, default `info`.
/// Production logs are JSON lines.
pub fn init_tracing(environment: Environment) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    match environment {
        Environment::Production => registry
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        Environment::Development => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}

/// Installs the Prometheus recorder behind the `metrics` macros.
pub fn install_metrics() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    metrics::describe_counter!(UPLOADS_TOTAL, "Upload requests by outcome");
    metrics::describe_counter!(PREDICTIONS_TOTAL, "Successful predictions by label");
    metrics::describe_histogram!(
        INFERENCE_DURATION_SECONDS,
        metrics::Unit::Seconds,
        "Preprocessing plus forward pass time"
    );
    Ok(handle)
}
