use crate::config::ModelConfig;
use crate::error::ProvisionError;
use crate::model::classifier::{Classifier, OnnxClassifier};
use crate::model::loader::{ArtifactLoader, OnnxLoader};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Fetches a remote artifact to a local path.
pub trait ArtifactFetcher {
    /// Downloads `url` to `dest`, returning the number of bytes written.
    fn fetch(&self, url: &str, dest: &Path)
        -> impl Future<Output = Result<u64, ProvisionError>> + Send;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, ProvisionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProvisionError::DownloadFailure(e.to_string()))?;
        Ok(Self { client })
    }
}

fn part_path(dest: &Path) -> PathBuf {
    let mut part = dest.as_os_str().to_owned();
    part.push(".part");
    PathBuf::from(part)
}

impl ArtifactFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, dest: &Path) -> Result<u64, ProvisionError> {
        let download = |e: reqwest::Error| ProvisionError::DownloadFailure(e.to_string());

        let response = self.client.get(url).send().await.map_err(download)?;
        if !response.status().is_success() {
            return Err(ProvisionError::DownloadFailure(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        // Drive answers oversized or rate-limited files with an HTML page.
        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("text/html"));
        if is_html {
            return Err(ProvisionError::DownloadFailure(
                "server returned an HTML page instead of the model".to_string(),
            ));
        }

        let part = part_path(dest);
        let written = match write_part(response, &part).await {
            Ok(written) => written,
            Err(e) => {
                let _ = tokio::fs::remove_file(&part).await;
                return Err(e);
            }
        };
        if let Err(e) = tokio::fs::rename(&part, dest).await {
            let _ = tokio::fs::remove_file(&part).await;
            return Err(ProvisionError::DownloadFailure(e.to_string()));
        }

        Ok(written)
    }
}

/// Streams the response body into `part` chunk by chunk.
async fn write_part(mut response: reqwest::Response, part: &Path) -> Result<u64, ProvisionError> {
    let io = |e: std::io::Error| ProvisionError::DownloadFailure(e.to_string());

    let mut file = tokio::fs::File::create(part).await.map_err(io)?;
    let mut written = 0u64;
    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| ProvisionError::DownloadFailure(e.to_string()))?
    {
        file.write_all(&chunk).await.map_err(io)?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(io)?;

    Ok(written)
}

// A stat error is not "absent"; downloading would overwrite whatever is there.
async fn artifact_exists(path: &Path) -> Result<bool, ProvisionError> {
    tokio::fs::try_exists(path)
        .await
        .map_err(|e| ProvisionError::DownloadFailure(format!("{}: {e}", path.display())))
}

/// Makes sure the artifact at `path` exists and loads.
///
/// A missing artifact is downloaded from `url` once. An empty artifact is
/// rejected without loading. An artifact that fails to load is deleted so the
/// next start downloads it again.
pub async fn ensure_model<F, L>(
    fetcher: &F,
    loader: &L,
    url: &str,
    path: &Path,
) -> Result<L::Model, ProvisionError>
where
    F: ArtifactFetcher,
    L: ArtifactLoader,
{
    let path_str = path.display().to_string();

    if !artifact_exists(path).await? {
        tracing::info!(url, path = %path_str, "downloading model");
        let written = fetcher.fetch(url, path).await?;
        if !artifact_exists(path).await? {
            return Err(ProvisionError::DownloadFailure(
                "model file was not downloaded successfully".to_string(),
            ));
        }
        tracing::info!(bytes = written, "download complete");
    }

    let size = tokio::fs::metadata(path)
        .await
        .map_err(|e| ProvisionError::DownloadFailure(e.to_string()))?
        .len();
    if size == 0 {
        return Err(ProvisionError::EmptyArtifact(path_str));
    }
    tracing::info!(size_mb = size as f64 / (1024.0 * 1024.0), "model file size");

    match loader.load(path) {
        Ok(model) => {
            tracing::info!("model loaded successfully");
            Ok(model)
        }
        Err(e) => {
            match tokio::fs::remove_file(path).await {
                Ok(()) => tracing::warn!(path = %path_str, "removed potentially corrupted model file"),
                Err(rm) => tracing::error!(path = %path_str, error = %rm, "could not remove corrupted model file"),
            }
            Err(ProvisionError::CorruptArtifact {
                path: path_str,
                reason: e.to_string(),
            })
        }
    }
}

async fn provision_onnx(config: &ModelConfig) -> Result<OnnxClassifier, ProvisionError> {
    let fetcher = HttpFetcher::new(Duration::from_secs(config.download_timeout_secs))?;
    let loader = OnnxLoader {
        intra_threads: config.intra_threads,
    };
    ensure_model(&fetcher, &loader, &config.url, &config.path).await
}

/// Startup provisioning with the production fetcher and loader. Any failure
/// is logged and yields `None`; the server still starts without a model.
pub async fn provision(config: &ModelConfig) -> Option<Arc<dyn Classifier>> {
    match provision_onnx(config).await {
        Ok(model) => Some(Arc::new(model) as Arc<dyn Classifier>),
        Err(e) => {
            tracing::error!(error = %e, "error in model setup");
            None
        }
    }
}
