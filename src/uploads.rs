use crate::error::UploadError;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tokio::task::JoinHandle;

pub const ALLOWED_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// Lower-cased extension of `filename` if it is one we accept.
pub fn allowed_extension(filename: &str) -> Result<String, UploadError> {
    if filename.is_empty() {
        return Err(UploadError::EmptyFilename);
    }

    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .ok_or_else(|| UploadError::DisallowedExtension(String::new()))?;

    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(UploadError::DisallowedExtension(ext))
    }
}

/// Directory holding uploaded images under generated names.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    /// Opens the store, creating `dir` if needed.
    pub fn open(dir: impl Into<PathBuf>) -> std::io::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `bytes` as `<uuid>.<ext>` and returns the generated file name.
    pub async fn save(&self, ext: &str, bytes: &[u8]) -> Result<String, UploadError> {
        let filename = format!("{}.{}", uuid::Uuid::new_v4().simple(), ext);
        tokio::fs::write(self.dir.join(&filename), bytes).await?;
        tracing::debug!(%filename, size = bytes.len(), "stored upload");
        Ok(filename)
    }

    /// Deletes regular files whose last modification is at least `max_age` ago.
    /// Returns how many were removed.
    pub async fn sweep(&self, max_age: Duration) -> std::io::Result<usize> {
        let now = SystemTime::now();
        let mut removed = 0;
        let mut entries = tokio::fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let age = metadata
                .modified()
                .ok()
                .and_then(|m| now.duration_since(m).ok())
                .unwrap_or_default();
            if age >= max_age {
                match tokio::fs::remove_file(entry.path()).await {
                    Ok(()) => removed += 1,
                    Err(e) => {
                        tracing::warn!(path = %entry.path().display(), error = %e, "failed to remove upload")
                    }
                }
            }
        }

        Ok(removed)
    }

    /// Runs [`UploadStore::sweep`] every `interval`. A zero `retention` keeps
    /// uploads forever and no task is started. A zero `interval` cannot be
    /// scheduled, so it starts nothing either.
    pub fn spawn_sweeper(&self, retention: Duration, interval: Duration) -> Option<JoinHandle<()>> {
        if retention.is_zero() {
            tracing::info!("upload retention disabled, uploads are kept");
            return None;
        }
        if interval.is_zero() {
            tracing::warn!(
                retention_secs = retention.as_secs(),
                "upload sweep interval is zero, sweeper not started and uploads are kept"
            );
            return None;
        }

        let store = self.clone();
        Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                match store.sweep(retention).await {
                    Ok(0) => {}
                    Ok(n) => tracing::info!(removed = n, "swept expired uploads"),
                    Err(e) => tracing::warn!(error = %e, "upload sweep failed"),
                }
            }
        }))
    }
}
