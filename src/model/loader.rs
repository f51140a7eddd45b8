use crate::error::InferenceError;
use crate::model::classifier::OnnxClassifier;
use ort::session::{builder::GraphOptimizationLevel, Session};
use std::path::Path;

// Initialize the global environment for ORT (only needed once)
pub fn init_ort() {
    // Idempotent; a second commit is a no-op.
    let _ = ort::init().with_name("wastenet").commit();
}

/// Turns an artifact on disk into something that can run forward passes.
pub trait ArtifactLoader {
    type Model;

    fn load(&self, path: &Path) -> Result<Self::Model, InferenceError>;
}

/// Loads ONNX artifacts through ONNX Runtime.
#[derive(Debug, Clone)]
pub struct OnnxLoader {
    pub intra_threads: usize,
}

impl Default for OnnxLoader {
    fn default() -> Self {
        Self { intra_threads: 4 }
    }
}

impl ArtifactLoader for OnnxLoader {
    type Model = OnnxClassifier;

    fn load(&self, path: &Path) -> Result<OnnxClassifier, InferenceError> {
        let session = load_model(path, self.intra_threads)?;
        OnnxClassifier::new(session)
    }
}

// Builder steps may hand back a builder-carrying error; keep only the message.
fn ort_error<E: Into<ort::Error>>(e: E) -> InferenceError {
    InferenceError::OrtError(e.into())
}

/// Loads an ONNX model from disk and creates an inference session.
///
/// # Arguments
/// * `model_path` - Path to the .onnx file
/// * `intra_threads` - Parallelism within an op
pub fn load_model(
    model_path: impl AsRef<Path>,
    intra_threads: usize,
) -> Result<Session, InferenceError> {
    let path = model_path.as_ref();
    if !path.exists() {
        return Err(InferenceError::ModelNotFound(path.display().to_string()));
    }

    let session = Session::builder()?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(ort_error)?
        .with_intra_threads(intra_threads)
        .map_err(ort_error)?
        .commit_from_file(path)?;

    tracing::info!(path = %path.display(), "loaded model");
    for (i, input) in session.inputs.iter().enumerate() {
        tracing::debug!(index = i, name = %input.name, ty = ?input.input_type, "model input");
    }

    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_model_nonexistent_file() {
        let result = load_model("nonexistent_model.onnx", 1);
        match result {
            Err(InferenceError::ModelNotFound(_)) => {}
            _ => panic!("Expected ModelNotFound error"),
        }
    }

    #[test]
    fn test_loader_rejects_garbage() {
        init_ort();
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"definitely not a protobuf graph").unwrap();

        let result = OnnxLoader { intra_threads: 1 }.load(file.path());
        assert!(result.is_err());
    }
}
