use axum::{
    extract::multipart::MultipartError,
    response::{IntoResponse, Redirect, Response},
};
use ndarray::ShapeError;
use thiserror::Error;

/// Failures while bringing the model artifact up at startup.
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Model download failed: {0}")]
    DownloadFailure(String),

    #[error("Model artifact is empty: {0}")]
    EmptyArtifact(String),

    #[error("Model artifact at {path} could not be loaded: {reason}")]
    CorruptArtifact { path: String, reason: String },
}

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Model not loaded")]
    ModelUnavailable,

    #[error("Model not found at path: {0}")]
    ModelNotFound(String),

    #[error("ONNX Runtime error: {0}")]
    OrtError(#[from] ort::Error),

    #[error("Image processing error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Shape error: {0}")]
    ShapeError(#[from] ShapeError),

    #[error("Prediction failed: {0}")]
    PredictionFailure(String),
}

/// Rejections of the multipart upload itself, before the model is involved.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("No file part in request")]
    NoFileProvided,

    #[error("Uploaded file has an empty filename")]
    EmptyFilename,

    #[error("File extension not allowed: {0}")]
    DisallowedExtension(String),

    #[error("Malformed multipart body: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Failed to store upload: {0}")]
    Storage(#[from] std::io::Error),
}

/// Everything `/upload` can fail with. The browser only ever sees a redirect
/// back to the entry page; the detail goes to the log.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Inference(#[from] InferenceError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Upload(e) => tracing::warn!(error = %e, "upload rejected"),
            AppError::Inference(InferenceError::ModelUnavailable) => {
                tracing::warn!("model not loaded, cannot predict")
            }
            AppError::Inference(e) => tracing::error!(error = %e, "error during prediction"),
        }

        Redirect::to("/").into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, StatusCode};

    #[test]
    fn test_model_not_found_error() {
        let error = InferenceError::ModelNotFound("test_path".to_string());
        assert_eq!(error.to_string(), "Model not found at path: test_path");
    }

    #[test]
    fn test_corrupt_artifact_message() {
        let error = ProvisionError::CorruptArtifact {
            path: "model.onnx".to_string(),
            reason: "bad protobuf".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Model artifact at model.onnx could not be loaded: bad protobuf"
        );
    }

    #[test]
    fn test_disallowed_extension_message() {
        let error = UploadError::DisallowedExtension("gif".to_string());
        assert_eq!(error.to_string(), "File extension not allowed: gif");
    }

    #[test]
    fn test_shape_error_conversion() {
        let shape_error = ShapeError::from_kind(ndarray::ErrorKind::OutOfBounds);
        let inference_error = InferenceError::from(shape_error);
        match inference_error {
            InferenceError::ShapeError(_) => {}
            _ => panic!("Expected ShapeError"),
        }
    }

    #[test]
    fn test_ort_error_conversion() {
        let ort_error = ort::Error::new("test error");
        let inference_error = InferenceError::from(ort_error);
        match inference_error {
            InferenceError::OrtError(_) => {}
            _ => panic!("Expected OrtError"),
        }
    }

    #[test]
    fn test_io_error_becomes_storage() {
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        match UploadError::from(io_error) {
            UploadError::Storage(_) => {}
            _ => panic!("Expected Storage"),
        }
    }

    #[test]
    fn test_every_app_error_redirects_home() {
        let errors = vec![
            AppError::from(UploadError::NoFileProvided),
            AppError::from(UploadError::EmptyFilename),
            AppError::from(UploadError::DisallowedExtension("gif".to_string())),
            AppError::from(InferenceError::ModelUnavailable),
            AppError::from(InferenceError::PredictionFailure("boom".to_string())),
        ];

        for error in errors {
            let response = error.into_response();
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            assert_eq!(response.headers()[header::LOCATION], "/");
        }
    }
}
