use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Json,
};
use metrics::{counter, histogram};
use std::sync::Arc;
use std::time::Instant;

use crate::error::{AppError, InferenceError, UploadError};
use crate::model::classifier::{classify, Prediction};
use crate::observability::{INFERENCE_DURATION_SECONDS, PREDICTIONS_TOTAL, UPLOADS_TOTAL};
use crate::server::pages;
use crate::server::types::*;
use crate::uploads::allowed_extension;

pub async fn health_check() -> &'static str {
    "OK"
}

pub async fn index() -> Html<&'static str> {
    Html(pages::INDEX_HTML)
}

pub async fn model_status(State(state): State<Arc<AppState>>) -> (StatusCode, Json<ModelStatus>) {
    match state.classifier {
        Some(_) => (StatusCode::OK, Json(ModelStatus::ok())),
        None => (StatusCode::INTERNAL_SERVER_ERROR, Json(ModelStatus::error())),
    }
}

pub async fn render_metrics(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => handle.render().into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

pub async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Html<String>, AppError> {
    let result = classify_upload(state, multipart).await;

    let outcome = match &result {
        Ok(_) => "classified",
        Err(AppError::Upload(_)) => "rejected",
        Err(AppError::Inference(InferenceError::ModelUnavailable)) => "model_unavailable",
        Err(AppError::Inference(_)) => "failed",
    };
    counter!(UPLOADS_TOTAL, "outcome" => outcome).increment(1);

    let (filename, prediction) = result?;
    tracing::info!(
        %filename,
        label = %prediction.label,
        confidence = prediction.confidence,
        "classified upload"
    );
    counter!(PREDICTIONS_TOTAL, "label" => prediction.label.clone()).increment(1);

    Ok(Html(pages::render_result(&filename, &prediction)))
}

/// Pulls the `file` part out of the form, validates and stores it, then runs
/// the classifier on it.
pub(super) async fn classify_upload(
    state: Arc<AppState>,
    mut multipart: Multipart,
) -> Result<(String, Prediction), AppError> {
    // 1. Extract the file part
    let mut file = None;
    while let Some(field) = multipart.next_field().await.map_err(UploadError::from)? {
        if field.name() == Some("file") {
            // A part without a filename is not a file upload at all.
            let filename = field
                .file_name()
                .ok_or(UploadError::NoFileProvided)?
                .to_string();
            let bytes = field.bytes().await.map_err(UploadError::from)?;
            file = Some((filename, bytes));
            break;
        }
    }
    let (original_name, bytes) = file.ok_or(UploadError::NoFileProvided)?;

    // 2. Validate & store
    let ext = allowed_extension(&original_name)?;
    let filename = state.uploads.save(&ext, &bytes).await?;

    // 3. Inference
    let classifier = state
        .classifier
        .clone()
        .ok_or(InferenceError::ModelUnavailable)?;

    let start = Instant::now();
    let prediction = tokio::task::spawn_blocking(move || {
        classify(classifier.as_ref(), &state.categories, &bytes)
    })
    .await
    .map_err(|e| InferenceError::PredictionFailure(e.to_string()))??;
    histogram!(INFERENCE_DURATION_SECONDS).record(start.elapsed().as_secs_f64());

    Ok((filename, prediction))
}
