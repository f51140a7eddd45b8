use crate::model::classifier::Classifier;
use crate::model::labels::CategoryMap;
use crate::uploads::UploadStore;
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Shared Application State
///
/// Built once in `main` and handed to every handler; the classifier is `None`
/// when provisioning failed.
#[derive(Clone)]
pub struct AppState {
    pub classifier: Option<Arc<dyn Classifier>>,
    pub categories: CategoryMap,
    pub uploads: UploadStore,
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(classifier: Option<Arc<dyn Classifier>>, uploads: UploadStore) -> Self {
        Self {
            classifier,
            categories: CategoryMap::new(),
            uploads,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct ModelStatus {
    pub status: String,
    pub message: String,
}

impl ModelStatus {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            message: "Model loaded successfully".to_string(),
        }
    }

    pub fn error() -> Self {
        Self {
            status: "error".to_string(),
            message: "Model not loaded".to_string(),
        }
    }
}
