#[cfg(test)]
mod end_to_end_tests {
    use crate::{
        config::{AppConfig, ModelConfig},
        error::ProvisionError,
        model::classifier::tests::{png_bytes, FixedClassifier},
        model::provisioner::{provision, ArtifactFetcher, HttpFetcher},
        server::{routes, types::AppState},
        uploads::UploadStore,
    };
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        response::Html,
        routing::get,
        Router,
    };
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::net::TcpListener;
    use tower::ServiceExt;

    /// Serves a fake artifact and a fake Drive interstitial on a random port.
    async fn spawn_artifact_server() -> String {
        let app = Router::new()
            .route("/model.onnx", get(|| async { "not an onnx graph" }))
            .route(
                "/interstitial",
                get(|| async { Html("<html>Google Drive can't scan this file</html>") }),
            )
            .route(
                "/missing",
                get(|| async { (StatusCode::NOT_FOUND, "gone") }),
            );

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn model_config(url: String, path: std::path::PathBuf) -> ModelConfig {
        ModelConfig {
            url,
            path,
            download_timeout_secs: 5,
            intra_threads: 1,
        }
    }

    #[tokio::test]
    async fn test_http_fetcher_writes_artifact() {
        let base = spawn_artifact_server().await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("model.onnx");

        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        let written = fetcher
            .fetch(&format!("{base}/model.onnx"), &dest)
            .await
            .unwrap();

        assert_eq!(written, "not an onnx graph".len() as u64);
        assert_eq!(std::fs::read(&dest).unwrap(), b"not an onnx graph");
        assert!(!dir.path().join("model.onnx.part").exists());
    }

    #[tokio::test]
    async fn test_http_fetcher_rejects_html_and_errors() {
        let base = spawn_artifact_server().await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("model.onnx");
        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();

        for route in ["interstitial", "missing"] {
            let result = fetcher.fetch(&format!("{base}/{route}"), &dest).await;
            assert!(matches!(result, Err(ProvisionError::DownloadFailure(_))));
            assert!(!dest.exists());
        }
    }

    #[tokio::test]
    async fn test_http_fetcher_cleans_up_part_file_on_failed_rename() {
        let base = spawn_artifact_server().await;
        let dir = tempfile::tempdir().unwrap();
        // A non-empty directory in the way makes the final rename fail.
        let dest = dir.path().join("model.onnx");
        std::fs::create_dir(&dest).unwrap();
        std::fs::write(dest.join("keep"), b"x").unwrap();

        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        let result = fetcher.fetch(&format!("{base}/model.onnx"), &dest).await;

        assert!(matches!(result, Err(ProvisionError::DownloadFailure(_))));
        assert!(!dir.path().join("model.onnx.part").exists());
        assert!(dest.join("keep").exists());
    }

    #[tokio::test]
    async fn test_http_fetcher_into_missing_directory_fails_cleanly() {
        let base = spawn_artifact_server().await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("absent").join("model.onnx");

        let fetcher = HttpFetcher::new(Duration::from_secs(5)).unwrap();
        let result = fetcher.fetch(&format!("{base}/model.onnx"), &dest).await;

        assert!(matches!(result, Err(ProvisionError::DownloadFailure(_))));
        assert!(!dir.path().join("absent").exists());
    }

    #[tokio::test]
    async fn test_downloaded_corrupt_artifact_is_removed() {
        crate::model::loader::init_ort();
        let base = spawn_artifact_server().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");

        let classifier = provision(&model_config(format!("{base}/model.onnx"), path.clone())).await;

        assert!(classifier.is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_unreachable_url_leaves_no_model() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");

        let classifier = provision(&model_config(
            "http://127.0.0.1:9/model.onnx".to_string(),
            path.clone(),
        ))
        .await;

        assert!(classifier.is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_empty_artifact_is_kept_and_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"").unwrap();

        let classifier = provision(&model_config(
            "http://127.0.0.1:9/model.onnx".to_string(),
            path.clone(),
        ))
        .await;

        assert!(classifier.is_none());
        // Only a load failure deletes the artifact.
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_failed_provisioning_keeps_server_up() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::default();
        let uploads = UploadStore::open(dir.path().join("uploads")).unwrap();
        let app = routes::create_router(AppState::new(None, uploads), config.server.body_limit);

        let status = app
            .clone()
            .oneshot(Request::get("/model-status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(status.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let index = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(index.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_repeated_uploads_are_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = UploadStore::open(dir.path()).unwrap();
        let app = routes::create_router(
            AppState::new(Some(Arc::new(FixedClassifier::winning(21))), uploads),
            1024 * 1024,
        );

        let mut pages = Vec::new();
        for _ in 0..2 {
            let boundary = "b0undary";
            let mut body = format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"shoe.jpg\"\r\n\r\n"
            )
            .into_bytes();
            body.extend_from_slice(&png_bytes());
            body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

            let request = Request::post("/upload")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let html = axum::body::to_bytes(response.into_body(), usize::MAX)
                .await
                .unwrap();
            let html = String::from_utf8(html.to_vec()).unwrap();
            // Drop the per-upload file name before comparing.
            let verdict: Vec<&str> = html
                .lines()
                .filter(|l| !l.contains("/static/uploads/"))
                .collect();
            pages.push(verdict.join("\n"));
        }

        assert_eq!(pages[0], pages[1]);
        assert!(pages[0].contains("<strong>shoes</strong>"));
    }
}
