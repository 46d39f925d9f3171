//! HTTP surface: `POST /generate`, static `/media` files and `GET /health`.

use crate::app::App;
use crate::models::{GenerateRequest, Metadata};
use crate::{Error, Result};
use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

#[derive(Clone)]
struct AppState {
    app: Arc<App>,
}

/// Failure that escaped the pipeline. The caller only ever sees a bare 500.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self.0);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}

pub fn router(app: Arc<App>) -> Router {
    let media_root = app.config().media_root.clone();

    Router::new()
        .route("/generate", post(generate_handler))
        .route("/health", get(health_handler))
        .nest_service("/media", ServeDir::new(media_root))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { app })
}

pub async fn start_server(app: App) -> Result<()> {
    let addr = app.config().bind_addr.clone();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API server listening on {}", addr);

    axum::serve(listener, router(Arc::new(app))).await?;
    Ok(())
}

/// Refusals are returned with 200 like approvals; `status` tells them apart.
async fn generate_handler(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> std::result::Result<Json<Metadata>, ApiError> {
    let metadata = state.app.generate(&request).await?;
    match metadata.reason {
        Some(reason) => info!("Request refused: {:?}", reason),
        None => info!("Request approved"),
    }
    Ok(Json(metadata))
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "status": "ok", "mock": state.app.config().mock }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{MockImageGenerationClient, MockReinterpretClient};
    use crate::app::AppServices;
    use crate::models::Config;
    use axum::body::Body;
    use axum::http::Request;
    use std::path::Path;
    use tempfile::tempdir;
    use tower::ServiceExt;

    fn test_router(media_root: &Path, mock: bool, reinterpreter: MockReinterpretClient) -> Router {
        let config = Config {
            openai_api_key: Some("test-key".to_string()),
            mock,
            media_root: media_root.to_path_buf(),
            ..Config::default()
        };
        let app = App::with_services(
            AppServices {
                reinterpreter: Box::new(reinterpreter),
                image_gen: Box::new(MockImageGenerationClient::new()),
            },
            config,
        );
        router(Arc::new(app))
    }

    fn generate_request(body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/generate")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_refusal_is_a_200_with_reason() {
        let dir = tempdir().unwrap();
        let app = test_router(dir.path(), false, MockReinterpretClient::new());

        let response = app
            .oneshot(generate_request(
                json!({ "prompt": "hi", "themes_possibles": ["animals"] }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await,
            json!({ "status": "refused", "reason": "PROMPT_SIZE_INVALID" })
        );
    }

    #[tokio::test]
    async fn test_approved_payload_has_no_visual_description() {
        let dir = tempdir().unwrap();
        let app = test_router(dir.path(), false, MockReinterpretClient::new());

        let response = app
            .oneshot(generate_request(json!({
                "prompt": "un lapin qui saute",
                "themes_possibles": ["animals", "character"]
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "approved");
        assert_eq!(body["theme"], "animals");
        assert!(body.get("visual_description").is_none());
        assert!(body["url_media"]
            .as_str()
            .unwrap()
            .starts_with("/media/images/animals/asset_"));
    }

    #[tokio::test]
    async fn test_bypass_mode_payload() {
        let dir = tempdir().unwrap();
        let app = test_router(dir.path(), true, MockReinterpretClient::new());

        let response = app
            .oneshot(generate_request(json!({
                "prompt": "donne un coup",
                "themes_possibles": []
            })))
            .await
            .unwrap();

        let body = body_json(response).await;
        assert_eq!(body["status"], "approved");
        assert_eq!(body["labels"], json!({ "fr": "mock", "en": "mock", "pt": "mock" }));
        assert!(body["url_media"]
            .as_str()
            .unwrap()
            .ends_with("/media/images/other/mock.png"));
    }

    #[tokio::test]
    async fn test_pipeline_error_is_opaque_500() {
        let dir = tempdir().unwrap();
        let app = test_router(
            dir.path(),
            false,
            MockReinterpretClient::new().with_failure("secret upstream detail"),
        );

        let response = app
            .oneshot(generate_request(json!({
                "prompt": "un chat qui dort",
                "themes_possibles": ["animals"]
            })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"Internal Server Error");
    }

    #[tokio::test]
    async fn test_missing_fields_are_rejected() {
        let dir = tempdir().unwrap();
        let app = test_router(dir.path(), false, MockReinterpretClient::new());

        let response = app
            .oneshot(generate_request(json!({ "prompt": "un chat" })))
            .await
            .unwrap();

        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_media_files_are_served() {
        let dir = tempdir().unwrap();
        let theme_dir = dir.path().join("images").join("animals");
        std::fs::create_dir_all(&theme_dir).unwrap();
        std::fs::write(theme_dir.join("asset_abcdef.png"), b"png-bytes").unwrap();
        let app = test_router(dir.path(), false, MockReinterpretClient::new());

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/media/images/animals/asset_abcdef.png")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"png-bytes");
    }

    #[tokio::test]
    async fn test_health_reports_mock_flag() {
        let dir = tempdir().unwrap();
        let app = test_router(dir.path(), true, MockReinterpretClient::new());

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(body_json(response).await, json!({ "status": "ok", "mock": true }));
    }
}
