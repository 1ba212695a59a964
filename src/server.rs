// HTTP surface: translate endpoint, artifact serving and monitoring

use axum::{
    extract::{rejection::JsonRejection, Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::{error, info};

use crate::core::errors::PipelineError;
use crate::core::types::{AppState, ErrorResponse, TranslateRequest, TranslateResponse};
use crate::phases::is_artifact_name;

/// Errors surfaced to HTTP clients as `{"error": "..."}`
#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Pipeline(PipelineError),
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        Self::Pipeline(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Pipeline(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let static_files = Router::new()
        .route_service("/{id}", ServeDir::new(state.pipeline.store().root()))
        .layer(middleware::from_fn(only_artifacts));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route("/stats", get(stats_endpoint))
        .route("/translate", post(translate))
        .nest("/static", static_files)
        .with_state(state)
        .layer(cors)
}

/// Serves stored artifacts only; staging files and stray paths are 404
async fn only_artifacts(request: Request, next: Next) -> Response {
    let name = request.uri().path().trim_start_matches('/');
    if !is_artifact_name(name) {
        return StatusCode::NOT_FOUND.into_response();
    }
    next.run(request).await
}

async fn root() -> &'static str {
    "Image Overlay Translator"
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
        "scalable_font": state.pipeline.renderer().has_scalable_font(),
    }))
}

/// Prometheus metrics endpoint
async fn metrics_endpoint(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.to_prometheus(),
    )
}

/// Detailed statistics endpoint (JSON)
async fn stats_endpoint(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "metrics": state.metrics.snapshot(),
        "artifacts_dir": state.pipeline.store().root().display().to_string(),
        "request_timeout_seconds": state.config.pipeline.request_timeout.as_secs(),
    }))
}

/// Translate the text of one image
///
/// # Request
/// `{"image_reference": "<url>", "target_lang": "th"}`; `image_url` is accepted
/// for `image_reference`, and `target_lang` defaults to the configured language.
///
/// # Response
/// `{"artifact_reference": "<base>/static/<id>", ...}` or `{"error": "..."}`
async fn translate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<TranslateRequest>, JsonRejection>,
) -> Result<Json<TranslateResponse>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;

    let reference = request
        .image_reference
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("No image_reference provided".to_string()))?;
    let target_lang = request
        .target_lang
        .filter(|l| !l.trim().is_empty())
        .unwrap_or_else(|| state.config.default_target_lang().to_string());

    info!("Translate request: {} -> {}", reference, target_lang);

    let output = state
        .pipeline
        .process(&reference, &target_lang)
        .await
        .map_err(|e| {
            error!("Pipeline failed for {}: {}", reference, e);
            ApiError::from(e)
        })?;

    let artifact_reference = format!(
        "{}/static/{}",
        base_url(&state, &headers),
        output.artifact_id
    );

    Ok(Json(TranslateResponse {
        image_url: artifact_reference.clone(),
        artifact_reference,
        fallbacks: output.fallbacks(),
        regions: output.regions.len(),
        artifact_id: output.artifact_id,
    }))
}

/// Public base for artifact references, without a trailing slash
fn base_url(state: &AppState, headers: &HeaderMap) -> String {
    if let Some(base) = &state.config.server.public_base_url {
        return base.clone();
    }

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");

    match headers.get(header::HOST).and_then(|v| v.to_str().ok()) {
        Some(host) => format!("{}://{}", scheme, host),
        None => format!(
            "{}://{}:{}",
            scheme,
            state.config.server_host(),
            state.config.server_port()
        ),
    }
}
