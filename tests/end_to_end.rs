// End-to-end: real router and HTTP collaborators against local stub services

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use overlay_translator::{
    core::{types::AppState, Config},
    orchestration::TranslationPipeline,
    server,
    services::{
        ArtifactStore, HttpDetector, HttpImageSource, LibreTranslateClient, OverlayRenderer,
        TranslationOrchestrator,
    },
    utils::Metrics,
};
use serde_json::{json, Value};
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Clone)]
struct Stub {
    png: Arc<Vec<u8>>,
    confidence: f32,
    detector_status: StatusCode,
}

fn source_image() -> RgbImage {
    RgbImage::from_fn(100, 50, |x, y| Rgb([200, (x * 2) as u8, (y * 3) as u8]))
}

fn png_bytes(img: &RgbImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img.clone())
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn stub_image(State(stub): State<Stub>) -> impl IntoResponse {
    ([("content-type", "image/png")], stub.png.as_ref().clone())
}

async fn stub_detect(State(stub): State<Stub>) -> impl IntoResponse {
    if stub.detector_status != StatusCode::OK {
        return (stub.detector_status, "model not loaded").into_response();
    }
    Json(json!([{
        "quad": [[10, 10], [60, 10], [60, 30], [10, 30]],
        "text": "HELLO",
        "confidence": stub.confidence,
    }]))
    .into_response()
}

async fn stub_translate(Json(body): Json<Value>) -> Json<Value> {
    assert_eq!(body["source"], "auto");
    assert_eq!(body["format"], "text");
    Json(json!({ "translatedText": "สวัสดี" }))
}

struct TestApp {
    base: String,
    stub_base: String,
    client: reqwest::Client,
    dir: tempfile::TempDir,
}

async fn start(confidence: f32, detector_status: StatusCode, translator_up: bool) -> TestApp {
    let stub = Stub {
        png: Arc::new(png_bytes(&source_image())),
        confidence,
        detector_status,
    };
    let stub_app = Router::new()
        .route("/image.png", get(stub_image))
        .route("/detect", post(stub_detect))
        .route("/translate", post(stub_translate))
        .with_state(stub);
    let stub_addr = serve(stub_app).await;
    let stub_base = format!("http://{}", stub_addr);

    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.detection.detector_url = format!("{}/detect", stub_base);
    config.translation.api_url = if translator_up {
        format!("{}/translate", stub_base)
    } else {
        // Nothing listens on the discard port
        "http://127.0.0.1:9/translate".to_string()
    };
    config.rendering.font_path = dir.path().join("missing-font.ttf");
    config.storage.static_dir = dir.path().join("static");
    let config = Arc::new(config);

    let metrics = Metrics::new();
    let pipeline = TranslationPipeline::new(
        config.clone(),
        Arc::new(HttpImageSource::new(&config.source).unwrap()),
        Arc::new(HttpDetector::new(&config.detection).unwrap()),
        Arc::new(TranslationOrchestrator::new(
            Arc::new(LibreTranslateClient::new(&config.translation).unwrap()),
            &config.translation,
            metrics.clone(),
        )),
        Arc::new(OverlayRenderer::new(&config.rendering, metrics.clone())),
        Arc::new(ArtifactStore::new(&config.storage).unwrap()),
        metrics.clone(),
    );

    let app = server::router(AppState {
        config,
        pipeline: Arc::new(pipeline),
        metrics,
    });
    let addr = serve(app).await;

    TestApp {
        base: format!("http://{}", addr),
        stub_base,
        client: reqwest::Client::new(),
        dir,
    }
}

impl TestApp {
    async fn translate(&self, body: Value) -> (StatusCode, Value) {
        let response = self
            .client
            .post(format!("{}/translate", self.base))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
        (status, response.json().await.unwrap())
    }

    async fn fetch_artifact(&self, reference: &str) -> RgbImage {
        let response = self.client.get(reference).send().await.unwrap();
        assert!(response.status().is_success(), "artifact not served: {}", reference);
        let bytes = response.bytes().await.unwrap();
        image::load_from_memory(&bytes).unwrap().to_rgb8()
    }
}

fn mean_abs_diff(a: &RgbImage, b: &RgbImage) -> f64 {
    let total: u64 = a
        .as_raw()
        .iter()
        .zip(b.as_raw())
        .map(|(x, y)| u64::from(x.abs_diff(*y)))
        .sum();
    total as f64 / a.as_raw().len() as f64
}

#[tokio::test]
async fn translates_and_serves_artifact() {
    let app = start(0.9, StatusCode::OK, true).await;

    let (status, body) = app
        .translate(json!({
            "image_url": format!("{}/image.png", app.stub_base),
            "target_lang": "th",
        }))
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    let reference = body["artifact_reference"].as_str().unwrap();
    assert!(reference.starts_with(&format!("{}/static/", app.base)));
    assert!(reference.ends_with(".jpg"));
    assert_eq!(body["image_url"], body["artifact_reference"]);
    assert_eq!(body["regions"], 1);
    assert_eq!(body["fallbacks"], 0);

    let artifact = app.fetch_artifact(reference).await;
    assert_eq!(artifact.dimensions(), (100, 50));
    // Inside the box, below the drawn line: mean color of (8,8)-(62,32),
    // which is G = 69, B = 58 for this gradient (source here is G = 24, B = 78)
    let px = artifact.get_pixel(12, 26);
    assert!(px[1].abs_diff(69) < 10, "pixel {:?} not erased", px);
    assert!(px[2].abs_diff(58) < 10, "pixel {:?} not erased", px);
}

#[tokio::test]
async fn low_confidence_region_leaves_image_unchanged() {
    let app = start(0.2, StatusCode::OK, true).await;

    let (status, body) = app
        .translate(json!({ "image_reference": format!("{}/image.png", app.stub_base) }))
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["regions"], 0);

    let artifact = app
        .fetch_artifact(body["artifact_reference"].as_str().unwrap())
        .await;
    // Only JPEG noise separates the artifact from the source
    assert!(mean_abs_diff(&artifact, &source_image()) < 4.0);
}

#[tokio::test]
async fn unreachable_translator_still_succeeds() {
    let app = start(0.9, StatusCode::OK, false).await;

    let (status, body) = app
        .translate(json!({ "image_url": format!("{}/image.png", app.stub_base) }))
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["regions"], 1);
    assert_eq!(body["fallbacks"], 1);
}

#[tokio::test]
async fn missing_image_reference_is_bad_request() {
    let app = start(0.9, StatusCode::OK, true).await;

    let (status, body) = app.translate(json!({ "target_lang": "th" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("image_reference"));
}

#[tokio::test]
async fn detector_failure_is_server_error() {
    let app = start(0.9, StatusCode::SERVICE_UNAVAILABLE, true).await;

    let (status, body) = app
        .translate(json!({ "image_url": format!("{}/image.png", app.stub_base) }))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().starts_with("Text detection failed"));
    assert!(body.get("artifact_reference").is_none());
}

#[tokio::test]
async fn unknown_image_is_server_error() {
    let app = start(0.9, StatusCode::OK, true).await;

    let (status, body) = app
        .translate(json!({ "image_url": format!("{}/nope.png", app.stub_base) }))
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("404"));
}

#[tokio::test]
async fn monitoring_endpoints_respond() {
    let app = start(0.9, StatusCode::OK, true).await;
    app.translate(json!({ "image_url": format!("{}/image.png", app.stub_base) }))
        .await;

    let health: Value = app
        .client
        .get(format!("{}/health", app.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["scalable_font"], false);

    let prometheus = app
        .client
        .get(format!("{}/metrics", app.base))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(prometheus.contains("requests_total {} 1"));
}

#[tokio::test]
async fn static_route_serves_artifacts_only() {
    let app = start(0.9, StatusCode::OK, true).await;
    std::fs::write(app.dir.path().join("static").join("notes.txt"), b"private").unwrap();
    std::fs::write(
        app.dir.path().join("static").join(".0123456789abcdef0123456789abcdef.jpg.part"),
        b"partial",
    )
    .unwrap();

    for path in ["notes.txt", ".0123456789abcdef0123456789abcdef.jpg.part"] {
        let response = app
            .client
            .get(format!("{}/static/{}", app.base, path))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 404, "{} was served", path);
    }
}
