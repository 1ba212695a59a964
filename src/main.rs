// Main entry point for the image overlay translator

use overlay_translator::{
    core::{types::AppState, Config},
    orchestration::TranslationPipeline,
    server,
    services::{
        ArtifactStore, FontManager, HttpDetector, HttpImageSource, LibreTranslateClient,
        OverlayRenderer, TranslationOrchestrator,
    },
    utils::Metrics,
};

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Arc::new(Config::new().context("Failed to load configuration")?);

    // Initialize logging
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::new(format!(
        "overlay_translator={},tower_http=warn",
        match config.log_level() {
            tracing::Level::TRACE => "trace",
            tracing::Level::DEBUG => "debug",
            tracing::Level::INFO => "info",
            tracing::Level::WARN => "warn",
            tracing::Level::ERROR => "error",
        }
    ));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("=== IMAGE OVERLAY TRANSLATOR ===");
    info!(
        "Config: threshold={:.2} padding={}px target={} concurrency={}",
        config.confidence_threshold(),
        config.detection.box_padding,
        config.default_target_lang(),
        config.translation.concurrency
    );

    let metrics = Metrics::new();

    // Font first: the renderer loads it once and never touches disk again
    let font_manager = FontManager::new(&config.rendering)?;
    font_manager.provision().await;
    let renderer = Arc::new(OverlayRenderer::new(&config.rendering, metrics.clone()));

    let source = Arc::new(HttpImageSource::new(&config.source)?);
    let detector = Arc::new(HttpDetector::new(&config.detection)?);
    let backend = Arc::new(LibreTranslateClient::new(&config.translation)?);
    let translator = Arc::new(TranslationOrchestrator::new(
        backend,
        &config.translation,
        metrics.clone(),
    ));
    let store = Arc::new(ArtifactStore::new(&config.storage)?);

    let pipeline = Arc::new(TranslationPipeline::new(
        config.clone(),
        source,
        detector,
        translator,
        renderer,
        store,
        metrics.clone(),
    ));

    let state = AppState {
        config: config.clone(),
        pipeline,
        metrics,
    };
    let app = server::router(state);

    let addr = format!("{}:{}", config.server_host(), config.server_port());
    info!("{}", "=".repeat(70));
    info!("Server starting on http://{}", addr);
    info!("{}", "-".repeat(70));
    info!("Endpoints:");
    info!("  GET  /              - Root endpoint");
    info!("  GET  /health        - Health check");
    info!("  GET  /metrics       - Prometheus metrics");
    info!("  GET  /stats         - Detailed statistics");
    info!("  POST /translate     - Translate an image (JSON)");
    info!("  GET  /static/<id>   - Stored artifacts");
    info!("{}", "=".repeat(70));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
