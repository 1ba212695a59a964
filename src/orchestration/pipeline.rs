// Pipeline coordinator: fetch, detect, then erase/translate/draw each region

use futures::stream::{self, StreamExt};
use image::RgbImage;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::Instant as Deadline;
use tracing::{debug, info, instrument, warn};

use crate::core::config::Config;
use crate::core::errors::{PipelineResult, TranslationError};
use crate::core::types::{
    BoundingBox, DetectedRegion, FillColor, GenerationTime, OutputArtifact, TranslatedRegion,
};
use crate::phases::{artifact_name, erase_region, filter_regions, sample_fill_color};
use crate::services::{
    ArtifactStore, ImageSource, OverlayRenderer, TextDetector, TranslationOrchestrator,
    TranslationOutcome,
};
use crate::utils::Metrics;

/// Annotated raster for one image, before naming and persistence
#[derive(Debug)]
pub struct Annotation {
    pub raster: RgbImage,
    /// Drawn regions in reading order
    pub regions: Vec<TranslatedRegion>,
    pub filtered_out: usize,
    /// Survivors whose box collapsed to zero area
    pub skipped: usize,
}

/// Result of a successful pipeline run
#[derive(Debug)]
pub struct PipelineOutput {
    pub artifact_id: String,
    pub regions: Vec<TranslatedRegion>,
    pub filtered_out: usize,
    pub skipped: usize,
}

impl PipelineOutput {
    pub fn fallbacks(&self) -> usize {
        self.regions.iter().filter(|r| r.is_fallback()).count()
    }
}

/// Region ready to be erased and drawn
struct PlannedRegion {
    bbox: BoundingBox,
    fill: FillColor,
    region: DetectedRegion,
}

/// Sequences the whole workflow for one image.
///
/// All collaborators are injected at startup and shared read-only between
/// requests; each request owns its source image and working canvas.
pub struct TranslationPipeline {
    config: Arc<Config>,
    source: Arc<dyn ImageSource>,
    detector: Arc<dyn TextDetector>,
    translator: Arc<TranslationOrchestrator>,
    renderer: Arc<OverlayRenderer>,
    store: Arc<ArtifactStore>,
    metrics: Metrics,
}

impl TranslationPipeline {
    pub fn new(
        config: Arc<Config>,
        source: Arc<dyn ImageSource>,
        detector: Arc<dyn TextDetector>,
        translator: Arc<TranslationOrchestrator>,
        renderer: Arc<OverlayRenderer>,
        store: Arc<ArtifactStore>,
        metrics: Metrics,
    ) -> Self {
        info!(
            "Pipeline ready (threshold {:.2}, padding {}px, {} concurrent translations)",
            config.detection.confidence_threshold,
            config.detection.box_padding,
            config.translation.concurrency
        );

        Self {
            config,
            source,
            detector,
            translator,
            renderer,
            store,
            metrics,
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    pub fn renderer(&self) -> &OverlayRenderer {
        &self.renderer
    }

    /// Runs the pipeline for one image reference.
    ///
    /// Only fetch, detection and persistence failures are returned; translation
    /// and rendering problems degrade per region.
    #[instrument(skip(self))]
    pub async fn process(&self, reference: &str, target_lang: &str) -> PipelineResult<PipelineOutput> {
        let start = Instant::now();
        let result = self.run(reference, target_lang).await;
        self.metrics.record_request(result.is_ok(), start.elapsed());
        result
    }

    async fn run(&self, reference: &str, target_lang: &str) -> PipelineResult<PipelineOutput> {
        let deadline = Deadline::now() + self.config.pipeline.request_timeout;

        let source = self.source.load(reference).await?;

        let detect_start = Instant::now();
        let detections = self.detector.detect(&source).await?;
        self.metrics.record_detection(detections.len(), detect_start.elapsed());

        let annotation = self
            .annotate(&source, detections, target_lang, deadline)
            .await;

        // Sampled once per run
        let time = GenerationTime::now();
        let artifact_id = artifact_name(reference, target_lang, &time);

        self.store
            .persist(OutputArtifact {
                id: artifact_id.clone(),
                raster: annotation.raster,
            })
            .await?;

        info!(
            "Stored {} ({} regions drawn, {} filtered, {} skipped)",
            artifact_id,
            annotation.regions.len(),
            annotation.filtered_out,
            annotation.skipped
        );

        Ok(PipelineOutput {
            artifact_id,
            regions: annotation.regions,
            filtered_out: annotation.filtered_out,
            skipped: annotation.skipped,
        })
    }

    /// Produces the overlaid raster from `source` and its detections.
    ///
    /// Translations run with bounded parallelism while the canvas is mutated
    /// strictly in reading order. Once `deadline` passes, regions still
    /// waiting on a translation are drawn with their original text.
    pub async fn annotate(
        &self,
        source: &RgbImage,
        detections: Vec<DetectedRegion>,
        target_lang: &str,
        deadline: Deadline,
    ) -> Annotation {
        let detected = detections.len();
        let survivors = filter_regions(detections, self.config.detection.confidence_threshold);
        let filtered_out = detected - survivors.len();

        let (width, height) = source.dimensions();
        let padding = self.config.detection.box_padding;
        let mut skipped = 0;
        let mut planned = Vec::with_capacity(survivors.len());

        for region in survivors {
            let bbox = BoundingBox::from_quad(&region.quad, padding, width, height);
            // Fill comes from the untouched source, never from the canvas
            match sample_fill_color(source, &bbox) {
                Some(fill) => planned.push(PlannedRegion { bbox, fill, region }),
                None => {
                    debug!("Skipping {:?}: box {} is empty", region.text, bbox);
                    skipped += 1;
                }
            }
        }

        // Reading order: top to bottom, then left to right
        planned.sort_by_key(|p| (p.bbox.y_min, p.bbox.x_min));

        let texts: Vec<String> = planned.iter().map(|p| p.region.text.clone()).collect();
        let translator = &self.translator;
        // Dropped with this call; repeated texts on the page share one call
        let cache = translator.request_cache();
        let cache = &cache;
        let mut translations = std::pin::pin!(stream::iter(texts)
            .map(|text| async move { translator.translate(&text, target_lang, cache).await })
            .buffered(self.config.translation.concurrency));

        let mut canvas = source.clone();
        let mut regions = Vec::with_capacity(planned.len());
        let mut expired = false;

        for PlannedRegion { bbox, fill, region } in planned {
            erase_region(&mut canvas, &bbox, fill);

            let next = if expired {
                None
            } else {
                match tokio::time::timeout_at(deadline, translations.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        warn!("Request deadline passed; remaining regions keep their original text");
                        expired = true;
                        None
                    }
                }
            };
            let outcome = next.unwrap_or_else(|| {
                self.metrics.record_translation_fallback();
                TranslationOutcome::fallback(&region.text, TranslationError::DeadlineExceeded)
            });

            let path = self.renderer.draw(&mut canvas, &bbox, outcome.text());
            debug!("Region {} {:?} -> {:?} ({:?})", bbox, region.text, outcome.text(), path);

            regions.push(TranslatedRegion {
                bbox,
                original_text: region.text,
                confidence: region.confidence,
                fill,
                fallback_reason: outcome.fallback_reason().map(|e| e.to_string()),
                cached: outcome.is_cached(),
                rendered_text: outcome.into_text(),
            });
        }

        self.metrics.record_filtered_out(filtered_out);
        self.metrics.record_skipped(skipped);
        self.metrics.record_rendered(regions.len());

        Annotation {
            raster: canvas,
            regions,
            filtered_out,
            skipped,
        }
    }
}
