use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Latency samples kept per series; older samples are dropped first
const MAX_SAMPLES: usize = 4096;

/// Metrics collector shared by the pipeline, its services and the HTTP layer.
///
/// Thread-safe; clones share the same counters.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    // Request Metrics
    requests_total: AtomicUsize,
    requests_success: AtomicUsize,
    requests_failed: AtomicUsize,
    pipeline_latency_ms: RwLock<Vec<u64>>,
    detection_latency_ms: RwLock<Vec<u64>>,

    // Region Metrics
    regions_detected: AtomicUsize,
    regions_filtered_out: AtomicUsize,
    regions_skipped: AtomicUsize,
    regions_rendered: AtomicUsize,

    // Translation Metrics
    translation_calls: AtomicUsize,
    translations_success: AtomicUsize,
    translations_fallback: AtomicUsize,
    translation_latency_ms: RwLock<Vec<u64>>,

    // Cache Metrics
    cache_hits: AtomicUsize,
    cache_misses: AtomicUsize,

    // Rendering Metrics
    font_fallbacks: AtomicUsize,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner {
                requests_total: AtomicUsize::new(0),
                requests_success: AtomicUsize::new(0),
                requests_failed: AtomicUsize::new(0),
                pipeline_latency_ms: RwLock::new(Vec::new()),
                detection_latency_ms: RwLock::new(Vec::new()),
                regions_detected: AtomicUsize::new(0),
                regions_filtered_out: AtomicUsize::new(0),
                regions_skipped: AtomicUsize::new(0),
                regions_rendered: AtomicUsize::new(0),
                translation_calls: AtomicUsize::new(0),
                translations_success: AtomicUsize::new(0),
                translations_fallback: AtomicUsize::new(0),
                translation_latency_ms: RwLock::new(Vec::new()),
                cache_hits: AtomicUsize::new(0),
                cache_misses: AtomicUsize::new(0),
                font_fallbacks: AtomicUsize::new(0),
                start_time: Instant::now(),
            }),
        }
    }

    // Request Metrics
    pub fn record_request(&self, success: bool, duration: Duration) {
        self.inner.requests_total.fetch_add(1, Ordering::Relaxed);
        if success {
            self.inner.requests_success.fetch_add(1, Ordering::Relaxed);
        } else {
            self.inner.requests_failed.fetch_add(1, Ordering::Relaxed);
        }
        push_sample(&self.inner.pipeline_latency_ms, duration);
    }

    pub fn record_detection(&self, regions: usize, duration: Duration) {
        self.inner.regions_detected.fetch_add(regions, Ordering::Relaxed);
        push_sample(&self.inner.detection_latency_ms, duration);
    }

    // Region Metrics
    pub fn record_filtered_out(&self, count: usize) {
        self.inner.regions_filtered_out.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_skipped(&self, count: usize) {
        self.inner.regions_skipped.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_rendered(&self, count: usize) {
        self.inner.regions_rendered.fetch_add(count, Ordering::Relaxed);
    }

    // Translation Metrics
    pub fn record_translation_call(&self, success: bool, duration: Duration) {
        self.inner.translation_calls.fetch_add(1, Ordering::Relaxed);
        if success {
            self.inner.translations_success.fetch_add(1, Ordering::Relaxed);
        }
        push_sample(&self.inner.translation_latency_ms, duration);
    }

    pub fn record_translation_fallback(&self) {
        self.inner.translations_fallback.fetch_add(1, Ordering::Relaxed);
    }

    // Cache Metrics
    pub fn record_cache_hit(&self) {
        self.inner.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cache_miss(&self) {
        self.inner.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_font_fallback(&self) {
        self.inner.font_fallbacks.fetch_add(1, Ordering::Relaxed);
    }

    // Get snapshot for reporting
    pub fn snapshot(&self) -> MetricsSnapshot {
        let pipeline_latency = self.inner.pipeline_latency_ms.read();
        let pipeline_latency_avg_ms = avg(&pipeline_latency);
        let pipeline_latency_p50_ms = percentile(&pipeline_latency, 0.5);
        let pipeline_latency_p95_ms = percentile(&pipeline_latency, 0.95);
        drop(pipeline_latency);

        let detection_latency_avg_ms = avg(&self.inner.detection_latency_ms.read());
        let translation_latency_avg_ms = avg(&self.inner.translation_latency_ms.read());

        let cache_hits = self.inner.cache_hits.load(Ordering::Relaxed);
        let cache_misses = self.inner.cache_misses.load(Ordering::Relaxed);
        let cache_total = cache_hits + cache_misses;
        let cache_hit_rate = if cache_total > 0 {
            cache_hits as f64 / cache_total as f64
        } else {
            0.0
        };

        MetricsSnapshot {
            requests_total: self.inner.requests_total.load(Ordering::Relaxed),
            requests_success: self.inner.requests_success.load(Ordering::Relaxed),
            requests_failed: self.inner.requests_failed.load(Ordering::Relaxed),
            pipeline_latency_avg_ms,
            pipeline_latency_p50_ms,
            pipeline_latency_p95_ms,
            detection_latency_avg_ms,
            regions_detected: self.inner.regions_detected.load(Ordering::Relaxed),
            regions_filtered_out: self.inner.regions_filtered_out.load(Ordering::Relaxed),
            regions_skipped: self.inner.regions_skipped.load(Ordering::Relaxed),
            regions_rendered: self.inner.regions_rendered.load(Ordering::Relaxed),
            translation_calls: self.inner.translation_calls.load(Ordering::Relaxed),
            translations_success: self.inner.translations_success.load(Ordering::Relaxed),
            translations_fallback: self.inner.translations_fallback.load(Ordering::Relaxed),
            translation_latency_avg_ms,
            cache_hits,
            cache_misses,
            cache_hit_rate,
            font_fallbacks: self.inner.font_fallbacks.load(Ordering::Relaxed),
            uptime_seconds: self.inner.start_time.elapsed().as_secs(),
        }
    }

    /// Generate Prometheus-format metrics
    pub fn to_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        format!(
            r#"# HELP requests_total Total translate requests handled
# TYPE requests_total counter
requests_total {{}} {}

# HELP requests_failed_total Requests that ended in a fatal error
# TYPE requests_failed_total counter
requests_failed_total {{}} {}

# HELP pipeline_latency_avg_ms Average pipeline latency in milliseconds
# TYPE pipeline_latency_avg_ms gauge
pipeline_latency_avg_ms {{}} {}

# HELP regions_total Regions by pipeline outcome
# TYPE regions_total counter
regions_total {{outcome="detected"}} {}
regions_total {{outcome="filtered_out"}} {}
regions_total {{outcome="skipped"}} {}
regions_total {{outcome="rendered"}} {}

# HELP translation_calls_total Calls made to the translation backend
# TYPE translation_calls_total counter
translation_calls_total {{}} {}

# HELP translation_fallbacks_total Regions rendered with their original text
# TYPE translation_fallbacks_total counter
translation_fallbacks_total {{}} {}

# HELP cache_hit_rate Cache hit rate (0.0 to 1.0)
# TYPE cache_hit_rate gauge
cache_hit_rate {{}} {}

# HELP font_fallbacks_total Regions drawn with the built-in bitmap font
# TYPE font_fallbacks_total counter
font_fallbacks_total {{}} {}

# HELP uptime_seconds Application uptime in seconds
# TYPE uptime_seconds counter
uptime_seconds {{}} {}
"#,
            snapshot.requests_total,
            snapshot.requests_failed,
            snapshot.pipeline_latency_avg_ms,
            snapshot.regions_detected,
            snapshot.regions_filtered_out,
            snapshot.regions_skipped,
            snapshot.regions_rendered,
            snapshot.translation_calls,
            snapshot.translations_fallback,
            snapshot.cache_hit_rate,
            snapshot.font_fallbacks,
            snapshot.uptime_seconds,
        )
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub requests_total: usize,
    pub requests_success: usize,
    pub requests_failed: usize,
    pub pipeline_latency_avg_ms: u64,
    pub pipeline_latency_p50_ms: u64,
    pub pipeline_latency_p95_ms: u64,
    pub detection_latency_avg_ms: u64,
    pub regions_detected: usize,
    pub regions_filtered_out: usize,
    pub regions_skipped: usize,
    pub regions_rendered: usize,
    pub translation_calls: usize,
    pub translations_success: usize,
    pub translations_fallback: usize,
    pub translation_latency_avg_ms: u64,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub cache_hit_rate: f64,
    pub font_fallbacks: usize,
    pub uptime_seconds: u64,
}

fn push_sample(series: &RwLock<Vec<u64>>, duration: Duration) {
    let mut samples = series.write();
    if samples.len() >= MAX_SAMPLES {
        samples.remove(0);
    }
    samples.push(duration.as_millis() as u64);
}

fn percentile(values: &[u64], p: f64) -> u64 {
    if values.is_empty() {
        return 0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_unstable();
    let idx = ((values.len() as f64 - 1.0) * p) as usize;
    sorted[idx]
}

fn avg(values: &[u64]) -> u64 {
    if values.is_empty() {
        return 0;
    }
    values.iter().sum::<u64>() / values.len() as u64
}
