//! Prometheus metrics for mirage-http-proxy.
//!
//! Tracks recording and playback activity and upstream latency.
use lazy_static::lazy_static;
use prometheus::{
    register_counter, register_counter_vec, register_histogram_vec, Counter, CounterVec, Encoder,
    HistogramVec, TextEncoder,
};

lazy_static! {
    /// Total number of intermediated requests
    pub static ref REQUESTS_TOTAL: CounterVec = register_counter_vec!(
        "mirage_requests_total",
        "Total number of requests handled by the intermediary",
        &["mode", "status"]
    )
    .unwrap();

    /// Interactions captured from a real upstream
    pub static ref RECORDED_TOTAL: Counter = register_counter!(
        "mirage_recorded_total",
        "Total number of interactions recorded from upstream targets"
    )
    .unwrap();

    /// Requests answered from recordings
    pub static ref REPLAYED_TOTAL: Counter = register_counter!(
        "mirage_replayed_total",
        "Total number of requests answered from recordings"
    )
    .unwrap();

    /// Playback requests with no matching recording
    pub static ref PLAYBACK_MISSES_TOTAL: Counter = register_counter!(
        "mirage_playback_misses_total",
        "Total number of playback requests without a matching recording"
    )
    .unwrap();

    /// Recordings that were captured but could not be persisted
    pub static ref PERSIST_FAILURES_TOTAL: Counter = register_counter!(
        "mirage_persist_failures_total",
        "Total number of recorded interactions that failed to persist"
    )
    .unwrap();

    /// Upstream round-trip duration while recording
    pub static ref UPSTREAM_DURATION_MS: HistogramVec = register_histogram_vec!(
        "mirage_upstream_duration_ms",
        "Duration of upstream requests while recording, response body included",
        &["method"],
        vec![1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0]
    )
    .unwrap();
}

/// Register every metric so the exposition lists them before first use.
pub fn init() {
    lazy_static::initialize(&REQUESTS_TOTAL);
    lazy_static::initialize(&RECORDED_TOTAL);
    lazy_static::initialize(&REPLAYED_TOTAL);
    lazy_static::initialize(&PLAYBACK_MISSES_TOTAL);
    lazy_static::initialize(&PERSIST_FAILURES_TOTAL);
    lazy_static::initialize(&UPSTREAM_DURATION_MS);
}

/// Collect and return all metrics in Prometheus text format
pub fn collect_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Helper to record request processing
pub fn record_request(mode: &str, status: u16) {
    REQUESTS_TOTAL
        .with_label_values(&[mode, &status.to_string()])
        .inc();
}

/// Helper to record a captured interaction
pub fn record_capture(method: &str, duration_ms: u64) {
    RECORDED_TOTAL.inc();
    UPSTREAM_DURATION_MS
        .with_label_values(&[method])
        .observe(duration_ms as f64);
}

pub fn record_replay() {
    REPLAYED_TOTAL.inc();
}

pub fn record_playback_miss() {
    PLAYBACK_MISSES_TOTAL.inc();
}

pub fn record_persist_failure() {
    PERSIST_FAILURES_TOTAL.inc();
}
