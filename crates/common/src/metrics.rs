use once_cell::sync::Lazy;
use prometheus::{
    register_histogram, register_int_counter, register_int_counter_vec, Encoder, Histogram,
    IntCounter, IntCounterVec, TextEncoder,
};

use crate::CoreError;

// Prometheus metrics (default registry)
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "pantry_http_requests_total",
        "Total API requests by route group",
        &["group"]
    )
    .expect("register http_requests_total")
});

pub static UPSTREAM_CALLS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "pantry_upstream_calls_total",
        "Total calls made to external OCR/product services"
    )
    .expect("register upstream_calls_total")
});

pub static UPSTREAM_ERRORS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "pantry_upstream_errors_total",
        "Total failed calls to external services"
    )
    .expect("register upstream_errors_total")
});

pub static UPSTREAM_RETRIES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "pantry_upstream_retries_total",
        "Total retry attempts against external services"
    )
    .expect("register upstream_retries_total")
});

pub static CIRCUIT_OPEN_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "pantry_circuit_open_rejections_total",
        "Total calls rejected because the circuit breaker was open"
    )
    .expect("register circuit_open_total")
});

pub static UPSTREAM_DURATION: Lazy<Histogram> = Lazy::new(|| {
    register_histogram!(
        "pantry_upstream_duration_seconds",
        "External service call duration in seconds",
        vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]
    )
    .expect("register upstream_duration")
});

pub static BARCODE_CACHE_HITS: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "pantry_barcode_cache_hits_total",
        "Barcode lookups answered from the remote lookup cache"
    )
    .expect("register barcode_cache_hits")
});

/// Count one API request against a route group (`inventory`, `ocr`, ...).
pub fn record_request(group: &str) {
    HTTP_REQUESTS_TOTAL.with_label_values(&[group]).inc();
}

/// Render the default registry in the text exposition format.
pub fn encode_metrics() -> Result<String, CoreError> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| CoreError::Metrics(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| CoreError::Metrics(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorded_requests_show_up_in_output() {
        record_request("inventory");
        UPSTREAM_CALLS_TOTAL.inc();
        let text = encode_metrics().unwrap();
        assert!(text.contains("pantry_http_requests_total"));
        assert!(text.contains("group=\"inventory\""));
        assert!(text.contains("pantry_upstream_calls_total"));
    }
}
