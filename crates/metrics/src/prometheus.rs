use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Metrics registry error: {0}")]
    Registry(#[from] prometheus::Error),

    #[error("Metrics encoding error: {reason}")]
    Encoding { reason: String },
}

const DURATION_BUCKETS_MS: &[f64] = &[
    1.0, 5.0, 10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 15000.0, 60000.0, 300000.0,
];

/// Invocation metrics kept by one runtime process.
#[derive(Clone)]
pub struct RuntimeMetrics {
    registry: Registry,
    invocations_total: IntCounter,
    errors_total: IntCounterVec,
    cold_starts_total: IntCounter,
    duration_ms: Histogram,
    init_duration_ms: Histogram,
}

impl RuntimeMetrics {
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let invocations_total = IntCounter::new(
            "geo_runtime_invocations_total",
            "Total number of invocations dispatched to the handler",
        )?;

        let errors_total = IntCounterVec::new(
            Opts::new(
                "geo_runtime_errors_total",
                "Total number of failed invocations by error type",
            ),
            &["error_type"],
        )?;

        let cold_starts_total = IntCounter::new(
            "geo_runtime_cold_starts_total",
            "Total number of cold-start invocations",
        )?;

        let duration_ms = Histogram::with_opts(
            HistogramOpts::new(
                "geo_runtime_duration_ms",
                "Handler execution duration in milliseconds",
            )
            .buckets(DURATION_BUCKETS_MS.to_vec()),
        )?;

        let init_duration_ms = Histogram::with_opts(
            HistogramOpts::new(
                "geo_runtime_init_duration_ms",
                "Handler resolution duration in milliseconds",
            )
            .buckets(DURATION_BUCKETS_MS.to_vec()),
        )?;

        registry.register(Box::new(invocations_total.clone()))?;
        registry.register(Box::new(errors_total.clone()))?;
        registry.register(Box::new(cold_starts_total.clone()))?;
        registry.register(Box::new(duration_ms.clone()))?;
        registry.register(Box::new(init_duration_ms.clone()))?;

        Ok(Self {
            registry,
            invocations_total,
            errors_total,
            cold_starts_total,
            duration_ms,
            init_duration_ms,
        })
    }

    pub fn record_invocation(&self) {
        self.invocations_total.inc();
    }

    pub fn record_error(&self, error_type: &str) {
        self.errors_total.with_label_values(&[error_type]).inc();
    }

    pub fn record_cold_start(&self) {
        self.cold_starts_total.inc();
    }

    pub fn record_duration(&self, duration_ms: f64) {
        self.duration_ms.observe(duration_ms);
    }

    pub fn record_init_duration(&self, duration_ms: f64) {
        self.init_duration_ms.observe(duration_ms);
    }

    pub fn invocations(&self) -> u64 {
        self.invocations_total.get()
    }

    pub fn errors(&self, error_type: &str) -> u64 {
        self.errors_total.with_label_values(&[error_type]).get()
    }

    pub fn cold_starts(&self) -> u64 {
        self.cold_starts_total.get()
    }

    /// Prometheus text exposition of every registered metric.
    pub fn get_metrics(&self) -> Result<String, MetricsError> {
        let metric_families = self.registry.gather();
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();

        encoder.encode(&metric_families, &mut buffer)?;

        String::from_utf8(buffer).map_err(|e| MetricsError::Encoding {
            reason: e.to_string(),
        })
    }
}
