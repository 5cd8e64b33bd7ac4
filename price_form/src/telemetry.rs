use opentelemetry::{
    global,
    metrics::{Counter, Histogram, MeterProvider},
    KeyValue,
};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::Registry;

pub struct Metrics {
    model_uploads: Counter<u64>,
    predictions: Counter<u64>,
    prediction_duration: Histogram<u64>,
    // Keeps the exporter alive if the global provider is replaced later.
    _provider: SdkMeterProvider,
    pub registry: Registry,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();
        let exporter = opentelemetry_prometheus::exporter()
            .with_registry(registry.clone())
            .build()?;

        let provider = SdkMeterProvider::builder().with_reader(exporter).build();

        let meter = provider.meter("price_form");
        global::set_meter_provider(provider.clone());

        let model_uploads = meter
            .u64_counter("model_uploads_total")
            .with_description("Model uploads by outcome")
            .build();

        let predictions = meter
            .u64_counter("predictions_total")
            .with_description("Price predictions by outcome")
            .build();

        let prediction_duration = meter
            .u64_histogram("prediction_duration_us")
            .with_boundaries(exponential_boundaries(50.0, 2.0, 12))
            .with_description("Duration of a single price prediction in microseconds")
            .build();

        Ok(Metrics {
            model_uploads,
            predictions,
            prediction_duration,
            _provider: provider,
            registry,
        })
    }

    pub fn record_upload(&self, outcome: &str) {
        let attributes = [KeyValue::new("outcome", outcome.to_string())];
        self.model_uploads.add(1, &attributes);
    }

    pub fn record_prediction(&self, outcome: &str, duration_us: u64) {
        let attributes = [KeyValue::new("outcome", outcome.to_string())];
        self.predictions.add(1, &attributes);
        self.prediction_duration.record(duration_us, &attributes);
    }
}

/// `count` bucket bounds starting at `start`, each `factor` times the last.
fn exponential_boundaries(start: f64, factor: f64, count: usize) -> Vec<f64> {
    std::iter::successors(Some(start), |bound| Some(bound * factor))
        .take(count)
        .collect()
}
