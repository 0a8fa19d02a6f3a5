use opentelemetry::{KeyValue, metrics::UpDownCounter};
use std::sync::LazyLock;

static STATDS: LazyLock<UpDownCounter<i64>> = LazyLock::new(|| {
    logfire::i64_up_down_counter("flows_endpoint_statds")
        .with_description("WhatsApp Flows endpoint statistics")
        .with_unit("request")
        .build()
});

fn incr_statds(metric: String, value: String) {
    STATDS.add(1, &[KeyValue::new(metric, value)]);
}

/// Counts data exchanges by outcome (`Screen`, `TokenInvalidated` or a `FlowError` kind)
pub fn incr_flow_exchange_statds(outcome: &str) {
    incr_statds("flow_exchange".to_string(), outcome.into())
}

pub fn incr_challenge_statds(outcome: &str) {
    incr_statds("challenge".to_string(), outcome.into())
}
