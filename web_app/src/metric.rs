use opentelemetry::{KeyValue, metrics::UpDownCounter};
use std::sync::LazyLock;

static STATDS: LazyLock<UpDownCounter<i64>> = LazyLock::new(|| {
    logfire::i64_up_down_counter("yoni_webhooks_statds")
        .with_description("Yoni webhook intake statistics")
        .with_unit("event")
        .build()
});

fn incr_statds(attributes: &[KeyValue]) {
    STATDS.add(1, attributes);
}

/// outcome: "processed", "duplicate", "handler_error", "rejected"
pub fn incr_webhook_statds(provider: &str, outcome: &str) {
    incr_statds(&[
        KeyValue::new("provider", provider.to_string()),
        KeyValue::new("webhook", outcome.to_string()),
    ])
}

pub fn incr_payment_status_statds(status: &str) {
    incr_statds(&[KeyValue::new("payment_status", status.to_string())])
}
