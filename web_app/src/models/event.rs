use chrono::{DateTime, TimeDelta, Utc};
use ntex::util::Bytes;

/// A webhook delivery that passed signature verification.
#[derive(Debug, Clone)]
pub struct WebhookEvent {
    /// Provider the delivery arrived for (e.g. "stripe")
    pub provider: String,
    /// Identifier assigned by the sender, unique per event
    pub id: String,
    /// Event category, e.g. "checkout.session.completed"
    pub event_type: String,
    /// Exact bytes received on the wire
    pub raw_body: Bytes,
    /// Parsed view of `raw_body`
    pub payload: serde_json::Value,
    pub received_at: DateTime<Utc>,
}

impl WebhookEvent {
    /// Key under which the event is remembered by the event store.
    ///
    /// Namespaced by provider so ids coming from different senders never collide.
    pub fn dedup_key(&self) -> String {
        format!("{}:{}", self.provider, self.id)
    }
}

/// Marker that an event id was handled at `processed_at`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedEventRecord {
    pub event_id: String,
    pub processed_at: DateTime<Utc>,
}

impl ProcessedEventRecord {
    pub fn new(event_id: impl Into<String>, processed_at: DateTime<Utc>) -> Self {
        Self {
            event_id: event_id.into(),
            processed_at,
        }
    }

    /// A record is live while `now - processed_at < retention`.
    pub fn is_live(&self, now: DateTime<Utc>, retention: TimeDelta) -> bool {
        now - self.processed_at < retention
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dedup_key_is_namespaced_by_provider() {
        let event = WebhookEvent {
            provider: "stripe".into(),
            id: "evt_1".into(),
            event_type: "checkout.session.completed".into(),
            raw_body: Bytes::from_static(b"{}"),
            payload: serde_json::json!({}),
            received_at: Utc::now(),
        };

        assert_eq!(event.dedup_key(), "stripe:evt_1");
    }

    #[test]
    fn test_record_expires_at_retention_boundary() {
        let processed_at = Utc::now();
        let record = ProcessedEventRecord::new("evt_1", processed_at);
        let retention = TimeDelta::hours(24);

        assert!(record.is_live(processed_at, retention));
        assert!(record.is_live(processed_at + TimeDelta::hours(23), retention));
        assert!(!record.is_live(processed_at + retention, retention));
    }
}
