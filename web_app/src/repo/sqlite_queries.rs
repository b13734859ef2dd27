pub const QUERY_CREATE_PROCESSED_EVENTS: &str =
    include_str!("../../../migrations/processed_events.sql");

pub const QUERY_GET_PROCESSED_AT: &str = r#"
SELECT processed_at
FROM processed_events
WHERE event_id=$1;
"#;

pub const QUERY_UPSERT_PROCESSED_EVENT: &str = r#"
INSERT INTO processed_events(event_id,processed_at)
VALUES($1,$2)
ON CONFLICT(event_id) DO UPDATE SET processed_at=excluded.processed_at;
"#;

/// Inserts the event, or refreshes it only when the stored record is expired
/// ($3 is the expiration cutoff). Zero affected rows means duplicate.
pub const QUERY_TEST_AND_SET_PROCESSED_EVENT: &str = r#"
INSERT INTO processed_events(event_id,processed_at)
VALUES($1,$2)
ON CONFLICT(event_id) DO UPDATE SET processed_at=excluded.processed_at
WHERE processed_events.processed_at<=$3;
"#;

pub const QUERY_DELETE_EXPIRED_EVENTS: &str = r#"
DELETE FROM processed_events
WHERE processed_at<=$1;
"#;
