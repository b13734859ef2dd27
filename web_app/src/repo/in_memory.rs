use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use super::EventStore;
use crate::{clock::Clock, models::event::ProcessedEventRecord};

/// Process-local event store.
///
/// Every insert sweeps the whole map, which is fine for a few thousand events
/// per retention window.
pub struct InMemoryEventStore {
    records: Mutex<HashMap<String, ProcessedEventRecord>>,
    retention: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl InMemoryEventStore {
    pub fn new(retention: TimeDelta, clock: Arc<dyn Clock>) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            retention,
            clock,
        }
    }

    /// Number of records currently tracked, expired ones included until the next sweep.
    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.lock().len()
    }

    /// Synchronous core of [`EventStore::test_and_set`]; the lock makes check and insert one step.
    pub fn check_and_record(&self, event_id: &str, ttl: TimeDelta) -> bool {
        let now = self.clock.now();
        let mut records = self.lock();

        if records
            .get(event_id)
            .is_some_and(|record| record.is_live(now, ttl))
        {
            return false;
        }

        records.insert(
            event_id.to_string(),
            ProcessedEventRecord::new(event_id, now),
        );
        Self::sweep(&mut records, now, ttl);

        true
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, ProcessedEventRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn sweep(
        records: &mut HashMap<String, ProcessedEventRecord>,
        now: DateTime<Utc>,
        ttl: TimeDelta,
    ) {
        records.retain(|_, record| record.is_live(now, ttl));
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn is_duplicate(&self, event_id: &str) -> anyhow::Result<bool> {
        let now = self.clock.now();

        Ok(self
            .lock()
            .get(event_id)
            .is_some_and(|record| record.is_live(now, self.retention)))
    }

    async fn mark_processed(&self, event_id: &str) -> anyhow::Result<()> {
        let now = self.clock.now();
        let mut records = self.lock();

        records.insert(
            event_id.to_string(),
            ProcessedEventRecord::new(event_id, now),
        );
        Self::sweep(&mut records, now, self.retention);

        Ok(())
    }

    async fn test_and_set(&self, event_id: &str, ttl: TimeDelta) -> anyhow::Result<bool> {
        Ok(self.check_and_record(event_id, ttl))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    fn store_with_clock() -> (InMemoryEventStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = InMemoryEventStore::new(TimeDelta::hours(24), clock.clone());
        (store, clock)
    }

    #[ntex::test]
    async fn test_unseen_event_is_not_duplicate() {
        let (store, _) = store_with_clock();

        assert!(!store.is_duplicate("evt_1").await.unwrap());
    }

    #[ntex::test]
    async fn test_marked_event_is_duplicate() {
        let (store, _) = store_with_clock();

        store.mark_processed("evt_1").await.unwrap();

        assert!(store.is_duplicate("evt_1").await.unwrap());
        assert!(!store.is_duplicate("evt_2").await.unwrap());
    }

    #[ntex::test]
    async fn test_record_is_evicted_after_retention() {
        let (store, clock) = store_with_clock();

        store.mark_processed("evt_1").await.unwrap();
        clock.advance(TimeDelta::hours(23));
        assert!(store.is_duplicate("evt_1").await.unwrap());

        clock.advance(TimeDelta::hours(1));
        assert!(!store.is_duplicate("evt_1").await.unwrap());
    }

    #[ntex::test]
    async fn test_mark_processed_sweeps_expired_records() {
        let (store, clock) = store_with_clock();

        store.mark_processed("evt_old").await.unwrap();
        clock.advance(TimeDelta::hours(25));
        store.mark_processed("evt_new").await.unwrap();

        assert_eq!(store.tracked(), 1);
        assert!(store.is_duplicate("evt_new").await.unwrap());
    }

    #[ntex::test]
    async fn test_mark_processed_overwrites_timestamp() {
        let (store, clock) = store_with_clock();

        store.mark_processed("evt_1").await.unwrap();
        clock.advance(TimeDelta::hours(20));
        store.mark_processed("evt_1").await.unwrap();
        clock.advance(TimeDelta::hours(20));

        assert!(store.is_duplicate("evt_1").await.unwrap());
    }

    #[ntex::test]
    async fn test_test_and_set_reports_first_sighting_only() {
        let (store, _) = store_with_clock();
        let ttl = TimeDelta::hours(24);

        assert!(store.test_and_set("evt_1", ttl).await.unwrap());
        assert!(!store.test_and_set("evt_1", ttl).await.unwrap());
        assert!(store.test_and_set("evt_2", ttl).await.unwrap());
    }

    #[ntex::test]
    async fn test_test_and_set_accepts_again_after_ttl() {
        let (store, clock) = store_with_clock();
        let ttl = TimeDelta::hours(24);

        assert!(store.test_and_set("evt_1", ttl).await.unwrap());
        clock.advance(ttl);
        assert!(store.test_and_set("evt_1", ttl).await.unwrap());
    }

    #[test]
    fn test_concurrent_test_and_set_lets_one_caller_win() {
        let (store, _) = store_with_clock();
        let store = Arc::new(store);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store.check_and_record("evt_race", TimeDelta::hours(24))
                })
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|was_new| *was_new)
            .count();

        assert_eq!(winners, 1);
    }
}
