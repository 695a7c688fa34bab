//! In-process counter store.
//!
//! Mirrors the subset of Redis semantics the limiters rely on: integer
//! counters with an optional TTL and sorted sets scored by timestamp. A whole
//! batch runs under one lock, which gives the same isolation a `MULTI`/`EXEC`
//! transaction gives across processes.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::trace;

use super::store::{Batch, Command, CounterStore, Reply};
use crate::error::{HitwindowError, Result};

#[derive(Debug, Clone)]
enum StoredValue {
    Counter(i64),
    /// member -> score
    SortedSet(HashMap<String, i64>),
}

#[derive(Debug, Clone)]
struct Entry {
    value: StoredValue,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Counter store held in process memory.
#[derive(Debug, Default)]
pub struct InMemoryCounterStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryCounterStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every key whose TTL has elapsed and return how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(now));
        before - entries.len()
    }

    /// Remaining time to live of `key`, if it exists and has one.
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        let entries = self.entries.lock();
        let entry = entries.get(key).filter(|entry| !entry.is_expired(now))?;
        entry.expires_at.map(|at| at.saturating_duration_since(now))
    }
}

fn wrong_type(key: &str) -> HitwindowError {
    HitwindowError::StoreUnavailable(format!(
        "WRONGTYPE operation against key {key:?} holding the wrong kind of value"
    ))
}

fn apply(entries: &mut HashMap<String, Entry>, command: &Command, now: Instant) -> Result<Reply> {
    let key = match command {
        Command::Incr { key }
        | Command::Expire { key, .. }
        | Command::ZAdd { key, .. }
        | Command::ZRemRangeByScoreBelow { key, .. }
        | Command::ZCard { key } => key,
    };

    // Expired keys behave as if they were never written.
    if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
        entries.remove(key);
    }

    match command {
        Command::Incr { key } => {
            let entry = entries.entry(key.clone()).or_insert(Entry {
                value: StoredValue::Counter(0),
                expires_at: None,
            });
            match &mut entry.value {
                StoredValue::Counter(value) => {
                    *value += 1;
                    Ok(Reply::Integer(*value))
                }
                StoredValue::SortedSet(_) => Err(wrong_type(key)),
            }
        }
        Command::Expire { key, seconds } => match entries.get_mut(key) {
            Some(entry) => {
                entry.expires_at = Some(now + Duration::from_secs(*seconds));
                Ok(Reply::Integer(1))
            }
            None => Ok(Reply::Integer(0)),
        },
        Command::ZAdd { key, score, member } => {
            let entry = entries.entry(key.clone()).or_insert(Entry {
                value: StoredValue::SortedSet(HashMap::new()),
                expires_at: None,
            });
            match &mut entry.value {
                StoredValue::SortedSet(members) => {
                    let added = members.insert(member.clone(), *score).is_none();
                    Ok(Reply::Integer(i64::from(added)))
                }
                StoredValue::Counter(_) => Err(wrong_type(key)),
            }
        }
        Command::ZRemRangeByScoreBelow { key, below } => {
            let Some(entry) = entries.get_mut(key) else {
                return Ok(Reply::Integer(0));
            };
            let StoredValue::SortedSet(members) = &mut entry.value else {
                return Err(wrong_type(key));
            };

            let before = members.len();
            members.retain(|_, score| *score >= *below);
            let removed = before - members.len();

            if members.is_empty() {
                entries.remove(key);
            }
            Ok(Reply::Integer(removed as i64))
        }
        Command::ZCard { key } => match entries.get(key).map(|entry| &entry.value) {
            Some(StoredValue::SortedSet(members)) => Ok(Reply::Integer(members.len() as i64)),
            Some(StoredValue::Counter(_)) => Err(wrong_type(key)),
            None => Ok(Reply::Integer(0)),
        },
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn execute(&self, batch: Batch) -> Result<Vec<Reply>> {
        let now = Instant::now();
        let mut entries = self.entries.lock();

        let replies = batch
            .commands()
            .iter()
            .map(|command| apply(&mut entries, command, now))
            .collect::<Result<Vec<_>>>()?;

        trace!(commands = batch.len(), "Executed in-memory batch");
        Ok(replies)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_incr_counts_up() {
        let store = InMemoryCounterStore::new();

        let replies = store.execute(Batch::new().incr("k").incr("k")).await.unwrap();
        assert_eq!(replies, vec![Reply::Integer(1), Reply::Integer(2)]);
    }

    #[tokio::test]
    async fn test_expire_sets_ttl() {
        let store = InMemoryCounterStore::new();

        let replies = store
            .execute(Batch::new().expire("missing", 60).incr("k").expire("k", 60))
            .await
            .unwrap();
        assert_eq!(replies[0], Reply::Integer(0));
        assert_eq!(replies[2], Reply::Integer(1));

        let ttl = store.ttl("k").unwrap();
        assert!(ttl <= Duration::from_secs(60));
        assert!(ttl > Duration::from_secs(58));
    }

    #[tokio::test]
    async fn test_expired_counter_restarts() {
        let store = InMemoryCounterStore::new();
        store.execute(Batch::new().incr("k").expire("k", 1)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1100)).await;

        let replies = store.execute(Batch::new().incr("k")).await.unwrap();
        assert_eq!(replies, vec![Reply::Integer(1)]);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let store = InMemoryCounterStore::new();
        store.execute(Batch::new().incr("short").expire("short", 1)).await.unwrap();
        store.execute(Batch::new().incr("long")).await.unwrap();
        assert_eq!(store.len(), 2);

        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert_eq!(store.len(), 1);
        assert_eq!(store.purge_expired(), 1);
        assert!(store.ttl("short").is_none());
    }

    #[tokio::test]
    async fn test_sorted_set_operations() {
        let store = InMemoryCounterStore::new();

        let replies = store
            .execute(
                Batch::new()
                    .zadd("log", 100, "a")
                    .zadd("log", 200, "b")
                    .zadd("log", 200, "b")
                    .zadd("log", 300, "c")
                    .zrem_range_by_score_below("log", 200)
                    .zcard("log"),
            )
            .await
            .unwrap();

        assert_eq!(
            replies,
            vec![
                Reply::Integer(1),
                Reply::Integer(1),
                Reply::Integer(0),
                Reply::Integer(1),
                Reply::Integer(1),
                Reply::Integer(2),
            ]
        );
    }

    #[tokio::test]
    async fn test_emptied_sorted_set_is_removed() {
        let store = InMemoryCounterStore::new();
        store.execute(Batch::new().zadd("log", 1, "a")).await.unwrap();

        let replies = store
            .execute(Batch::new().zrem_range_by_score_below("log", 10).zcard("log"))
            .await
            .unwrap();
        assert_eq!(replies, vec![Reply::Integer(1), Reply::Integer(0)]);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_type_is_store_error() {
        let store = InMemoryCounterStore::new();
        store.execute(Batch::new().incr("k")).await.unwrap();

        let err = store.execute(Batch::new().zcard("k")).await.unwrap_err();
        assert!(matches!(err, HitwindowError::StoreUnavailable(_)));
    }
}
