//! The ephemeral record store.
//!
//! [`RecordStore`] is the single owner of the record collection and the
//! running counters. Every operation takes one store-wide
//! [`parking_lot::Mutex`], so a mutation is never observed half-applied
//! and the counters always agree with the collection. Records are
//! immutable, so readers receive clones and never hold the lock after
//! returning.
//!
//! Each time-dependent operation has an `*_at(now)` form that takes the
//! query time explicitly; the plain form uses [`Utc::now`].
//!
//! # Invariants
//!
//! - `expires_at` is fixed at insertion and never refreshed.
//! - Insertion order is preserved by every query.
//! - `total_inserted` only grows; `total_expired` only grows, and only
//!   through [`RecordStore::sweep`].
//! - Records sharing a job ID are kept side by side, never merged.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use serde::{Serialize, Serializer};
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::record::{Candidate, Record, RecordId};

/// Point-in-time view of the store counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    /// Records inserted since the store was created.
    pub total_inserted: u64,
    /// Records removed by the expiry sweep.
    pub total_expired: u64,
    /// Records active at snapshot time (derived, never stored).
    pub active_count: usize,
    /// When the store was created.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub started_at: DateTime<Utc>,
    /// Time elapsed since `started_at`.
    #[serde(rename = "uptimeSeconds", serialize_with = "serialize_secs")]
    pub uptime: Duration,
}

/// Collection and counters, guarded together.
#[derive(Debug, Default)]
struct Inner {
    records: Vec<Record>,
    total_inserted: u64,
    total_expired: u64,
}

/// Concurrently shared store of time-bounded records.
///
/// Wrap in [`std::sync::Arc`] to share between request handlers and the
/// [`Sweeper`](crate::sweeper::Sweeper).
#[derive(Debug)]
pub struct RecordStore {
    inner: Mutex<Inner>,
    ttl: TimeDelta,
    started_at: DateTime<Utc>,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new(&StoreConfig::default())
    }
}

impl RecordStore {
    /// Create an empty store using the configured TTL.
    pub fn new(config: &StoreConfig) -> Self {
        Self::starting_at(config, Utc::now())
    }

    /// Create an empty store with an explicit start time.
    pub fn starting_at(config: &StoreConfig, started_at: DateTime<Utc>) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            ttl: TimeDelta::from_std(config.ttl).unwrap_or(TimeDelta::MAX),
            started_at,
        }
    }

    /// The TTL applied to new records.
    pub fn ttl(&self) -> Duration {
        self.ttl.to_std().unwrap_or(Duration::MAX)
    }

    /// Insert a candidate and return the stored record.
    pub fn insert(&self, candidate: Candidate) -> Record {
        self.insert_at(candidate, Utc::now())
    }

    /// Insert a candidate as of `now`.
    ///
    /// The id is `{millis}-{jobId}`, or the first `{millis}-{jobId}-{n}`
    /// with `n >= 1` that no stored record holds.
    pub fn insert_at(&self, candidate: Candidate, now: DateTime<Utc>) -> Record {
        let mut inner = self.inner.lock();

        let base = RecordId::derive(now, &candidate.job_id);
        let mut id = base.clone();
        let mut sequence: u64 = 0;
        while inner.records.iter().any(|r| r.id == id) {
            sequence = sequence.saturating_add(1);
            id = base.with_sequence(sequence);
        }

        let record = Record::from_candidate(candidate, id, now, self.ttl);
        inner.records.push(record.clone());
        inner.total_inserted = inner.total_inserted.saturating_add(1);
        drop(inner);

        info!(
            id = %record.id,
            job_id = record.job_id,
            display_name = record.display_name,
            value = record.value,
            "record stored"
        );
        record
    }

    /// All active records in insertion order.
    pub fn active_records(&self) -> Vec<Record> {
        self.active_records_at(Utc::now())
    }

    /// All records active at `now`, in insertion order.
    pub fn active_records_at(&self, now: DateTime<Utc>) -> Vec<Record> {
        self.select_active(now, |_| true)
    }

    /// Active records for a job ID. May be empty.
    pub fn records_by_key(&self, job_id: &str) -> Vec<Record> {
        self.records_by_key_at(job_id, Utc::now())
    }

    /// Records for a job ID active at `now`.
    pub fn records_by_key_at(&self, job_id: &str, now: DateTime<Utc>) -> Vec<Record> {
        self.select_active(now, |r| r.job_id == job_id)
    }

    /// Active records whose value is at least `min_value`.
    pub fn filter_by_min_value(&self, min_value: u64) -> Vec<Record> {
        self.filter_by_min_value_at(min_value, Utc::now())
    }

    /// Records active at `now` whose value is at least `min_value`.
    pub fn filter_by_min_value_at(&self, min_value: u64, now: DateTime<Utc>) -> Vec<Record> {
        self.select_active(now, |r| r.value >= min_value)
    }

    /// Remove every record sharing `job_id`, active or not.
    ///
    /// Returns exactly the removed records. Removing an unknown key
    /// returns an empty vector. `total_expired` is not touched.
    pub fn remove_by_key(&self, job_id: &str) -> Vec<Record> {
        let mut inner = self.inner.lock();
        let (removed, retained): (Vec<Record>, Vec<Record>) =
            std::mem::take(&mut inner.records)
                .into_iter()
                .partition(|r| r.job_id == job_id);
        inner.records = retained;
        drop(inner);

        if !removed.is_empty() {
            info!(job_id, removed = removed.len(), "records removed by job id");
        }
        removed
    }

    /// Remove every record whose expiry is at or before `now`.
    ///
    /// Returns the number removed, which is also added to
    /// `total_expired`. Partition and counter update happen under the
    /// same lock, so overlapping sweeps and concurrent inserts can neither
    /// double-count nor drop a live record.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.records.len();
        inner.records.retain(|r| r.is_active_at(now));
        let removed = before.saturating_sub(inner.records.len());
        let removed_u64 = u64::try_from(removed).unwrap_or(u64::MAX);
        inner.total_expired = inner.total_expired.saturating_add(removed_u64);
        let remaining = inner.records.len();
        drop(inner);

        debug!(removed, remaining, "sweep complete");
        removed
    }

    /// Snapshot the counters.
    pub fn stats(&self) -> Stats {
        self.stats_at(Utc::now())
    }

    /// Snapshot the counters as of `now`.
    pub fn stats_at(&self, now: DateTime<Utc>) -> Stats {
        let inner = self.inner.lock();
        let active_count = inner.records.iter().filter(|r| r.is_active_at(now)).count();
        let (total_inserted, total_expired) = (inner.total_inserted, inner.total_expired);
        drop(inner);

        Stats {
            total_inserted,
            total_expired,
            active_count,
            started_at: self.started_at,
            uptime: now
                .signed_duration_since(self.started_at)
                .to_std()
                .unwrap_or(Duration::ZERO),
        }
    }

    /// Number of records held, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    /// Whether the store holds no records at all.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().records.is_empty()
    }

    fn select_active<F>(&self, now: DateTime<Utc>, predicate: F) -> Vec<Record>
    where
        F: Fn(&Record) -> bool,
    {
        self.inner
            .lock()
            .records
            .iter()
            .filter(|r| r.is_active_at(now) && predicate(r))
            .cloned()
            .collect()
    }
}

fn serialize_secs<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_secs())
}
