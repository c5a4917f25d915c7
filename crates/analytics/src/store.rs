//! Record store — owns the fetched fact table for one dashboard session.
//!
//! Refetches replace the whole snapshot; there is no partial mutation. When
//! fetches overlap, the newest issued fetch wins: a superseded in-flight
//! result is discarded on arrival rather than overwriting fresher data.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use adpulse_core::types::{Dimension, PerformanceRecord};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::{debug, info};

use crate::resolver::RollupSource;

/// Every dimension; the grain of the flat fact table.
const FULL_GRAIN: [Dimension; 9] = [
    Dimension::Date,
    Dimension::Month,
    Dimension::Platform,
    Dimension::Channel,
    Dimension::FunnelStage,
    Dimension::Device,
    Dimension::Region,
    Dimension::AdType,
    Dimension::Placement,
];

/// One consistent view of the fetched data. Readers hold an `Arc` to it, so
/// a concurrent refetch never tears an in-progress recomputation.
#[derive(Debug)]
pub struct StoreSnapshot {
    pub generation: u64,
    pub fetched_at: DateTime<Utc>,
    /// Pre-aggregated accelerants ordered finest to coarsest, with the flat
    /// record set appended last as the always-sufficient source of truth.
    pub sources: Vec<RollupSource>,
}

impl StoreSnapshot {
    fn empty() -> Self {
        Self {
            generation: 0,
            fetched_at: Utc::now(),
            sources: Vec::new(),
        }
    }

    /// The flat fact table.
    pub fn records(&self) -> &[PerformanceRecord] {
        self.sources
            .last()
            .map(|s| s.records.as_slice())
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.records().is_empty()
    }
}

/// Claim on one in-flight fetch. Commit succeeds only while the ticket is
/// still the newest one issued.
#[derive(Debug, Clone, Copy)]
pub struct FetchTicket {
    generation: u64,
}

impl FetchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Immutable-snapshot record store with last-write-wins refetch semantics.
pub struct RecordStore {
    issued: AtomicU64,
    current: RwLock<Arc<StoreSnapshot>>,
}

impl RecordStore {
    pub fn new() -> Self {
        Self {
            issued: AtomicU64::new(0),
            current: RwLock::new(Arc::new(StoreSnapshot::empty())),
        }
    }

    /// Register an outgoing fetch. Issuing a new ticket supersedes every
    /// ticket issued before it.
    pub fn begin_fetch(&self) -> FetchTicket {
        let generation = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        FetchTicket { generation }
    }

    /// Install a completed fetch. Returns `false` (and drops the batch)
    /// when a newer fetch was issued while this one was in flight.
    pub fn commit(
        &self,
        ticket: FetchTicket,
        mut records: Vec<PerformanceRecord>,
        accelerants: Vec<RollupSource>,
    ) -> bool {
        if ticket.generation != self.issued.load(Ordering::SeqCst) {
            metrics::counter!("store.superseded_fetches").increment(1);
            debug!(
                generation = ticket.generation,
                "Discarding superseded fetch result"
            );
            return false;
        }

        for record in &mut records {
            record.sanitize();
        }

        let mut sources = accelerants;
        sources.push(RollupSource::new("flat", FULL_GRAIN.to_vec(), records));

        let snapshot = Arc::new(StoreSnapshot {
            generation: ticket.generation,
            fetched_at: Utc::now(),
            sources,
        });

        let mut current = self.current.write();
        // A newer generation may have landed between the check and here.
        if snapshot.generation < current.generation {
            metrics::counter!("store.superseded_fetches").increment(1);
            return false;
        }
        info!(
            generation = snapshot.generation,
            records = snapshot.records().len(),
            sources = snapshot.sources.len(),
            "Record store replaced"
        );
        *current = snapshot;
        true
    }

    /// The most recently committed snapshot.
    pub fn snapshot(&self) -> Arc<StoreSnapshot> {
        self.current.read().clone()
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(date: &str, spend: f64) -> PerformanceRecord {
        PerformanceRecord {
            date: date.parse().unwrap(),
            platform: "Google".to_string(),
            channel: "Search".to_string(),
            funnel_stage: None,
            device: None,
            region: None,
            ad_type: None,
            placement: None,
            spend,
            impressions: 0.0,
            clicks: 0.0,
            conversions: 0.0,
            revenue: 0.0,
            reach: 0.0,
        }
    }

    #[test]
    fn test_commit_installs_snapshot() {
        let store = RecordStore::new();
        assert!(store.snapshot().is_empty());

        let ticket = store.begin_fetch();
        assert!(store.commit(ticket, vec![record("2024-01-01", 10.0)], vec![]));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.generation, 1);
        assert_eq!(snapshot.records().len(), 1);
    }

    #[test]
    fn test_superseded_fetch_is_discarded() {
        let store = RecordStore::new();
        let stale = store.begin_fetch();
        let fresh = store.begin_fetch();

        assert!(store.commit(fresh, vec![record("2024-02-01", 20.0)], vec![]));
        // The older fetch arrives late and must not overwrite fresher data.
        assert!(!store.commit(stale, vec![record("2024-01-01", 10.0)], vec![]));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.generation, 2);
        assert_eq!(snapshot.records()[0].spend, 20.0);
    }

    #[test]
    fn test_superseded_fetch_discarded_even_before_newer_lands() {
        let store = RecordStore::new();
        let stale = store.begin_fetch();
        let _fresh = store.begin_fetch();

        // The newer fetch is still in flight; the stale one is already dead.
        assert!(!store.commit(stale, vec![record("2024-01-01", 10.0)], vec![]));
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_commit_sanitizes_malformed_records() {
        let store = RecordStore::new();
        let ticket = store.begin_fetch();
        let mut bad = record("2024-01-01", -5.0);
        bad.clicks = f64::NAN;
        assert!(store.commit(ticket, vec![bad], vec![]));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.records()[0].spend, 0.0);
        assert_eq!(snapshot.records()[0].clicks, 0.0);
    }

    #[test]
    fn test_flat_source_is_appended_last() {
        let store = RecordStore::new();
        let ticket = store.begin_fetch();
        let accelerant = RollupSource::new(
            "month_platform",
            vec![Dimension::Month, Dimension::Platform],
            vec![record("2024-01-01", 10.0)],
        );
        assert!(store.commit(ticket, vec![record("2024-01-01", 10.0)], vec![accelerant]));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.sources.len(), 2);
        assert_eq!(snapshot.sources.last().unwrap().name, "flat");
    }
}
