// src/fanout.rs
//! Fan-out load: query every registered source at once, keep what the
//! ownership resolver assigns to the caller, merge into one ordered aggregate.
//!
//! A failing source contributes nothing and is recorded as degraded; it never
//! takes the other sources' results down with it.

use futures::future::join_all;
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::aggregate::{Aggregate, DegradedSource};
use crate::error::SourceError;
use crate::identity::Identity;
use crate::ownership::OwnershipResolver;
use crate::record::{NormalizedRecord, RawRecord};
use crate::source::SourceAdapter;

/// One-time metrics registration (so series show up on /metrics).
pub(crate) fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "hub_source_errors_total",
            "Sources that failed during a fan-out load."
        );
        describe_counter!(
            "hub_records_kept_total",
            "Records kept after ownership filtering and normalization."
        );
        describe_counter!(
            "hub_records_discarded_total",
            "Records dropped: foreign owner, no owner, no id, or duplicate."
        );
        describe_counter!(
            "hub_missing_created_at_total",
            "Records without a usable timestamp (ordered as epoch zero)."
        );
        describe_counter!("hub_deletes_total", "Delete requests by outcome.");
        describe_histogram!("hub_load_ms", "Fan-out load time in milliseconds.");
        describe_gauge!("hub_last_load_ts", "Unix ts of the last completed load.");
    });
}

/// What survived from one source.
#[derive(Debug, Default)]
struct SourceSlot {
    records: Vec<NormalizedRecord>,
    discarded: usize,
}

pub struct Aggregator {
    sources: Vec<Arc<dyn SourceAdapter>>,
    resolver: OwnershipResolver,
    fetch_timeout: Option<Duration>,
}

impl Aggregator {
    pub fn new(sources: Vec<Arc<dyn SourceAdapter>>, resolver: OwnershipResolver) -> Self {
        Self {
            sources,
            resolver,
            fetch_timeout: None,
        }
    }

    /// Per-source deadline; a source that misses it counts as failed.
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    pub fn sources(&self) -> &[Arc<dyn SourceAdapter>] {
        &self.sources
    }

    async fn fetch(
        &self,
        source: &dyn SourceAdapter,
        identity: &Identity,
    ) -> Result<Vec<RawRecord>, SourceError> {
        match self.fetch_timeout {
            Some(limit) => tokio::time::timeout(limit, source.fetch_all(identity))
                .await
                .map_err(|_| SourceError::Timeout(limit))?,
            None => source.fetch_all(identity).await,
        }
    }

    /// Filter and normalize one source's raw records. Touches nothing shared.
    fn settle(
        &self,
        source: &dyn SourceAdapter,
        raw: Vec<RawRecord>,
        identity: &Identity,
    ) -> SourceSlot {
        let mut slot = SourceSlot::default();
        for r in &raw {
            let hints = self.resolver.hints(r);
            if !OwnershipResolver::hints_match(&hints, identity) {
                slot.discarded += 1;
                continue;
            }
            match source.normalize(r, hints) {
                Ok(n) => slot.records.push(n),
                Err(e) => {
                    tracing::warn!(error = %e, source = %source.key(), "dropping unusable record");
                    slot.discarded += 1;
                }
            }
        }
        slot
    }

    /// Load the caller's records from every source.
    ///
    /// Never fails: zero sources gives an empty aggregate, and failed sources
    /// show up in `Aggregate::degraded_sources`. The caller swaps the result in
    /// whole.
    pub async fn load_aggregate(&self, identity: &Identity) -> Aggregate {
        ensure_metrics_described();
        let t0 = Instant::now();

        let results = join_all(
            self.sources
                .iter()
                .map(|s| async move { (s, self.fetch(s.as_ref(), identity).await) }),
        )
        .await;

        let mut degraded = Vec::new();
        let mut slots = Vec::with_capacity(results.len());
        for (source, result) in results {
            match result {
                Ok(raw) => slots.push(self.settle(source.as_ref(), raw, identity)),
                Err(e) => {
                    tracing::warn!(error = %e, source = %source.key(), "source degraded");
                    counter!("hub_source_errors_total").increment(1);
                    degraded.push(DegradedSource {
                        key: source.key(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let mut aggregate = Aggregate::new(self.sources.len(), degraded);
        let mut discarded = 0usize;
        for slot in slots {
            discarded += slot.discarded;
            for rec in slot.records {
                if !aggregate.insert(rec) {
                    discarded += 1;
                }
            }
        }

        let ms = t0.elapsed().as_secs_f64() * 1_000.0;
        histogram!("hub_load_ms").record(ms);
        counter!("hub_records_kept_total").increment(aggregate.len() as u64);
        counter!("hub_records_discarded_total").increment(discarded as u64);
        gauge!("hub_last_load_ts").set(chrono::Utc::now().timestamp() as f64);

        tracing::info!(
            kept = aggregate.len(),
            discarded,
            degraded = aggregate.degraded_sources().len(),
            sources = self.sources.len(),
            "aggregate loaded"
        );
        aggregate
    }
}
