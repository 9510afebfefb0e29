//! The merged, ordered, identity-keyed collection of one user's records.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};

use crate::record::{NormalizedRecord, RecordKey, SourceKey};

/// Newest first; ties by source key, then id.
type OrderKey = (Reverse<DateTime<Utc>>, SourceKey, String);

fn order_key(r: &NormalizedRecord) -> OrderKey {
    (Reverse(r.created_at), r.source_key, r.id.clone())
}

/// A source that contributed nothing to a load because it failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DegradedSource {
    pub key: SourceKey,
    pub reason: String,
}

/// Which empty-state message a renderer should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyState {
    HasContent,
    /// Every source answered and none had anything for this user.
    NoContent,
    /// Every source failed; absence of records says nothing.
    Unavailable,
}

#[derive(Debug, Clone, Default)]
pub struct Aggregate {
    ordered: BTreeMap<OrderKey, NormalizedRecord>,
    index: HashMap<RecordKey, OrderKey>,
    degraded: Vec<DegradedSource>,
    sources_queried: usize,
}

impl Aggregate {
    pub fn new(sources_queried: usize, degraded: Vec<DegradedSource>) -> Self {
        Self {
            sources_queried,
            degraded,
            ..Self::default()
        }
    }

    /// Insert unless the `(source_key, id)` pair is already present.
    /// Returns false for a duplicate.
    pub fn insert(&mut self, record: NormalizedRecord) -> bool {
        let key = record.key();
        if self.index.contains_key(&key) {
            return false;
        }
        let ok = order_key(&record);
        self.index.insert(key, ok.clone());
        self.ordered.insert(ok, record);
        true
    }

    pub fn remove(&mut self, key: &RecordKey) -> Option<NormalizedRecord> {
        let ok = self.index.remove(key)?;
        self.ordered.remove(&ok)
    }

    pub fn contains(&self, key: &RecordKey) -> bool {
        self.index.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = &NormalizedRecord> {
        self.ordered.values()
    }

    pub fn records(&self) -> Vec<NormalizedRecord> {
        self.ordered.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn degraded_sources(&self) -> &[DegradedSource] {
        &self.degraded
    }

    /// At least one source failed during the load that built this aggregate.
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }

    pub fn all_sources_failed(&self) -> bool {
        self.sources_queried > 0 && self.degraded.len() >= self.sources_queried
    }

    pub fn empty_state(&self) -> EmptyState {
        if !self.is_empty() {
            EmptyState::HasContent
        } else if self.all_sources_failed() {
            EmptyState::Unavailable
        } else {
            EmptyState::NoContent
        }
    }
}

/// The aggregate a hub currently shows. Reloads swap it whole; confirmed
/// deletes remove single keys. Locks are never held across an await.
#[derive(Debug, Default)]
pub struct SharedAggregate {
    inner: RwLock<Aggregate>,
}

impl SharedAggregate {
    pub fn new(aggregate: Aggregate) -> Self {
        Self {
            inner: RwLock::new(aggregate),
        }
    }

    pub fn snapshot(&self) -> Aggregate {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn replace(&self, aggregate: Aggregate) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = aggregate;
    }

    pub fn remove(&self, key: &RecordKey) -> Option<NormalizedRecord> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rec(source_key: SourceKey, id: &str, ts: i64) -> NormalizedRecord {
        NormalizedRecord {
            id: id.to_string(),
            source_key,
            source_label: source_key.default_label().to_string(),
            title: String::new(),
            secondary_fields: Default::default(),
            body: String::new(),
            images: vec![],
            created_at: Utc.timestamp_opt(ts, 0).unwrap(),
            owner_id: Some("u1".into()),
            owner_email: None,
        }
    }

    #[test]
    fn orders_newest_first_with_deterministic_ties() {
        let mut agg = Aggregate::new(3, vec![]);
        agg.insert(rec(SourceKey::News, "b", 100));
        agg.insert(rec(SourceKey::Jobs, "z", 100));
        agg.insert(rec(SourceKey::News, "a", 100));
        agg.insert(rec(SourceKey::Rent, "x", 200));
        let order: Vec<_> = agg
            .iter()
            .map(|r| (r.source_key, r.id.as_str()))
            .collect();
        assert_eq!(
            order,
            vec![
                (SourceKey::Rent, "x"),
                (SourceKey::Jobs, "z"),
                (SourceKey::News, "a"),
                (SourceKey::News, "b"),
            ]
        );
    }

    #[test]
    fn same_id_in_different_sources_are_distinct() {
        let mut agg = Aggregate::default();
        assert!(agg.insert(rec(SourceKey::Jobs, "1", 10)));
        assert!(agg.insert(rec(SourceKey::Cv, "1", 10)));
        assert!(!agg.insert(rec(SourceKey::Jobs, "1", 99)));
        assert_eq!(agg.len(), 2);

        let removed = agg.remove(&RecordKey::new(SourceKey::Jobs, "1")).unwrap();
        assert_eq!(removed.source_key, SourceKey::Jobs);
        assert!(agg.contains(&RecordKey::new(SourceKey::Cv, "1")));
        assert!(agg.remove(&RecordKey::new(SourceKey::Jobs, "1")).is_none());
    }

    #[test]
    fn empty_state_distinguishes_failure_from_no_content() {
        assert_eq!(Aggregate::new(0, vec![]).empty_state(), EmptyState::NoContent);
        assert_eq!(Aggregate::new(2, vec![]).empty_state(), EmptyState::NoContent);

        let failed = |k| DegradedSource {
            key: k,
            reason: "boom".into(),
        };
        let partial = Aggregate::new(2, vec![failed(SourceKey::Jobs)]);
        assert!(partial.is_degraded());
        assert_eq!(partial.empty_state(), EmptyState::NoContent);

        let all = Aggregate::new(2, vec![failed(SourceKey::Jobs), failed(SourceKey::News)]);
        assert!(all.all_sources_failed());
        assert_eq!(all.empty_state(), EmptyState::Unavailable);
    }
}
