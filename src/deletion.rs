// src/deletion.rs
//! Routes a delete to the source that owns the item and reconciles the
//! shown aggregate only once the store has confirmed the removal.

use metrics::counter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::aggregate::SharedAggregate;
use crate::fanout::ensure_metrics_described;
use crate::identity::Identity;
use crate::record::{DeleteOutcome, RecordKey, SourceKey};
use crate::source::SourceAdapter;

/// What the presentation layer hands back when the user presses delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    pub id: String,
    pub source_key: SourceKey,
}

impl ItemRef {
    pub fn new(source_key: SourceKey, id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_key,
        }
    }

    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.source_key, self.id.clone())
    }
}

pub struct DeletionCoordinator {
    routes: HashMap<SourceKey, Arc<dyn SourceAdapter>>,
}

impl DeletionCoordinator {
    pub fn new(sources: &[Arc<dyn SourceAdapter>]) -> Self {
        let routes = sources.iter().map(|s| (s.key(), Arc::clone(s))).collect();
        Self { routes }
    }

    /// One delete attempt, no retry.
    ///
    /// `Deleted` and `NotFound` remove the item from `aggregate`; `Forbidden`
    /// and `TransientFailure` leave it untouched so the caller can show it again.
    /// Two concurrent calls for the same item must be serialized by the caller.
    pub async fn delete_item(
        &self,
        item: &ItemRef,
        identity: Option<&Identity>,
        aggregate: &SharedAggregate,
    ) -> DeleteOutcome {
        ensure_metrics_described();
        let outcome = self.attempt(item, identity).await;

        if outcome.removes_from_view() {
            aggregate.remove(&item.key());
        }
        counter!("hub_deletes_total", "outcome" => outcome.as_str()).increment(1);
        tracing::info!(
            source = %item.source_key,
            id = %item.id,
            outcome = outcome.as_str(),
            "delete finished"
        );
        outcome
    }

    async fn attempt(&self, item: &ItemRef, identity: Option<&Identity>) -> DeleteOutcome {
        let Some(identity) = identity else {
            return DeleteOutcome::Forbidden;
        };
        let Some(source) = self.routes.get(&item.source_key) else {
            // Nothing from an unregistered source can be in the aggregate.
            tracing::warn!(source = %item.source_key, id = %item.id, "delete for unregistered source");
            return DeleteOutcome::NotFound;
        };
        match source.delete_one(&item.id, identity).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, source = %item.source_key, id = %item.id, "source unavailable for delete");
                DeleteOutcome::TransientFailure
            }
        }
    }
}
