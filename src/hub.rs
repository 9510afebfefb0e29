// src/hub.rs
//! The surface a renderer talks to: current aggregate, reload, delete.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::aggregate::{Aggregate, SharedAggregate};
use crate::deletion::{DeletionCoordinator, ItemRef};
use crate::error::HubError;
use crate::fanout::Aggregator;
use crate::identity::{Identity, IdentityProvider};
use crate::record::{DeleteOutcome, NormalizedRecord, SourceKey};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadStatus {
    Applied,
    /// A newer reload started meanwhile; this result was dropped.
    Superseded,
}

pub struct ContentHub {
    identity: Arc<dyn IdentityProvider>,
    aggregator: Aggregator,
    coordinator: DeletionCoordinator,
    aggregate: SharedAggregate,
    generation: AtomicU64,
}

impl ContentHub {
    pub fn new(identity: Arc<dyn IdentityProvider>, aggregator: Aggregator) -> Self {
        let coordinator = DeletionCoordinator::new(aggregator.sources());
        Self {
            identity,
            aggregator,
            coordinator,
            aggregate: SharedAggregate::default(),
            generation: AtomicU64::new(0),
        }
    }

    /// Ordered records currently shown.
    pub fn get_aggregate(&self) -> Vec<NormalizedRecord> {
        self.aggregate.snapshot().records()
    }

    /// Full snapshot, including degraded-source information.
    pub fn snapshot(&self) -> Aggregate {
        self.aggregate.snapshot()
    }

    async fn current_user(&self) -> Result<Identity, HubError> {
        match self.identity.current_user().await {
            Ok(Some(identity)) => Ok(identity),
            Ok(None) => Err(HubError::Unauthenticated),
            Err(e) => Err(HubError::Identity(e)),
        }
    }

    /// Re-run the fan-out for the signed-in user and swap the result in.
    ///
    /// Signed out: the shown aggregate is cleared and `Unauthenticated`
    /// returned. Identity lookup failure leaves it as it was.
    pub async fn reload(&self) -> Result<ReloadStatus, HubError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let identity = match self.current_user().await {
            Ok(identity) => identity,
            Err(HubError::Unauthenticated) => {
                self.aggregate.replace(Aggregate::default());
                return Err(HubError::Unauthenticated);
            }
            Err(e) => return Err(e),
        };

        let fresh = self.aggregator.load_aggregate(&identity).await;
        if self.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(generation, "discarding superseded reload");
            return Ok(ReloadStatus::Superseded);
        }
        self.aggregate.replace(fresh);
        Ok(ReloadStatus::Applied)
    }

    pub async fn request_delete(&self, id: &str, source_key: SourceKey) -> DeleteOutcome {
        let identity = match self.identity.current_user().await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(error = %e, "identity lookup failed before delete");
                return DeleteOutcome::TransientFailure;
            }
        };
        let item = ItemRef::new(source_key, id);
        self.coordinator
            .delete_item(&item, identity.as_ref(), &self.aggregate)
            .await
    }
}
