// src/lib.rs
// Public library surface for integration tests and the HTTP binary.

pub mod aggregate;
pub mod api;
pub mod config;
pub mod deletion;
pub mod error;
pub mod fanout;
pub mod hub;
pub mod identity;
pub mod ownership;
pub mod record;
pub mod source;
pub mod store;
pub mod telemetry;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::{Aggregate, DegradedSource, EmptyState};
pub use crate::api::router;
pub use crate::deletion::{DeletionCoordinator, ItemRef};
pub use crate::fanout::Aggregator;
pub use crate::hub::{ContentHub, ReloadStatus};
pub use crate::identity::{Identity, IdentityProvider, StaticIdentity};
pub use crate::ownership::OwnershipResolver;
pub use crate::record::{DeleteOutcome, NormalizedRecord, RawRecord, RecordKey, SourceKey};
