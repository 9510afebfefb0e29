// src/store/mod.rs
pub mod local;
pub mod memory;
pub mod rest;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::identity::Identity;
use crate::record::{DeleteOutcome, RawRecord};

pub use local::LocalBlobStore;
pub use memory::MemoryStore;
pub use rest::RestTableStore;

/// Backing store for one content category.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Records visible to `owner`. Stores that cannot filter server-side may
    /// return more; the ownership resolver drops the rest.
    async fn list(&self, owner: &Identity) -> Result<Vec<RawRecord>, StoreError>;

    /// Single delete attempt. `Err` is a transient failure; resubmitting is safe.
    async fn delete(&self, id: &str, owner: &Identity) -> Result<DeleteOutcome, StoreError>;

    fn describe(&self) -> String;
}
