// src/config/build.rs
//! Turn a `HubConfig` into live adapters, an identity provider and a hub.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;

use super::{HubConfig, SourceConfig, StoreKind};
use crate::fanout::Aggregator;
use crate::hub::ContentHub;
use crate::identity::{Identity, IdentityProvider, RemoteIdentityProvider, StaticIdentity};
use crate::source::{SourceAdapter, StoreAdapter};
use crate::store::{ContentStore, LocalBlobStore, RestTableStore};

impl HubConfig {
    /// One adapter per configured source. A source whose store can't be built
    /// from the config is still registered, without a store, so it reports
    /// itself unavailable at load time instead of vanishing.
    pub fn build_sources(&self) -> Vec<Arc<dyn SourceAdapter>> {
        self.sources
            .iter()
            .map(|sc| {
                let adapter = match self.build_store(sc) {
                    Some(store) => StoreAdapter::new(sc.key, store),
                    None => {
                        tracing::warn!(source = %sc.key, "source has no usable store configuration");
                        StoreAdapter::unconfigured(sc.key)
                    }
                };
                let adapter = match &sc.label {
                    Some(label) => adapter.with_label(label.clone()),
                    None => adapter,
                };
                Arc::new(adapter) as Arc<dyn SourceAdapter>
            })
            .collect()
    }

    fn build_store(&self, sc: &SourceConfig) -> Option<Arc<dyn ContentStore>> {
        match sc.kind? {
            StoreKind::Local => {
                let path = sc.path.clone()?;
                Some(Arc::new(LocalBlobStore::new(path, self.ownership.clone())))
            }
            StoreKind::Remote => {
                let remote = self.remote.as_ref()?;
                let table = sc.table.clone()?;
                let store = RestTableStore::new(
                    remote.base_url.clone(),
                    table,
                    remote.api_key.clone(),
                    Duration::from_millis(remote.timeout_ms),
                )
                .map_err(|e| tracing::warn!(error = %e, source = %sc.key, "building rest store"))
                .ok()?;
                let store = match &sc.owner_column {
                    Some(c) => store.with_owner_column(c.clone()),
                    None => store,
                };
                let store = match &sc.id_column {
                    Some(c) => store.with_id_column(c.clone()),
                    None => store,
                };
                let store = match &self.identity.access_token {
                    Some(t) => store.with_bearer(t.clone()),
                    None => store,
                };
                Some(Arc::new(store))
            }
        }
    }

    pub fn build_identity(&self) -> Result<Arc<dyn IdentityProvider>> {
        let id = &self.identity;
        if let Some(user_id) = &id.user_id {
            return Ok(Arc::new(StaticIdentity::signed_in(Identity::new(
                user_id.clone(),
                id.email.clone(),
            ))));
        }
        match (&id.access_token, &self.remote) {
            (Some(token), Some(remote)) => Ok(Arc::new(RemoteIdentityProvider::new(
                remote.base_url.clone(),
                remote.api_key.clone(),
                token.clone(),
                Duration::from_millis(remote.timeout_ms),
            )?)),
            _ => Ok(Arc::new(StaticIdentity::signed_out())),
        }
    }

    pub fn build_aggregator(&self) -> Aggregator {
        let agg = Aggregator::new(self.build_sources(), self.ownership.clone());
        match self.fetch_timeout_ms {
            Some(ms) => agg.with_fetch_timeout(Duration::from_millis(ms)),
            None => agg,
        }
    }

    pub fn build_hub(&self) -> Result<ContentHub> {
        Ok(ContentHub::new(self.build_identity()?, self.build_aggregator()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SourceKey;

    #[test]
    fn incomplete_sources_are_registered_without_store() {
        let cfg = HubConfig::parse(
            r#"
[[sources]]
key = "jobs"
kind = "local"

[[sources]]
key = "news"
kind = "remote"
table = "news"

[[sources]]
key = "rent"
kind = "local"
path = "data/rent.json"
label = "Housing"
"#,
        )
        .unwrap();
        let sources = cfg.build_sources();
        let keys: Vec<_> = sources.iter().map(|s| s.key()).collect();
        assert_eq!(keys, vec![SourceKey::Jobs, SourceKey::News, SourceKey::Rent]);
        assert_eq!(sources[2].label(), "Housing");
        assert_eq!(sources[0].label(), "Jobs");
    }

    #[tokio::test]
    async fn static_identity_from_config() {
        let cfg = HubConfig::parse("[identity]\nuser_id = \"u1\"\n").unwrap();
        let who = cfg.build_identity().unwrap().current_user().await.unwrap();
        assert_eq!(who.map(|i| i.id).as_deref(), Some("u1"));

        let cfg = HubConfig::default();
        let who = cfg.build_identity().unwrap().current_user().await.unwrap();
        assert!(who.is_none());
    }
}
