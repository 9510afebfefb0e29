// src/config/mod.rs
pub mod build;

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ownership::OwnershipResolver;
use crate::record::SourceKey;

pub const ENV_CONFIG_PATH: &str = "CONTENT_HUB_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/content_hub.toml";
pub const ENV_API_KEY: &str = "CONTENT_HUB_API_KEY";
pub const ENV_ACCESS_TOKEN: &str = "CONTENT_HUB_ACCESS_TOKEN";

fn default_remote_timeout_ms() -> u64 {
    8_000
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HubConfig {
    /// Per-source deadline for one fan-out fetch. Unset = no deadline.
    #[serde(default)]
    pub fetch_timeout_ms: Option<u64>,
    #[serde(default)]
    pub ownership: OwnershipResolver,
    #[serde(default)]
    pub remote: Option<RemoteConfig>,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    pub base_url: String,
    /// "ENV" means: read from CONTENT_HUB_API_KEY
    pub api_key: String,
    #[serde(default = "default_remote_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    pub user_id: Option<String>,
    pub email: Option<String>,
    /// "ENV" means: read from CONTENT_HUB_ACCESS_TOKEN
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Local,
    Remote,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    pub key: SourceKey,
    pub label: Option<String>,
    pub kind: Option<StoreKind>,
    /// Local: JSON blob file.
    pub path: Option<PathBuf>,
    /// Remote: table name.
    pub table: Option<String>,
    pub owner_column: Option<String>,
    pub id_column: Option<String>,
}

impl HubConfig {
    /// Load from an explicit TOML file; secrets marked "ENV" are resolved.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading hub config from {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("parsing {}", path.display()))
    }

    /// Resolution order:
    /// 1) $CONTENT_HUB_CONFIG (must exist)
    /// 2) config/content_hub.toml
    /// 3) built-in defaults (no sources)
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path"));
            }
            return Self::load_from(&pb);
        }
        let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from(&default_p);
        }
        Ok(Self::default())
    }

    pub fn parse(s: &str) -> Result<Self> {
        let mut cfg: HubConfig = toml::from_str(s)?;
        cfg.resolve_env()?;
        cfg.check_unique_sources()?;
        Ok(cfg)
    }

    fn resolve_env(&mut self) -> Result<()> {
        if let Some(remote) = self.remote.as_mut() {
            if remote.api_key.trim().eq_ignore_ascii_case("env") {
                remote.api_key = std::env::var(ENV_API_KEY)
                    .map_err(|_| anyhow!("Missing {ENV_API_KEY} env var"))?;
            }
            remote.base_url = remote.base_url.trim().trim_end_matches('/').to_string();
        }
        if let Some(token) = self.identity.access_token.as_mut() {
            if token.trim().eq_ignore_ascii_case("env") {
                *token = std::env::var(ENV_ACCESS_TOKEN)
                    .map_err(|_| anyhow!("Missing {ENV_ACCESS_TOKEN} env var"))?;
            }
        }
        Ok(())
    }

    fn check_unique_sources(&self) -> Result<()> {
        let mut seen = std::collections::BTreeSet::new();
        for s in &self.sources {
            if !seen.insert(s.key) {
                bail!("source `{}` configured more than once", s.key);
            }
        }
        Ok(())
    }
}
