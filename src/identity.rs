use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The signed-in user, passed explicitly into every load and delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>, email: Option<impl Into<String>>) -> Self {
        Self {
            id: id.into(),
            email: email.map(Into::into),
        }
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` means nobody is signed in; `Err` means the provider could not tell.
    async fn current_user(&self) -> Result<Option<Identity>>;
}

/// Fixed identity, or a permanently signed-out session.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentity(Option<Identity>);

impl StaticIdentity {
    pub fn signed_in(identity: Identity) -> Self {
        Self(Some(identity))
    }

    pub fn signed_out() -> Self {
        Self(None)
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentity {
    async fn current_user(&self) -> Result<Option<Identity>> {
        Ok(self.0.clone())
    }
}

/// Resolves the session user against the managed backend's auth endpoint.
pub struct RemoteIdentityProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    access_token: String,
}

#[derive(Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

impl RemoteIdentityProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        access_token: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building auth http client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            access_token: access_token.into(),
        })
    }
}

#[async_trait]
impl IdentityProvider for RemoteIdentityProvider {
    async fn current_user(&self) -> Result<Option<Identity>> {
        if self.access_token.is_empty() {
            return Ok(None);
        }
        let url = format!("{}/auth/v1/user", self.base_url);
        let resp = self
            .client
            .get(&url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.access_token)
            .send()
            .await
            .context("auth user request")?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            tracing::debug!(%status, "session rejected by auth endpoint");
            return Ok(None);
        }
        let user: AuthUser = resp
            .error_for_status()
            .context("auth user status")?
            .json()
            .await
            .context("decoding auth user")?;
        Ok(Some(Identity {
            id: user.id,
            email: user.email,
        }))
    }
}
