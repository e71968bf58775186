//! Google id-token verification through the `tokeninfo` endpoint.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::GoogleConfig;

/// Identity asserted by a verified Google id token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoogleProfile {
    pub email: String,
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub picture: Option<String>,
}

#[async_trait]
pub trait GoogleVerifier: Send + Sync {
    async fn verify(&self, id_token: &str) -> anyhow::Result<GoogleProfile>;
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    email: Option<String>,
    // tokeninfo returns booleans as strings
    email_verified: Option<serde_json::Value>,
    aud: Option<String>,
    given_name: Option<String>,
    family_name: Option<String>,
    picture: Option<String>,
}

fn is_true(value: &Option<serde_json::Value>) -> bool {
    match value {
        Some(serde_json::Value::Bool(b)) => *b,
        Some(serde_json::Value::String(s)) => s == "true",
        _ => false,
    }
}

#[derive(Clone)]
pub struct HttpGoogleVerifier {
    client: reqwest::Client,
    tokeninfo_url: String,
    client_id: Option<String>,
}

impl HttpGoogleVerifier {
    pub fn new(cfg: &GoogleConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            tokeninfo_url: cfg.tokeninfo_url.clone(),
            client_id: cfg.client_id.clone(),
        }
    }
}

#[async_trait]
impl GoogleVerifier for HttpGoogleVerifier {
    async fn verify(&self, id_token: &str) -> anyhow::Result<GoogleProfile> {
        let resp = self
            .client
            .get(&self.tokeninfo_url)
            .query(&[("id_token", id_token)])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, body = %body, "google tokeninfo rejected id token");
            anyhow::bail!("tokeninfo returned {status}");
        }

        let info: TokenInfo = resp.json().await?;
        if let Some(expected) = &self.client_id {
            if info.aud.as_deref() != Some(expected.as_str()) {
                anyhow::bail!("id token issued for another client");
            }
        }
        if !is_true(&info.email_verified) {
            anyhow::bail!("google email not verified");
        }
        let email = info
            .email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| anyhow::anyhow!("id token carries no email"))?;

        debug!(email = %email, "google id token verified");
        Ok(GoogleProfile {
            email,
            given_name: info.given_name,
            family_name: info.family_name,
            picture: info.picture,
        })
    }
}
