/// Identity provider client
///
/// Resolves a provider-issued access token to the user's profile using the
/// standard OIDC userinfo endpoint.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ServiceError, ServiceResult};

/// Subset of the OIDC userinfo claims we keep
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IdentityProfile {
    /// Stable subject identifier
    pub sub: String,
    /// Empty when the provider does not release the email claim
    #[serde(default)]
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn fetch_profile(&self, access_token: &str) -> ServiceResult<IdentityProfile>;
}

/// Provider reached over HTTPS
#[derive(Debug, Clone)]
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    userinfo_url: String,
}

impl HttpIdentityProvider {
    pub fn new(userinfo_url: impl Into<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            userinfo_url: userinfo_url.into(),
        })
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn fetch_profile(&self, access_token: &str) -> ServiceResult<IdentityProfile> {
        let response = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ServiceError::Identity(format!("userinfo request failed: {e}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            tracing::warn!("🚫 Identity provider rejected access token ({})", status);
            return Err(ServiceError::Unauthorized);
        }
        if !status.is_success() {
            return Err(ServiceError::Identity(format!("userinfo returned {status}")));
        }

        response
            .json::<IdentityProfile>()
            .await
            .map_err(|e| ServiceError::Identity(format!("invalid userinfo payload: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn userinfo_without_email_still_parses() {
        let profile: IdentityProfile =
            serde_json::from_str(r#"{"sub":"auth0|42","name":"Dana"}"#).unwrap();
        assert_eq!(profile.sub, "auth0|42");
        assert_eq!(profile.email, "");
        assert_eq!(profile.picture, None);
    }
}
