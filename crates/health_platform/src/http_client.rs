//! HTTP implementation of [`HealthPlatform`](crate::HealthPlatform).
//!
//! The device plugin is reached through a companion bridge that exposes the four
//! plugin operations (plus the store hook) as JSON endpoints.

use crate::config::Config;
use crate::{AggregateQuery, AuthorizationScope, HealthPlatform, PlatformError};
use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Bridge client using reqwest.
#[derive(Clone, Debug)]
pub struct ReqwestHealthPlatform {
    base_url: String,
    token: SecretString,
    remediation: bool,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct AvailableResponse {
    available: bool,
}

#[derive(Deserialize)]
struct AuthorizedResponse {
    authorized: bool,
}

#[derive(Deserialize)]
struct GrantResponse {
    granted: bool,
}

impl ReqwestHealthPlatform {
    /// Create a new bridge client.
    ///
    /// # Arguments
    /// * `base_url` - Root of the bridge (e.g., "http://127.0.0.1:8787")
    /// * `token` - Bearer token the bridge was started with
    pub fn new(base_url: &str, token: SecretString) -> Result<Self, PlatformError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
            remediation: false,
            client,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, PlatformError> {
        Ok(Self::new(&config.bridge_url, config.bridge_token.clone())?
            .with_remediation(config.remediation))
    }

    /// Advertise the store hook to callers.
    pub fn with_remediation(mut self, enabled: bool) -> Self {
        self.remediation = enabled;
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1/health/{}", self.base_url, path)
    }

    fn get_request(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(self.url(path))
            .bearer_auth(self.token.expose_secret())
    }

    fn post_request(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(self.url(path))
            .bearer_auth(self.token.expose_secret())
    }

    /// Execute a request and expect a JSON response.
    async fn execute_json<T: serde::de::DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, PlatformError> {
        let resp = request.send().await?;
        if !resp.status().is_success() {
            return Err(self.error_from_response(resp).await);
        }
        Ok(resp.json::<T>().await?)
    }

    /// Execute a request with no expected response body.
    async fn execute_empty(&self, request: reqwest::RequestBuilder) -> Result<(), PlatformError> {
        let resp = request.send().await?;
        if !resp.status().is_success() {
            return Err(self.error_from_response(resp).await);
        }
        Ok(())
    }

    /// Extract error information from a failed response.
    async fn error_from_response(&self, resp: reqwest::Response) -> PlatformError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        let body_snippet: String = body.chars().take(256).collect();
        PlatformError::from_status(status, body_snippet)
    }
}

#[async_trait]
impl HealthPlatform for ReqwestHealthPlatform {
    async fn is_available(&self) -> Result<bool, PlatformError> {
        tracing::debug!("bridge: checking availability");
        let resp: AvailableResponse = self.execute_json(self.get_request("available")).await?;
        Ok(resp.available)
    }

    async fn is_authorized(&self, scope: &AuthorizationScope) -> Result<bool, PlatformError> {
        tracing::debug!("bridge: checking existing grant");
        let resp: AuthorizedResponse = self
            .execute_json(self.post_request("authorization/check").json(scope))
            .await?;
        Ok(resp.authorized)
    }

    async fn request_authorization(
        &self,
        scope: &AuthorizationScope,
    ) -> Result<bool, PlatformError> {
        tracing::debug!("bridge: requesting authorization");
        let resp: GrantResponse = self
            .execute_json(self.post_request("authorization/request").json(scope))
            .await?;
        Ok(resp.granted)
    }

    async fn query_aggregated(
        &self,
        query: &AggregateQuery,
    ) -> Result<serde_json::Value, PlatformError> {
        tracing::debug!(metric = %query.data_type, "bridge: aggregated query");
        self.execute_json(self.post_request("aggregated").json(query))
            .await
    }

    fn supports_remediation(&self) -> bool {
        self.remediation
    }

    async fn open_health_store(&self) -> Result<(), PlatformError> {
        if !self.remediation {
            return Err(PlatformError::Unsupported);
        }
        self.execute_empty(self.post_request("store/open")).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_trailing_slash() {
        let client =
            ReqwestHealthPlatform::new("http://localhost/", SecretString::new("tok".into()))
                .expect("client");
        assert_eq!(client.url("available"), "http://localhost/api/v1/health/available");
        assert!(!client.supports_remediation());
    }

    #[test]
    fn from_config_carries_remediation_flag() {
        let cfg = Config {
            bridge_token: SecretString::new("tok".into()),
            bridge_url: "http://localhost".into(),
            remediation: true,
        };
        let client = ReqwestHealthPlatform::from_config(&cfg).expect("client");
        assert!(client.supports_remediation());
    }

    #[tokio::test]
    async fn open_health_store_unsupported_without_flag() {
        let client = ReqwestHealthPlatform::new("http://localhost", SecretString::new("t".into()))
            .expect("client");
        let res = client.open_health_store().await;
        assert!(matches!(res, Err(PlatformError::Unsupported)));
    }
}
