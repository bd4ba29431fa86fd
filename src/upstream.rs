use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;

use crate::config::UpstreamSettings;
use crate::domain::{ResourceKind, ResourceRef};
use crate::error::DexError;

/// Read-only access to the creature database. Implementations do not cache
/// and do not retry; callers decide what a failure means.
#[async_trait]
pub trait UpstreamClient: Send + Sync {
    async fn fetch(&self, kind: ResourceKind, target: &ResourceRef) -> Result<Value, DexError>;
}

#[async_trait]
impl<T: UpstreamClient + ?Sized> UpstreamClient for std::sync::Arc<T> {
    async fn fetch(&self, kind: ResourceKind, target: &ResourceRef) -> Result<Value, DexError> {
        (**self).fetch(kind, target).await
    }
}

#[derive(Clone)]
pub struct HttpUpstream {
    client: Client,
    base_url: String,
}

impl HttpUpstream {
    pub fn new(settings: &UpstreamSettings) -> Result<Self, DexError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&settings.user_agent)
                .map_err(|err| DexError::ConfigParse(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|err| DexError::UpstreamHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Links are used verbatim. For the species index, an `Id` target is the
    /// page size of the listing.
    pub fn resource_url(&self, kind: ResourceKind, target: &ResourceRef) -> String {
        match (kind, target) {
            (_, ResourceRef::Link(url)) => url.clone(),
            (ResourceKind::SpeciesIndex, ResourceRef::Id(limit)) => {
                format!("{}/{}?limit={limit}", self.base_url, kind.path())
            }
            (ResourceKind::SpeciesIndex, ResourceRef::Name(_)) => {
                format!("{}/{}", self.base_url, kind.path())
            }
            (_, ResourceRef::Id(id)) => format!("{}/{}/{id}", self.base_url, kind.path()),
            (_, ResourceRef::Name(name)) => {
                format!("{}/{}/{name}", self.base_url, kind.path())
            }
        }
    }

    async fn handle_status(response: reqwest::Response) -> Result<reqwest::Response, DexError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "upstream request failed".to_string());
        Err(DexError::UpstreamStatus { status, message })
    }
}

#[async_trait]
impl UpstreamClient for HttpUpstream {
    async fn fetch(&self, kind: ResourceKind, target: &ResourceRef) -> Result<Value, DexError> {
        let url = self.resource_url(kind, target);
        tracing::debug!(%kind, %url, "upstream request");
        let start = std::time::Instant::now();
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| DexError::UpstreamHttp(err.to_string()))?;
        let response = Self::handle_status(response).await?;
        let value: Value = response
            .json()
            .await
            .map_err(|err| DexError::Malformed(format!("{kind} {target}: {err}")))?;
        tracing::debug!(
            %kind,
            %url,
            latency_ms = start.elapsed().as_millis() as u64,
            "upstream response"
        );
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolvedConfig;

    #[test]
    fn resource_urls() {
        let mut settings = ResolvedConfig::default().upstream;
        settings.base_url = "https://example.test/api/v2/".to_string();
        let client = HttpUpstream::new(&settings).unwrap();

        assert_eq!(
            client.resource_url(ResourceKind::Entity, &ResourceRef::Id(1)),
            "https://example.test/api/v2/pokemon/1"
        );
        assert_eq!(
            client.resource_url(ResourceKind::Type, &ResourceRef::Name("grass".to_string())),
            "https://example.test/api/v2/type/grass"
        );
        assert_eq!(
            client.resource_url(ResourceKind::SpeciesIndex, &ResourceRef::Id(1500)),
            "https://example.test/api/v2/pokemon-species?limit=1500"
        );
        assert_eq!(
            client.resource_url(
                ResourceKind::EvolutionChain,
                &ResourceRef::Link("https://example.test/api/v2/evolution-chain/1/".to_string())
            ),
            "https://example.test/api/v2/evolution-chain/1/"
        );
    }
}
