//! Pinecone REST client
//!
//! Blocking ureq client for the control plane (`/indexes`) and the
//! per-index data plane (`/vectors/upsert`, `/query`, `/describe_index_stats`).

use std::time::Duration;

use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::service::VectorService;
use super::types::{
    IndexDescription, IndexList, IndexSpec, IndexStats, QueryRequest, QueryResponse,
    UpsertRequest, UpsertResponse, VectorRecord,
};
use crate::error::{EmbedSearchError, Result};

/// Default control-plane endpoint
pub const DEFAULT_CONTROLLER_URL: &str = "https://api.pinecone.io";

/// API version sent with every request
pub const API_VERSION: &str = "2024-07";

/// Connection settings
#[derive(Clone)]
pub struct PineconeConfig {
    pub api_key: String,
    pub controller_url: String,
    pub api_version: String,
    pub timeout: Duration,
}

impl PineconeConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            controller_url: DEFAULT_CONTROLLER_URL.to_string(),
            api_version: API_VERSION.to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Read `PINECONE_API_KEY` and optional `PINECONE_CONTROLLER_HOST`
    ///
    /// Call `dotenvy::dotenv()` first if the key lives in a `.env` file.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(
            std::env::var("PINECONE_API_KEY").ok(),
            std::env::var("PINECONE_CONTROLLER_HOST").ok(),
        )
    }

    fn from_vars(api_key: Option<String>, controller: Option<String>) -> Result<Self> {
        let api_key = api_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| EmbedSearchError::config("PINECONE_API_KEY is not set"))?;

        let mut config = Self::new(api_key);
        if let Some(controller) = controller.filter(|c| !c.trim().is_empty()) {
            config.controller_url = with_scheme(controller.trim());
        }
        Ok(config)
    }
}

impl std::fmt::Debug for PineconeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PineconeConfig")
            .field("api_key", &"<redacted>")
            .field("controller_url", &self.controller_url)
            .field("api_version", &self.api_version)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Prefix `https://` unless a scheme is already present
fn with_scheme(host: &str) -> String {
    let host = host.trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{host}")
    }
}

/// Blocking Pinecone client
pub struct PineconeClient {
    agent: ureq::Agent,
    config: PineconeConfig,
    /// index name -> data-plane base URL
    hosts: DashMap<String, String>,
}

impl PineconeClient {
    pub fn new(config: PineconeConfig) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(config.timeout).build();
        log::info!("Pinecone client targeting {}", config.controller_url);
        Self {
            agent,
            config,
            hosts: DashMap::new(),
        }
    }

    pub fn config(&self) -> &PineconeConfig {
        &self.config
    }

    fn controller(&self, path: &str) -> String {
        format!("{}{}", self.config.controller_url, path)
    }

    /// Data-plane URL for an index, describing it once to learn the host
    fn data_plane(&self, index: &str, path: &str) -> Result<String> {
        if let Some(base) = self.hosts.get(index) {
            return Ok(format!("{}{}", base.value(), path));
        }

        let description = self.describe_index(index)?;
        if description.host.is_empty() {
            return Err(EmbedSearchError::not_found(format!(
                "{index} (no data-plane host yet)"
            )));
        }
        let base = with_scheme(&description.host);
        self.hosts.insert(index.to_string(), base.clone());
        Ok(format!("{base}{path}"))
    }

    fn call<T: DeserializeOwned>(&self, method: &str, url: &str, body: Option<Value>) -> Result<T> {
        log::debug!("{} {}", method, url);

        let request = self
            .agent
            .request(method, url)
            .set("Api-Key", &self.config.api_key)
            .set("X-Pinecone-API-Version", &self.config.api_version)
            .set("Accept", "application/json");

        let response = match body {
            Some(body) => request.send_json(body),
            None => request.call(),
        };

        match response {
            Ok(response) => {
                let text = response.into_string()?;
                if text.trim().is_empty() {
                    Ok(serde_json::from_str("{}")?)
                } else {
                    Ok(serde_json::from_str(&text)?)
                }
            }
            Err(ureq::Error::Status(status, response)) => {
                let body = response.into_string().unwrap_or_default();
                log::debug!("{} {} -> HTTP {}: {}", method, url, status, body);
                Err(EmbedSearchError::HttpStatus { status, body })
            }
            Err(ureq::Error::Transport(transport)) => {
                Err(EmbedSearchError::Transport(transport.to_string()))
            }
        }
    }
}

impl VectorService for PineconeClient {
    fn list_indexes(&self) -> Result<Vec<IndexDescription>> {
        let list: IndexList = self.call("GET", &self.controller("/indexes"), None)?;
        Ok(list.indexes)
    }

    fn describe_index(&self, name: &str) -> Result<IndexDescription> {
        let url = self.controller(&format!("/indexes/{name}"));
        match self.call::<IndexDescription>("GET", &url, None) {
            Err(e) if e.is_not_found() => Err(EmbedSearchError::not_found(name)),
            other => other,
        }
    }

    fn create_index(&self, spec: &IndexSpec) -> Result<IndexDescription> {
        self.call(
            "POST",
            &self.controller("/indexes"),
            Some(serde_json::to_value(spec)?),
        )
    }

    fn upsert(&self, index: &str, namespace: &str, records: &[VectorRecord]) -> Result<usize> {
        let url = self.data_plane(index, "/vectors/upsert")?;
        let body = serde_json::to_value(UpsertRequest {
            vectors: records,
            namespace,
        })?;
        let response: UpsertResponse = self.call("POST", &url, Some(body))?;
        Ok(response.upserted_count)
    }

    fn query(&self, index: &str, request: &QueryRequest) -> Result<QueryResponse> {
        let url = self.data_plane(index, "/query")?;
        self.call("POST", &url, Some(serde_json::to_value(request)?))
    }

    fn describe_index_stats(&self, index: &str) -> Result<IndexStats> {
        let url = self.data_plane(index, "/describe_index_stats")?;
        self.call("POST", &url, Some(serde_json::json!({})))
    }
}
