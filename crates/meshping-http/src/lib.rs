// # HTTP Target Service
//
// This crate provides the HTTP/JSON implementation of `TargetService`,
// talking to the REST API of a running meshping instance.
//
// ## Behavior
//
// - Makes exactly one HTTP request per call
// - Every failure is returned to the caller: transport errors and
//   non-success statuses as `Error::Http`, undecodable bodies as
//   `Error::Json`
// - No retries, no caching, no background tasks (scheduling is owned by
//   `SyncEngine`)
//
// ## Endpoints
//
// - List:   GET    `{base}/api/targets`
// - Create: POST   `{base}/api/targets`
// - Delete: DELETE `{base}/api/targets/{identity}` (one encoded segment)

use async_trait::async_trait;
use meshping_core::config::ServiceConfig;
use meshping_core::traits::{
    CreateTargetRequest, CreateTargetResponse, DeleteTargetResponse, TargetListResponse,
    TargetService,
};
use meshping_core::{Error, Result, Target};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

/// HTTP client for the meshping target API
#[derive(Debug, Clone)]
pub struct HttpTargetService {
    /// `{base}/api/targets`
    targets_url: Url,

    /// HTTP client (carries the request timeout)
    client: reqwest::Client,
}

impl HttpTargetService {
    /// Create a service client from its configuration
    ///
    /// Fails if the configuration is invalid or the base URL cannot carry
    /// a path.
    pub fn new(config: &ServiceConfig) -> Result<Self> {
        config.validate()?;

        let targets_url = targets_url(&config.base_url)?;
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            targets_url,
            client,
        })
    }

    /// URL of the target collection
    pub fn targets_url(&self) -> &Url {
        &self.targets_url
    }

    /// URL of a single target, with the identity encoded as one path segment
    pub fn target_url(&self, identity: &str) -> Result<Url> {
        let mut url = self.targets_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::config("Base URL cannot carry a path"))?
            .push(identity);
        Ok(url)
    }
}

/// Build `{base}/api/targets`, tolerating a trailing slash on the base
fn targets_url(base_url: &str) -> Result<Url> {
    let mut url = Url::parse(base_url)
        .map_err(|e| Error::config(format!("Invalid base URL '{}': {}", base_url, e)))?;

    url.path_segments_mut()
        .map_err(|_| Error::config(format!("Base URL cannot carry a path: {}", base_url)))?
        .pop_if_empty()
        .extend(["api", "targets"]);

    Ok(url)
}

/// Check the status and decode the JSON body of a response
async fn decode<T: DeserializeOwned>(response: Response, action: &str) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        return Err(Error::http(format!("{} returned HTTP {}", action, status)));
    }

    let body = response
        .text()
        .await
        .map_err(|e| Error::http(format!("{}: failed to read response: {}", action, e)))?;

    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl TargetService for HttpTargetService {
    async fn fetch_targets(&self) -> Result<Vec<Target>> {
        debug!("GET {}", self.targets_url);

        let response = self
            .client
            .get(self.targets_url.clone())
            .send()
            .await
            .map_err(|e| Error::http(format!("List request failed: {}", e)))?;

        let list: TargetListResponse = decode(response, "List targets").await?;
        Ok(list.targets)
    }

    async fn create_target(&self, identity: &str) -> Result<CreateTargetResponse> {
        debug!("POST {} ({})", self.targets_url, identity);

        let request = CreateTargetRequest {
            target: identity.to_string(),
        };
        let response = self
            .client
            .post(self.targets_url.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::http(format!("Create request failed: {}", e)))?;

        decode(response, "Create target").await
    }

    async fn delete_target(&self, identity: &str) -> Result<DeleteTargetResponse> {
        let url = self.target_url(identity)?;
        debug!("DELETE {}", url);

        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|e| Error::http(format!("Delete request failed: {}", e)))?;

        decode(response, "Delete target").await
    }

    fn service_name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(base_url: &str) -> HttpTargetService {
        HttpTargetService::new(&ServiceConfig::new(base_url)).unwrap()
    }

    #[test]
    fn test_targets_url_from_bare_host() {
        let service = service("http://127.0.0.1:9922");
        assert_eq!(service.targets_url().as_str(), "http://127.0.0.1:9922/api/targets");
    }

    #[test]
    fn test_targets_url_keeps_base_path() {
        let service = service("https://mon.example.net/meshping/");
        assert_eq!(
            service.targets_url().as_str(),
            "https://mon.example.net/meshping/api/targets"
        );
    }

    #[test]
    fn test_identity_is_a_single_segment() {
        let service = service("http://127.0.0.1:9922");

        let url = service.target_url("gw@10.0.0.1").unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:9922/api/targets/gw@10.0.0.1");

        let url = service.target_url("odd/name@10.0.0.1").unwrap();
        assert_eq!(
            url.as_str(),
            "http://127.0.0.1:9922/api/targets/odd%2Fname@10.0.0.1"
        );

        let url = service.target_url("my host@fe80:0:0:0:0:0:0:1").unwrap();
        assert_eq!(url.path_segments().unwrap().count(), 3);
    }

    #[test]
    fn test_rejects_invalid_config() {
        assert!(HttpTargetService::new(&ServiceConfig::new("")).is_err());
        assert!(HttpTargetService::new(&ServiceConfig::new("ftp://host")).is_err());

        let mut config = ServiceConfig::new("http://127.0.0.1:9922");
        config.request_timeout_secs = 0;
        assert!(HttpTargetService::new(&config).is_err());
    }

    #[test]
    fn test_service_name() {
        assert_eq!(service("http://127.0.0.1:9922").service_name(), "http");
    }
}
