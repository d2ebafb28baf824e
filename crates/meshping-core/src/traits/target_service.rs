// # Target Service Trait
//
// Defines the interface to the remote meshping service that owns the
// authoritative target list.
//
// ## Implementations
//
// - HTTP/JSON: `meshping-http` crate
// - Test doubles: `tests/common/mod.rs`
//
// ## REST contract
//
// ```text
// GET    /api/targets             -> { "targets": [ { "name", "addr" } ] }
// POST   /api/targets             <- { "target": "name[@addr]" }
//                                 -> { "success": bool, "targets": [string] }
// DELETE /api/targets/{identity}  -> { "success": bool }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::target::Target;

/// Body of `GET /api/targets`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetListResponse {
    /// Every target known to the service, in service order
    pub targets: Vec<Target>,
}

/// Body of `POST /api/targets`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTargetRequest {
    /// `name` or `name@addr`
    pub target: String,
}

/// Response of `POST /api/targets`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTargetResponse {
    /// Whether the service accepted the request
    pub success: bool,
    /// Identities actually created; a bare name may resolve to several
    #[serde(default)]
    pub targets: Vec<String>,
}

/// Response of `DELETE /api/targets/{identity}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteTargetResponse {
    /// Whether the service removed the target
    pub success: bool,
}

/// Trait for remote target service implementations
///
/// Implementations perform exactly one request per call. Scheduling,
/// staleness tracking and the decision to poll are owned by
/// [`SyncEngine`](crate::engine::SyncEngine); user confirmation and message
/// handling are owned by [`MutationGateway`](crate::mutation::MutationGateway).
///
/// # Errors
///
/// Any transport failure, non-success status or undecodable body must be
/// returned as an error rather than papered over with an empty result.
#[async_trait]
pub trait TargetService: Send + Sync {
    /// Fetch the full target collection
    async fn fetch_targets(&self) -> Result<Vec<Target>, crate::Error>;

    /// Ask the service to create the target(s) described by `identity`
    async fn create_target(&self, identity: &str) -> Result<CreateTargetResponse, crate::Error>;

    /// Ask the service to delete the target with the given `name@addr` identity
    async fn delete_target(&self, identity: &str) -> Result<DeleteTargetResponse, crate::Error>;

    /// Short name for logging (e.g., "http")
    fn service_name(&self) -> &'static str;
}
