//! Create and delete requests against the remote service
//!
//! Mutations never touch the canonical collection. A created target shows
//! up, and a deleted one disappears, only once the next successful poll
//! brings the service's view of the world back.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::target::{IDENTITY_SEPARATOR, create_identity};
use crate::traits::TargetService;
use tracing::{debug, info, warn};

/// Destructive-action guard consulted before every delete
pub trait ConfirmDelete: Send + Sync {
    /// Return `true` to proceed with deleting `identity`
    fn confirm(&self, identity: &str) -> bool;
}

/// Any `Fn(&str) -> bool` closure can act as a confirmation prompt
impl<F> ConfirmDelete for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn confirm(&self, identity: &str) -> bool {
        self(identity)
    }
}

/// Result of a successful create request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOutcome {
    /// Identities the service actually created, in service order
    pub created: Vec<String>,
}

impl CreateOutcome {
    /// Message shown to the user after the request succeeded
    pub fn message(&self) -> String {
        format!(
            "Added targets: {}. New targets will show up after the next ping cycle.",
            self.created.join(", ")
        )
    }
}

/// Result of a delete request that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The user declined; no request was sent
    Declined,
    /// The service removed the target
    Deleted { identity: String },
}

impl DeleteOutcome {
    /// Message shown to the user, if any
    pub fn message(&self) -> Option<String> {
        match self {
            DeleteOutcome::Declined => None,
            DeleteOutcome::Deleted { identity } => Some(format!(
                "Deleted target {}. It will disappear after the next ping cycle.",
                identity
            )),
        }
    }
}

/// Issues create/delete requests and reports their outcome
///
/// Failures are returned to the caller as [`Error::Mutation`] (or the
/// transport error) and are never retried automatically.
#[derive(Clone)]
pub struct MutationGateway {
    service: Arc<dyn TargetService>,
}

impl MutationGateway {
    /// Create a gateway over the given service
    pub fn new(service: Arc<dyn TargetService>) -> Self {
        Self { service }
    }

    /// Create a target from a name and an optional address
    ///
    /// A bare name lets the service resolve it, possibly into several
    /// targets; every created identity is reported back.
    pub async fn create_target(&self, name: &str, addr: Option<&str>) -> Result<CreateOutcome> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::invalid_input("Target name cannot be empty"));
        }
        if name.contains(IDENTITY_SEPARATOR) {
            return Err(Error::invalid_input(format!(
                "Target name cannot contain '{}': {}",
                IDENTITY_SEPARATOR, name
            )));
        }

        let identity = create_identity(name, addr.map(str::trim));
        debug!("Creating target {}", identity);

        let response = self.service.create_target(&identity).await.map_err(|e| {
            warn!("Create request for {} failed: {}", identity, e);
            e
        })?;

        if !response.success {
            warn!("Service rejected creation of {}", identity);
            return Err(Error::mutation(format!(
                "Service rejected creation of {}",
                identity
            )));
        }

        info!("Created {} target(s) from {}", response.targets.len(), identity);
        Ok(CreateOutcome {
            created: response.targets,
        })
    }

    /// Delete the target with the given `name@addr` identity
    ///
    /// `confirm` is consulted first; a declined confirmation sends nothing.
    pub async fn delete_target(
        &self,
        identity: &str,
        confirm: &dyn ConfirmDelete,
    ) -> Result<DeleteOutcome> {
        if identity.is_empty() {
            return Err(Error::invalid_input("Target identity cannot be empty"));
        }

        if !confirm.confirm(identity) {
            debug!("Deletion of {} declined", identity);
            return Ok(DeleteOutcome::Declined);
        }

        let response = self.service.delete_target(identity).await.map_err(|e| {
            warn!("Delete request for {} failed: {}", identity, e);
            e
        })?;

        if !response.success {
            warn!("Service rejected deletion of {}", identity);
            return Err(Error::mutation(format!(
                "Service rejected deletion of {}",
                identity
            )));
        }

        info!("Deleted target {}", identity);
        Ok(DeleteOutcome::Deleted {
            identity: identity.to_string(),
        })
    }
}
