//! Monitored target model
//!
//! A target is identified for mutation purposes by the composite string
//! `name@addr`. The collection as a whole is replaced wholesale on every
//! successful poll, so this module only provides the value type and the
//! duplicate filter applied to server payloads.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Separator between name and address in a target identity
pub const IDENTITY_SEPARATOR: char = '@';

/// A monitored endpoint
///
/// Extra fields sent by the service (statistics, histograms) are ignored
/// on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    /// Display name, unique within the collection
    pub name: String,
    /// IPv4 or IPv6 address text, unique within the collection
    pub addr: String,
}

impl Target {
    /// Create a new target
    pub fn new(name: impl Into<String>, addr: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            addr: addr.into(),
        }
    }

    /// Identity string used by the service for deletion (`name@addr`)
    pub fn identity(&self) -> String {
        format!("{}{}{}", self.name, IDENTITY_SEPARATOR, self.addr)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.name, IDENTITY_SEPARATOR, self.addr)
    }
}

/// Build the identity sent to the service when creating a target
///
/// An absent or empty address yields the bare name, which the service may
/// resolve into several addresses.
pub fn create_identity(name: &str, addr: Option<&str>) -> String {
    match addr {
        Some(addr) if !addr.is_empty() => format!("{}{}{}", name, IDENTITY_SEPARATOR, addr),
        _ => name.to_string(),
    }
}

/// Drop targets whose identity already appeared earlier in the sequence
///
/// Order of the surviving targets is preserved. Returns the deduplicated
/// collection and the number of dropped entries.
pub fn dedupe(targets: Vec<Target>) -> (Vec<Target>, usize) {
    let total = targets.len();
    let mut seen = HashSet::with_capacity(total);
    let unique: Vec<Target> = targets
        .into_iter()
        .filter(|target| seen.insert(target.identity()))
        .collect();
    let dropped = total - unique.len();
    (unique, dropped)
}
