//! Error types for the meshping dashboard
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for dashboard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the meshping dashboard
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed address text handed to the address ordering
    #[error("Invalid address '{address}': {reason}")]
    AddressParse {
        /// The offending address text
        address: String,
        /// What was wrong with it
        reason: String,
    },

    /// A poll of the remote service failed (wraps the transport or payload error)
    #[error("Poll failed: {0}")]
    Poll(String),

    /// A create or delete request failed or was rejected by the service
    #[error("Mutation failed: {0}")]
    Mutation(String),

    /// Key-value persistence errors
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client errors (non-success status, unreadable body)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create an address parse error
    pub fn address_parse(address: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::AddressParse {
            address: address.into(),
            reason: reason.into(),
        }
    }

    /// Create a poll error
    pub fn poll(msg: impl Into<String>) -> Self {
        Self::Poll(msg.into())
    }

    /// Create a mutation error
    pub fn mutation(msg: impl Into<String>) -> Self {
        Self::Mutation(msg.into())
    }

    /// Create a persistence error
    pub fn persistence(msg: impl Into<String>) -> Self {
        Self::Persistence(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}
