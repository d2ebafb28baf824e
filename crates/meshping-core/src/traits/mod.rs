//! Core traits for the meshping dashboard
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`TargetService`]: Talk to the remote service owning the target list
//! - [`KeyValueStore`]: Persist small client-side values across sessions

pub mod key_value_store;
pub mod target_service;

pub use key_value_store::{KeyValueStore, StoredValue};
pub use target_service::{
    CreateTargetRequest, CreateTargetResponse, DeleteTargetResponse, TargetListResponse,
    TargetService,
};
