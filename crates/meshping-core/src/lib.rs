// # meshping-core
//
// Client-side synchronization core of the meshping dashboard.
//
// ## Architecture Overview
//
// - **address**: Numeric ordering over IPv4/IPv6 address text
// - **pipeline**: Pure filter-and-sort derivation of the visible view
// - **SyncEngine**: Owns the canonical target collection, polls when stale
// - **MutationGateway**: Create/delete requests with eventual visibility
// - **SearchPersistence**: Restores and saves the search string
// - **ViewModel**: Composition root exposing the derived view
// - **TargetService** / **KeyValueStore**: Seams to the remote service and
//   to local persistence
//
// ## Design Principles
//
// 1. **Single owner**: only the engine writes the canonical collection
// 2. **Pure derivation**: the view is recomputed, never mutated in place
// 3. **Stale, not wrong**: failed polls change nothing and retry on the next tick
// 4. **No optimistic updates**: mutations become visible through the next poll

pub mod address;
pub mod config;
pub mod engine;
pub mod error;
pub mod mutation;
pub mod persistence;
pub mod pipeline;
pub mod target;
pub mod traits;
pub mod viewmodel;

// Re-export core types for convenience
pub use config::{DashboardConfig, PersistenceConfig, ServiceConfig, SyncConfig};
pub use engine::{PollOutcome, SyncEngine, SyncEvent, SyncPhase, TickOutcome};
pub use error::{Error, Result};
pub use mutation::{ConfirmDelete, CreateOutcome, DeleteOutcome, MutationGateway};
pub use persistence::{FileKeyValueStore, MemoryKeyValueStore, SearchPersistence};
pub use target::Target;
pub use traits::{KeyValueStore, TargetService};
pub use viewmodel::ViewModel;
