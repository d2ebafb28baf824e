//! View model: the composition root of the dashboard
//!
//! Owns the search string and the derived view, listens to the engine's
//! collection channel and forwards user mutations to the gateway. There is
//! no global state: whoever renders the dashboard owns a `ViewModel` and
//! subscribes to its view channel.
//!
//! ## Data Flow
//!
//! ```text
//! SyncEngine ──watch──▶ ViewModel ──derive(collection, search)──▶ view watch
//!                          ▲   │
//!      search / keys ──────┘   └── SearchPersistence (save on change)
//! ```

pub mod input;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::debug;

use crate::engine::SyncEngine;
use crate::error::Result;
use crate::mutation::{ConfirmDelete, CreateOutcome, DeleteOutcome, MutationGateway};
use crate::persistence::SearchPersistence;
use crate::pipeline::derive;
use crate::target::Target;

pub use input::{InputAction, Key, KeyPress};

/// Reactive state consumed by the rendering layer
pub struct ViewModel {
    engine: Arc<SyncEngine>,
    gateway: MutationGateway,
    persistence: SearchPersistence,
    collection_rx: watch::Receiver<Arc<Vec<Target>>>,
    collection: Arc<Vec<Target>>,
    search: String,
    search_focused: bool,
    status_message: Option<String>,
    view_tx: watch::Sender<Arc<Vec<Target>>>,
}

impl ViewModel {
    /// Wire the view model and restore the persisted search string
    pub async fn new(
        engine: Arc<SyncEngine>,
        gateway: MutationGateway,
        persistence: SearchPersistence,
    ) -> Self {
        let search = persistence.restore().await;
        let mut collection_rx = engine.subscribe();
        let collection = collection_rx.borrow_and_update().clone();
        let (view_tx, _) = watch::channel(Arc::new(derive(&collection, &search)));

        Self {
            engine,
            gateway,
            persistence,
            collection_rx,
            collection,
            search,
            search_focused: false,
            status_message: None,
            view_tx,
        }
    }

    /// The current search string
    pub fn search(&self) -> &str {
        &self.search
    }

    /// Whether the search field has focus
    pub fn is_search_focused(&self) -> bool {
        self.search_focused
    }

    /// Snapshot of the filtered, ordered view
    pub fn filtered(&self) -> Arc<Vec<Target>> {
        self.view_tx.borrow().clone()
    }

    /// Snapshot of the canonical collection the view was derived from
    pub fn collection(&self) -> Arc<Vec<Target>> {
        self.collection.clone()
    }

    /// Subscribe to view changes
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Target>>> {
        self.view_tx.subscribe()
    }

    /// View changes as a stream (yields the current view first)
    pub fn view_stream(&self) -> WatchStream<Arc<Vec<Target>>> {
        WatchStream::new(self.view_tx.subscribe())
    }

    /// Message from the last successful mutation, cleared by the next poll
    pub fn status_message(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    /// Wall-clock time of the last successful sync
    pub async fn last_update(&self) -> Option<DateTime<Utc>> {
        self.engine.last_sync_at().await
    }

    /// Replace the search string, persist it and recompute the view
    ///
    /// The view is recomputed even if persisting fails; the persistence
    /// error is still returned.
    pub async fn set_search(&mut self, search: impl Into<String>) -> Result<()> {
        let search = search.into();
        if search == self.search {
            return Ok(());
        }

        self.search = search;
        self.recompute();
        self.persistence.save(&self.search).await
    }

    /// Reset the search string to empty
    pub async fn clear_search(&mut self) -> Result<()> {
        self.set_search(String::new()).await
    }

    /// Route a key press and perform the resulting action
    pub async fn handle_key(&mut self, press: KeyPress) -> Result<Option<InputAction>> {
        let action = input::route(press);
        match action {
            Some(InputAction::FocusSearch) => {
                self.search_focused = true;
            }
            Some(InputAction::ClearSearch) => {
                self.search_focused = false;
                self.clear_search().await?;
            }
            None => {}
        }
        Ok(action)
    }

    /// Apply a pending collection change from the engine, if any
    ///
    /// Returns `true` when a new collection was applied.
    pub fn sync_from_engine(&mut self) -> bool {
        if !self.collection_rx.has_changed().unwrap_or(false) {
            return false;
        }
        self.apply_collection();
        true
    }

    /// Wait for the engine to publish a new collection and apply it
    ///
    /// Returns `false` once the engine is gone.
    pub async fn changed(&mut self) -> bool {
        if self.collection_rx.changed().await.is_err() {
            return false;
        }
        self.apply_collection();
        true
    }

    /// Create a target; the new entries appear after the next poll
    pub async fn create_target(&mut self, name: &str, addr: Option<&str>) -> Result<CreateOutcome> {
        let outcome = self.gateway.create_target(name, addr).await?;
        self.status_message = Some(outcome.message());
        Ok(outcome)
    }

    /// Delete a target after confirmation; it disappears after the next poll
    pub async fn delete_target(
        &mut self,
        target: &Target,
        confirm: &dyn ConfirmDelete,
    ) -> Result<DeleteOutcome> {
        let outcome = self.gateway.delete_target(&target.identity(), confirm).await?;
        if let Some(message) = outcome.message() {
            self.status_message = Some(message);
        }
        Ok(outcome)
    }

    fn apply_collection(&mut self) {
        self.collection = self.collection_rx.borrow_and_update().clone();
        self.status_message = None;
        debug!("Collection changed ({} targets), recomputing view", self.collection.len());
        self.recompute();
    }

    fn recompute(&mut self) {
        let view = derive(&self.collection, &self.search);
        self.view_tx.send_replace(Arc::new(view));
    }
}
