//! Contract Test: View Model
//!
//! The view model composes engine, pipeline and persistence into the view
//! the dashboard renders.
//!
//! Constraints verified:
//! - The persisted search is restored on startup and applied to the view
//! - Every search change recomputes the view and is persisted
//! - Escape clears and persists the search, Ctrl+F focuses it
//! - New collections from the engine are applied and re-filtered

mod common;

use common::*;
use meshping_core::persistence::SEARCH_KEY;
use meshping_core::viewmodel::{InputAction, Key, KeyPress};
use meshping_core::{
    KeyValueStore, MemoryKeyValueStore, MutationGateway, SearchPersistence, Target, ViewModel,
};
use std::sync::Arc;
use tokio_stream::StreamExt;

async fn view_model_with_store(
    service: &Arc<ScriptedTargetService>,
    store: &MemoryKeyValueStore,
) -> (ViewModel, Arc<meshping_core::SyncEngine>) {
    let (engine, _events) = engine_for(service);
    let gateway = MutationGateway::new(service.clone());
    let persistence = SearchPersistence::new(Arc::new(store.clone()));
    let view = ViewModel::new(engine.clone(), gateway, persistence).await;
    (view, engine)
}

#[tokio::test]
async fn restored_search_filters_first_view() {
    let service = ScriptedTargetService::new(sample_targets());
    let store = MemoryKeyValueStore::new();
    store.set(SEARCH_KEY, "edge").await.unwrap();

    let (mut view, engine) = view_model_with_store(&service, &store).await;
    assert_eq!(view.search(), "edge");
    assert!(view.filtered().is_empty());

    engine.poll().await;
    assert!(view.sync_from_engine());
    assert_eq!(view.filtered().as_slice(), &[Target::new("edge-b", "10.0.0.1")]);
}

#[tokio::test]
async fn search_changes_recompute_and_persist() {
    let service = ScriptedTargetService::new(sample_targets());
    let store = MemoryKeyValueStore::new();
    let (mut view, engine) = view_model_with_store(&service, &store).await;

    engine.poll().await;
    view.sync_from_engine();
    assert_eq!(view.filtered().len(), 2);

    let mut updates = view.subscribe();
    view.set_search("CORE").await.unwrap();
    assert!(updates.has_changed().unwrap());
    assert_eq!(updates.borrow_and_update().as_slice(), &[Target::new("core-a", "10.0.0.2")]);
    assert_eq!(store.get(SEARCH_KEY).await.unwrap(), Some("CORE".to_string()));

    // Address match on the literal text
    view.set_search("0.0.1").await.unwrap();
    assert_eq!(view.filtered().as_slice(), &[Target::new("edge-b", "10.0.0.1")]);

    // The canonical collection is untouched by filtering
    assert_eq!(view.collection().as_slice(), sample_targets().as_slice());
}

#[tokio::test]
async fn escape_clears_and_ctrl_f_focuses() {
    let service = ScriptedTargetService::new(sample_targets());
    let store = MemoryKeyValueStore::new();
    let (mut view, engine) = view_model_with_store(&service, &store).await;

    engine.poll().await;
    view.sync_from_engine();

    let action = view.handle_key(KeyPress::ctrl(Key::Char('f'))).await.unwrap();
    assert_eq!(action, Some(InputAction::FocusSearch));
    assert!(view.is_search_focused());

    view.set_search("core").await.unwrap();
    assert_eq!(view.filtered().len(), 1);

    let action = view.handle_key(KeyPress::plain(Key::Escape)).await.unwrap();
    assert_eq!(action, Some(InputAction::ClearSearch));
    assert!(!view.is_search_focused());
    assert_eq!(view.search(), "");
    assert_eq!(view.filtered().len(), 2);
    assert_eq!(store.get(SEARCH_KEY).await.unwrap(), Some(String::new()));

    let action = view.handle_key(KeyPress::plain(Key::Char('x'))).await.unwrap();
    assert_eq!(action, None);
}

#[tokio::test]
async fn changed_applies_engine_updates() {
    let service = ScriptedTargetService::new(sample_targets());
    let store = MemoryKeyValueStore::new();
    let (mut view, engine) = view_model_with_store(&service, &store).await;

    let poller = engine.clone();
    tokio::spawn(async move { poller.poll().await });

    assert!(view.changed().await);
    assert_eq!(
        view.filtered().as_slice(),
        &[
            Target::new("edge-b", "10.0.0.1"),
            Target::new("core-a", "10.0.0.2"),
        ]
    );
}

#[tokio::test]
async fn view_stream_yields_current_then_updates() {
    let service = ScriptedTargetService::new(sample_targets());
    let store = MemoryKeyValueStore::new();
    let (mut view, engine) = view_model_with_store(&service, &store).await;

    let mut stream = view.view_stream();
    let first = stream.next().await.expect("current view");
    assert!(first.is_empty());

    engine.poll().await;
    view.sync_from_engine();

    let second = stream.next().await.expect("updated view");
    assert_eq!(second.len(), 2);
}

#[tokio::test]
async fn status_message_cleared_by_next_collection() {
    let service = ScriptedTargetService::new(sample_targets());
    let store = MemoryKeyValueStore::new();
    let (mut view, engine) = view_model_with_store(&service, &store).await;

    view.create_target("gw", Some("10.0.0.3")).await.unwrap();
    assert!(view.status_message().is_some());

    engine.poll().await;
    view.sync_from_engine();
    assert_eq!(view.status_message(), None);
}

#[tokio::test]
async fn last_update_follows_engine() {
    let service = ScriptedTargetService::new(sample_targets());
    let store = MemoryKeyValueStore::new();
    let (view, engine) = view_model_with_store(&service, &store).await;

    assert_eq!(view.last_update().await, None);
    engine.poll().await;
    assert_eq!(view.last_update().await, engine.last_sync_at().await);
    assert!(view.last_update().await.is_some());
}
