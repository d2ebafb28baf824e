//! Test doubles and common utilities for contract tests
//!
//! The scripted service behaves like a tiny in-memory meshping server:
//! creates and deletes change what the next poll returns, which is exactly
//! what the eventual-visibility contract relies on.

#![allow(dead_code)]

use meshping_core::error::{Error, Result};
use meshping_core::traits::{CreateTargetResponse, DeleteTargetResponse, TargetService};
use meshping_core::{SyncConfig, SyncEngine, SyncEvent, Target};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::{Notify, mpsc};

/// A controllable in-memory target service
pub struct ScriptedTargetService {
    /// Targets the next successful poll returns
    targets: std::sync::Mutex<Vec<Target>>,
    /// When set, fetch_targets() fails
    failing: AtomicBool,
    /// When set, create/delete report `success: false`
    rejecting: AtomicBool,
    /// When set, fetch_targets() waits for `release` before answering
    gated: AtomicBool,
    /// Notified each time fetch_targets() is entered
    entered: Notify,
    /// Lets a gated fetch_targets() continue
    release: Notify,
    fetch_calls: AtomicUsize,
    create_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    deleted: std::sync::Mutex<Vec<String>>,
}

impl ScriptedTargetService {
    pub fn new(targets: Vec<Target>) -> Arc<Self> {
        Arc::new(Self {
            targets: std::sync::Mutex::new(targets),
            failing: AtomicBool::new(false),
            rejecting: AtomicBool::new(false),
            gated: AtomicBool::new(false),
            entered: Notify::new(),
            release: Notify::new(),
            fetch_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
            delete_calls: AtomicUsize::new(0),
            deleted: std::sync::Mutex::new(Vec::new()),
        })
    }

    pub fn set_targets(&self, targets: Vec<Target>) {
        *self.targets.lock().unwrap() = targets;
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::SeqCst);
    }

    pub fn set_gated(&self, gated: bool) {
        self.gated.store(gated, Ordering::SeqCst);
    }

    /// Wait until a fetch_targets() call has started
    pub async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    /// Let one gated fetch_targets() call finish
    pub fn release_one(&self) {
        self.release.notify_one();
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl TargetService for ScriptedTargetService {
    async fn fetch_targets(&self) -> Result<Vec<Target>> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();

        if self.gated.load(Ordering::SeqCst) {
            self.release.notified().await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::http("List targets returned HTTP 503 Service Unavailable"));
        }
        Ok(self.targets.lock().unwrap().clone())
    }

    async fn create_target(&self, identity: &str) -> Result<CreateTargetResponse> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);

        if self.rejecting.load(Ordering::SeqCst) {
            return Ok(CreateTargetResponse {
                success: false,
                targets: Vec::new(),
            });
        }

        // A bare name resolves to a single made-up address
        let (name, addr) = identity
            .split_once('@')
            .unwrap_or((identity, "192.0.2.1"));
        let target = Target::new(name, addr);
        let created = target.identity();
        self.targets.lock().unwrap().push(target);

        Ok(CreateTargetResponse {
            success: true,
            targets: vec![created],
        })
    }

    async fn delete_target(&self, identity: &str) -> Result<DeleteTargetResponse> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);

        if self.rejecting.load(Ordering::SeqCst) {
            return Ok(DeleteTargetResponse { success: false });
        }

        self.deleted.lock().unwrap().push(identity.to_string());
        self.targets
            .lock()
            .unwrap()
            .retain(|target| target.identity() != identity);
        Ok(DeleteTargetResponse { success: true })
    }

    fn service_name(&self) -> &'static str {
        "scripted"
    }
}

/// Sync settings used by the contract tests (1s tick, 29.5s threshold)
pub fn test_sync_config() -> SyncConfig {
    SyncConfig {
        tick_interval_ms: 1_000,
        stale_threshold_ms: 29_500,
        event_channel_capacity: 100,
    }
}

/// Build an engine over the scripted service
pub fn engine_for(
    service: &Arc<ScriptedTargetService>,
) -> (Arc<SyncEngine>, mpsc::Receiver<SyncEvent>) {
    let (engine, events) = SyncEngine::new(service.clone(), &test_sync_config())
        .expect("engine construction succeeds");
    (Arc::new(engine), events)
}

/// Drain every event currently buffered in the channel
pub fn drain_events(events: &mut mpsc::Receiver<SyncEvent>) -> Vec<SyncEvent> {
    let mut drained = Vec::new();
    while let Ok(event) = events.try_recv() {
        drained.push(event);
    }
    drained
}

/// Two targets deliberately out of address order
pub fn sample_targets() -> Vec<Target> {
    vec![
        Target::new("core-a", "10.0.0.2"),
        Target::new("edge-b", "10.0.0.1"),
    ]
}
