//! Target synchronization engine
//!
//! The SyncEngine is responsible for:
//! - Owning the canonical target collection
//! - Deciding when the collection is stale
//! - Polling the remote service (one request at a time)
//! - Publishing every new collection to subscribers
//!
//! ## Architecture
//!
//! ```text
//!   tick (1s) / refresh
//!          │
//!          ▼
//! ┌──────────────────┐  fetch_targets  ┌───────────────┐
//! │    SyncEngine    │ ──────────────▶ │ TargetService │
//! │ (staleness gate) │ ◀────────────── │   (remote)    │
//! └──────────────────┘                 └───────────────┘
//!          │
//!          ├── watch::Sender<Arc<Vec<Target>>> ──▶ view model
//!          └── mpsc::Sender<SyncEvent>         ──▶ monitoring
//! ```
//!
//! ## Poll Lifecycle
//!
//! `Idle → Polling → (Synced | PollFailed) → Idle`
//!
//! 1. A tick finds the collection stale (or a refresh is requested)
//! 2. The in-flight flag is claimed; if already held the call is a no-op
//! 3. On success the collection is replaced wholesale and the clock advances
//! 4. On failure nothing changes; the next tick retries

use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::target::{Target, dedupe};
use crate::traits::TargetService;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, mpsc, oneshot, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Phase of the poll state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    /// No poll running, waiting for the next due tick
    Idle,
    /// A poll request is in flight
    Polling,
    /// The last poll succeeded
    Synced,
    /// The last poll failed; the collection is stale but unchanged
    PollFailed,
}

/// Events emitted by the SyncEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Tick loop started
    Started {
        stale_threshold: Duration,
    },

    /// A poll request was issued
    PollStarted,

    /// A poll replaced the canonical collection
    PollSucceeded {
        targets_count: usize,
        duplicates_dropped: usize,
    },

    /// A poll failed; collection and staleness clock left unchanged
    PollFailed {
        error: String,
    },

    /// A poll was requested while another was in flight
    PollSkipped,

    /// A poll completed after teardown and was thrown away
    PollDiscarded,

    /// Tick loop stopped
    Stopped {
        reason: String,
    },
}

/// Result of a single poll attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The collection was replaced
    Synced { targets_count: usize },
    /// The request failed; nothing changed
    Failed,
    /// Another poll was in flight; no request was issued
    AlreadyInFlight,
    /// The engine was torn down before the response arrived
    Discarded,
}

/// Result of a staleness check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The collection is fresh enough; nothing was done
    NotDue,
    /// The collection was stale and a poll was attempted
    Due(PollOutcome),
}

#[derive(Debug)]
struct SyncState {
    phase: SyncPhase,
    last_sync: Option<Instant>,
    last_sync_at: Option<DateTime<Utc>>,
    last_error: Option<String>,
}

/// Releases the in-flight flag when the poll finishes or is dropped
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Owner of the canonical target collection
///
/// The engine is the only writer of the collection. Readers either take a
/// snapshot with [`SyncEngine::collection()`] or subscribe to changes with
/// [`SyncEngine::subscribe()`].
///
/// ## Lifecycle
///
/// 1. Create with [`SyncEngine::new()`]
/// 2. Share it (`Arc<SyncEngine>`) and start [`SyncEngine::run()`] on a task
/// 3. Call [`SyncEngine::refresh()`] for out-of-band refreshes
/// 4. [`SyncEngine::teardown()`] discards any response still in flight
///
/// ## Failure Policy
///
/// Poll failures are logged and reported through [`SyncEvent::PollFailed`],
/// never returned as errors: the collection degrades to stale, not wrong,
/// and the next due tick retries.
pub struct SyncEngine {
    /// Remote service
    service: Arc<dyn TargetService>,

    /// Cadence of the staleness check
    tick_interval: Duration,

    /// Age after which the collection must be refetched
    stale_threshold: Duration,

    /// Phase, staleness clock and last error
    state: RwLock<SyncState>,

    /// Set while a poll request is outstanding
    in_flight: AtomicBool,

    /// Set once the engine has been torn down
    torn_down: AtomicBool,

    /// Canonical collection, published to subscribers
    collection_tx: watch::Sender<Arc<Vec<Target>>>,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<SyncEvent>,
}

impl SyncEngine {
    /// Create a new sync engine
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields sync events
    pub fn new(
        service: Arc<dyn TargetService>,
        config: &SyncConfig,
    ) -> Result<(Self, mpsc::Receiver<SyncEvent>)> {
        config.validate()?;

        let (event_tx, event_rx) = mpsc::channel(config.event_channel_capacity);
        let (collection_tx, _) = watch::channel(Arc::new(Vec::new()));

        let engine = Self {
            service,
            tick_interval: config.tick_interval(),
            stale_threshold: config.stale_threshold(),
            state: RwLock::new(SyncState {
                phase: SyncPhase::Idle,
                last_sync: None,
                last_sync_at: None,
                last_error: None,
            }),
            in_flight: AtomicBool::new(false),
            torn_down: AtomicBool::new(false),
            collection_tx,
            event_tx,
        };

        Ok((engine, event_rx))
    }

    /// Snapshot of the canonical collection
    pub fn collection(&self) -> Arc<Vec<Target>> {
        self.collection_tx.borrow().clone()
    }

    /// Subscribe to collection changes
    ///
    /// The receiver is notified once per successful poll.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Target>>> {
        self.collection_tx.subscribe()
    }

    /// Current phase of the poll state machine
    pub async fn phase(&self) -> SyncPhase {
        self.state.read().await.phase
    }

    /// Monotonic time of the last successful poll
    pub async fn last_sync(&self) -> Option<Instant> {
        self.state.read().await.last_sync
    }

    /// Wall-clock time of the last successful poll (for display)
    pub async fn last_sync_at(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.last_sync_at
    }

    /// Error of the last failed poll, cleared by the next success
    pub async fn last_error(&self) -> Option<String> {
        self.state.read().await.last_error.clone()
    }

    /// Whether a poll request is currently outstanding
    pub fn is_polling(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Whether a refresh is due at `now`
    ///
    /// A collection that was never synced is always due.
    pub async fn is_due_at(&self, now: Instant) -> bool {
        match self.state.read().await.last_sync {
            None => true,
            Some(last_sync) => now.saturating_duration_since(last_sync) > self.stale_threshold,
        }
    }

    /// Run one staleness check against the current time
    pub async fn tick(&self) -> TickOutcome {
        self.tick_at(Instant::now()).await
    }

    /// Run one staleness check against the given time
    pub async fn tick_at(&self, now: Instant) -> TickOutcome {
        {
            let mut state = self.state.write().await;
            match state.phase {
                SyncPhase::Synced | SyncPhase::PollFailed => state.phase = SyncPhase::Idle,
                // A poll that was dropped mid-flight never reached its result
                SyncPhase::Polling if !self.is_polling() => state.phase = SyncPhase::Idle,
                _ => {}
            }
        }

        if !self.is_due_at(now).await {
            return TickOutcome::NotDue;
        }

        TickOutcome::Due(self.poll().await)
    }

    /// Poll immediately, regardless of staleness
    ///
    /// Used for visibility changes and manual refreshes. Still subject to
    /// the single in-flight rule.
    pub async fn refresh(&self) -> PollOutcome {
        self.poll().await
    }

    /// Fetch the full collection from the service
    pub async fn poll(&self) -> PollOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            debug!("Poll already in flight, skipping");
            self.emit_event(SyncEvent::PollSkipped);
            return PollOutcome::AlreadyInFlight;
        };

        self.state.write().await.phase = SyncPhase::Polling;
        self.emit_event(SyncEvent::PollStarted);
        debug!("Polling {} service for targets", self.service.service_name());

        let result = self.service.fetch_targets().await;

        if self.torn_down.load(Ordering::Acquire) {
            debug!("Engine torn down, discarding poll result");
            self.state.write().await.phase = SyncPhase::Idle;
            self.emit_event(SyncEvent::PollDiscarded);
            return PollOutcome::Discarded;
        }

        match result {
            Ok(targets) => {
                let (targets, duplicates_dropped) = dedupe(targets);
                if duplicates_dropped > 0 {
                    warn!("Dropped {} duplicate target(s) from poll response", duplicates_dropped);
                }
                let targets_count = targets.len();

                {
                    let mut state = self.state.write().await;
                    state.phase = SyncPhase::Synced;
                    state.last_sync = Some(Instant::now());
                    state.last_sync_at = Some(Utc::now());
                    state.last_error = None;
                }
                self.collection_tx.send_replace(Arc::new(targets));

                info!("Synced {} target(s)", targets_count);
                self.emit_event(SyncEvent::PollSucceeded {
                    targets_count,
                    duplicates_dropped,
                });
                PollOutcome::Synced { targets_count }
            }
            Err(e) => {
                let error = Error::poll(format!("{} service: {}", self.service.service_name(), e));
                warn!("{}, keeping previous collection", error);
                {
                    let mut state = self.state.write().await;
                    state.phase = SyncPhase::PollFailed;
                    state.last_error = Some(error.to_string());
                }
                self.emit_event(SyncEvent::PollFailed {
                    error: error.to_string(),
                });
                PollOutcome::Failed
            }
        }
    }

    /// Stop applying poll results
    ///
    /// A response arriving after teardown is discarded without touching
    /// the collection.
    pub fn teardown(&self) {
        self.torn_down.store(true, Ordering::Release);
    }

    /// Whether [`SyncEngine::teardown()`] was called
    pub fn is_torn_down(&self) -> bool {
        self.torn_down.load(Ordering::Acquire)
    }

    /// Run the tick loop until Ctrl-C
    pub async fn run(&self) -> Result<()> {
        self.run_internal(None).await
    }

    /// Run the tick loop until the shutdown signal fires
    ///
    /// Used by embedders that manage their own lifecycle (and by tests).
    pub async fn run_with_shutdown(&self, shutdown_rx: oneshot::Receiver<()>) -> Result<()> {
        self.run_internal(Some(shutdown_rx)).await
    }

    async fn run_internal(&self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        self.emit_event(SyncEvent::Started {
            stale_threshold: self.stale_threshold,
        });
        info!(
            "Sync loop started (tick={:?}, stale after {:?})",
            self.tick_interval, self.stale_threshold
        );

        let shutdown = async move {
            match shutdown_rx {
                Some(rx) => {
                    let _ = rx.await;
                }
                None => {
                    if let Err(e) = tokio::signal::ctrl_c().await {
                        warn!("Failed to listen for Ctrl-C: {}", e);
                        std::future::pending::<()>().await;
                    }
                }
            }
        };
        tokio::pin!(shutdown);

        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    // A poll in progress is abandoned if shutdown arrives
                    tokio::select! {
                        _ = self.tick() => {}
                        _ = &mut shutdown => break,
                    }
                }
                _ = &mut shutdown => break,
            }
        }

        self.teardown();
        info!("Shutdown signal received, sync loop stopped");
        self.emit_event(SyncEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });
        Ok(())
    }

    /// Emit a sync event, dropping it if the channel is full
    fn emit_event(&self, event: SyncEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Sync event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody is listening
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}
