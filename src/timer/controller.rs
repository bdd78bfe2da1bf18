use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::Serialize;
use tokio::{
    sync::{broadcast, watch, Mutex},
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::settings::PlaybackSettings;
use crate::timeline::Timeline;

use super::{Clock, MonotonicClock, PlayheadSnapshot, Scheduler, Tick, Transition};

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionEvent {
    pub run_id: String,
    pub transition: Transition,
    pub snapshot: PlayheadSnapshot,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub stopped_at: DateTime<Utc>,
    pub completed: bool,
    pub elapsed_ms: u64,
    pub total_duration_ms: u64,
}

#[derive(Debug, Clone)]
struct RunInfo {
    run_id: String,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

struct Ticker {
    handle: JoinHandle<()>,
    cancel_token: CancellationToken,
}

/// Async host around a [`Scheduler`]: serializes control calls, drives `tick`
/// from a tokio interval and publishes snapshots and transitions.
#[derive(Clone)]
pub struct SequencerController {
    scheduler: Arc<Mutex<Scheduler>>,
    clock: Arc<dyn Clock>,
    run: Arc<Mutex<Option<RunInfo>>>,
    ticker: Arc<Mutex<Option<Ticker>>>,
    tick_interval: Duration,
    log_transitions: bool,
    verbose_ticks: bool,
    snapshot_tx: Arc<watch::Sender<PlayheadSnapshot>>,
    events_tx: broadcast::Sender<TransitionEvent>,
}

impl SequencerController {
    pub fn new(timeline: Arc<Timeline>, settings: &PlaybackSettings) -> Self {
        Self::with_clock(timeline, settings, Arc::new(MonotonicClock::new()))
    }

    pub fn with_clock(
        timeline: Arc<Timeline>,
        settings: &PlaybackSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let verbose_ticks = std::env::var("TEMPO_SEQUENCER_DEBUG")
            .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let scheduler = Scheduler::new(timeline);
        let (snapshot_tx, _) = watch::channel(scheduler.snapshot());
        let (events_tx, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            scheduler: Arc::new(Mutex::new(scheduler)),
            clock,
            run: Arc::new(Mutex::new(None)),
            ticker: Arc::new(Mutex::new(None)),
            tick_interval: settings.tick_interval(),
            log_transitions: settings.log_transitions,
            verbose_ticks,
            snapshot_tx: Arc::new(snapshot_tx),
            events_tx,
        }
    }

    pub fn subscribe_snapshots(&self) -> watch::Receiver<PlayheadSnapshot> {
        self.snapshot_tx.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<TransitionEvent> {
        self.events_tx.subscribe()
    }

    pub async fn snapshot(&self) -> PlayheadSnapshot {
        self.scheduler.lock().await.snapshot()
    }

    pub async fn run_id(&self) -> Option<String> {
        self.run.lock().await.as_ref().map(|run| run.run_id.clone())
    }

    pub async fn start(&self) -> PlayheadSnapshot {
        let snapshot = {
            let mut scheduler = self.scheduler.lock().await;
            if !scheduler.start(self.clock.now_ms()) {
                return scheduler.snapshot();
            }
            scheduler.snapshot()
        };

        let run_id = Uuid::new_v4().to_string();
        info!(
            "Starting run {}: {} segments, {}ms",
            run_id, snapshot.total_segments, snapshot.total_duration_ms
        );
        *self.run.lock().await = Some(RunInfo {
            run_id,
            started_at: Utc::now(),
            completed_at: None,
        });

        self.snapshot_tx.send_replace(snapshot.clone());
        self.spawn_ticker().await;
        snapshot
    }

    /// Pauses playback and suspends the ticker until `resume`.
    pub async fn pause(&self) -> bool {
        let paused = self.scheduler.lock().await.pause(self.clock.now_ms());
        if paused {
            self.cancel_ticker().await;
            self.publish_snapshot().await;
        }
        paused
    }

    pub async fn resume(&self) -> bool {
        let resumed = self.scheduler.lock().await.resume(self.clock.now_ms());
        if resumed {
            self.publish_snapshot().await;
            self.spawn_ticker().await;
        }
        resumed
    }

    pub async fn seek(&self, activity_index: usize) -> bool {
        let tick = {
            let mut scheduler = self.scheduler.lock().await;
            let now = self.clock.now_ms();
            if !scheduler.seek(activity_index, now) {
                return false;
            }
            scheduler.tick(now)
        };
        self.publish_tick(tick).await;
        true
    }

    pub async fn lock(&self) {
        self.scheduler.lock().await.lock();
        self.publish_snapshot().await;
    }

    pub async fn unlock(&self) {
        self.scheduler.lock().await.unlock();
        self.publish_snapshot().await;
    }

    pub async fn toggle_lock(&self) -> bool {
        let locked = self.scheduler.lock().await.toggle_lock();
        self.publish_snapshot().await;
        locked
    }

    /// Swap in a rebuilt timeline. A rebuild can end the run outright (even
    /// a paused one), so the result is ticked once and announced here rather
    /// than left to a ticker that may not be running.
    pub async fn replace_timeline(&self, timeline: Arc<Timeline>) {
        let tick = {
            let mut scheduler = self.scheduler.lock().await;
            let now = self.clock.now_ms();
            scheduler.replace_timeline(timeline, now);
            scheduler.tick(now)
        };
        self.publish_tick(tick).await;
    }

    /// Stops the ticker, ends the run where it stands and reports how far it got.
    pub async fn stop(&self) -> Result<RunSummary> {
        self.cancel_ticker().await;
        let tick = {
            let mut scheduler = self.scheduler.lock().await;
            let now = self.clock.now_ms();
            scheduler.stop(now);
            scheduler.tick(now)
        };
        self.publish_tick(tick).await;

        let run = self
            .run
            .lock()
            .await
            .clone()
            .ok_or_else(|| anyhow!("no active run to stop"))?;
        let snapshot = self.snapshot().await;

        let summary = RunSummary {
            run_id: run.run_id,
            started_at: run.started_at,
            stopped_at: run.completed_at.unwrap_or_else(Utc::now),
            completed: snapshot.completed,
            elapsed_ms: snapshot.total_elapsed_ms,
            total_duration_ms: snapshot.total_duration_ms,
        };
        info!(
            "Run {} stopped after {}ms of {}ms (completed: {})",
            summary.run_id, summary.elapsed_ms, summary.total_duration_ms, summary.completed
        );
        Ok(summary)
    }

    async fn publish_snapshot(&self) {
        let snapshot = self.scheduler.lock().await.snapshot();
        self.snapshot_tx.send_replace(snapshot);
    }

    async fn publish_tick(&self, tick: Tick) {
        self.snapshot_tx.send_replace(tick.snapshot.clone());
        if let Some(transition) = tick.transition {
            announce(
                &self.run,
                &self.events_tx,
                self.log_transitions,
                transition,
                tick.snapshot,
            )
            .await;
        }
    }

    async fn spawn_ticker(&self) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(ticker) = ticker_guard.take() {
            ticker.cancel_token.cancel();
            ticker.handle.abort();
        }
        // A pause may have landed between the caller's state change and here.
        if !self.scheduler.lock().await.needs_ticks() {
            return;
        }

        let cancel_token = CancellationToken::new();
        let token = cancel_token.clone();
        let scheduler = self.scheduler.clone();
        let clock = self.clock.clone();
        let run = self.run.clone();
        let snapshot_tx = self.snapshot_tx.clone();
        let events_tx = self.events_tx.clone();
        let tick_interval = self.tick_interval;
        let log_transitions = self.log_transitions;
        let verbose_ticks = self.verbose_ticks;

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(tick_interval);
            // Position is recomputed from the anchor, so late ticks are simply dropped.
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = interval.tick() => {}
                    _ = token.cancelled() => break,
                }

                let tick = {
                    let mut guard = scheduler.lock().await;
                    guard.tick(clock.now_ms())
                };

                if verbose_ticks {
                    debug!(
                        "tick: segment {}/{} remaining {}ms elapsed {}ms",
                        tick.snapshot.current_segment_index,
                        tick.snapshot.total_segments,
                        tick.snapshot.remaining_ms,
                        tick.snapshot.total_elapsed_ms
                    );
                }

                snapshot_tx.send_replace(tick.snapshot.clone());

                let Some(transition) = tick.transition else {
                    if tick.snapshot.completed || !tick.snapshot.running {
                        break;
                    }
                    continue;
                };

                announce(&run, &events_tx, log_transitions, transition, tick.snapshot).await;

                if transition == Transition::Completed {
                    break;
                }
            }
        });

        *ticker_guard = Some(Ticker {
            handle,
            cancel_token,
        });
    }

    async fn cancel_ticker(&self) {
        if let Some(ticker) = self.ticker.lock().await.take() {
            ticker.cancel_token.cancel();
            let _ = ticker.handle.await;
        }
    }
}

/// Stamp the run, log the transition and broadcast it.
async fn announce(
    run: &Mutex<Option<RunInfo>>,
    events_tx: &broadcast::Sender<TransitionEvent>,
    log_transitions: bool,
    transition: Transition,
    snapshot: PlayheadSnapshot,
) {
    let run_id = {
        let mut guard = run.lock().await;
        match guard.as_mut() {
            Some(info) => {
                if transition == Transition::Completed && info.completed_at.is_none() {
                    info.completed_at = Some(Utc::now());
                }
                info.run_id.clone()
            }
            None => String::new(),
        }
    };

    match transition {
        Transition::SegmentChanged { to, .. } if log_transitions => {
            info!(
                "Run {}: segment {} ({:?} rep {:?} of block {:?})",
                run_id, to, snapshot.phase_tag, snapshot.rep_number, snapshot.block_index
            );
        }
        Transition::Completed => {
            info!("Run {} completed after {}ms", run_id, snapshot.total_elapsed_ms);
        }
        _ => {}
    }

    // No subscribers is fine.
    let _ = events_tx.send(TransitionEvent {
        run_id,
        transition,
        snapshot,
    });
}
