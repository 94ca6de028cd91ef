use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use tokio::{
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};

use crate::{
    config::PlaybackConfig,
    controller::{PlaybackController, PlaybackSnapshot, TickOutcome},
    presentation::PlaybackObserver,
    route::Route,
};

/// Drives a [`PlaybackController`] from a repeating timer.
///
/// The player is the only owner of the ticker task. The task is spawned when
/// playback enters Playing and aborted on Pause, Reset and drop. Every command
/// also bumps a generation counter under the state lock, so a tick that was
/// already waiting on the lock sees the new generation and exits without
/// touching the state.
pub struct Player {
    shared: Arc<Mutex<Inner>>,
    config: PlaybackConfig,
}

struct Inner {
    controller: PlaybackController,
    generation: u64,
    ticker: Option<JoinHandle<()>>,
    observers: Vec<Arc<dyn PlaybackObserver>>,
}

impl Inner {
    fn disarm(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }

    fn pause(&mut self) -> bool {
        self.disarm();
        if !self.controller.pause() {
            return false;
        }
        tracing::info!("playback paused at {:?}", self.controller.state());
        self.notify();
        true
    }

    fn notify(&self) {
        let snapshot = self.controller.snapshot();
        for observer in &self.observers {
            observer.on_update(&snapshot);
        }
    }
}

impl Player {
    pub fn new(route: Arc<Route>, config: PlaybackConfig) -> Self {
        let controller = PlaybackController::new(route, config.steps_per_segment());
        Self {
            shared: Arc::new(Mutex::new(Inner {
                controller,
                generation: 0,
                ticker: None,
                observers: Vec::new(),
            })),
            config,
        }
    }

    pub fn route(&self) -> Arc<Route> {
        Arc::clone(self.lock().controller.route())
    }

    pub fn subscribe(&self, observer: Arc<dyn PlaybackObserver>) {
        self.lock().observers.push(observer);
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.lock().controller.snapshot()
    }

    /// Whether a ticker task is currently armed.
    pub fn is_armed(&self) -> bool {
        self.lock()
            .ticker
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Must be called from within a Tokio runtime.
    pub fn start(&self) -> bool {
        let mut inner = self.lock();
        self.start_locked(&mut inner)
    }

    pub fn pause(&self) -> bool {
        self.lock().pause()
    }

    /// Start when stopped, pause when playing, decided under the same lock
    /// as the transition.
    pub fn toggle(&self) -> bool {
        let mut inner = self.lock();
        if inner.controller.is_playing() {
            inner.pause()
        } else {
            self.start_locked(&mut inner)
        }
    }

    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.disarm();
        inner.controller.reset();
        tracing::info!("playback reset");
        inner.notify();
    }

    fn start_locked(&self, inner: &mut Inner) -> bool {
        if !inner.controller.start() {
            tracing::debug!("start ignored: {:?}", inner.controller.state());
            return false;
        }
        inner.disarm();
        let generation = inner.generation;
        inner.ticker = Some(self.spawn_ticker(generation));
        tracing::info!(
            "playback started at segment {}",
            inner.controller.state().segment_index
        );
        inner.notify();
        true
    }

    fn spawn_ticker(&self, generation: u64) -> JoinHandle<()> {
        let shared = Arc::downgrade(&self.shared);
        let period = self.config.tick_interval();
        tokio::spawn(run_ticker(shared, generation, period))
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock(&self.shared)
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.lock().disarm();
    }
}

fn lock(shared: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn run_ticker(shared: Weak<Mutex<Inner>>, generation: u64, period: std::time::Duration) {
    let mut interval = time::interval_at(time::Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let Some(shared) = shared.upgrade() else {
            return;
        };
        let mut inner = lock(&shared);
        if inner.generation != generation {
            return;
        }

        let outcome = inner.controller.tick();
        match outcome {
            TickOutcome::Idle => {
                inner.ticker = None;
                return;
            }
            TickOutcome::Advanced => {
                tracing::trace!("tick {:?}", inner.controller.state());
            }
            TickOutcome::SegmentCompleted => {
                tracing::debug!(
                    "entered segment {}",
                    inner.controller.state().segment_index
                );
            }
            TickOutcome::Finished => {
                tracing::info!("playback reached the final waypoint");
            }
        }
        inner.notify();

        if outcome == TickOutcome::Finished {
            inner.ticker = None;
            return;
        }
    }
}
