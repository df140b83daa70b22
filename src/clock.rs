// Mission timing: a shared elapsed-seconds counter and the task that ticks it.

use std::{
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{sync::watch, task::JoinHandle};

pub const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Default)]
struct ClockState {
    elapsed: AtomicU64,
    stopped: AtomicBool,
}

/// Elapsed time of one mission, optionally bounded by a time limit.
///
/// Clones share the same counter, so a [`Countdown`] can tick the clock a
/// session holds. Once stopped or expired a clock never moves again.
#[derive(Debug, Clone)]
pub struct MissionClock {
    state: Arc<ClockState>,
    limit: Option<u64>,
}

impl MissionClock {
    pub fn new(limit: Option<u64>) -> Self {
        Self {
            state: Arc::default(),
            limit,
        }
    }

    pub fn elapsed(&self) -> u64 {
        self.state.elapsed.load(Ordering::SeqCst)
    }

    pub fn limit(&self) -> Option<u64> {
        self.limit
    }

    pub fn remaining(&self) -> Option<u64> {
        self.limit.map(|limit| limit.saturating_sub(self.elapsed()))
    }

    pub fn is_expired(&self) -> bool {
        self.limit.is_some_and(|limit| self.elapsed() >= limit)
    }

    pub fn is_stopped(&self) -> bool {
        self.state.stopped.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.state.stopped.store(true, Ordering::SeqCst);
    }

    /// Advance by one second. Returns whether the clock should keep ticking.
    pub fn tick(&self) -> bool {
        if self.is_stopped() || self.is_expired() {
            return false;
        }
        self.state.elapsed.fetch_add(1, Ordering::SeqCst);
        !self.is_expired()
    }
}

/// Background task ticking a [`MissionClock`] once per [`TICK`].
///
/// The task ends when the clock is stopped or expires, or when the countdown
/// is stopped or dropped. Must be started from within a tokio runtime.
#[derive(Debug)]
pub struct Countdown {
    handle: JoinHandle<()>,
    expired: watch::Receiver<bool>,
}

impl Countdown {
    pub fn start(clock: MissionClock) -> Self {
        let (expired_tx, expired) = watch::channel(false);
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK);
            // The first tick completes immediately.
            interval.tick().await;
            loop {
                interval.tick().await;
                if !clock.tick() {
                    break;
                }
            }
            if clock.is_expired() && !clock.is_stopped() {
                log::debug!("countdown expired after {}s", clock.elapsed());
                let _ = expired_tx.send(true);
            }
        });
        Self { handle, expired }
    }

    /// Resolves once the clock runs out. Never resolves if the countdown ends
    /// any other way.
    pub async fn expired(&mut self) {
        if self.expired.wait_for(|&expired| expired).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for Countdown {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
