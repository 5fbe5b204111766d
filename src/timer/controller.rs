//! Timer lifecycle controller
//!
//! `start` spawns a schedule task, `stop` cancels it, `restart` replaces a
//! running schedule with one whose first tick fires immediately.
//!
//! Cancellation only prevents future ticks. A tick already in progress runs
//! to completion; ticks from successive schedules are serialized through a
//! shared gate so they never overlap.

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::{IntervalSource, TickAction, TimerState};

/// How often a disabled schedule re-reads its interval
const DISABLED_RECHECK: Duration = Duration::from_secs(1);

/// A live schedule. Dropping it cancels the schedule.
struct TimerHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

pub struct TimerController {
    interval: Arc<dyn IntervalSource>,
    action: Arc<dyn TickAction>,
    /// Held for the duration of every tick
    tick_gate: Arc<Mutex<()>>,
    handle: Option<TimerHandle>,
}

impl TimerController {
    pub fn new(interval: Arc<dyn IntervalSource>, action: Arc<dyn TickAction>) -> Self {
        Self {
            interval,
            action,
            tick_gate: Arc::new(Mutex::new(())),
            handle: None,
        }
    }

    pub fn state(&self) -> TimerState {
        match self.handle {
            Some(_) => TimerState::Running,
            None => TimerState::Idle,
        }
    }

    /// Start a schedule. Ignored if one is already running.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self, run_first: bool) -> bool {
        if self.handle.is_some() {
            warn!("Timer already running, ignoring start");
            return false;
        }

        debug!("Starting timer (run_first: {})", run_first);

        let token = CancellationToken::new();
        let task = tokio::spawn(run_schedule(
            self.interval.clone(),
            self.action.clone(),
            self.tick_gate.clone(),
            token.clone(),
            run_first,
        ));

        self.handle = Some(TimerHandle { token, task });
        true
    }

    /// Cancel the running schedule, if any
    pub fn stop(&mut self) -> bool {
        match self.handle.take() {
            Some(_handle) => {
                debug!("Stopping timer");
                true
            }
            None => false,
        }
    }

    /// Replace a running schedule with one that ticks immediately.
    /// No-op while idle.
    pub fn restart(&mut self) -> bool {
        if self.handle.is_none() {
            debug!("Timer idle, nothing to restart");
            return false;
        }

        debug!("Restarting timer");
        self.stop();
        self.start(true)
    }

    /// Stop the schedule and wait for an in-flight tick to finish
    pub async fn shutdown(&mut self) {
        let Some(mut handle) = self.handle.take() else {
            return;
        };
        handle.token.cancel();

        if let Err(e) = (&mut handle.task).await {
            if e.is_panic() {
                error!("Timer task panicked: {}", e);
            }
        }
    }
}

impl Drop for TimerController {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_schedule(
    interval: Arc<dyn IntervalSource>,
    action: Arc<dyn TickAction>,
    gate: Arc<Mutex<()>>,
    token: CancellationToken,
    run_first: bool,
) {
    let mut fire_now = run_first;

    loop {
        let period = match interval.current_interval() {
            Some(period) => period,
            None => {
                // Disabled: no ticks, not even a pending immediate one
                fire_now = false;
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(DISABLED_RECHECK) => continue,
                }
            }
        };

        if !fire_now {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(period) => {}
            }
        }
        fire_now = false;

        let _guard = tokio::select! {
            _ = token.cancelled() => break,
            guard = gate.lock() => guard,
        };
        if token.is_cancelled() {
            break;
        }

        run_tick(action.as_ref(), period).await;
    }

    debug!("Timer schedule ended");
}

async fn run_tick(action: &dyn TickAction, period: Duration) {
    debug!("Timer tick at interval {}s", period.as_secs());

    match AssertUnwindSafe(action.tick()).catch_unwind().await {
        Ok(Ok(url)) => info!("Snapshot published: {}", url),
        Ok(Err(e)) => error!("Snapshot tick failed: {}", e),
        Err(_) => error!("Snapshot tick panicked"),
    }
}
