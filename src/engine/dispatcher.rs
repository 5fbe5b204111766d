//! Engine main loop

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, info};

use crate::events::{route, HostEvent, TimerAction};
use crate::timer::{TimerController, TimerState};

use super::{EngineCommand, EngineStatus};

/// Owns the timer and applies host events to it, one at a time
pub struct SnapEngine {
    timer: TimerController,
    cmd_rx: mpsc::Receiver<EngineCommand>,
    status_tx: broadcast::Sender<EngineStatus>,
}

impl SnapEngine {
    pub fn new(
        timer: TimerController,
        cmd_rx: mpsc::Receiver<EngineCommand>,
        status_tx: broadcast::Sender<EngineStatus>,
    ) -> Self {
        Self {
            timer,
            cmd_rx,
            status_tx,
        }
    }

    /// Run until shutdown or until every command sender is gone
    pub async fn run(&mut self) {
        info!("Snap engine started");
        self.publish_status();

        while let Some(cmd) = self.cmd_rx.recv().await {
            match cmd {
                EngineCommand::HostEvent(event) => {
                    self.handle_event(&event);
                }
                EngineCommand::Shutdown => {
                    info!("Shutdown command received");
                    break;
                }
            }
        }

        self.timer.shutdown().await;
        self.publish_status();
        info!("Snap engine stopped");
    }

    /// Apply one host event to the timer
    pub fn handle_event(&mut self, event: &HostEvent) -> TimerAction {
        let action = route(event);
        debug!("Event {} -> {:?}", event, action);

        let changed = match action {
            TimerAction::Start { run_first } => self.timer.start(run_first),
            TimerAction::Stop => self.timer.stop(),
            TimerAction::Restart => self.timer.restart(),
            TimerAction::None => false,
        };

        if changed {
            self.publish_status();
        }
        action
    }

    fn publish_status(&self) {
        let status = match self.timer.state() {
            TimerState::Idle => EngineStatus::Idle,
            TimerState::Running => EngineStatus::Running,
        };
        let _ = self.status_tx.send(status);
    }
}

/// Create the channels used to drive the engine
pub fn create_engine_channels() -> (
    mpsc::Sender<EngineCommand>,
    mpsc::Receiver<EngineCommand>,
    broadcast::Sender<EngineStatus>,
    broadcast::Receiver<EngineStatus>,
) {
    let (cmd_tx, cmd_rx) = mpsc::channel(32);
    let (status_tx, status_rx) = broadcast::channel(16);
    (cmd_tx, cmd_rx, status_tx, status_rx)
}
