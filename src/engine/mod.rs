//! Snap engine - dispatches host lifecycle events to the snapshot timer

mod dispatcher;
mod intake;
mod tick;

pub use dispatcher::{create_engine_channels, SnapEngine};
pub use intake::forward_events;
pub use tick::SnapshotTick;

use crate::events::HostEvent;

/// Commands that can be sent to the engine
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// A lifecycle event from the printer host
    HostEvent(HostEvent),
    /// Shutdown the engine
    Shutdown,
}

/// Status updates from the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    /// No snapshot schedule is active
    Idle,
    /// Snapshots are being taken periodically
    Running,
}
