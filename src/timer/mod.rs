//! Periodic snapshot timer
//!
//! The controller owns at most one running schedule. Each schedule asks its
//! [`IntervalSource`] for the period before every tick, so configuration
//! changes apply from the next tick on without a restart.

mod controller;

pub use controller::TimerController;

use async_trait::async_trait;
use std::time::Duration;

use crate::config::SettingsStore;
use crate::error::SnapResult;

/// Supplies the current tick period
pub trait IntervalSource: Send + Sync {
    /// Period until the next tick, or `None` while ticking is disabled
    fn current_interval(&self) -> Option<Duration>;
}

/// Work performed on every tick
#[async_trait]
pub trait TickAction: Send + Sync {
    /// Run one tick, returning the published snapshot URL
    async fn tick(&self) -> SnapResult<String>;
}

/// Whether a schedule is active
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Idle,
    Running,
}

/// Reads the interval from the live settings on every call
#[derive(Debug, Clone)]
pub struct ConfigInterval {
    settings: SettingsStore,
}

impl ConfigInterval {
    pub fn new(settings: SettingsStore) -> Self {
        Self { settings }
    }
}

impl IntervalSource for ConfigInterval {
    fn current_interval(&self) -> Option<Duration> {
        self.settings.current().interval()
    }
}
