//! Host lifecycle events and their mapping to timer actions

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Lifecycle events emitted by the printer host
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    PrintStarted,
    PrintResumed,
    PrintPaused,
    PrintFailed,
    PrintDone,
    PrintCancelling,
    PrintCancelled,
    SettingsUpdated,
    /// Any event the agent does not react to
    Other(String),
}

/// What the timer controller should do in response to an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    Start { run_first: bool },
    Stop,
    Restart,
    None,
}

impl HostEvent {
    /// Host-side name of the event
    pub fn name(&self) -> &str {
        match self {
            HostEvent::PrintStarted => "PrintStarted",
            HostEvent::PrintResumed => "PrintResumed",
            HostEvent::PrintPaused => "PrintPaused",
            HostEvent::PrintFailed => "PrintFailed",
            HostEvent::PrintDone => "PrintDone",
            HostEvent::PrintCancelling => "PrintCancelling",
            HostEvent::PrintCancelled => "PrintCancelled",
            HostEvent::SettingsUpdated => "SettingsUpdated",
            HostEvent::Other(name) => name,
        }
    }
}

impl FromStr for HostEvent {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "PrintStarted" => HostEvent::PrintStarted,
            "PrintResumed" => HostEvent::PrintResumed,
            "PrintPaused" => HostEvent::PrintPaused,
            "PrintFailed" => HostEvent::PrintFailed,
            "PrintDone" => HostEvent::PrintDone,
            "PrintCancelling" => HostEvent::PrintCancelling,
            "PrintCancelled" => HostEvent::PrintCancelled,
            "SettingsUpdated" => HostEvent::SettingsUpdated,
            other => HostEvent::Other(other.to_string()),
        })
    }
}

impl fmt::Display for HostEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify a host event
pub fn route(event: &HostEvent) -> TimerAction {
    match event {
        HostEvent::PrintStarted | HostEvent::PrintResumed => TimerAction::Start { run_first: false },
        HostEvent::SettingsUpdated => TimerAction::Restart,
        HostEvent::PrintFailed
        | HostEvent::PrintDone
        | HostEvent::PrintCancelling
        | HostEvent::PrintCancelled
        | HostEvent::PrintPaused => TimerAction::Stop,
        HostEvent::Other(_) => TimerAction::None,
    }
}
