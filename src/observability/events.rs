//! Lifecycle events
//!
//! Events are explicit and typed; request-level logging uses free-form
//! event names from the HTTP layer.

use std::fmt;

/// Observable process lifecycle events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Process startup begins
    BootStart,
    /// Configuration loaded and validated
    ConfigLoaded,
    /// Connection pool to the store established
    PoolConnected,
    /// HTTP listener bound, serving requests
    Serving,
    /// Startup failed
    BootFailed,
    /// Shutdown signal received
    ShutdownStart,
    /// Pool closed, process about to exit
    ShutdownComplete,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "ISEKAI_STARTUP_BEGIN",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::PoolConnected => "POOL_CONNECTED",
            Event::Serving => "ISEKAI_SERVING",
            Event::BootFailed => "ISEKAI_STARTUP_FAILED",
            Event::ShutdownStart => "SHUTDOWN_START",
            Event::ShutdownComplete => "SHUTDOWN_COMPLETE",
        }
    }

    /// Returns true if this event means the process cannot continue
    pub fn is_failure(&self) -> bool {
        matches!(self, Event::BootFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
