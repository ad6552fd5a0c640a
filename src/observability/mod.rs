//! Observability for the Isekai API
//!
//! - Structured logging (JSON lines)
//! - Typed lifecycle events
//! - Request counters
//!
//! # Usage
//!
//! ```ignore
//! use isekai_api::observability::{Logger, Event, log_event_with_fields};
//!
//! log_event_with_fields(Event::Serving, &[("addr", "0.0.0.0:8000")]);
//! Logger::warn("UNKNOWN_FILTER_CODE", &[("parameter", "speciesCode")]);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log a lifecycle event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_failure() {
        Severity::Error
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}
