//! Observability for querygate
//!
//! - Structured JSON logging, one line per event
//! - Typed events
//! - Atomic counters
//!
//! ```ignore
//! use querygate::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::QueryExecuted, &[("entity", "Order"), ("rows", "10")]);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log a lifecycle event at INFO
pub fn log_event(event: Event) {
    Logger::log(Severity::Info, event.as_str(), &[]);
}

/// Log an event with fields at INFO
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(Severity::Info, event.as_str(), fields);
}

/// Log an event with fields at an explicit severity
pub fn log_event_at(severity: Severity, event: Event, fields: &[(&str, &str)]) {
    Logger::log(severity, event.as_str(), fields);
}
