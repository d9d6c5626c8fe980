//! Collaborators of the poll cycle.
//!
//! - Snapshot acquisition (`Source`, `HttpSource`)
//! - Notification delivery (`Sink`, `WebhookSink`, `LogSink`)
//! - Message rendering (`format`)

pub mod format;
mod sink;
mod source;

pub use sink::{LogSink, Sink, WebhookSink, sink_from_config};
pub use source::{HttpSource, Source, register_courses};
