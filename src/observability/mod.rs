//! Observability subsystem.
//!
//! Structured logs only: every subsystem emits `tracing` events, and the HTTP
//! layer wraps each request in a span carrying its request ID.

pub mod logging;

pub use logging::init_logging;
