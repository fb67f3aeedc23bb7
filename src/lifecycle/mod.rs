//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Validate config → Bind listener
//!
//! Run (controller.rs):
//!     Spawn server → wait for termination → trigger shutdown → bounded drain
//!
//! Shutdown (shutdown.rs):
//!     Running → ShuttingDown → Stopped
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → TerminationReason
//! ```
//!
//! # Design Decisions
//! - One shutdown attempt per process; no retries
//! - The drain deadline is a fresh grace period that starts when the
//!   termination request arrives
//! - Bind, serve and drain failures are all fatal to the caller

pub mod controller;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use controller::{Lifecycle, LifecycleError};
pub use shutdown::{ServerState, Shutdown};
pub use signals::TerminationReason;
