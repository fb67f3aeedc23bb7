//! OS signal handling.
//!
//! # Responsibilities
//! - Register handlers for SIGINT and SIGTERM
//! - Translate the first one received into a [`TerminationReason`]
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Non-unix targets only see Ctrl-C

use std::fmt;

/// Why the server was asked to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    /// SIGINT / Ctrl-C.
    Interrupt,
    /// SIGTERM.
    Terminate,
    /// Requested in-process, without a signal.
    Requested,
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::Interrupt => write!(f, "interrupt signal received"),
            TerminationReason::Terminate => write!(f, "terminate signal received"),
            TerminationReason::Requested => write!(f, "shutdown requested"),
        }
    }
}

/// Wait until SIGINT or SIGTERM arrives.
///
/// Fails only if a handler cannot be installed.
#[cfg(unix)]
pub async fn wait_for_termination() -> std::io::Result<TerminationReason> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    tokio::select! {
        _ = interrupt.recv() => Ok(TerminationReason::Interrupt),
        _ = terminate.recv() => Ok(TerminationReason::Terminate),
    }
}

/// Wait until Ctrl-C arrives.
#[cfg(not(unix))]
pub async fn wait_for_termination() -> std::io::Result<TerminationReason> {
    tokio::signal::ctrl_c().await?;
    Ok(TerminationReason::Interrupt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasons_display() {
        assert_eq!(TerminationReason::Interrupt.to_string(), "interrupt signal received");
        assert_eq!(TerminationReason::Terminate.to_string(), "terminate signal received");
        assert_eq!(TerminationReason::Requested.to_string(), "shutdown requested");
    }
}
