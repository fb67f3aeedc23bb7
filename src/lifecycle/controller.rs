//! Serve-until-terminated controller.
//!
//! # Responsibilities
//! - Spawn the HTTP server on a bound listener
//! - Wait for a termination request, or for the server to fail on its own
//! - Trigger exactly one graceful shutdown and bound the drain by a deadline

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinError;

use crate::compute::Parallelism;
use crate::config::{ConfigError, ServerConfig};
use crate::http::HttpServer;
use crate::lifecycle::signals::{wait_for_termination, TerminationReason};
use crate::lifecycle::startup::bind_listener;
use crate::lifecycle::shutdown::Shutdown;

/// Fatal lifecycle failures. Every variant ends the process.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error("failed to install signal handler: {0}")]
    Signal(#[source] std::io::Error),

    #[error("server stopped before shutdown was requested")]
    UnexpectedStop,

    #[error("server task failed: {0}")]
    Task(#[from] JoinError),

    #[error("in-flight requests did not finish within {grace_period:?}")]
    DrainTimeout { grace_period: Duration },
}

/// Owns one server lifetime: Running → ShuttingDown → Stopped.
pub struct Lifecycle {
    config: ServerConfig,
    parallelism: Arc<Parallelism>,
    shutdown: Shutdown,
}

impl Lifecycle {
    /// Create a controller for `config`.
    pub fn new(config: ServerConfig, parallelism: Arc<Parallelism>) -> Self {
        Self {
            config,
            parallelism,
            shutdown: Shutdown::new(),
        }
    }

    /// Shutdown coordinator, for observing lifecycle state.
    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Bind the configured address and serve until SIGINT or SIGTERM.
    pub async fn run(self) -> Result<(), LifecycleError> {
        let listener = bind_listener(&self.config).await?;
        self.serve(listener, wait_for_termination()).await
    }

    /// Serve on `listener` until `termination` resolves, then drain.
    ///
    /// The drain deadline starts when `termination` resolves. With a zero
    /// grace period the drain is abandoned unless the server task has already
    /// finished when first checked, and this returns
    /// [`LifecycleError::DrainTimeout`].
    pub async fn serve<F>(self, listener: TcpListener, termination: F) -> Result<(), LifecycleError>
    where
        F: Future<Output = std::io::Result<TerminationReason>>,
    {
        let server = HttpServer::new(Arc::clone(&self.parallelism));
        let mut serving = tokio::spawn(server.run(listener, self.shutdown.subscribe()));

        let reason = tokio::select! {
            reason = termination => reason.map_err(LifecycleError::Signal),
            result = &mut serving => {
                self.shutdown.mark_stopped();
                return Err(match result {
                    Ok(Ok(())) => LifecycleError::UnexpectedStop,
                    Ok(Err(e)) => LifecycleError::Serve(e),
                    Err(e) => LifecycleError::Task(e),
                });
            }
        };
        let reason = match reason {
            Ok(reason) => reason,
            Err(e) => {
                serving.abort();
                self.shutdown.mark_stopped();
                return Err(e);
            }
        };

        let grace_period = self.config.shutdown.grace_period;
        tracing::info!(
            reason = %reason,
            grace_period_ms = grace_period.as_millis() as u64,
            "Server is shutting down"
        );
        self.shutdown.trigger();

        let outcome = match tokio::time::timeout(grace_period, &mut serving).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(e))) => Err(LifecycleError::Serve(e)),
            Ok(Err(e)) => Err(LifecycleError::Task(e)),
            Err(_) => {
                serving.abort();
                Err(LifecycleError::DrainTimeout { grace_period })
            }
        };
        self.shutdown.mark_stopped();

        if outcome.is_ok() {
            tracing::info!("Shutdown complete");
        }
        outcome
    }
}
