//! Startup orchestration.
//!
//! # Responsibilities
//! - Validate configuration
//! - Bind the listener
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The listener is bound before the server task is spawned, so a bind
//!   failure surfaces directly to the caller

use tokio::net::TcpListener;

use crate::config::{validate_config, ServerConfig};
use crate::lifecycle::LifecycleError;

/// Validate `config` and bind its listen address.
pub async fn bind_listener(config: &ServerConfig) -> Result<TcpListener, LifecycleError> {
    validate_config(config)?;

    let address = config.listener.bind_address.as_str();
    let listener = TcpListener::bind(address)
        .await
        .map_err(|source| LifecycleError::Bind {
            address: address.to_string(),
            source,
        })?;

    let local_addr = listener.local_addr().map_err(LifecycleError::Serve)?;
    tracing::info!(address = %local_addr, "Listener bound");
    Ok(listener)
}
