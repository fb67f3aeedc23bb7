//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → command-line overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (immutable for the process lifetime)
//! ```

pub mod schema;
pub mod validation;

pub use schema::{ListenerConfig, ServerConfig, ShutdownConfig};
pub use validation::{validate_config, ConfigError, ValidationError};
