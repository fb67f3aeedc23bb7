//! CPU quota demonstration server.
//!
//! Two endpoints: a deliberately slow primality check that burns CPU in
//! proportion to its input, and a handler that reads or changes how many of
//! those checks may run at once.

pub mod api;
pub mod compute;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use compute::Parallelism;
pub use config::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::{Lifecycle, LifecycleError, Shutdown};
