//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use cpu_quota_demo::compute::Parallelism;
use cpu_quota_demo::config::ServerConfig;
use cpu_quota_demo::lifecycle::{Lifecycle, LifecycleError, ServerState, TerminationReason};
use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

/// A server started on an ephemeral port, stoppable without OS signals.
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: watch::Receiver<ServerState>,
    stop: Option<oneshot::Sender<()>>,
    handle: JoinHandle<Result<(), LifecycleError>>,
}

impl TestServer {
    /// Start serving with the given drain grace period and parallelism.
    pub async fn start(grace_period: Duration, parallelism: Arc<Parallelism>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let mut config = ServerConfig::default();
        config.listener.bind_address = addr.to_string();
        config.shutdown.grace_period = grace_period;

        let lifecycle = Lifecycle::new(config, parallelism);
        let state = lifecycle.shutdown().watch_state();

        let (stop, stopped) = oneshot::channel();
        let handle = tokio::spawn(lifecycle.serve(listener, termination(stopped)));

        Self {
            addr,
            state,
            stop: Some(stop),
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Request termination and wait for the lifecycle to finish.
    pub async fn stop(mut self) -> Result<(), LifecycleError> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        tokio::time::timeout(Duration::from_secs(30), self.handle)
            .await
            .expect("lifecycle did not finish")
            .expect("lifecycle task panicked")
    }
}

fn termination(
    stopped: oneshot::Receiver<()>,
) -> impl Future<Output = std::io::Result<TerminationReason>> {
    async move {
        stopped
            .await
            .map(|_| TerminationReason::Requested)
            .map_err(std::io::Error::other)
    }
}

/// HTTP client that never pools or proxies.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
