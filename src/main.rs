use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;

use cpu_quota_demo::compute::Parallelism;
use cpu_quota_demo::config::ServerConfig;
use cpu_quota_demo::lifecycle::Lifecycle;
use cpu_quota_demo::observability::init_logging;

#[derive(Parser)]
#[command(name = "cpu-quota-demo")]
#[command(about = "HTTP server for observing CPU quota effects", long_about = None)]
struct Cli {
    /// Address to listen on.
    #[arg(long, default_value = "0.0.0.0:8080")]
    bind: String,

    /// Seconds in-flight requests may keep running after SIGINT/SIGTERM.
    #[arg(long, default_value_t = 10)]
    shutdown_grace_secs: u64,
}

impl Cli {
    fn into_config(self) -> ServerConfig {
        let mut config = ServerConfig::default();
        config.listener.bind_address = self.bind;
        config.shutdown.grace_period = Duration::from_secs(self.shutdown_grace_secs);
        config
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = Cli::parse().into_config();

    if let Err(e) = init_logging() {
        eprintln!("failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    let parallelism = Arc::new(Parallelism::from_system());
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        address = %config.listener.bind_address,
        parallelism = parallelism.current(),
        available_cpus = parallelism.available(),
        "Server is starting"
    );

    match Lifecycle::new(config, parallelism).run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            // Exit without dropping the runtime: scans abandoned by the drain
            // still occupy the blocking pool.
            std::process::exit(1);
        }
    }
}
