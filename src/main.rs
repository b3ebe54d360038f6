//! Failover gateway (v1)
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │               FAILOVER GATEWAY               │
//!     Client Request     │  ┌─────────┐   ┌──────────┐   ┌───────────┐  │      ┌──────────┐
//!     ───────────────────┼─▶│  http   │──▶│ failover │──▶│  attempt  │──┼─────▶│ primary  │
//!                        │  │ server  │   │dispatcher│   │ (bounded) │──┼──┐   └──────────┘
//!                        │  └─────────┘   └──────────┘   └───────────┘  │  │   ┌──────────┐
//!     Client Response    │       ▲              │                       │  ├──▶│ backup 1 │
//!     ◀──────────────────┼───────┴── forwarded response | fixed 503 ◀───┼──┘   └──────────┘
//!                        │                                              │         ...
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use failover_gateway::config::{load_config, ConfigError};
use failover_gateway::lifecycle::{signals, startup, Shutdown};
use failover_gateway::observability::logging;

#[derive(Parser)]
#[command(name = "failover-gateway")]
#[command(about = "Forward HTTP requests to the first healthy origin, in order", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,

    /// Validate the configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            logging::init("info");
            report_config_error(&cli.config, &e);
            return ExitCode::FAILURE;
        }
    };

    logging::init(&config.observability.log_level);

    if cli.check {
        println!("{}: configuration OK", cli.config.display());
        return ExitCode::SUCCESS;
    }

    tracing::info!("failover-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        primary = %config.upstreams.primary,
        backups = config.upstreams.backups.len(),
        attempt_timeout_ms = config.upstreams.attempt_timeout_ms,
        "Configuration loaded"
    );

    let shutdown = Shutdown::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        signals::wait_for_signal().await;
        trigger.trigger();
    });

    match startup::run(config, &shutdown).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Gateway failed");
            ExitCode::FAILURE
        }
    }
}

fn report_config_error(path: &std::path::Path, error: &ConfigError) {
    tracing::error!(path = %path.display(), "Invalid configuration");
    match error {
        ConfigError::Validation(errors) => {
            for e in errors {
                eprintln!("  - {}", e);
            }
        }
        other => eprintln!("  {}", other),
    }
}
