use std::time::Duration;

use clap::Parser;
use drive_runtime::config::{CMD_TIMEOUT, FULL_SPEEDUP_TIME, POWER_CHANGE_PERIOD, RegulatorConfig};
use drive_runtime::runtime::RuntimeOptions;
use tracing_subscriber::EnvFilter;

/// Drive motor runtime: ramps power commands and forwards them to the microcontroller
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Regulator period in milliseconds
    #[arg(long, default_value_t = POWER_CHANGE_PERIOD.as_millis() as u64, value_parser = clap::value_parser!(u64).range(1..))]
    period_ms: u64,

    /// Time to ramp from rest to full power, in milliseconds
    #[arg(long, default_value_t = FULL_SPEEDUP_TIME.as_millis() as u64)]
    full_speedup_ms: u64,

    /// Stop the robot when no command arrives for this long, in milliseconds
    #[arg(long, default_value_t = CMD_TIMEOUT.as_millis() as u64)]
    cmd_timeout_ms: u64,
}

impl Args {
    fn options(&self) -> RuntimeOptions {
        RuntimeOptions {
            regulator: RegulatorConfig::new(
                Duration::from_millis(self.period_ms),
                Duration::from_millis(self.full_speedup_ms),
            ),
            cmd_timeout: Duration::from_millis(self.cmd_timeout_ms),
        }
    }
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let args = Args::parse();

    if let Err(e) = drive_runtime::runtime::run(args.options()).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
