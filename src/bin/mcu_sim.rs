// Simulated microcontroller: logs motor commands and answers distance queries
//
// Usage: cargo run --bin mcu_sim -- --distance-raw 120
use clap::Parser;
use drive_runtime::config::{TOPIC_RT_DISTANCE, TOPIC_RT_MOTORS};
use drive_runtime::messages::{MotorCommand, RawDistance};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version)]
struct Opts {
    /// Raw distance reported to queries (sensor units)
    #[arg(long, default_value_t = 100.0)]
    distance_raw: f32,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    let opts = Opts::parse();

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;
    let subscriber = session.declare_subscriber(TOPIC_RT_MOTORS).await?;
    let queryable = session.declare_queryable(TOPIC_RT_DISTANCE).await?;

    info!("Listening on {}, answering {}", TOPIC_RT_MOTORS, TOPIC_RT_DISTANCE);

    let mut last_cmd = MotorCommand::default();
    loop {
        tokio::select! {
            sample = subscriber.recv_async() => {
                let sample = sample?;
                let payload = sample.payload().to_bytes();
                match serde_json::from_slice::<MotorCommand>(&payload) {
                    Ok(cmd) if cmd != last_cmd => {
                        info!("Motors: left={}, right={}", cmd.left, cmd.right);
                        last_cmd = cmd;
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Failed to parse motor command: {}", e),
                }
            }
            query = queryable.recv_async() => {
                let query = query?;
                let reply = serde_json::to_string(&RawDistance { raw: opts.distance_raw })?;
                debug!("Distance query on {}", query.key_expr());
                query.reply(query.key_expr().clone(), reply).await?;
            }
        }
    }
}
