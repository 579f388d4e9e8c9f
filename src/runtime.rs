// 50 Hz runtime loop with watchdog
// Bridges zenoh power commands to the power regulator and publishes the ramped
// motor state, health and distance readings.
// Note: the watchdog stops the robot if teleop stops sending commands; the
// regulator then ramps both motors down to rest instead of cutting power.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::interval;
use tracing::{error, info, warn};
use zenoh::Session;

use crate::comm::{Communicator, ZenohLink};
use crate::config::{
    CMD_TIMEOUT, DISTANCE_HZ, LOOP_HZ, RegulatorConfig, TOPIC_CMD_MOTORS, TOPIC_HEALTH,
    TOPIC_STATE_DISTANCE, TOPIC_STATE_MOTORS,
};
use crate::messages::{DistanceReading, MotorState, PowerCommand, RuntimeHealth};
use crate::motor::PowerRegulator;
use crate::sensor::DistanceSensor;

/// Runtime settings, usually taken from the command line
#[derive(Debug, Clone, Copy)]
pub struct RuntimeOptions {
    pub regulator: RegulatorConfig,
    pub cmd_timeout: Duration,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            regulator: RegulatorConfig::default(),
            cmd_timeout: CMD_TIMEOUT,
        }
    }
}

/// Watchdog and health bookkeeping
pub struct Runtime {
    cmd_timeout: Duration,
    cmd_received_at: Option<Instant>,
    stale: bool,
    health: RuntimeHealth,
}

impl Runtime {
    pub fn new(cmd_timeout: Duration) -> Self {
        Self {
            cmd_timeout,
            cmd_received_at: None,
            stale: true, // Start stale until first cmd
            health: RuntimeHealth::CmdStale,
        }
    }

    /// Process incoming command; returns the powers to request
    pub fn on_command(&mut self, cmd: PowerCommand, now: Instant) -> PowerCommand {
        if self.stale {
            info!("Receiving commands again");
        }
        self.cmd_received_at = Some(now);
        self.stale = false;
        cmd
    }

    /// Returns a stop command once when commands go stale
    pub fn check_watchdog(&mut self, now: Instant) -> Option<PowerCommand> {
        let Some(received_at) = self.cmd_received_at else {
            // No command ever received; the regulator is still at rest
            return None;
        };

        let cmd_age = now.saturating_duration_since(received_at);
        if cmd_age > self.cmd_timeout && !self.stale {
            // Watchdog triggered - stop the robot
            warn!("Command stale ({:?} old), stopping robot", cmd_age);
            self.stale = true;
            return Some(PowerCommand::stop());
        }
        None
    }

    /// Recompute health from the watchdog and the motor link
    pub fn update_health(&mut self, dispatch_failures: u32) -> RuntimeHealth {
        let health = if dispatch_failures > 0 {
            RuntimeHealth::LinkDown
        } else if self.stale {
            RuntimeHealth::CmdStale
        } else {
            RuntimeHealth::Ok
        };

        if health != self.health {
            info!("Health: {:?} -> {:?}", self.health, health);
            self.health = health;
        }
        health
    }

    pub fn health(&self) -> RuntimeHealth {
        self.health
    }
}

pub async fn run(options: RuntimeOptions) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    let link = Arc::new(ZenohLink::new(session.clone()));
    let regulator = PowerRegulator::start(link.clone(), options.regulator);

    let sensor = DistanceSensor::new(link);
    let distance_session = session.clone();
    tokio::spawn(async move {
        if let Err(e) = publish_distance(sensor, distance_session).await {
            error!("Distance publishing stopped: {}", e);
        }
    });

    info!("Setting up publishers and subscribers...");
    let subscriber = session.declare_subscriber(TOPIC_CMD_MOTORS).await?;
    let pub_state = session.declare_publisher(TOPIC_STATE_MOTORS).await?;
    let pub_health = session.declare_publisher(TOPIC_HEALTH).await?;

    let mut runtime = Runtime::new(options.cmd_timeout);
    let mut tick = interval(Duration::from_millis(1000 / LOOP_HZ));

    info!(
        "Runtime started: {}Hz loop, {}ms watchdog timeout",
        LOOP_HZ,
        options.cmd_timeout.as_millis()
    );
    info!("Subscribed to: {}", TOPIC_CMD_MOTORS);
    info!(
        "Publishing to: {}, {}, {}",
        TOPIC_STATE_MOTORS, TOPIC_HEALTH, TOPIC_STATE_DISTANCE
    );

    loop {
        tick.tick().await;
        let now = Instant::now();

        // 1. Drain all pending commands (non-blocking), each becomes the new target
        while let Ok(Some(sample)) = subscriber.try_recv() {
            let payload = sample.payload().to_bytes();
            match serde_json::from_slice::<PowerCommand>(&payload) {
                Ok(cmd) => {
                    let cmd = runtime.on_command(cmd, now);
                    regulator.set_powers(cmd.left, cmd.right);
                }
                Err(e) => {
                    warn!("Failed to parse command: {}", e);
                }
            }
        }

        // 2. Watchdog
        if let Some(stop) = runtime.check_watchdog(now) {
            regulator.set_powers(stop.left, stop.right);
        }

        // 3. Publish ramped motor state
        let state = MotorState::from(&regulator.snapshot());
        pub_state.put(serde_json::to_string(&state)?).await?;

        // 4. Publish health
        let health = runtime.update_health(regulator.dispatch_failures());
        pub_health.put(serde_json::to_string(&health)?).await?;
    }
}

/// Poll the distance sensor and publish converted readings
async fn publish_distance<C: Communicator>(
    sensor: DistanceSensor<C>,
    session: Session,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let publisher = session.declare_publisher(TOPIC_STATE_DISTANCE).await?;
    let mut tick = interval(Duration::from_millis(1000 / DISTANCE_HZ));

    loop {
        tick.tick().await;
        match sensor.get_distance().await {
            Ok(meters) => {
                let reading = DistanceReading { meters };
                publisher.put(serde_json::to_string(&reading)?).await?;
            }
            Err(e) => warn!("Failed to read distance: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT: Duration = Duration::from_millis(250);

    #[test]
    fn test_starts_stale_without_stopping() {
        let mut runtime = Runtime::new(TIMEOUT);
        assert_eq!(runtime.health(), RuntimeHealth::CmdStale);
        // Nothing to stop before the first command
        assert_eq!(runtime.check_watchdog(Instant::now() + TIMEOUT * 4), None);
        assert_eq!(runtime.update_health(0), RuntimeHealth::CmdStale);
    }

    #[test]
    fn test_fresh_command_is_ok() {
        let mut runtime = Runtime::new(TIMEOUT);
        let now = Instant::now();
        let cmd = runtime.on_command(PowerCommand::new(0.5, 0.5), now);
        assert_eq!(cmd, PowerCommand::new(0.5, 0.5));
        assert_eq!(runtime.check_watchdog(now + TIMEOUT / 2), None);
        assert_eq!(runtime.update_health(0), RuntimeHealth::Ok);
    }

    #[test]
    fn test_watchdog_stops_once() {
        let mut runtime = Runtime::new(TIMEOUT);
        let now = Instant::now();
        runtime.on_command(PowerCommand::new(1.0, 1.0), now);

        let late = now + TIMEOUT * 2;
        assert_eq!(runtime.check_watchdog(late), Some(PowerCommand::stop()));
        // Already stopped; no repeated stop requests
        assert_eq!(runtime.check_watchdog(late + TIMEOUT), None);
        assert_eq!(runtime.update_health(0), RuntimeHealth::CmdStale);

        // A new command re-arms the watchdog
        let resumed = late + TIMEOUT * 2;
        runtime.on_command(PowerCommand::new(0.4, 0.4), resumed);
        assert_eq!(runtime.update_health(0), RuntimeHealth::Ok);
        assert_eq!(
            runtime.check_watchdog(resumed + TIMEOUT * 2),
            Some(PowerCommand::stop())
        );
    }

    #[test]
    fn test_link_failures_take_precedence() {
        let mut runtime = Runtime::new(TIMEOUT);
        let now = Instant::now();
        runtime.on_command(PowerCommand::new(0.5, 0.5), now);
        assert_eq!(runtime.update_health(3), RuntimeHealth::LinkDown);
        assert_eq!(runtime.update_health(0), RuntimeHealth::Ok);
    }
}
