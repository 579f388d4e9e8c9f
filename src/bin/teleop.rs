// Keyboard teleop for the drive motors
//
// Held keys set a drive direction (W/S) and a turn direction (A/D); R/F change
// the power level. Releasing all keys for a short while brings the powers back
// to zero, and the runtime's regulator ramps the motors accordingly.
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use drive_runtime::config::TOPIC_CMD_MOTORS;
use drive_runtime::messages::PowerCommand;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::info;

const PUBLISH_PERIOD: Duration = Duration::from_millis(20);
const RELEASE_TIMEOUT: Duration = Duration::from_millis(100);
// Inner wheel power relative to the outer wheel in a driving turn
const TURN_RATIO: f32 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
enum PowerLevel {
    Low,
    Medium,
    High,
}

impl PowerLevel {
    fn power(self) -> f32 {
        match self {
            PowerLevel::Low => 0.4,
            PowerLevel::Medium => 0.7,
            PowerLevel::High => 1.0,
        }
    }

    fn raise(self) -> Self {
        match self {
            PowerLevel::Low => PowerLevel::Medium,
            _ => PowerLevel::High,
        }
    }

    fn lower(self) -> Self {
        match self {
            PowerLevel::High => PowerLevel::Medium,
            _ => PowerLevel::Low,
        }
    }
}

impl fmt::Display for PowerLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} ({:.0}%)", self, self.power() * 100.0)
    }
}

/// Keyboard state turned into power commands
struct Teleop {
    drive: f32, // -1, 0 or 1
    turn: f32,  // -1 (right), 0 or 1 (left)
    level: PowerLevel,
    last_input: Instant,
}

impl Teleop {
    fn new(now: Instant) -> Self {
        Self {
            drive: 0.0,
            turn: 0.0,
            level: PowerLevel::Low,
            last_input: now,
        }
    }

    /// Apply a key press; returns false when the user asked to quit
    fn on_key(&mut self, code: KeyCode, now: Instant) -> bool {
        let (drive, turn) = match code {
            KeyCode::Char('w') => (Some(1.0), None),
            KeyCode::Char('s') => (Some(-1.0), None),
            KeyCode::Char('a') => (None, Some(1.0)),
            KeyCode::Char('d') => (None, Some(-1.0)),
            KeyCode::Char('r') => {
                self.level = self.level.raise();
                info!("Power level: {}", self.level);
                return true;
            }
            KeyCode::Char('f') => {
                self.level = self.level.lower();
                info!("Power level: {}", self.level);
                return true;
            }
            KeyCode::Char('q') | KeyCode::Esc => return false,
            _ => return true,
        };

        if let Some(drive) = drive {
            self.drive = drive;
        }
        if let Some(turn) = turn {
            self.turn = turn;
        }
        self.last_input = now;
        true
    }

    /// Command to publish now; directions reset once keys are released
    fn command(&mut self, now: Instant) -> PowerCommand {
        if now.duration_since(self.last_input) > RELEASE_TIMEOUT {
            self.drive = 0.0;
            self.turn = 0.0;
        }
        mix(self.drive, self.turn, self.level.power())
    }
}

/// Differential mix of drive/turn directions into left/right powers
fn mix(drive: f32, turn: f32, power: f32) -> PowerCommand {
    if drive == 0.0 {
        // Spin in place
        return PowerCommand::new(-turn * power, turn * power);
    }

    let outer = drive * power;
    let inner = outer * TURN_RATIO;
    match turn {
        t if t > 0.0 => PowerCommand::new(inner, outer),
        t if t < 0.0 => PowerCommand::new(outer, inner),
        _ => PowerCommand::new(outer, outer),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let session = zenoh::open(zenoh::Config::default()).await?;
    let publisher = session.declare_publisher(TOPIC_CMD_MOTORS).await?;
    info!("Publishing power commands on {}", TOPIC_CMD_MOTORS);
    info!("Keys: W/S drive, A/D turn, R/F power level, Q quit");

    enable_raw_mode()?;
    let result = drive_loop(&publisher).await;
    disable_raw_mode()?;
    result?;

    // Leave the robot at rest
    publisher
        .put(serde_json::to_string(&PowerCommand::stop())?)
        .await?;
    Ok(())
}

async fn drive_loop(
    publisher: &zenoh::pubsub::Publisher<'_>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut teleop = Teleop::new(Instant::now());

    loop {
        if event::poll(PUBLISH_PERIOD)? {
            if let Event::Key(KeyEvent { code, kind, .. }) = event::read()? {
                let pressed = matches!(kind, KeyEventKind::Press | KeyEventKind::Repeat);
                if pressed && !teleop.on_key(code, Instant::now()) {
                    return Ok(());
                }
            }
        }

        let cmd = teleop.command(Instant::now());
        publisher.put(serde_json::to_string(&cmd)?).await?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mix() {
        assert_eq!(mix(0.0, 0.0, 0.7), PowerCommand::stop());
        assert_eq!(mix(1.0, 0.0, 0.7), PowerCommand::new(0.7, 0.7));
        assert_eq!(mix(-1.0, 0.0, 0.4), PowerCommand::new(-0.4, -0.4));
        assert_eq!(mix(1.0, 1.0, 1.0), PowerCommand::new(0.5, 1.0));
        assert_eq!(mix(1.0, -1.0, 1.0), PowerCommand::new(1.0, 0.5));
        assert_eq!(mix(0.0, 1.0, 0.4), PowerCommand::new(-0.4, 0.4));
    }

    #[test]
    fn test_power_levels_saturate() {
        assert_eq!(PowerLevel::Low.lower(), PowerLevel::Low);
        assert_eq!(PowerLevel::Low.raise(), PowerLevel::Medium);
        assert_eq!(PowerLevel::Medium.raise(), PowerLevel::High);
        assert_eq!(PowerLevel::High.raise(), PowerLevel::High);
        assert_eq!(PowerLevel::High.lower(), PowerLevel::Medium);
    }

    #[test]
    fn test_keys_drive_and_release() {
        let start = Instant::now();
        let mut teleop = Teleop::new(start);

        assert!(teleop.on_key(KeyCode::Char('r'), start));
        assert!(teleop.on_key(KeyCode::Char('w'), start));
        assert_eq!(teleop.command(start), PowerCommand::new(0.7, 0.7));

        assert!(teleop.on_key(KeyCode::Char('a'), start));
        assert_eq!(teleop.command(start), PowerCommand::new(0.35, 0.7));

        // Keys released
        let later = start + RELEASE_TIMEOUT * 2;
        assert_eq!(teleop.command(later), PowerCommand::stop());
    }

    #[test]
    fn test_quit_keys() {
        let now = Instant::now();
        let mut teleop = Teleop::new(now);
        assert!(!teleop.on_key(KeyCode::Char('q'), now));
        assert!(!teleop.on_key(KeyCode::Esc, now));
        assert!(teleop.on_key(KeyCode::Char('x'), now));
    }
}
