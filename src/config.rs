// Timeouts, topics, ramp timing and conversion factors
use std::time::Duration;

// Runtime loop frequency
pub const LOOP_HZ: u64 = 50;

// Command timeout for watchdog
pub const CMD_TIMEOUT: Duration = Duration::from_millis(250);

// Distance polling frequency
pub const DISTANCE_HZ: u64 = 10;

// How long to wait for the microcontroller to answer a distance query
pub const DISTANCE_QUERY_TIMEOUT: Duration = Duration::from_millis(100);

// Zenoh topics
pub const TOPIC_CMD_MOTORS: &str = "robot/cmd/motors"; // power commands from teleop/scripts
pub const TOPIC_RT_MOTORS: &str = "robot/rt/motors"; // scaled commands to the microcontroller
pub const TOPIC_RT_DISTANCE: &str = "robot/rt/distance"; // distance queryable on the microcontroller side
pub const TOPIC_STATE_MOTORS: &str = "robot/state/motors"; // ramped motor state
pub const TOPIC_STATE_DISTANCE: &str = "robot/state/distance"; // converted distance readings
pub const TOPIC_HEALTH: &str = "robot/state/health"; // health status

// Power regulation
// Time required to go from 0.0 to 1.0 power
pub const FULL_SPEEDUP_TIME: Duration = Duration::from_millis(2000);
// Regulator period; the ramp advances one step per period
pub const POWER_CHANGE_PERIOD: Duration = Duration::from_millis(100);

// Computer power to microcontroller power
pub const POWER_CONVERSION_FACTOR: f32 = 255.0;

// Raw sensor units (cm) to meters
pub const DISTANCE_CONVERSION_FACTOR: f32 = 0.01;

/// Timing of the power ramp
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegulatorConfig {
    /// How often the regulator advances the ramp and re-sends the command
    pub period: Duration,
    /// Time to ramp from rest to full power
    pub full_speedup: Duration,
}

impl RegulatorConfig {
    pub fn new(period: Duration, full_speedup: Duration) -> Self {
        Self {
            period,
            full_speedup,
        }
    }

    /// Degree change allowed per period.
    ///
    /// A zero full-speedup time yields an infinite step, i.e. targets are
    /// reached on the next period without ramping.
    pub fn degree_step(&self) -> f32 {
        self.period.as_secs_f32() / self.full_speedup.as_secs_f32()
    }
}

impl Default for RegulatorConfig {
    fn default() -> Self {
        Self::new(POWER_CHANGE_PERIOD, FULL_SPEEDUP_TIME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_step() {
        let step = RegulatorConfig::default().degree_step();
        assert!((step - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_custom_step() {
        let config = RegulatorConfig::new(Duration::from_millis(250), Duration::from_secs(1));
        assert_eq!(config.degree_step(), 0.25);
    }

    #[test]
    fn test_zero_speedup_is_instant() {
        let config = RegulatorConfig::new(Duration::from_millis(100), Duration::ZERO);
        assert!(config.degree_step().is_infinite());
    }
}
