// Define message types for the runtime

use serde::{Deserialize, Serialize};

use crate::config::POWER_CONVERSION_FACTOR;
use crate::motor::PowerState;

// Command from teleop/scripts -> runtime
// Normalized powers, -1.0 = full reverse, 1.0 = full forward
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct PowerCommand {
    pub left: f32,
    pub right: f32,
}

impl PowerCommand {
    pub fn new(left: f32, right: f32) -> Self {
        Self { left, right }
    }

    pub fn stop() -> Self {
        Self::default()
    }
}

// Command from runtime -> microcontroller, in microcontroller power units
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct MotorCommand {
    pub left: i16,
    pub right: i16,
}

impl MotorCommand {
    /// Scale normalized powers to microcontroller units (truncating, saturating at i16)
    pub fn from_powers(power_left: f32, power_right: f32) -> Self {
        Self {
            left: to_command_units(power_left),
            right: to_command_units(power_right),
        }
    }
}

fn to_command_units(power: f32) -> i16 {
    (power * POWER_CONVERSION_FACTOR) as i16
}

// Ramped motor state published by the runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct MotorState {
    pub current_left: f32,
    pub current_right: f32,
    pub desired_left: f32,
    pub desired_right: f32,
}

impl From<&PowerState> for MotorState {
    fn from(state: &PowerState) -> Self {
        Self {
            current_left: state.current_left,
            current_right: state.current_right,
            desired_left: state.desired_left,
            desired_right: state.desired_right,
        }
    }
}

// Distance reply from the microcontroller, in raw sensor units
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RawDistance {
    pub raw: f32,
}

// Converted distance published by the runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DistanceReading {
    pub meters: f32,
}

/// Health status published by runtime
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeHealth {
    Ok,
    CmdStale,
    LinkDown,
}
