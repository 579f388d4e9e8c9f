// Motor power regulation for the differential drive
//
// Provides:
// - Degree <-> power mapping compensating for motor dead-band
// - Power state of the two motors
// - Background regulator ramping power requests over time

pub mod mapping;
mod regulator;
mod state;

pub use mapping::{degree_to_power, power_to_degree};
pub use regulator::PowerRegulator;
pub use state::{PowerState, step_toward};
