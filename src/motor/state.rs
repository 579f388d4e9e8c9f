// Shared power state of the two drive motors

use super::mapping::{degree_to_power, power_to_degree};

/// Current and desired power/degree of both motors
///
/// Powers are only ever derived from degrees through [`degree_to_power`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PowerState {
    // Ramped powers, as sent to the microcontroller
    pub current_left: f32,
    pub current_right: f32,
    // Powers requested by the caller
    pub desired_left: f32,
    pub desired_right: f32,
    // Linear ramp position; maps to power
    pub degree_left: f32,
    pub degree_right: f32,
    pub degree_left_desired: f32,
    pub degree_right_desired: f32,
    // Set by a new request, cleared once the regulator has consumed it
    pub changed: bool,
}

impl PowerState {
    /// Record new target powers for both motors
    pub fn set_desired(&mut self, power_left: f32, power_right: f32) {
        self.desired_left = power_left;
        self.desired_right = power_right;
        self.degree_left_desired = power_to_degree(power_left);
        self.degree_right_desired = power_to_degree(power_right);
        self.changed = true;
    }

    /// Advance both degrees one step toward their targets and recompute powers
    ///
    /// Returns the new current powers.
    pub fn advance(&mut self, step: f32) -> (f32, f32) {
        self.degree_left = step_toward(self.degree_left, self.degree_left_desired, step);
        self.degree_right = step_toward(self.degree_right, self.degree_right_desired, step);

        self.current_left = degree_to_power(self.degree_left);
        self.current_right = degree_to_power(self.degree_right);

        self.current()
    }

    /// Current (ramped) powers
    pub fn current(&self) -> (f32, f32) {
        (self.current_left, self.current_right)
    }

    /// True when both motors have reached their desired degree
    pub fn is_settled(&self) -> bool {
        self.degree_left == self.degree_left_desired
            && self.degree_right == self.degree_right_desired
    }
}

/// Move `current` toward `target` by at most `step`, landing exactly on the target
pub fn step_toward(current: f32, target: f32, step: f32) -> f32 {
    if current == target {
        return current;
    }

    let next = if target > current {
        current + step
    } else {
        current - step
    };

    // Snap instead of overshooting (also covers rounding on the last step)
    if (target > current && next >= target) || (target < current && next <= target) {
        target
    } else {
        next
    }
}
