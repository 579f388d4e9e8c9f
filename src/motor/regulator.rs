// Power regulator for the drive motors
//
// Power requests are applied over time instead of instantly, to prevent the
// robot from slipping. A background task wakes once per period, or as soon as
// a new request arrives, advances the ramp by the time actually elapsed and
// re-sends the current powers to the microcontroller.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tracing::{debug, info, warn};

use super::state::PowerState;
use crate::comm::{CommError, Communicator};
use crate::config::RegulatorConfig;

/// State shared between the API and the regulator task
#[derive(Default)]
struct Shared {
    state: Mutex<PowerState>,
    // Stores a permit when nobody is waiting, so no request is missed
    changed: Notify,
    dispatch_failures: AtomicU32,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, PowerState> {
        // PowerState is plain data and stays consistent even if a holder panicked
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// One ramp step under the lock; returns the powers to dispatch
    fn advance(&self, step: f32) -> (f32, f32) {
        let mut state = self.state();
        if state.changed {
            debug!(
                "Ramping toward left={}, right={}",
                state.desired_left, state.desired_right
            );
            state.changed = false;
        }
        let was_settled = state.is_settled();
        let powers = state.advance(step);
        if !was_settled && state.is_settled() {
            debug!("Motors settled at left={}, right={}", powers.0, powers.1);
        }
        powers
    }
}

/// Thread-safe, non-blocking controller of the two drive motor powers
///
/// Powers range from -1.0 (full reverse) to 1.0 (full forward). The time
/// needed to go from 0.0 to 1.0 is set by [`RegulatorConfig::full_speedup`].
pub struct PowerRegulator {
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl PowerRegulator {
    /// Start the regulator task; must be called within a tokio runtime
    pub fn start<C>(link: Arc<C>, config: RegulatorConfig) -> Self
    where
        C: Communicator + 'static,
    {
        let shared = Arc::new(Shared::default());
        let task = tokio::spawn(regulate(shared.clone(), link, config));
        Self { shared, task }
    }

    /// Request new powers; returns without waiting for the ramp
    ///
    /// Values outside -1.0..=1.0 are not clamped. Non-finite values are ignored.
    pub fn set_powers(&self, power_left: f32, power_right: f32) {
        if !power_left.is_finite() || !power_right.is_finite() {
            warn!(
                "Ignoring non-finite power request: left={}, right={}",
                power_left, power_right
            );
            return;
        }

        self.shared.state().set_desired(power_left, power_right);
        self.shared.changed.notify_one();
    }

    /// Powers currently applied (ramped), which may lag the last request
    pub fn get_powers(&self) -> (f32, f32) {
        self.shared.state().current()
    }

    /// Copy of the full power state
    pub fn snapshot(&self) -> PowerState {
        *self.shared.state()
    }

    /// Consecutive failed dispatches to the microcontroller (0 when healthy)
    pub fn dispatch_failures(&self) -> u32 {
        self.shared.dispatch_failures.load(Ordering::Relaxed)
    }
}

impl Drop for PowerRegulator {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn regulate<C: Communicator>(shared: Arc<Shared>, link: Arc<C>, config: RegulatorConfig) {
    info!(
        "Power regulator started: {}ms period, {}ms full speedup",
        config.period.as_millis(),
        config.full_speedup.as_millis()
    );

    let mut last_step = Instant::now();
    loop {
        // Wake on a new request, or when the period elapses
        let _ = time::timeout(config.period, shared.changed.notified()).await;

        // Early wakes only advance by the share of a period that actually passed
        let now = Instant::now();
        let elapsed = now.duration_since(last_step);
        last_step = now;
        let (power_left, power_right) = shared.advance(ramp_step(elapsed, config));

        // Dispatch outside the state lock; a failure is retried next period
        let sent = time::timeout(config.period, link.send_powers(power_left, power_right))
            .await
            .unwrap_or(Err(CommError::Timeout(config.period)));
        match sent {
            Ok(()) => {
                let failures = shared.dispatch_failures.swap(0, Ordering::Relaxed);
                if failures > 0 {
                    info!("Motor link recovered after {} failed sends", failures);
                }
            }
            Err(e) => {
                let failures = shared.dispatch_failures.fetch_add(1, Ordering::Relaxed) + 1;
                if failures == 1 {
                    warn!("Failed to send motor powers: {}", e);
                } else {
                    debug!("Failed to send motor powers ({} in a row): {}", failures, e);
                }
            }
        }
    }
}

/// Degree step for `elapsed` time since the last step, capped at one full step
fn ramp_step(elapsed: std::time::Duration, config: RegulatorConfig) -> f32 {
    if elapsed >= config.period {
        config.degree_step()
    } else if elapsed.is_zero() {
        0.0
    } else {
        config.degree_step() * (elapsed.as_secs_f32() / config.period.as_secs_f32())
    }
}
