//!
//! Closed loop joint angle control
//!

use serde::{Deserialize, Serialize};

use crate::hardware::math::shortest_error;
use clock::Clock;

pub mod clock;

///
/// The gains of a PI angle controller. Both may be changed at any time, no bounds
/// are enforced.
///
/// # Fields:
/// - `kp`: The proportional gain, in % duty per degree
/// - `ki`: The integral gain, in % duty per degree second
///
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerParams {
    pub kp: f64,
    pub ki: f64,
}

impl Default for ControllerParams {
    fn default() -> Self {
        ControllerParams { kp: 0.9, ki: 0.05 }
    }
}

///
/// A proportional-integral controller working on joint angles. The error is always
/// taken the short way around the circle, so a target at 359 degrees seen from 0
/// degrees is 1 degree away, not 359.
///
/// The output is an unbounded duty cycle; saturation is left to the motor driver.
///
/// # Fields:
/// - `params`: The controller gains
/// - `setpoint`: The target angle, in degrees
/// - `integral`: The accumulated error, in degree seconds
/// - `last_update`: When `update` last ran, `None` until the first update after
/// construction, a setpoint change or a reset
/// - `clock`: The time source for the integral term
///
pub struct AngleController<C: Clock> {
    params: ControllerParams,
    setpoint: f64,
    integral: f64,
    last_update: Option<std::time::Duration>,
    clock: C,
}

impl<C: Clock> AngleController<C> {
    pub fn new(params: ControllerParams, setpoint: f64, clock: C) -> AngleController<C> {
        AngleController { params, setpoint, integral: 0., last_update: None, clock }
    }

    ///
    /// Computes the next duty cycle from a measured angle.
    ///
    /// The first update after construction or a setpoint change integrates over zero
    /// time. If the clock reports a time earlier than the previous update, that update
    /// also contributes nothing to the integral.
    ///
    /// # Parameters:
    /// - `measured`: The current joint angle, in degrees
    ///
    /// # Returns:
    /// - The signed duty cycle command, in percent
    ///
    pub fn update(&mut self, measured: f64) -> f64 {
        let error = shortest_error(self.setpoint, measured);
        let now = self.clock.now();

        let dt = match self.last_update {
            None => 0.,
            Some(previous) => match now.checked_sub(previous) {
                Some(elapsed) => elapsed.as_secs_f64(),
                None => {
                    tracing::warn!("Controller clock went backwards by {:?}, skipping integral", previous - now);
                    0.
                }
            },
        };

        self.integral += error * dt;
        self.last_update = Some(now);

        let proportional = self.params.kp * error;
        let integral = self.params.ki * self.integral;
        tracing::trace!(error, dt, proportional, integral, "Controller update");

        proportional + integral
    }

    ///
    /// Moves the target angle. The timing reference restarts so the next update does
    /// not integrate across the jump, but the accumulated integral is kept.
    ///
    /// # Parameters:
    /// - `setpoint`: The new target angle, in degrees
    ///
    pub fn change_setpoint(&mut self, setpoint: f64) {
        self.setpoint = setpoint;
        self.last_update = None;
    }

    pub fn change_kp(&mut self, kp: f64) {
        self.params.kp = kp;
    }

    pub fn change_ki(&mut self, ki: f64) {
        self.params.ki = ki;
    }

    ///
    /// Clears the integral and the timing reference, as if newly constructed.
    ///
    pub fn reset(&mut self) {
        self.integral = 0.;
        self.last_update = None;
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    pub fn params(&self) -> ControllerParams {
        self.params
    }

    /// The accumulated error, in degree seconds.
    pub fn integral(&self) -> f64 {
        self.integral
    }
}
