use serde::{Deserialize, Serialize};

use super::math::ticks_to_degrees;
use super::SensorPort;

///
/// The scaling constants of one encoder channel.
///
/// # Fields:
/// - `modulus`: The counter period, the counter reads within `[0, modulus)`
/// - `gear_ratio`: The gearbox reduction between motor and joint
/// - `counts_per_rev`: The encoder counts per motor revolution
///
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncoderSettings {
    pub modulus: u32,
    pub gear_ratio: f64,
    pub counts_per_rev: f64,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        EncoderSettings { modulus: 65536, gear_ratio: 131., counts_per_rev: 16. }
    }
}

///
/// Turns a wrapping hardware counter into an unbounded joint position.
///
/// Between two calls to `update` the joint must move less than half the counter
/// modulus, otherwise the direction of travel is ambiguous and the position will
/// jump by a full counter period.
///
pub struct EncoderTracker<S: SensorPort> {
    sensor: S,
    settings: EncoderSettings,
    position: i64,
    delta: i64,
}

impl<S: SensorPort> EncoderTracker<S> {
    ///
    /// Creates a tracker which owns the given counter. The accumulated position
    /// starts at zero; the hardware counter is left untouched until `zero`.
    ///
    /// # Parameters:
    /// - `sensor`: The hardware counter, exclusively owned by this tracker
    /// - `settings`: The counter modulus and angle scaling constants
    ///
    pub fn new(sensor: S, settings: EncoderSettings) -> EncoderTracker<S> {
        EncoderTracker { sensor, settings, position: 0, delta: 0 }
    }

    ///
    /// Samples the counter and folds the movement since the previous sample into
    /// the accumulated position, undoing counter wraparound.
    ///
    /// # Returns:
    /// - The accumulated position, in ticks
    ///
    pub fn update(&mut self) -> i64 {
        let modulus = i64::from(self.settings.modulus.max(1));
        let counter = i64::from(self.sensor.counter()) % modulus;

        let mut delta = counter - self.position.rem_euclid(modulus);

        // compared doubled so odd moduli split exactly in half
        if 2 * delta < -modulus {
            delta += modulus;
        } else if 2 * delta > modulus {
            delta -= modulus;
        }

        self.delta = delta;
        self.position += delta;
        self.position
    }

    ///
    /// # Returns:
    /// - The accumulated position as of the last `update`, in degrees at the joint
    ///
    pub fn read(&self) -> f64 {
        ticks_to_degrees(self.position, self.settings.gear_ratio, self.settings.counts_per_rev)
    }

    ///
    /// Resets the accumulated position, the last delta and the hardware counter to zero.
    ///
    pub fn zero(&mut self) {
        self.position = 0;
        self.delta = 0;
        self.sensor.reset();
        tracing::info!("Encoder zeroed");
    }

    /// The accumulated position, in ticks.
    pub fn position(&self) -> i64 {
        self.position
    }

    /// The correction-adjusted movement seen by the last `update`, in ticks.
    pub fn delta(&self) -> i64 {
        self.delta
    }

    pub fn settings(&self) -> &EncoderSettings {
        &self.settings
    }
}
