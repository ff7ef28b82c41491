//!
//! Robot configuration, read from a JSON file
//!
//! Every section falls back to the dimensions and tuning of the robot as built, so a
//! file only needs to name what differs. An empty object `{}` is a valid configuration.
//!

pub mod error;

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::control::ControllerParams;
use crate::hardware::encoder::EncoderSettings;
use crate::hardware::error::GeometryError;
use crate::hardware::{RobotGeometry, LEG_COUNT};
use crate::input::error::CalibrationError;
use crate::input::{PanelMapping, TouchCalibration};
use error::ConfigError;

///
/// Task periods and priorities. Periods are in milliseconds; higher priorities run
/// first when tasks fall due together.
///
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleSettings {
    pub joint_period_ms: u64,
    pub brain_period_ms: u64,
    pub touch_period_ms: u64,
    pub joint_priority: u8,
    pub brain_priority: u8,
    pub touch_priority: u8,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        ScheduleSettings {
            joint_period_ms: 50,
            brain_period_ms: 50,
            touch_period_ms: 50,
            joint_priority: 2,
            brain_priority: 3,
            touch_priority: 4,
        }
    }
}

impl ScheduleSettings {
    pub fn joint_period(&self) -> Duration {
        Duration::from_millis(self.joint_period_ms)
    }

    pub fn brain_period(&self) -> Duration {
        Duration::from_millis(self.brain_period_ms)
    }

    pub fn touch_period(&self) -> Duration {
        Duration::from_millis(self.touch_period_ms)
    }
}

///
/// The touch panel's placement, and where to find its calibration.
///
/// # Fields:
/// - `mapping`: Panel millimetres to robot inches
/// - `calibration`: A calibration file written by `TouchCalibration::save`. The nominal
/// calibration is used when absent
///
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelSettings {
    pub mapping: PanelMapping,
    pub calibration: Option<PathBuf>,
}

///
/// The complete robot configuration.
///
/// # Fields:
/// - `geometry`: The leg dimensions, in inches
/// - `controllers`: The gains of each joint controller, in leg order
/// - `initial_setpoint`: The joint setpoint before the first request, in degrees
/// - `encoder`: The counter modulus and angle scaling of every joint
/// - `schedule`: Task periods and priorities
/// - `request_capacity`: How many position requests may wait for the brain
/// - `panel`: The touch panel settings
/// - `platform_theta`: The platform orientation held while drawing, in degrees
///
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RobotConfig {
    pub geometry: RobotGeometry,
    pub controllers: [ControllerParams; LEG_COUNT],
    pub initial_setpoint: f64,
    pub encoder: EncoderSettings,
    pub schedule: ScheduleSettings,
    pub request_capacity: usize,
    pub panel: PanelSettings,
    pub platform_theta: f64,
}

impl Default for RobotConfig {
    fn default() -> Self {
        RobotConfig {
            geometry: RobotGeometry::default(),
            controllers: [ControllerParams::default(); LEG_COUNT],
            initial_setpoint: 0.,
            encoder: EncoderSettings::default(),
            schedule: ScheduleSettings::default(),
            request_capacity: 100,
            panel: PanelSettings::default(),
            platform_theta: 0.,
        }
    }
}

impl RobotConfig {
    ///
    /// Reads, parses and validates a configuration file.
    ///
    /// # Parameters:
    /// - `path`: The JSON file to read
    ///
    /// # Returns:
    /// - The validated `RobotConfig`
    /// - A `ConfigError` if the file is unreadable, malformed, or describes an impossible robot
    ///
    pub fn load<P: AsRef<Path>>(path: P) -> Result<RobotConfig, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| {
            tracing::error!("Failed to read config file '{}': {}", path.display(), source);
            ConfigError::Io { path: path.display().to_string(), source }
        })?;

        let config: RobotConfig = serde_json::from_str(&contents)?;
        config.validate()?;

        tracing::info!("Loaded robot configuration from {}", path.display());
        Ok(config)
    }

    ///
    /// Checks every setting is usable.
    ///
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.geometry()?;

        let schedule = &self.schedule;
        if schedule.joint_period_ms == 0 || schedule.brain_period_ms == 0 || schedule.touch_period_ms == 0 {
            return Err(invalid("task periods must be at least 1 ms"));
        }
        if self.request_capacity == 0 {
            return Err(invalid("request_capacity must be at least 1"));
        }
        if self.encoder.modulus == 0 {
            return Err(invalid("encoder modulus must be at least 1"));
        }
        if !(self.encoder.gear_ratio > 0. && self.encoder.counts_per_rev > 0.) {
            return Err(invalid("encoder gear_ratio and counts_per_rev must be positive"));
        }
        if let Some(leg) = self.controllers.iter().position(|gains| !(gains.kp.is_finite() && gains.ki.is_finite())) {
            let reason = format!("controller gains of leg {} must be finite", leg + 1);
            return Err(ConfigError::Invalid { reason });
        }
        if !(self.panel.mapping.scale.is_finite() && self.panel.mapping.scale != 0.) {
            return Err(invalid("panel mapping scale must be a non-zero number"));
        }

        Ok(())
    }

    ///
    /// # Returns:
    /// - The configured geometry, checked leg by leg
    ///
    pub fn geometry(&self) -> Result<RobotGeometry, GeometryError> {
        RobotGeometry::new(self.geometry.legs)
    }

    ///
    /// Loads the configured touch calibration file, or the nominal calibration when
    /// none is configured.
    ///
    pub fn touch_calibration(&self) -> Result<TouchCalibration, CalibrationError> {
        match &self.panel.calibration {
            Some(path) => TouchCalibration::load(path),
            None => Ok(TouchCalibration::default()),
        }
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid { reason: reason.to_string() }
}
