//!
//! Physical hardware representations and handling
//!

use nalgebra::{Rotation2, Vector2};
use serde::{Deserialize, Serialize};

use crate::kinematics::PlatformPose;
use error::GeometryError;

pub mod encoder;
pub mod error;
pub mod math;
pub mod motor;

/// The number of legs (and therefore joints) on the robot.
pub const LEG_COUNT: usize = 3;

///
/// A simple container for the physical dimensions of one RRR leg.
/// All lengths are measured in inches, in the world frame.
/// All fields have an associated getter function.
///
/// # Fields:
/// - `base`: The location of the actuated base joint
/// - `a`: The length of the driven arm, attached to the motor shaft
/// - `b`: The length of the passive arm, between the elbow and the platform
/// - `attachment`: The location of the platform attachment point, relative to the
/// platform center at zero orientation
///
#[derive(getset::CopyGetters, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[get_copy = "pub"]
pub struct LegGeometry {
    base: [f64; 2],
    a: f64,
    b: f64,
    attachment: [f64; 2],
}

impl LegGeometry {
    ///
    /// Creates a new leg, checking the link lengths are physically meaningful.
    ///
    /// # Parameters:
    /// - `base`: The (x, y) location of the base joint
    /// - `a`: The driven arm length, must be positive
    /// - `b`: The passive arm length, must be positive
    /// - `attachment`: The (x, y) platform attachment offset
    ///
    /// # Returns:
    /// - A new `LegGeometry` instance
    /// - A `GeometryError` if either link length is not a positive number
    ///
    pub fn new(base: [f64; 2], a: f64, b: f64, attachment: [f64; 2]) -> Result<LegGeometry, GeometryError> {
        let leg = LegGeometry { base, a, b, attachment };
        leg.validate()?;
        Ok(leg)
    }

    ///
    /// Checks the link length invariant. Deserialized legs bypass `new`, so the
    /// configuration loader calls this explicitly.
    ///
    pub fn validate(&self) -> Result<(), GeometryError> {
        // the negated comparison also rejects NaN
        if !(self.a > 0.) {
            return Err(GeometryError::NonPositiveLength { link: "a", length: self.a });
        }
        if !(self.b > 0.) {
            return Err(GeometryError::NonPositiveLength { link: "b", length: self.b });
        }
        if !self.base.iter().chain(self.attachment.iter()).all(|v| v.is_finite()) {
            return Err(GeometryError::NonFiniteCoordinate);
        }

        Ok(())
    }

    ///
    /// Computes the world location of the attachment point for a platform pose.
    ///
    /// # Parameters:
    /// - `pose`: The platform pose, orientation in degrees
    ///
    /// # Returns:
    /// - The (x, y) world location of this leg's attachment point
    ///
    pub fn attachment_point(&self, pose: &PlatformPose) -> Vector2<f64> {
        let rotation = Rotation2::new(pose.theta.to_radians());
        Vector2::new(pose.x, pose.y) + rotation * Vector2::from(self.attachment)
    }

    ///
    /// Computes the world location of the elbow, where the driven arm meets the passive arm.
    /// Joint angles are measured counter-clockwise from the world x axis.
    ///
    /// # Parameters:
    /// - `angle`: The joint angle, in degrees
    ///
    pub fn elbow_point(&self, angle: f64) -> Vector2<f64> {
        let (sin, cos) = angle.to_radians().sin_cos();
        Vector2::from(self.base) + Vector2::new(cos, sin) * self.a
    }

    ///
    /// A forward check of a joint angle: how far the passive arm would need to stretch
    /// to close the loop between the elbow and the attachment point.
    ///
    /// # Returns:
    /// - `|C - E| - b`, zero when the angle exactly satisfies the pose
    ///
    pub fn closure_error(&self, pose: &PlatformPose, angle: f64) -> f64 {
        (self.attachment_point(pose) - self.elbow_point(angle)).norm() - self.b
    }

    ///
    /// # Returns:
    /// - true if the two links can close the loop between the base joint and the
    /// attachment point for the given pose, i.e. `|a - b| <= r <= a + b` with `r > 0`
    ///
    pub fn can_reach(&self, pose: &PlatformPose) -> bool {
        let r = (Vector2::from(self.base) - self.attachment_point(pose)).norm();
        r > 0. && r <= self.a + self.b && r >= (self.a - self.b).abs()
    }
}

///
/// The geometry of the full robot, one `LegGeometry` per leg, in joint order.
///
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RobotGeometry {
    pub legs: [LegGeometry; LEG_COUNT],
}

impl RobotGeometry {
    ///
    /// Validates every leg before constructing the geometry.
    ///
    pub fn new(legs: [LegGeometry; LEG_COUNT]) -> Result<RobotGeometry, GeometryError> {
        for (index, leg) in legs.iter().enumerate() {
            if let Err(err) = leg.validate() {
                return Err(GeometryError::InvalidLeg { leg: index, source: Box::new(err) });
            }
        }

        Ok(RobotGeometry { legs })
    }
}

impl Default for RobotGeometry {
    ///
    /// The dimensions of the drawing robot as built, in inches.
    ///
    fn default() -> Self {
        RobotGeometry {
            legs: [
                LegGeometry { base: [0., 0.], a: 7.25, b: 7.25, attachment: [-1.985, -1.089] },
                LegGeometry { base: [17.75, 0.], a: 7.25, b: 7.25, attachment: [1.829, -1.089] },
                LegGeometry { base: [8.875, 15.375], a: 7.25, b: 7.25, attachment: [-0.244, 2.144] },
            ],
        }
    }
}


/// The commanded state of the pen solenoid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PenState {
    Up,
    Down,
}

///
/// A single reading from the resistive touch panel.
///
/// # Fields:
/// - `adc_x`: The raw x channel reading
/// - `adc_y`: The raw y channel reading
/// - `contact`: Whether anything is pressing on the panel
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchSample {
    pub adc_x: f64,
    pub adc_y: f64,
    pub contact: bool,
}

///
/// A free-running hardware counter fed by a quadrature encoder.
/// Counter values are always within `[0, modulus)`.
///
pub trait SensorPort {
    fn counter(&mut self) -> u32;
    fn reset(&mut self);
}

///
/// A motor driver accepting a signed duty cycle, in percent. Values outside
/// [-100, 100] are the driver's to clamp.
///
pub trait ActuatorPort {
    fn set_duty(&mut self, duty: f64);
}

/// The pen lift solenoid.
pub trait PenPort {
    fn set_pen(&mut self, state: PenState);
}

/// The touch panel the user draws on.
pub trait TouchPort {
    fn scan(&mut self) -> TouchSample;
}
