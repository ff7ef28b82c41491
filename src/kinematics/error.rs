use thiserror::Error;

///
/// All errors emitted from the kinematics module.
///
/// - `Unreachable`: When a leg cannot close the loop between its base joint and the
/// platform attachment point for the requested pose, either because the point is
/// too far, too close, or sits directly on the base joint
///     Parameters:
///     - `leg`: The zero-indexed leg which could not reach
///     - `x`, `y`, `theta`: The requested pose
///
#[derive(Error, Debug, Clone, PartialEq)]
pub enum KinematicsError {
    #[error("Leg {} cannot reach the pose x:{} y:{} theta:{}", .leg, .x, .y, .theta)]
    Unreachable { leg: usize, x: f64, y: f64, theta: f64 },
}
