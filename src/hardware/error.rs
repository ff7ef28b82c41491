use thiserror::Error;

///
/// All errors emitted when describing the physical robot.
///
/// - `NonPositiveLength`: When a link length is zero, negative or not a number
///     Parameters:
///     - `link`: The link name, `a` (driven) or `b` (passive)
///     - `length`: The rejected length
/// - `NonFiniteCoordinate`: When a base or attachment coordinate is infinite or NaN
/// - `InvalidLeg`: Wraps one of the above with the index of the offending leg
///
#[derive(Error, Debug)]
pub enum GeometryError {
    #[error("Link {} must have a positive length, got {}", .link, .length)]
    NonPositiveLength { link: &'static str, length: f64 },

    #[error("Leg coordinates must be finite numbers")]
    NonFiniteCoordinate,

    #[error("Leg {} is invalid: {}", .leg, .source)]
    InvalidLeg { leg: usize, source: Box<GeometryError> },
}
