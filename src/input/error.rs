use thiserror::Error;

///
/// All errors emitted from the input module.
///
/// - `TooFewSamples`: When a calibration fit is given fewer than three points
///     Parameters:
///     - `count`: The number of points given
/// - `Singular`: When the calibration points do not span the panel, e.g. all lie on one line
/// - `Io`: When the calibration file could not be read or written
///     Parameters:
///     - `path`: The calibration file path
/// - `Json`: When the calibration file is not valid JSON, or is missing a coefficient
///
#[derive(Error, Debug)]
pub enum CalibrationError {
    #[error("A touch calibration needs at least 3 points, got {}", .count)]
    TooFewSamples { count: usize },

    #[error("The calibration points are degenerate, touch points must not all lie on one line.")]
    Singular,

    #[error("Could not access calibration file {}: {}", .path, .source)]
    Io { path: String, source: std::io::Error },

    #[error("Malformed calibration file: {}", .0)]
    Json(#[from] serde_json::Error),
}
