use thiserror::Error;

use crate::hardware::error::GeometryError;

///
/// All errors emitted from the config module.
///
/// - `Io`: When the configuration file could not be read
///     Parameters:
///     - `path`: The configuration file path
/// - `Json`: When the configuration file is not valid JSON for a `RobotConfig`
/// - `Geometry`: When the configured legs are not physically meaningful
/// - `Invalid`: When any other setting is out of range
///     Parameters:
///     - `reason`: Which setting, and what it must be
///
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read configuration file {}: {}", .path, .source)]
    Io { path: String, source: std::io::Error },

    #[error("Malformed configuration file: {}", .0)]
    Json(#[from] serde_json::Error),

    #[error("Invalid robot geometry: {}", .0)]
    Geometry(#[from] GeometryError),

    #[error("Invalid configuration: {}", .reason)]
    Invalid { reason: String },
}
