//!
//! Angle arithmetic on the 360 degree circle
//!

/// One full revolution, in degrees.
pub const FULL_TURN: f64 = 360.;

/// Half a revolution, in degrees.
pub const HALF_TURN: f64 = 180.;

///
/// Wraps any angle into `[0, 360)`.
///
/// # Parameters:
/// - `angle`: The angle in degrees, any finite value
///
/// # Returns:
/// - The equivalent angle within a single revolution
///
pub fn normalize_degrees(angle: f64) -> f64 {
    let wrapped = angle.rem_euclid(FULL_TURN);

    // tiny negative inputs round up to exactly 360
    if wrapped >= FULL_TURN { 0. } else { wrapped }
}

///
/// Calculates the distance between two angles going the short way around the circle.
///
/// # Returns:
/// - A distance in `[0, 180]` degrees
///
pub fn circular_distance(a: f64, b: f64) -> f64 {
    let delta = normalize_degrees(a - b);
    delta.min(FULL_TURN - delta)
}

///
/// Calculates the signed rotation that takes `measured` to `setpoint` along the
/// shorter arc. Exactly opposite angles resolve to +180.
///
/// # Parameters:
/// - `setpoint`: The target angle in degrees, not necessarily wrapped
/// - `measured`: The current angle in degrees, not necessarily wrapped
///
/// # Returns:
/// - An error in `(-180, 180]` degrees, congruent to `setpoint - measured` modulo 360
///
pub fn shortest_error(setpoint: f64, measured: f64) -> f64 {
    let error = normalize_degrees(setpoint - measured);

    if error > HALF_TURN { error - FULL_TURN } else { error }
}

///
/// Converts accumulated encoder ticks into an output shaft angle.
///
/// # Parameters:
/// - `ticks`: The accumulated, unwrapped tick count
/// - `gear_ratio`: The gearbox reduction between encoder and output shaft
/// - `counts_per_rev`: The encoder counts per motor revolution
///
/// # Returns:
/// - The output shaft angle, in degrees
///
pub fn ticks_to_degrees(ticks: i64, gear_ratio: f64, counts_per_rev: f64) -> f64 {
    (ticks as f64) * HALF_TURN / (gear_ratio * counts_per_rev)
}
