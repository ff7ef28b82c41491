//!
//! Touch panel input: raw readings to panel millimetres to robot inches
//!

pub mod error;

use std::path::Path;

use nalgebra::{DMatrix, Matrix2, Vector2};
use serde::{Deserialize, Serialize};

use error::CalibrationError;

///
/// The affine transform from raw touch panel readings to panel millimetres.
///
/// `x = adc_x * k_xx + adc_y * k_xy + x_offset`
/// `y = adc_x * k_yx + adc_y * k_yy + y_offset`
///
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchCalibration {
    pub k_xx: f64,
    pub k_xy: f64,
    pub k_yx: f64,
    pub k_yy: f64,
    pub x_offset: f64,
    pub y_offset: f64,
}

impl Default for TouchCalibration {
    ///
    /// The nominal transform for the panel: 170 mm by 100 mm over a 12 bit reading,
    /// centered on the panel.
    ///
    fn default() -> Self {
        TouchCalibration {
            k_xx: 170. / 4095.,
            k_xy: 0.,
            k_yx: 0.,
            k_yy: 100. / 4095.,
            x_offset: -100.,
            y_offset: -58.,
        }
    }
}

///
/// A calibration point: where the panel read, and where the touch actually was.
///
/// # Fields:
/// - `raw`: The raw (adc_x, adc_y) reading
/// - `reference`: The known touch location, in millimetres
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationPoint {
    pub raw: [f64; 2],
    pub reference: [f64; 2],
}

impl TouchCalibration {
    /// The transform which passes raw readings straight through.
    pub fn identity() -> TouchCalibration {
        TouchCalibration { k_xx: 1., k_xy: 0., k_yx: 0., k_yy: 1., x_offset: 0., y_offset: 0. }
    }

    ///
    /// Applies the calibration to a raw reading.
    ///
    /// # Returns:
    /// - The (x, y) touch location, in millimetres
    ///
    pub fn apply(&self, adc_x: f64, adc_y: f64) -> (f64, f64) {
        (
            adc_x * self.k_xx + adc_y * self.k_xy + self.x_offset,
            adc_x * self.k_yx + adc_y * self.k_yy + self.y_offset,
        )
    }

    ///
    /// Finds the raw reading which calibrates to a panel location.
    ///
    /// # Returns:
    /// - The (adc_x, adc_y) reading, or `None` if the calibration is not invertible
    ///
    pub fn invert(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let k = Matrix2::new(self.k_xx, self.k_xy, self.k_yx, self.k_yy);
        let raw = k.try_inverse()? * Vector2::new(x - self.x_offset, y - self.y_offset);
        Some((raw.x, raw.y))
    }

    ///
    /// Fits a calibration to a set of points by linear least squares, solving
    /// `K = (AᵀA)⁻¹AᵀP` where each row of `A` is `[adc_x, adc_y, 1]` and each row of
    /// `P` the matching reference location.
    ///
    /// # Parameters:
    /// - `points`: At least three calibration points, not all on one line
    ///
    /// # Returns:
    /// - The best fit `TouchCalibration`
    /// - `CalibrationError::TooFewSamples` or `CalibrationError::Singular` if no unique fit exists
    ///
    pub fn fit(points: &[CalibrationPoint]) -> Result<TouchCalibration, CalibrationError> {
        if points.len() < 3 {
            return Err(CalibrationError::TooFewSamples { count: points.len() });
        }

        let a = DMatrix::from_fn(points.len(), 3, |row, col| match col {
            0 => points[row].raw[0],
            1 => points[row].raw[1],
            _ => 1.,
        });
        let p = DMatrix::from_fn(points.len(), 2, |row, col| points[row].reference[col]);

        let at = a.transpose();
        let inverse = (&at * &a).try_inverse().ok_or(CalibrationError::Singular)?;
        let k = inverse * at * p;

        if k.iter().any(|v| !v.is_finite()) {
            return Err(CalibrationError::Singular);
        }

        let calibration = TouchCalibration {
            k_xx: k[(0, 0)],
            k_xy: k[(1, 0)],
            k_yx: k[(0, 1)],
            k_yy: k[(1, 1)],
            x_offset: k[(2, 0)],
            y_offset: k[(2, 1)],
        };

        tracing::info!(?calibration, points = points.len(), "Touch calibration fitted");
        Ok(calibration)
    }

    ///
    /// Reads a calibration previously written by `save`.
    ///
    pub fn load<P: AsRef<Path>>(path: P) -> Result<TouchCalibration, CalibrationError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|source| CalibrationError::Io { path: path.display().to_string(), source })?;

        let calibration = serde_json::from_str(&contents)?;
        tracing::info!("Loaded touch calibration from {}", path.display());
        Ok(calibration)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CalibrationError> {
        let path = path.as_ref();
        let contents = serde_json::to_string_pretty(self)?;

        std::fs::write(path, contents)
            .map_err(|source| CalibrationError::Io { path: path.display().to_string(), source })
    }
}

///
/// Places panel coordinates in the robot's frame.
///
/// # Fields:
/// - `scale`: Robot units per panel unit, inches per millimetre by default
/// - `offset`: Where the panel origin sits in the robot frame, in inches
///
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelMapping {
    pub scale: f64,
    pub offset: [f64; 2],
}

impl Default for PanelMapping {
    fn default() -> Self {
        PanelMapping { scale: 1. / 25.4, offset: [8.875, 5.124] }
    }
}

impl PanelMapping {
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.scale + self.offset[0], y * self.scale + self.offset[1])
    }

    /// Robot frame back to panel coordinates.
    pub fn invert(&self, x: f64, y: f64) -> (f64, f64) {
        ((x - self.offset[0]) / self.scale, (y - self.offset[1]) / self.scale)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn point(raw: [f64; 2], calibration: &TouchCalibration) -> CalibrationPoint {
        let (x, y) = calibration.apply(raw[0], raw[1]);
        CalibrationPoint { raw, reference: [x, y] }
    }

    #[test]
    fn default_maps_panel_corners() {
        let calibration = TouchCalibration::default();
        let (x, y) = calibration.apply(0., 0.);
        assert_eq!((x, y), (-100., -58.));

        let (x, y) = calibration.apply(4095., 4095.);
        assert_abs_diff_eq!(x, 70., epsilon = 1e-9);
        assert_abs_diff_eq!(y, 42., epsilon = 1e-9);
    }

    #[test]
    fn fit_recovers_exact_transform() {
        let truth = TouchCalibration { k_xx: 0.05, k_xy: 0.002, k_yx: -0.001, k_yy: 0.03, x_offset: -95., y_offset: -60. };
        let points: Vec<_> = [[200., 300.], [3900., 250.], [2000., 3800.], [3500., 3600.], [400., 3900.]]
            .into_iter()
            .map(|raw| point(raw, &truth))
            .collect();

        let fitted = TouchCalibration::fit(&points).unwrap();
        for (got, want) in [
            (fitted.k_xx, truth.k_xx),
            (fitted.k_xy, truth.k_xy),
            (fitted.k_yx, truth.k_yx),
            (fitted.k_yy, truth.k_yy),
            (fitted.x_offset, truth.x_offset),
            (fitted.y_offset, truth.y_offset),
        ] {
            assert_abs_diff_eq!(got, want, epsilon = 1e-6);
        }
    }

    #[test]
    fn fit_needs_three_points() {
        let identity = TouchCalibration::identity();
        let points = [point([1., 2.], &identity), point([3., 1.], &identity)];
        assert!(matches!(TouchCalibration::fit(&points), Err(CalibrationError::TooFewSamples { count: 2 })));
    }

    #[test]
    fn fit_rejects_collinear_points() {
        let identity = TouchCalibration::identity();
        let points = [point([0., 0.], &identity), point([1., 1.], &identity), point([2., 2.], &identity)];
        assert!(matches!(TouchCalibration::fit(&points), Err(CalibrationError::Singular)));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calibration.json");

        let calibration = TouchCalibration { k_xx: 0.04, k_xy: 0., k_yx: 0.001, k_yy: 0.025, x_offset: -99., y_offset: -57. };
        calibration.save(&path).unwrap();
        assert_eq!(TouchCalibration::load(&path).unwrap(), calibration);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = TouchCalibration::load(dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, CalibrationError::Io { .. }));
    }

    #[test]
    fn load_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calibration.json");
        std::fs::write(&path, "{\"k_xx\": 1.0}").unwrap();
        assert!(matches!(TouchCalibration::load(&path), Err(CalibrationError::Json(_))));
    }

    #[test]
    fn invert_undoes_apply() {
        let calibration = TouchCalibration { k_xx: 0.05, k_xy: 0.002, k_yx: -0.001, k_yy: 0.03, x_offset: -95., y_offset: -60. };
        let (adc_x, adc_y) = calibration.invert(12., -7.).unwrap();
        let (x, y) = calibration.apply(adc_x, adc_y);
        assert_abs_diff_eq!(x, 12., epsilon = 1e-9);
        assert_abs_diff_eq!(y, -7., epsilon = 1e-9);

        let flat = TouchCalibration { k_xx: 1., k_xy: 1., k_yx: 1., k_yy: 1., x_offset: 0., y_offset: 0. };
        assert_eq!(flat.invert(1., 1.), None);

        let mapping = PanelMapping::default();
        let (px, py) = mapping.invert(9.5, 4.);
        let (x, y) = mapping.apply(px, py);
        assert_abs_diff_eq!(x, 9.5, epsilon = 1e-12);
        assert_abs_diff_eq!(y, 4., epsilon = 1e-12);
    }

    #[test]
    fn mapping_places_panel_in_robot_frame() {
        let mapping = PanelMapping::default();
        assert_eq!(mapping.apply(0., 0.), (8.875, 5.124));
        let (x, y) = mapping.apply(25.4, -25.4);
        assert_abs_diff_eq!(x, 9.875, epsilon = 1e-12);
        assert_abs_diff_eq!(y, 4.124, epsilon = 1e-12);
    }
}
