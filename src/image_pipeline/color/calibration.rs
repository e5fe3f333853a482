use nalgebra::{Matrix3, Vector3};

/// A color matrix (camera raw -> XYZ.D50) measured under `illum`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ccm {
    pub illum: Vector3<f64>,
    pub matrix: Matrix3<f64>,
}

/// Pair of calibrated matrices bracketing the illuminants the camera is
/// expected to see. Intermediate illuminants interpolate between them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorCalibration {
    pub ccm1: Ccm,
    pub ccm2: Ccm,
}

impl Default for ColorCalibration {
    /// Incandescent (ccm1) and late-afternoon daylight (ccm2) calibrations.
    fn default() -> Self {
        Self {
            ccm1: Ccm {
                illum: Vector3::new(0.880159, 0.902888, 0.340842),
                matrix: Matrix3::new(
                    0.253550, 0.474052, 0.272397,
                    -0.182395, 1.121929, 0.060466,
                    -0.458151, -0.017908, 1.476060,
                ),
            },
            ccm2: Ccm {
                illum: Vector3::new(0.638797, 0.900519, 0.567254),
                matrix: Matrix3::new(
                    0.579444, 0.247106, 0.173450,
                    0.093154, 0.983335, -0.076489,
                    -0.171737, -0.351732, 1.523468,
                ),
            },
        }
    }
}

impl ColorCalibration {
    pub fn interpolate(&self, k: f64) -> Ccm {
        Ccm {
            illum: self.ccm1.illum * (1.0 - k) + self.ccm2.illum * k,
            matrix: self.ccm1.matrix * (1.0 - k) + self.ccm2.matrix * k,
        }
    }

    /// Interpolation factor for `illum`: the length of its projection onto
    /// the `ccm1.illum -> ccm2.illum` line, relative to that line's length.
    pub fn interpolation_for(&self, illum: &Vector3<f64>) -> f64 {
        let ab = self.ccm2.illum - self.ccm1.illum;
        let ac = illum - self.ccm1.illum;
        let len2 = ab.norm_squared();
        if len2 == 0.0 {
            return 0.0;
        }
        let ad = ab * (ac.dot(&ab) / len2);
        ad.norm() / len2.sqrt()
    }

    pub fn for_illuminant(&self, illum: &Vector3<f64>) -> Ccm {
        self.interpolate(self.interpolation_for(illum))
    }
}
