//! Color-space math shared by the color kernels and the stage drivers.
//!
//! All conversions are relative to the D50 reference white unless the name
//! says otherwise.

use nalgebra::{Matrix3, Vector3};

pub const D50_WHITE: [f64; 3] = [0.96422, 1.0, 0.82521];

const LAB_EPSILON: f64 = 216.0 / 24389.0;
const LAB_KAPPA: f64 = 24389.0 / 27.0;

pub fn d50_white() -> Vector3<f64> {
    Vector3::from(D50_WHITE)
}

pub const D65_WHITE: [f64; 3] = [0.95047, 1.0, 1.08883];

fn bradford_cone() -> Matrix3<f64> {
    Matrix3::new(
        0.8951000, 0.2664000, -0.1614000,
        -0.7502000, 1.7135000, 0.0367000,
        0.0389000, -0.0685000, 1.0296000,
    )
}

fn bradford_cone_inverse() -> Matrix3<f64> {
    Matrix3::new(
        0.9869929, -0.1470543, 0.1599627,
        0.4323053, 0.5183603, 0.0492912,
        -0.0085287, 0.0400428, 0.9684867,
    )
}

/// Bradford chromatic adaptation from `src_white` to `dst_white`.
pub fn bradford_adaptation(src_white: Vector3<f64>, dst_white: Vector3<f64>) -> Matrix3<f64> {
    let cone = bradford_cone();
    let s = cone * src_white;
    let d = cone * dst_white;
    let k = Matrix3::from_diagonal(&Vector3::new(d.x / s.x, d.y / s.y, d.z / s.z));
    bradford_cone_inverse() * k * cone
}

/// Tabulated XYZ.D65 -> XYZ.D50 Bradford matrix.
pub fn xyz_d50_from_xyz_d65() -> Matrix3<f64> {
    Matrix3::new(
        1.0478112, 0.0228866, -0.0501270,
        0.0295424, 0.9904844, -0.0170491,
        -0.0092345, 0.0150436, 0.7521316,
    )
}

pub fn xyz_d65_from_xyz_d50() -> Matrix3<f64> {
    bradford_adaptation(d50_white(), Vector3::from(D65_WHITE))
}

pub fn xyz_d65_from_lsrgb() -> Matrix3<f64> {
    Matrix3::new(
        0.4124564, 0.3575761, 0.1804375,
        0.2126729, 0.7151522, 0.0721750,
        0.0193339, 0.1191920, 0.9503041,
    )
}

pub fn lsrgb_from_xyz_d65() -> Matrix3<f64> {
    Matrix3::new(
        3.2404542, -1.5371385, -0.4985314,
        -0.9692660, 1.8760108, 0.0415560,
        0.0556434, -0.2040259, 1.0572252,
    )
}

pub fn lsrgb_d65_from_xyz_d50() -> Matrix3<f64> {
    lsrgb_from_xyz_d65() * xyz_d65_from_xyz_d50()
}

pub fn xyz_d50_from_lsrgb_d65() -> Matrix3<f64> {
    xyz_d50_from_xyz_d65() * xyz_d65_from_lsrgb()
}

pub fn srgb_gamma_forward(x: f64) -> f64 {
    if x <= 0.0031308 {
        12.92 * x
    } else {
        1.055 * x.powf(1.0 / 2.4) - 0.055
    }
}

pub fn srgb_gamma_reverse(x: f64) -> f64 {
    if x <= 0.04045 {
        x / 12.92
    } else {
        ((x + 0.055) / 1.055).powf(2.4)
    }
}

pub fn xyy_from_xyz(xyz: Vector3<f64>) -> Vector3<f64> {
    let sum = xyz.x + xyz.y + xyz.z;
    if sum == 0.0 {
        // Black keeps the white point's chromaticity.
        let w = d50_white();
        let ws = w.x + w.y + w.z;
        return Vector3::new(w.x / ws, w.y / ws, 0.0);
    }
    Vector3::new(xyz.x / sum, xyz.y / sum, xyz.y)
}

pub fn xyz_from_xyy(xyy: Vector3<f64>) -> Vector3<f64> {
    let (x, y, big_y) = (xyy.x, xyy.y, xyy.z);
    if y == 0.0 {
        return Vector3::zeros();
    }
    Vector3::new(x * big_y / y, big_y, (1.0 - x - y) * big_y / y)
}

fn lab_f(t: f64) -> f64 {
    if t > LAB_EPSILON {
        t.cbrt()
    } else {
        (LAB_KAPPA * t + 16.0) / 116.0
    }
}

fn lab_f_inv(f: f64) -> f64 {
    let f3 = f * f * f;
    if f3 > LAB_EPSILON {
        f3
    } else {
        (116.0 * f - 16.0) / LAB_KAPPA
    }
}

/// CIE L* for a relative luminance.
fn lightness(yr: f64) -> f64 {
    if yr > LAB_EPSILON {
        116.0 * yr.cbrt() - 16.0
    } else {
        LAB_KAPPA * yr
    }
}

fn luminance_from_lightness(l: f64) -> f64 {
    if l > LAB_KAPPA * LAB_EPSILON {
        ((l + 16.0) / 116.0).powi(3)
    } else {
        l / LAB_KAPPA
    }
}

pub fn lab_from_xyz(xyz: Vector3<f64>, white: Vector3<f64>) -> Vector3<f64> {
    let fx = lab_f(xyz.x / white.x);
    let fy = lab_f(xyz.y / white.y);
    let fz = lab_f(xyz.z / white.z);
    Vector3::new(116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz))
}

pub fn xyz_from_lab(lab: Vector3<f64>, white: Vector3<f64>) -> Vector3<f64> {
    let fy = (lab.x + 16.0) / 116.0;
    let fx = fy + lab.y / 500.0;
    let fz = fy - lab.z / 200.0;
    let yr = if lab.x > LAB_KAPPA * LAB_EPSILON {
        fy * fy * fy
    } else {
        lab.x / LAB_KAPPA
    };
    Vector3::new(lab_f_inv(fx) * white.x, yr * white.y, lab_f_inv(fz) * white.z)
}

fn uv_prime(xyz: Vector3<f64>) -> (f64, f64) {
    let denom = xyz.x + 15.0 * xyz.y + 3.0 * xyz.z;
    if denom == 0.0 {
        return (0.0, 0.0);
    }
    (4.0 * xyz.x / denom, 9.0 * xyz.y / denom)
}

pub fn luv_from_xyz(xyz: Vector3<f64>, white: Vector3<f64>) -> Vector3<f64> {
    let l = lightness(xyz.y / white.y);
    let (up, vp) = uv_prime(xyz);
    let (upw, vpw) = uv_prime(white);
    Vector3::new(l, 13.0 * l * (up - upw), 13.0 * l * (vp - vpw))
}

pub fn xyz_from_luv(luv: Vector3<f64>, white: Vector3<f64>) -> Vector3<f64> {
    let l = luv.x;
    if l == 0.0 {
        return Vector3::zeros();
    }
    let (u0, v0) = uv_prime(white);
    let y = luminance_from_lightness(l) * white.y;
    let du = luv.y + 13.0 * l * u0;
    let dv = luv.z + 13.0 * l * v0;
    if du == 0.0 || dv == 0.0 {
        return Vector3::new(0.0, y, 0.0);
    }
    let a = (52.0 * l / du - 1.0) / 3.0;
    let b = -5.0 * y;
    let c = -1.0 / 3.0;
    let d = y * (39.0 * l / dv - 5.0);
    let x = (d - b) / (a - c);
    let z = x * a + b;
    Vector3::new(x, y, z)
}

pub fn lchuv_from_luv(luv: Vector3<f64>) -> Vector3<f64> {
    Vector3::new(luv.x, luv.y.hypot(luv.z), luv.z.atan2(luv.y))
}

pub fn luv_from_lchuv(lch: Vector3<f64>) -> Vector3<f64> {
    Vector3::new(lch.x, lch.y * lch.z.cos(), lch.y * lch.z.sin())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample_xyz() -> Vec<Vector3<f64>> {
        vec![
            Vector3::new(0.2, 0.3, 0.1),
            Vector3::new(0.9, 0.8, 0.7),
            Vector3::new(0.004, 0.005, 0.003),
            d50_white(),
        ]
    }

    #[test]
    fn test_srgb_gamma_inverts() {
        for i in 0..=100 {
            let x = i as f64 / 100.0;
            assert_relative_eq!(srgb_gamma_reverse(srgb_gamma_forward(x)), x, epsilon = 1e-12);
        }
        assert_relative_eq!(srgb_gamma_forward(1.0), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_xyy_round_trip() {
        for xyz in sample_xyz() {
            let back = xyz_from_xyy(xyy_from_xyz(xyz));
            assert_relative_eq!(back, xyz, epsilon = 1e-12);
        }
        assert_eq!(xyz_from_xyy(xyy_from_xyz(Vector3::zeros())), Vector3::zeros());
    }

    #[test]
    fn test_lab_round_trip_and_white() {
        let white = d50_white();
        let lab = lab_from_xyz(white, white);
        assert_relative_eq!(lab, Vector3::new(100.0, 0.0, 0.0), epsilon = 1e-9);
        for xyz in sample_xyz() {
            assert_relative_eq!(xyz_from_lab(lab_from_xyz(xyz, white), white), xyz, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_luv_round_trip_through_lchuv() {
        let white = d50_white();
        for xyz in sample_xyz() {
            let lch = lchuv_from_luv(luv_from_xyz(xyz, white));
            let back = xyz_from_luv(luv_from_lchuv(lch), white);
            assert_relative_eq!(back, xyz, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_bradford_matches_tabulated_matrix() {
        let m = bradford_adaptation(Vector3::from(D65_WHITE), d50_white());
        assert_relative_eq!(m, xyz_d50_from_xyz_d65(), epsilon = 1e-4);
        let white = xyz_d65_from_xyz_d50() * d50_white();
        assert_relative_eq!(white, Vector3::from(D65_WHITE), epsilon = 1e-5);
    }

    #[test]
    fn test_d50_white_maps_to_srgb_white() {
        let rgb = lsrgb_d65_from_xyz_d50() * d50_white();
        assert_relative_eq!(rgb, Vector3::new(1.0, 1.0, 1.0), epsilon = 1e-3);
    }
}
