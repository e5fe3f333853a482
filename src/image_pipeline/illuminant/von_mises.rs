use nalgebra::DMatrix;
use std::f64::consts::TAU;

/// Modulus whose result takes the sign of the divisor, so negative bin
/// indices wrap onto the end of the histogram. `b == 0` returns `a`.
pub fn matlab_mod(a: f64, b: f64) -> f64 {
    if b == 0.0 {
        return a;
    }
    let r = a % b;
    if r == 0.0 {
        0.0
    } else if (r < 0.0) != (b < 0.0) {
        r + b
    } else {
        r
    }
}

/// Numerically stable softmax over every element of `h`.
pub fn softmax(h: &DMatrix<f64>) -> DMatrix<f64> {
    let max = h.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let mut p = h.map(|x| (x - max).exp());
    let sum = p.sum();
    if sum > 0.0 {
        p /= sum;
    }
    p
}

/// Circular mean of a PMF on an `n x n` torus, as fractional 0-based
/// `(row, col)` indices.
pub fn fit_bivariate_von_mises(p: &DMatrix<f64>) -> (f64, f64) {
    let n = p.nrows();
    let step = TAU / n as f64;
    let angles: Vec<(f64, f64)> = (0..n).map(|i| (i as f64 * step).sin_cos()).collect();

    let mut row_moment = (0.0, 0.0);
    let mut col_moment = (0.0, 0.0);
    for (i, (sin, cos)) in angles.iter().enumerate() {
        let row_sum: f64 = p.row(i).sum();
        let col_sum: f64 = p.column(i).sum();
        row_moment.0 += row_sum * sin;
        row_moment.1 += row_sum * cos;
        col_moment.0 += col_sum * sin;
        col_moment.1 += col_sum * cos;
    }

    let mu1 = matlab_mod(row_moment.0.atan2(row_moment.1), TAU) / step;
    let mu2 = matlab_mod(col_moment.0.atan2(col_moment.1), TAU) / step;
    (mu1, mu2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_matlab_mod_follows_divisor_sign() {
        assert_eq!(matlab_mod(5.0, 3.0), 2.0);
        assert_eq!(matlab_mod(-1.0, 64.0), 63.0);
        assert_eq!(matlab_mod(-64.0, 64.0), 0.0);
        assert_eq!(matlab_mod(1.0, -3.0), -2.0);
        assert_eq!(matlab_mod(7.5, 0.0), 7.5);
        assert_abs_diff_eq!(matlab_mod(-0.5, TAU), TAU - 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_softmax_normalises() {
        let h = DMatrix::from_fn(4, 4, |i, j| (i * 4 + j) as f64 * 100.0);
        let p = softmax(&h);
        assert_abs_diff_eq!(p.sum(), 1.0, epsilon = 1e-12);
        assert!(p.iter().all(|v| v.is_finite()));
        assert_abs_diff_eq!(p[(3, 3)], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_point_mass_is_recovered() {
        let n = 64;
        let mut p = DMatrix::zeros(n, n);
        p[(10, 40)] = 1.0;
        let (mu1, mu2) = fit_bivariate_von_mises(&p);
        assert_abs_diff_eq!(mu1, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(mu2, 40.0, epsilon = 1e-9);
    }

    #[test]
    fn test_mass_at_opposite_corners_wraps() {
        let n = 64;
        let mut a = DMatrix::zeros(n, n);
        a[(n - 1, 0)] = 1.0;
        let mut b = DMatrix::zeros(n, n);
        b[(0, n - 1)] = 1.0;

        let (a1, a2) = fit_bivariate_von_mises(&a);
        let (b1, b2) = fit_bivariate_von_mises(&b);
        assert_abs_diff_eq!(a1, (n - 1) as f64, epsilon = 1e-9);
        assert_abs_diff_eq!(a2, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(b1, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(b2, (n - 1) as f64, epsilon = 1e-9);

        // On the torus the two peaks are one bin apart along each axis.
        let wrapped = |d: f64| {
            let d = matlab_mod(d, n as f64);
            d.min(n as f64 - d)
        };
        assert_abs_diff_eq!(wrapped(a1 - b1), 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(wrapped(a2 - b2), 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_mass_straddling_the_seam_centres_on_it() {
        let n = 64;
        let mut p = DMatrix::zeros(n, n);
        p[(n - 1, 5)] = 0.5;
        p[(0, 5)] = 0.5;
        let (mu1, mu2) = fit_bivariate_von_mises(&p);
        // Halfway between the last and first row, not the middle of the grid.
        let d = matlab_mod(mu1 + 0.5, n as f64);
        assert!(d < 1e-6 || (n as f64 - d) < 1e-6, "mu1 = {mu1}");
        assert_abs_diff_eq!(mu2, 5.0, epsilon = 1e-9);
    }
}
