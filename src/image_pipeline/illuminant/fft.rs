use nalgebra::DMatrix;
use rustfft::{Fft, FftPlanner, num_complex::Complex};
use std::sync::Arc;

/// Square 2D FFT by row-column decomposition. The forward transform is
/// unnormalised and the inverse scales by `1 / n^2`, so `inverse(forward(x))`
/// returns `x`.
pub struct Fft2d {
    n: usize,
    forward_fft: Arc<dyn Fft<f64>>,
    inverse_fft: Arc<dyn Fft<f64>>,
}

impl Fft2d {
    pub fn new(n: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            n,
            forward_fft: planner.plan_fft_forward(n),
            inverse_fft: planner.plan_fft_inverse(n),
        }
    }

    pub fn size(&self) -> usize {
        self.n
    }

    fn transform(&self, data: &mut DMatrix<Complex<f64>>, fft: &Arc<dyn Fft<f64>>) {
        let n = self.n;
        assert_eq!(data.shape(), (n, n), "FFT size mismatch");

        // Columns are contiguous in column-major storage.
        for col in data.as_mut_slice().chunks_exact_mut(n) {
            fft.process(col);
        }

        let mut row = vec![Complex::new(0.0, 0.0); n];
        for r in 0..n {
            for (c, v) in row.iter_mut().enumerate() {
                *v = data[(r, c)];
            }
            fft.process(&mut row);
            for (c, v) in row.iter().enumerate() {
                data[(r, c)] = *v;
            }
        }
    }

    pub fn forward(&self, x: &DMatrix<f64>) -> DMatrix<Complex<f64>> {
        let mut data = x.map(|v| Complex::new(v, 0.0));
        self.transform(&mut data, &self.forward_fft);
        data
    }

    /// Real part of the normalised inverse transform.
    pub fn inverse_real(&self, x: &DMatrix<Complex<f64>>) -> DMatrix<f64> {
        let mut data = x.clone();
        self.transform(&mut data, &self.inverse_fft);
        let norm = 1.0 / (self.n * self.n) as f64;
        data.map(|c| c.re * norm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_delta_has_flat_spectrum() {
        let fft = Fft2d::new(8);
        let mut x = DMatrix::zeros(8, 8);
        x[(0, 0)] = 1.0;
        let spectrum = fft.forward(&x);
        for v in spectrum.iter() {
            assert_abs_diff_eq!(v.re, 1.0, epsilon = 1e-12);
            assert_abs_diff_eq!(v.im, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_inverse_undoes_forward() {
        let fft = Fft2d::new(16);
        let x = DMatrix::from_fn(16, 16, |i, j| ((i * 7 + j * 3) % 11) as f64 - 5.0);
        let back = fft.inverse_real(&fft.forward(&x));
        for (a, b) in back.iter().zip(x.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_product_of_spectra_is_circular_convolution() {
        let n = 8;
        let fft = Fft2d::new(n);
        let mut x = DMatrix::zeros(n, n);
        x[(2, 3)] = 1.0;
        let mut k = DMatrix::zeros(n, n);
        k[(n - 1, 6)] = 2.0; // shift by (-1, -2)

        let product = fft.forward(&x).component_mul(&fft.forward(&k));
        let y = fft.inverse_real(&product);
        assert_abs_diff_eq!(y[(1, 1)], 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(y.sum(), 2.0, epsilon = 1e-9);
    }
}
