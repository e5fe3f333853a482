//! Weighted least-squares polynomial surfaces in two variables

use nalgebra::{DMatrix, DVector};

pub const POLY_ORDER: usize = 4;
const TERMS: usize = POLY_ORDER * POLY_ORDER;
const SINGULAR_REL_EPS: f64 = 1e-12;

/// `sum(c[a][b] * y^a * x^b)` for `a, b` in `0..POLY_ORDER`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Poly2D {
    coeffs: [f64; TERMS],
}

fn basis(x: f64, y: f64) -> [f64; TERMS] {
    let mut out = [0.0; TERMS];
    let mut ya = 1.0;
    for a in 0..POLY_ORDER {
        let mut xb = 1.0;
        for b in 0..POLY_ORDER {
            out[a * POLY_ORDER + b] = ya * xb;
            xb *= x;
        }
        ya *= y;
    }
    out
}

impl Poly2D {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.coeffs.iter().all(|&c| c == 0.0)
    }

    pub fn eval(&self, x: f64, y: f64) -> f64 {
        basis(x, y)
            .iter()
            .zip(&self.coeffs)
            .map(|(t, c)| t * c)
            .sum()
    }
}

/// Accumulates weighted normal equations one sample at a time.
#[derive(Debug, Clone)]
pub struct Poly2DFitter {
    ata: DMatrix<f64>,
    atb: DVector<f64>,
    samples: usize,
}

impl Default for Poly2DFitter {
    fn default() -> Self {
        Self::new()
    }
}

impl Poly2DFitter {
    pub fn new() -> Self {
        Self {
            ata: DMatrix::zeros(TERMS, TERMS),
            atb: DVector::zeros(TERMS),
            samples: 0,
        }
    }

    pub fn add(&mut self, x: f64, y: f64, value: f64, weight: f64) {
        let phi = DVector::from_row_slice(&basis(x, y));
        self.ata += &phi * phi.transpose() * weight;
        self.atb += phi * (value * weight);
        self.samples += 1;
    }

    pub fn samples(&self) -> usize {
        self.samples
    }

    /// Minimum-norm solution; directions the samples don't constrain get
    /// zero coefficients. No samples yields the zero polynomial.
    pub fn solve(&self) -> Poly2D {
        if self.samples == 0 {
            return Poly2D::zero();
        }
        let svd = self.ata.clone().svd(true, true);
        let max_sv = svd.singular_values.max();
        if !max_sv.is_finite() || max_sv <= 0.0 {
            return Poly2D::zero();
        }
        match svd.solve(&self.atb, max_sv * SINGULAR_REL_EPS) {
            Ok(sol) if sol.iter().all(|v| v.is_finite()) => {
                let mut coeffs = [0.0; TERMS];
                coeffs.copy_from_slice(sol.as_slice());
                Poly2D { coeffs }
            }
            _ => Poly2D::zero(),
        }
    }
}
