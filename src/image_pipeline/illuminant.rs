//! Scene illuminant estimation
//!
//! A raw plane is reduced to two log-chromaticity histograms (pixel colors
//! and local absolute deviations). A trained model filters them in the
//! frequency domain, a softmax turns the response into a distribution over
//! chromaticities, and a von Mises fit picks its wrapped mean.

pub mod estimator;
pub mod fft;
pub mod model;
pub mod von_mises;

pub use estimator::IlluminantEstimator;
pub use fft::Fft2d;
pub use model::{HistogramParams, IlluminantModel};
pub use von_mises::{fit_bivariate_von_mises, matlab_mod, softmax};
