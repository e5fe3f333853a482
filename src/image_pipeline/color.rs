//! Color-space conversions and camera color calibration

pub mod calibration;
pub mod space;

pub use calibration::{Ccm, ColorCalibration};
