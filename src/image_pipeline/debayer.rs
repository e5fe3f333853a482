//! Demosaicing of single-channel Bayer planes into RGBA

pub mod bilinear;
pub mod lmmse;
pub mod types;

pub use bilinear::BilinearDebayer;
pub use types::RgbImageData;
