//! CPU reference implementations of every kernel

pub mod base;
pub mod color;
pub mod debayer_lmmse;
pub mod defringe;
pub mod ffcc;
pub mod highlights;
pub mod local_contrast;

use crate::image_pipeline::texture::{PixelFormat, Texture};

pub(crate) fn expect_format(name: &str, tex: &Texture, format: PixelFormat) {
    assert_eq!(
        tex.format(),
        format,
        "{name}: expected {format:?} texture, got {:?}",
        tex.format()
    );
}

pub(crate) fn expect_same_shape(name: &str, a: &Texture, b: &Texture) {
    assert!(
        a.same_shape(b),
        "{name}: dimension mismatch {}x{} vs {}x{}",
        a.width(),
        a.height(),
        b.width(),
        b.height()
    );
}
