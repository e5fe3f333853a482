//! Types for debayering operations

use crate::image_pipeline::texture::Texture;

/// Interleaved 16-bit RGB export of an RGBA plane
#[derive(Debug, Clone)]
pub struct RgbImageData {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
    /// RGB pixel data interleaved [R, G, B, R, G, B, ...]
    pub data: Vec<u16>,
    pub bits_per_sample: u32,
}

impl RgbImageData {
    /// Clamps each color channel into `[0, 1]` and scales to `0..=65535`.
    pub fn from_texture(rgba: &Texture) -> Self {
        let n = rgba.channels();
        let data = rgba
            .data()
            .chunks_exact(n)
            .flat_map(|px| {
                let mut out = [0u16; 3];
                for (c, o) in out.iter_mut().enumerate() {
                    let v = px[c.min(n - 1)];
                    *o = (v.clamp(0.0, 1.0) * 65535.0).round() as u16;
                }
                out
            })
            .collect();
        Self {
            width: rgba.width(),
            height: rgba.height(),
            data,
            bits_per_sample: 16,
        }
    }
}
