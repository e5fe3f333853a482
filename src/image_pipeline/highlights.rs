//! Highlight reconstruction
//!
//! Clipped raw samples are lifted toward the level implied by the brightest
//! channel of a half-resolution RGB proxy, tinted by the scene illuminant.

use nalgebra::Vector3;
use tracing::{debug, instrument};

use crate::image_pipeline::cfa::CfaDesc;
use crate::image_pipeline::render::{BaseKernel, HighlightsKernel, Renderer};
use crate::image_pipeline::texture::{PixelFormat, Texture};

/// Per-channel balance applied before the clip test.
pub const CHANNEL_SCALE: [f32; 3] = [1.179, 0.649, 1.180];
/// Balanced level above which a pixel starts to be reconstructed.
pub const CUTOFF: f32 = 0.774;

/// Illuminant normalised so that its smallest component is 1.
pub fn illum_min1(illum: &Vector3<f64>) -> [f32; 3] {
    let min = illum.min();
    if !(min.is_finite() && min > 0.0) {
        return [1.0; 3];
    }
    [(illum.x / min) as f32, (illum.y / min) as f32, (illum.z / min) as f32]
}

#[instrument(skip_all, fields(width = raw.width(), height = raw.height()))]
pub fn run<R: Renderer>(renderer: &mut R, cfa: &CfaDesc, illum: &Vector3<f64>, raw: &mut Texture) {
    assert_eq!(raw.format(), PixelFormat::R32Float, "Highlights: raw must be R32Float");
    let (w, h) = (raw.width(), raw.height());
    let illum_min1 = illum_min1(illum);
    debug!(?illum_min1, "Reconstructing highlights");

    let mut rgb = renderer.texture_create(PixelFormat::Rgba32Float, (w / 2).max(1), (h / 2).max(1));
    renderer.render(&mut rgb, BaseKernel::DebayerDownsample { cfa: *cfa, raw: &*raw }.into());

    let mut map = renderer.texture_create(PixelFormat::Rg32Float, w, h);
    renderer.render(
        &mut map,
        HighlightsKernel::CreateHighlightMap {
            rgb: &rgb,
            illum_min1,
            scale: CHANNEL_SCALE,
            cutoff: CUTOFF,
        }
        .into(),
    );

    let mut blurred = renderer.texture_create(PixelFormat::Rg32Float, w, h);
    renderer.render(&mut blurred, BaseKernel::Blur3x3 { src: &map }.into());

    renderer.render(
        raw,
        HighlightsKernel::Reconstruct {
            cfa: *cfa,
            map: &blurred,
            illum_min1,
        }
        .into(),
    );
}
