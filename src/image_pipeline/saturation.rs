//! Chroma scaling in LCHuv

use tracing::instrument;

use crate::image_pipeline::render::{ColorKernel, Renderer};
use crate::image_pipeline::texture::Texture;

/// Scales the chroma of an XYZ.D50 image by `2^(2*sat)`, in place.
#[instrument(skip_all, fields(sat = sat))]
pub fn run<R: Renderer>(renderer: &mut R, sat: f32, xyz_d50: &mut Texture) {
    let satpow = 2f32.powf(2.0 * sat);
    for kernel in [
        ColorKernel::LuvD50FromXyzD50,
        ColorKernel::LchuvFromLuv,
        ColorKernel::Saturation { satpow },
        ColorKernel::LuvFromLchuv,
        ColorKernel::XyzD50FromLuvD50,
    ] {
        renderer.render(xyz_d50, kernel.into());
    }
}
