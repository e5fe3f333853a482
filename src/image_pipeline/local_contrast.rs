//! Local contrast on the L* channel of a Lab image

use tracing::instrument;

use crate::image_pipeline::render::{BaseKernel, LocalContrastKernel, Renderer};
use crate::image_pipeline::texture::{PixelFormat, Texture};

/// `L += amount * (L - gaussian(L, sigma = radius))`, in place.
#[instrument(skip_all, fields(amount = amount, radius = radius))]
pub fn run<R: Renderer>(renderer: &mut R, amount: f32, radius: f32, lab: &mut Texture) {
    let (w, h) = (lab.width(), lab.height());
    let mut l = renderer.texture_create(PixelFormat::R32Float, w, h);
    renderer.render(&mut l, BaseKernel::ExtractChannel { src: &*lab, channel: 0 }.into());

    let mut blurred = renderer.texture_create(PixelFormat::R32Float, w, h);
    renderer.render(&mut blurred, BaseKernel::GaussianBlur { src: &l, sigma: radius }.into());

    renderer.render(lab, LocalContrastKernel::LocalContrast { blurred: &blurred, amount }.into());
}
