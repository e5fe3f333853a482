//! LMMSE demosaic driver
//!
//! Green is reconstructed from horizontal and vertical directional estimates
//! blended by their estimated error variance. Red and blue are then rebuilt
//! from green-minus-color differences, propagated first diagonally and then
//! axially across the mosaic.

use tracing::instrument;

use crate::image_pipeline::cfa::CfaDesc;
use crate::image_pipeline::render::{BaseKernel, LmmseKernel, Renderer};
use crate::image_pipeline::texture::{PixelFormat, Texture};

#[instrument(skip_all, fields(width = raw.width(), height = raw.height(), apply_gamma = apply_gamma))]
pub fn run<R: Renderer>(
    renderer: &mut R,
    cfa: &CfaDesc,
    apply_gamma: bool,
    raw: &Texture,
    rgb: &mut Texture,
) {
    assert_eq!(raw.format(), PixelFormat::R32Float, "LMMSE: raw must be R32Float");
    assert_eq!(rgb.format(), PixelFormat::Rgba32Float, "LMMSE: rgb must be Rgba32Float");
    assert!(raw.same_shape(rgb), "LMMSE: raw/rgb dimension mismatch");

    let cfa = *cfa;
    let (w, h) = (raw.width(), raw.height());
    let mut plane = || renderer.texture_create(PixelFormat::R32Float, w, h);
    let mut src = plane();
    let mut filtered_h = plane();
    let mut filtered_v = plane();
    let mut diff_h = plane();
    let mut diff_v = plane();
    let mut diff_gr = plane();
    let mut diff_gb = plane();
    let mut scratch = plane();

    renderer.copy(raw, &mut src);
    if apply_gamma {
        renderer.render(&mut src, BaseKernel::GammaForward.into());
    }

    for (filtered, horizontal) in [(&mut filtered_h, true), (&mut filtered_v, false)] {
        renderer.render(filtered, LmmseKernel::Interp5 { raw: &src, horizontal }.into());
    }

    renderer.render(
        &mut diff_h,
        LmmseKernel::NoiseEst { cfa, raw: &src, filtered: &filtered_h }.into(),
    );
    renderer.render(
        &mut diff_v,
        LmmseKernel::NoiseEst { cfa, raw: &src, filtered: &filtered_v }.into(),
    );

    // The directional interpolations are no longer needed; reuse them for
    // the smoothed differences.
    renderer.render(&mut filtered_h, LmmseKernel::Smooth9 { src: &diff_h, horizontal: true }.into());
    renderer.render(&mut filtered_v, LmmseKernel::Smooth9 { src: &diff_v, horizontal: false }.into());

    renderer.render(
        rgb,
        LmmseKernel::CalcG {
            cfa,
            raw: &src,
            smoothed_h: &filtered_h,
            diff_h: &diff_h,
            smoothed_v: &filtered_v,
            diff_v: &diff_v,
        }
        .into(),
    );

    for (diff, mode_gr) in [(&mut diff_gr, true), (&mut diff_gb, false)] {
        renderer.render(diff, LmmseKernel::CalcDiffGRGB { cfa, raw: &src, rgb: &*rgb, mode_gr }.into());
        renderer.render(
            &mut scratch,
            LmmseKernel::CalcDiagAvgDiffGRGB { cfa, diff: &*diff, mode_gr }.into(),
        );
        renderer.render(diff, LmmseKernel::CalcAxialAvgDiffGRGB { cfa, diff: &scratch }.into());
    }

    renderer.render(
        rgb,
        LmmseKernel::CalcRB { diff_gr: &diff_gr, diff_gb: &diff_gb }.into(),
    );

    if apply_gamma {
        renderer.render(rgb, BaseKernel::GammaReverse.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::render::CpuRenderer;
    use crate::image_pipeline::texture::RAW_WHITE;
    use approx::assert_abs_diff_eq;

    fn demosaic(raw: &Texture, apply_gamma: bool) -> Texture {
        let mut renderer = CpuRenderer::new();
        let mut rgb = Texture::new(PixelFormat::Rgba32Float, raw.width(), raw.height());
        run(&mut renderer, &CfaDesc::RGGB, apply_gamma, raw, &mut rgb);
        renderer.commit_and_wait();
        rgb
    }

    #[test]
    fn test_flat_input_is_reproduced() {
        for apply_gamma in [false, true] {
            let raw = Texture::from_data(PixelFormat::R32Float, 12, 10, vec![0.3; 120]).unwrap();
            let rgb = demosaic(&raw, apply_gamma);
            for px in rgb.data().chunks_exact(4) {
                assert_abs_diff_eq!(px[0], 0.3, epsilon = 1e-5);
                assert_abs_diff_eq!(px[1], 0.3, epsilon = 1e-5);
                assert_abs_diff_eq!(px[2], 0.3, epsilon = 1e-5);
                assert_eq!(px[3], 1.0);
            }
        }
    }

    #[test]
    fn test_bayer_tile_interpolates_between_native_samples() {
        // RGGB with R=100, G=50, B=200
        let tile = [[100u16, 50], [50, 200]];
        let pixels: Vec<u16> = (0..16).map(|i| tile[(i / 4) % 2][i % 2]).collect();
        let raw = Texture::from_raw_pixels(4, 4, &pixels).unwrap();
        let rgb = demosaic(&raw, false);

        let norm = |v: u16| f32::from(v) / f32::from(RAW_WHITE);
        let (r, g, b) = (norm(100), norm(50), norm(200));
        for y in 0..4 {
            for x in 0..4 {
                let px = rgb.px(x, y);
                assert!(px.iter().all(|v| v.is_finite()));
                // Both green neighbours read 50, so green lands on them.
                assert_abs_diff_eq!(px[1], g, epsilon = 1e-5);
                assert_abs_diff_eq!(px[0], r, epsilon = 1e-5);
                assert_abs_diff_eq!(px[2], b, epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn test_native_samples_are_preserved() {
        let pixels: Vec<u16> = (0..64u16).map(|i| 200 + (i * 37) % 900).collect();
        let raw = Texture::from_raw_pixels(8, 8, &pixels).unwrap();
        let rgb = demosaic(&raw, false);
        for y in 0..8 {
            for x in 0..8 {
                let c = CfaDesc::RGGB.color_at(x, y).channel();
                assert_abs_diff_eq!(rgb.get(x, y, c), raw.get(x, y, 0), epsilon = 1e-5);
            }
        }
    }
}
