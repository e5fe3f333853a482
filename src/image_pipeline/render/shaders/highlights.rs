use crate::image_pipeline::render::kernel::HighlightsKernel;
use crate::image_pipeline::texture::{PixelFormat, Texture};

use super::{expect_format, expect_same_shape};

pub fn run(dst: &mut Texture, kernel: HighlightsKernel<'_>) {
    let (w, h) = (dst.width(), dst.height());
    match kernel {
        HighlightsKernel::CreateHighlightMap {
            rgb,
            illum_min1,
            scale,
            cutoff,
        } => {
            expect_format("CreateHighlightMap", rgb, PixelFormat::Rgba32Float);
            expect_format("CreateHighlightMap", dst, PixelFormat::Rg32Float);
            for y in 0..h {
                let v = (y as f32 + 0.5) / h as f32;
                for x in 0..w {
                    let u = (x as f32 + 0.5) / w as f32;
                    let mut scaled_max = f32::MIN;
                    let mut level = f32::MIN;
                    for c in 0..3 {
                        let s = rgb.sample_nearest(u, v, c) / illum_min1[c];
                        scaled_max = scaled_max.max(s * scale[c]);
                        level = level.max(s);
                    }
                    let k = ((scaled_max - cutoff) / (1.0 - cutoff)).clamp(0.0, 1.0);
                    let px = dst.px_mut(x, y);
                    px[0] = k;
                    px[1] = level;
                }
            }
        }
        HighlightsKernel::Reconstruct { cfa, map, illum_min1 } => {
            expect_format("Reconstruct", dst, PixelFormat::R32Float);
            expect_format("Reconstruct", map, PixelFormat::Rg32Float);
            expect_same_shape("Reconstruct", map, dst);
            for y in 0..h {
                for x in 0..w {
                    let k = map.get(x, y, 0);
                    if k <= 0.0 {
                        continue;
                    }
                    let target = map.get(x, y, 1) * illum_min1[cfa.color_at(x, y).channel()];
                    let raw = dst.get(x, y, 0);
                    dst.set(x, y, 0, raw + k * (target - raw).max(0.0));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::cfa::CfaDesc;
    use approx::assert_relative_eq;

    const SCALE: [f32; 3] = [1.0, 1.0, 1.0];

    #[test]
    fn test_map_is_zero_below_cutoff() {
        let rgb = Texture::from_data(PixelFormat::Rgba32Float, 1, 1, vec![0.5, 0.6, 0.4, 1.0]).unwrap();
        let mut map = Texture::new(PixelFormat::Rg32Float, 2, 2);
        run(
            &mut map,
            HighlightsKernel::CreateHighlightMap {
                rgb: &rgb,
                illum_min1: [1.0, 1.0, 1.0],
                scale: SCALE,
                cutoff: 0.8,
            },
        );
        for y in 0..2 {
            for x in 0..2 {
                assert_eq!(map.get(x, y, 0), 0.0);
                assert_relative_eq!(map.get(x, y, 1), 0.6);
            }
        }
    }

    #[test]
    fn test_map_ramps_to_one_at_clip() {
        let rgb = Texture::from_data(PixelFormat::Rgba32Float, 1, 1, vec![0.9, 1.0, 0.5, 1.0]).unwrap();
        let mut map = Texture::new(PixelFormat::Rg32Float, 1, 1);
        run(
            &mut map,
            HighlightsKernel::CreateHighlightMap {
                rgb: &rgb,
                illum_min1: [1.0, 2.0, 1.0],
                scale: SCALE,
                cutoff: 0.8,
            },
        );
        // Green normalised by illuminant is .5, so red (.9) drives the map.
        assert_relative_eq!(map.get(0, 0, 0), 0.5, epsilon = 1e-6);
        assert_relative_eq!(map.get(0, 0, 1), 0.9);
    }

    #[test]
    fn test_reconstruct_only_lifts() {
        let mut raw = Texture::from_data(PixelFormat::R32Float, 2, 2, vec![0.5, 1.0, 1.0, 0.9]).unwrap();
        let map = Texture::from_data(
            PixelFormat::Rg32Float,
            2,
            2,
            vec![1.0, 0.8, 1.0, 0.8, 0.0, 2.0, 0.5, 1.0],
        )
        .unwrap();
        run(
            &mut raw,
            HighlightsKernel::Reconstruct {
                cfa: CfaDesc::RGGB,
                map: &map,
                illum_min1: [1.0, 1.5, 1.2],
            },
        );
        // R: .5 -> .8
        assert_relative_eq!(raw.get(0, 0, 0), 0.8);
        // G: target 1.2 > 1.0
        assert_relative_eq!(raw.get(1, 0, 0), 1.2);
        // k = 0 leaves the sample alone
        assert_relative_eq!(raw.get(0, 1, 0), 1.0);
        // B: .9 + .5 * (1.2 - .9)
        assert_relative_eq!(raw.get(1, 1, 0), 1.05, epsilon = 1e-6);
    }
}
