use crate::image_pipeline::cfa::{CfaColor, CfaDesc};
use crate::image_pipeline::render::kernel::LmmseKernel;
use crate::image_pipeline::texture::{PixelFormat, Texture};

use super::{expect_format, expect_same_shape};

/// Hamilton-Adams style directional interpolation taps.
const INTERP5: [f32; 5] = [-0.25, 0.5, 0.5, 0.5, -0.25];
const WINDOW: i64 = 4;
const EPS: f32 = 1e-10;

fn smooth9_weights() -> [f32; 9] {
    let mut w = [0.0f32; 9];
    for (i, wi) in w.iter_mut().enumerate() {
        let k = i as f32 - 4.0;
        *wi = (-(k * k) / 8.0).exp();
    }
    let sum: f32 = w.iter().sum();
    w.map(|v| v / sum)
}

/// Sample `tex` at offset `k` along the chosen axis, mirror-clamped.
#[inline]
fn along(tex: &Texture, x: usize, y: usize, k: i64, horizontal: bool) -> f32 {
    if horizontal {
        tex.mirrored(x as i64 + k, y as i64, 0)
    } else {
        tex.mirrored(x as i64, y as i64 + k, 0)
    }
}

/// Directional LMMSE estimate of the green-minus-color difference and its
/// error variance.
fn directional_estimate(
    smoothed: &Texture,
    diff: &Texture,
    x: usize,
    y: usize,
    horizontal: bool,
) -> (f32, f32) {
    let n = (2 * WINDOW + 1) as f32;
    let mut mean = 0.0f32;
    for k in -WINDOW..=WINDOW {
        mean += along(smoothed, x, y, k, horizontal);
    }
    mean /= n;

    let mut p = 0.0f32;
    let mut r = 0.0f32;
    for k in -WINDOW..=WINDOW {
        let s = along(smoothed, x, y, k, horizontal);
        let d = along(diff, x, y, k, horizontal);
        p += (s - mean) * (s - mean);
        r += (d - s) * (d - s);
    }
    p = p / n + EPS;
    r = r / n + EPS;

    let d0 = diff.get(x, y, 0);
    let estimate = mean + p / (p + r) * (d0 - mean);
    let variance = p * r / (p + r);
    (estimate, variance)
}

fn is_green(cfa: &CfaDesc, x: usize, y: usize) -> bool {
    cfa.color_at(x, y) == CfaColor::Green
}

pub fn run(dst: &mut Texture, kernel: LmmseKernel<'_>) {
    let (w, h) = (dst.width(), dst.height());
    match kernel {
        LmmseKernel::Interp5 { raw, horizontal } => {
            expect_format("Interp5", raw, PixelFormat::R32Float);
            expect_format("Interp5", dst, PixelFormat::R32Float);
            expect_same_shape("Interp5", raw, dst);
            for y in 0..h {
                for x in 0..w {
                    let v: f32 = INTERP5
                        .iter()
                        .enumerate()
                        .map(|(i, t)| t * along(raw, x, y, i as i64 - 2, horizontal))
                        .sum();
                    dst.set(x, y, 0, v);
                }
            }
        }
        LmmseKernel::NoiseEst { cfa, raw, filtered } => {
            expect_format("NoiseEst", dst, PixelFormat::R32Float);
            expect_same_shape("NoiseEst", raw, dst);
            expect_same_shape("NoiseEst", filtered, dst);
            for y in 0..h {
                for x in 0..w {
                    let r = raw.get(x, y, 0);
                    let f = filtered.get(x, y, 0);
                    dst.set(x, y, 0, if is_green(&cfa, x, y) { r - f } else { f - r });
                }
            }
        }
        LmmseKernel::Smooth9 { src, horizontal } => {
            expect_format("Smooth9", dst, PixelFormat::R32Float);
            expect_same_shape("Smooth9", src, dst);
            let weights = smooth9_weights();
            for y in 0..h {
                for x in 0..w {
                    let v: f32 = weights
                        .iter()
                        .enumerate()
                        .map(|(i, wt)| wt * along(src, x, y, i as i64 - 4, horizontal))
                        .sum();
                    dst.set(x, y, 0, v);
                }
            }
        }
        LmmseKernel::CalcG { cfa, raw, smoothed_h, diff_h, smoothed_v, diff_v } => {
            expect_format("CalcG", dst, PixelFormat::Rgba32Float);
            for t in [raw, smoothed_h, diff_h, smoothed_v, diff_v] {
                expect_same_shape("CalcG", t, dst);
            }
            for y in 0..h {
                for x in 0..w {
                    let r = raw.get(x, y, 0);
                    let g = if is_green(&cfa, x, y) {
                        r
                    } else {
                        let (xh, vh) = directional_estimate(smoothed_h, diff_h, x, y, true);
                        let (xv, vv) = directional_estimate(smoothed_v, diff_v, x, y, false);
                        r + (vv * xh + vh * xv) / (vh + vv)
                    };
                    dst.px_mut(x, y).copy_from_slice(&[r, g, r, 1.0]);
                }
            }
        }
        LmmseKernel::CalcDiffGRGB { cfa, raw, rgb, mode_gr } => {
            expect_format("CalcDiffGRGB", dst, PixelFormat::R32Float);
            expect_format("CalcDiffGRGB", rgb, PixelFormat::Rgba32Float);
            expect_same_shape("CalcDiffGRGB", raw, dst);
            expect_same_shape("CalcDiffGRGB", rgb, dst);
            let target = if mode_gr { CfaColor::Red } else { CfaColor::Blue };
            for y in 0..h {
                for x in 0..w {
                    let v = if cfa.color_at(x, y) == target {
                        rgb.get(x, y, 1) - raw.get(x, y, 0)
                    } else {
                        0.0
                    };
                    dst.set(x, y, 0, v);
                }
            }
        }
        LmmseKernel::CalcDiagAvgDiffGRGB { cfa, diff, mode_gr } => {
            expect_format("CalcDiagAvgDiffGRGB", dst, PixelFormat::R32Float);
            expect_same_shape("CalcDiagAvgDiffGRGB", diff, dst);
            // Differences known at red sites fill blue sites and vice versa.
            let opposite = if mode_gr { CfaColor::Blue } else { CfaColor::Red };
            for y in 0..h {
                for x in 0..w {
                    let (xi, yi) = (x as i64, y as i64);
                    let v = if cfa.color_at(x, y) == opposite {
                        (diff.mirrored(xi - 1, yi - 1, 0)
                            + diff.mirrored(xi + 1, yi - 1, 0)
                            + diff.mirrored(xi - 1, yi + 1, 0)
                            + diff.mirrored(xi + 1, yi + 1, 0))
                            / 4.0
                    } else {
                        diff.get(x, y, 0)
                    };
                    dst.set(x, y, 0, v);
                }
            }
        }
        LmmseKernel::CalcAxialAvgDiffGRGB { cfa, diff } => {
            expect_format("CalcAxialAvgDiffGRGB", dst, PixelFormat::R32Float);
            expect_same_shape("CalcAxialAvgDiffGRGB", diff, dst);
            for y in 0..h {
                for x in 0..w {
                    let (xi, yi) = (x as i64, y as i64);
                    let v = if is_green(&cfa, x, y) {
                        (diff.mirrored(xi - 1, yi, 0)
                            + diff.mirrored(xi + 1, yi, 0)
                            + diff.mirrored(xi, yi - 1, 0)
                            + diff.mirrored(xi, yi + 1, 0))
                            / 4.0
                    } else {
                        diff.get(x, y, 0)
                    };
                    dst.set(x, y, 0, v);
                }
            }
        }
        LmmseKernel::CalcRB { diff_gr, diff_gb } => {
            expect_format("CalcRB", dst, PixelFormat::Rgba32Float);
            expect_same_shape("CalcRB", diff_gr, dst);
            expect_same_shape("CalcRB", diff_gb, dst);
            for y in 0..h {
                for x in 0..w {
                    let g = dst.get(x, y, 1);
                    dst.set(x, y, 0, g - diff_gr.get(x, y, 0));
                    dst.set(x, y, 2, g - diff_gb.get(x, y, 0));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_smooth9_weights_are_normalised_and_symmetric() {
        let w = smooth9_weights();
        assert_relative_eq!(w.iter().sum::<f32>(), 1.0, epsilon = 1e-6);
        for i in 0..4 {
            assert_relative_eq!(w[i], w[8 - i]);
        }
        assert!(w[4] > w[3]);
    }

    #[test]
    fn test_interp5_reproduces_linear_ramp() {
        let data: Vec<f32> = (0..8).map(|x| x as f32 * 0.1).collect();
        let raw = Texture::from_data(PixelFormat::R32Float, 8, 1, data).unwrap();
        let mut dst = Texture::new(PixelFormat::R32Float, 8, 1);
        run(&mut dst, LmmseKernel::Interp5 { raw: &raw, horizontal: true });
        for x in 2..6 {
            assert_relative_eq!(dst.get(x, 0, 0), raw.get(x, 0, 0), epsilon = 1e-6);
        }
    }
}
