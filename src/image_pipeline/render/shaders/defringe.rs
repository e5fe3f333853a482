use crate::image_pipeline::cfa::CfaColor;
use crate::image_pipeline::render::kernel::DefringeKernel;
use crate::image_pipeline::texture::{PixelFormat, Texture};

use super::{expect_format, expect_same_shape};

const EPS: f32 = 1e-5;

pub fn run(dst: &mut Texture, kernel: DefringeKernel<'_>) {
    match kernel {
        DefringeKernel::ApplyCorrection { cfa, opts, raw, g_interp, shift_red, shift_blue } => {
            expect_format("ApplyCorrection", dst, PixelFormat::R32Float);
            expect_format("ApplyCorrection", raw, PixelFormat::R32Float);
            expect_format("ApplyCorrection", g_interp, PixelFormat::Rgba32Float);
            expect_format("ApplyCorrection", shift_red, PixelFormat::Rg32Float);
            expect_format("ApplyCorrection", shift_blue, PixelFormat::Rg32Float);
            expect_same_shape("ApplyCorrection", raw, dst);
            expect_same_shape("ApplyCorrection", g_interp, dst);

            let (w, h) = (dst.width(), dst.height());
            for y in 0..h {
                for x in 0..w {
                    let r = raw.get(x, y, 0);
                    let shift = match cfa.color_at(x, y) {
                        CfaColor::Green => {
                            dst.set(x, y, 0, r);
                            continue;
                        }
                        CfaColor::Red => shift_red,
                        CfaColor::Blue => shift_blue,
                    };

                    let u = (x as f32 + 0.5) / w as f32;
                    let v = (y as f32 + 0.5) / h as f32;
                    let sx = shift.sample(u, v, 0);
                    let sy = shift.sample(u, v, 1);

                    let g = g_interp.get(x, y, 1);
                    let gs = g_interp.sample_bilinear_px(x as f32 + 0.5 + sx, y as f32 + 0.5 + sy, 1);
                    let alpha = g / gs;
                    let corrected = if gs > EPS
                        && alpha >= 1.0 / opts.alpha_thresh
                        && alpha <= opts.alpha_thresh
                    {
                        r * alpha
                    } else {
                        r
                    };

                    let out = if (corrected - r).abs() / r.max(EPS) > opts.gamma_thresh {
                        let (xi, yi) = (x as i64, y as i64);
                        let mean = (raw.mirrored(xi - 2, yi, 0)
                            + raw.mirrored(xi + 2, yi, 0)
                            + raw.mirrored(xi, yi - 2, 0)
                            + raw.mirrored(xi, yi + 2, 0))
                            / 4.0;
                        opts.gamma_factor * mean + (1.0 - opts.gamma_factor) * corrected
                    } else {
                        corrected
                    };
                    dst.set(x, y, 0, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::cfa::CfaDesc;
    use crate::image_pipeline::defringe::DefringeOptions;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_uniform_shift_rescales_red_by_green_ratio() {
        let (w, h) = (8, 8);
        let mut g_interp = Texture::new(PixelFormat::Rgba32Float, w, h);
        let mut raw = Texture::new(PixelFormat::R32Float, w, h);
        for y in 0..h {
            for x in 0..w {
                let g = 0.4 + 0.01 * x as f32;
                g_interp.set(x, y, 1, g);
                raw.set(x, y, 0, g);
            }
        }
        let mut shift_red = Texture::new(PixelFormat::Rg32Float, 2, 2);
        for px in shift_red.data_mut().chunks_exact_mut(2) {
            px[0] = 1.0;
        }
        let shift_blue = Texture::new(PixelFormat::Rg32Float, 2, 2);

        let mut dst = Texture::new(PixelFormat::R32Float, w, h);
        run(
            &mut dst,
            DefringeKernel::ApplyCorrection {
                cfa: CfaDesc::RGGB,
                opts: DefringeOptions::default(),
                raw: &raw,
                g_interp: &g_interp,
                shift_red: &shift_red,
                shift_blue: &shift_blue,
            },
        );

        // Red at (2, 2): alpha = g(2) / g(3)
        let expected = raw.get(2, 2, 0) * g_interp.get(2, 2, 1) / g_interp.get(3, 2, 1);
        assert_abs_diff_eq!(dst.get(2, 2, 0), expected, epsilon = 1e-6);
        // Green and (unshifted) blue untouched
        assert_eq!(dst.get(3, 2, 0), raw.get(3, 2, 0));
        assert_abs_diff_eq!(dst.get(3, 3, 0), raw.get(3, 3, 0), epsilon = 1e-6);
    }
}
