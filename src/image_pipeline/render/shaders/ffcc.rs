use crate::image_pipeline::illuminant::von_mises::matlab_mod;
use crate::image_pipeline::render::kernel::FfccKernel;
use crate::image_pipeline::texture::{PixelFormat, Texture};

use super::{expect_format, expect_same_shape};

fn valid(rgb: [f32; 3]) -> bool {
    rgb.iter().all(|&c| c > 0.0 && c < 1.0)
}

pub fn run(dst: &mut Texture, kernel: FfccKernel<'_>) {
    let (w, h) = (dst.width(), dst.height());
    match kernel {
        FfccKernel::CreateMask { src } => {
            expect_format("CreateMask", dst, PixelFormat::R32Float);
            expect_same_shape("CreateMask", src, dst);
            for y in 0..h {
                for x in 0..w {
                    dst.set(x, y, 0, if valid(src.rgb(x, y)) { 1.0 } else { 0.0 });
                }
            }
        }
        FfccKernel::ApplyMask { src, mask } => {
            expect_format("ApplyMask", dst, PixelFormat::Rgba32Float);
            expect_same_shape("ApplyMask", src, dst);
            expect_same_shape("ApplyMask", mask, dst);
            for y in 0..h {
                for x in 0..w {
                    let m = mask.get(x, y, 0);
                    let [r, g, b] = src.rgb(x, y);
                    dst.px_mut(x, y).copy_from_slice(&[r * m, g * m, b * m, 1.0]);
                }
            }
        }
        FfccKernel::LocalAbsDev { src, mask } => {
            expect_format("LocalAbsDev", dst, PixelFormat::Rgba32Float);
            expect_same_shape("LocalAbsDev", src, dst);
            expect_same_shape("LocalAbsDev", mask, dst);
            for y in 0..h {
                for x in 0..w {
                    let centre = src.rgb(x, y);
                    let mut dev = [0.0f32; 3];
                    let mut count = 0.0f32;
                    if mask.get(x, y, 0) > 0.0 {
                        for dy in -1i64..=1 {
                            for dx in -1i64..=1 {
                                if dx == 0 && dy == 0 {
                                    continue;
                                }
                                let (nx, ny) = (x as i64 + dx, y as i64 + dy);
                                let m = mask.clamped(nx, ny, 0);
                                count += m;
                                for (c, d) in dev.iter_mut().enumerate() {
                                    *d += m * (src.clamped(nx, ny, c) - centre[c]).abs();
                                }
                            }
                        }
                    }
                    let coeff = if count > 0.0 { 1.0 / count } else { 0.0 };
                    dst.px_mut(x, y)
                        .copy_from_slice(&[dev[0] * coeff, dev[1] * coeff, dev[2] * coeff, 1.0]);
                }
            }
        }
        FfccKernel::CalcU { src } => {
            expect_format("CalcU", dst, PixelFormat::R32Float);
            expect_same_shape("CalcU", src, dst);
            for y in 0..h {
                for x in 0..w {
                    let [r, g, _] = src.rgb(x, y);
                    dst.set(x, y, 0, g.ln() - r.ln());
                }
            }
        }
        FfccKernel::CalcV { src } => {
            expect_format("CalcV", dst, PixelFormat::R32Float);
            expect_same_shape("CalcV", src, dst);
            for y in 0..h {
                for x in 0..w {
                    let [_, g, b] = src.rgb(x, y);
                    dst.set(x, y, 0, g.ln() - b.ln());
                }
            }
        }
        FfccKernel::CalcMaskUV { src, mask, min_intensity } => {
            expect_format("CalcMaskUV", dst, PixelFormat::R32Float);
            expect_same_shape("CalcMaskUV", src, dst);
            expect_same_shape("CalcMaskUV", mask, dst);
            for y in 0..h {
                for x in 0..w {
                    let [r, g, b] = src.rgb(x, y);
                    let ok = mask.get(x, y, 0) > 0.0 && r.min(g).min(b) >= min_intensity;
                    dst.set(x, y, 0, if ok { 1.0 } else { 0.0 });
                }
            }
        }
        FfccKernel::CalcBinUV { bin_count, bin_size, starting_uv } => {
            expect_format("CalcBinUV", dst, PixelFormat::R32Float);
            for v in dst.data_mut() {
                let bin = ((*v as f64 - starting_uv as f64) / bin_size as f64).round();
                *v = matlab_mod(bin, bin_count as f64) as f32;
            }
        }
    }
}
