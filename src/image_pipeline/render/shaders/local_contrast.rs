use crate::image_pipeline::render::kernel::LocalContrastKernel;
use crate::image_pipeline::texture::{PixelFormat, Texture};

use super::{expect_format, expect_same_shape};

pub fn run(dst: &mut Texture, kernel: LocalContrastKernel<'_>) {
    match kernel {
        LocalContrastKernel::LocalContrast { blurred, amount } => {
            expect_format("LocalContrast", dst, PixelFormat::Rgba32Float);
            expect_format("LocalContrast", blurred, PixelFormat::R32Float);
            expect_same_shape("LocalContrast", blurred, dst);
            for (px, &b) in dst.data_mut().chunks_exact_mut(4).zip(blurred.data()) {
                px[0] += amount * (px[0] - b);
            }
        }
    }
}
