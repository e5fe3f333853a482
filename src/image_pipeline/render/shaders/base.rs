use crate::image_pipeline::color::space::{srgb_gamma_forward, srgb_gamma_reverse};
use crate::image_pipeline::render::kernel::BaseKernel;
use crate::image_pipeline::texture::{PixelFormat, Texture};

use super::{expect_format, expect_same_shape};

pub fn run(dst: &mut Texture, kernel: BaseKernel<'_>) {
    match kernel {
        BaseKernel::GammaForward => map_color_channels(dst, |v| srgb_gamma_forward(v as f64) as f32),
        BaseKernel::GammaReverse => map_color_channels(dst, |v| srgb_gamma_reverse(v as f64) as f32),
        BaseKernel::DebayerDownsample { cfa, raw } => {
            expect_format("DebayerDownsample", raw, PixelFormat::R32Float);
            expect_format("DebayerDownsample", dst, PixelFormat::Rgba32Float);
            assert!(
                raw.width() >= 2 && raw.height() >= 2,
                "DebayerDownsample: raw plane must be at least 2x2"
            );
            let (rw, rh) = (raw.width(), raw.height());
            let (dw, dh) = (dst.width(), dst.height());
            for y in 0..dh {
                let sy = ((y * rh) / dh).min(rh - 2) & !1;
                for x in 0..dw {
                    let sx = ((x * rw) / dw).min(rw - 2) & !1;
                    let mut sum = [0.0f32; 3];
                    let mut count = [0u32; 3];
                    for (dy, dx) in [(0, 0), (0, 1), (1, 0), (1, 1)] {
                        let c = cfa.color_at(sx + dx, sy + dy).channel();
                        sum[c] += raw.get(sx + dx, sy + dy, 0);
                        count[c] += 1;
                    }
                    let px = dst.px_mut(x, y);
                    for c in 0..3 {
                        px[c] = if count[c] > 0 { sum[c] / count[c] as f32 } else { 0.0 };
                    }
                    px[3] = 1.0;
                }
            }
        }
        BaseKernel::ExtractChannel { src, channel } => {
            expect_format("ExtractChannel", dst, PixelFormat::R32Float);
            expect_same_shape("ExtractChannel", src, dst);
            assert!(channel < src.channels(), "ExtractChannel: channel out of range");
            for y in 0..dst.height() {
                for x in 0..dst.width() {
                    dst.set(x, y, 0, src.get(x, y, channel));
                }
            }
        }
        BaseKernel::GaussianBlur { src, sigma } => {
            expect_same_shape("GaussianBlur", src, dst);
            assert_eq!(src.format(), dst.format(), "GaussianBlur: format mismatch");
            let weights = gaussian_weights(sigma, src.width().max(src.height()));
            separable_filter(src, dst, &weights, Edge::Clamp);
        }
        BaseKernel::Blur3x3 { src } => {
            expect_same_shape("Blur3x3", src, dst);
            assert_eq!(src.format(), dst.format(), "Blur3x3: format mismatch");
            separable_filter(src, dst, &[0.25, 0.5, 0.25], Edge::Mirror);
        }
        BaseKernel::Saturate => map_color_channels(dst, |v| v.clamp(0.0, 1.0)),
    }
}

/// Applies `f` to the color channels, leaving alpha alone.
fn map_color_channels(dst: &mut Texture, f: impl Fn(f32) -> f32) {
    let n = dst.channels();
    let color = n.min(3);
    for px in dst.data_mut().chunks_exact_mut(n) {
        for v in &mut px[..color] {
            *v = f(*v);
        }
    }
}

/// Normalised Gaussian taps covering +-3 sigma, at most `max_radius` taps
/// each side. Non-finite or non-positive sigma is the identity.
fn gaussian_weights(sigma: f32, max_radius: usize) -> Vec<f32> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return vec![1.0];
    }
    // Taps past the image extent only re-read edge samples.
    let radius = ((3.0 * sigma).ceil() as i64).min(max_radius as i64);
    let denom = 2.0 * sigma * sigma;
    let mut weights: Vec<f32> = (-radius..=radius)
        .map(|k| (-((k * k) as f32) / denom).exp())
        .collect();
    let sum: f32 = weights.iter().sum();
    for w in &mut weights {
        *w /= sum;
    }
    weights
}

#[derive(Clone, Copy)]
enum Edge {
    Clamp,
    Mirror,
}

/// Horizontal then vertical pass with an odd-length symmetric kernel.
fn separable_filter(src: &Texture, dst: &mut Texture, weights: &[f32], edge: Edge) {
    let radius = (weights.len() / 2) as i64;
    let n = src.channels();
    let mut tmp = Texture::new(src.format(), src.width(), src.height());

    let fetch = |tex: &Texture, x: i64, y: i64, c: usize| match edge {
        Edge::Clamp => tex.clamped(x, y, c),
        Edge::Mirror => tex.mirrored(x, y, c),
    };

    for y in 0..src.height() {
        for x in 0..src.width() {
            for c in 0..n {
                let acc: f32 = weights
                    .iter()
                    .enumerate()
                    .map(|(i, w)| w * fetch(src, x as i64 + i as i64 - radius, y as i64, c))
                    .sum();
                tmp.set(x, y, c, acc);
            }
        }
    }
    for y in 0..src.height() {
        for x in 0..src.width() {
            for c in 0..n {
                let acc: f32 = weights
                    .iter()
                    .enumerate()
                    .map(|(i, w)| w * fetch(&tmp, x as i64, y as i64 + i as i64 - radius, c))
                    .sum();
                dst.set(x, y, c, acc);
            }
        }
    }
}
