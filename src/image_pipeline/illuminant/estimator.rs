use nalgebra::{DMatrix, Vector3};
use tracing::{debug, instrument};

use crate::image_pipeline::cfa::CfaDesc;
use crate::image_pipeline::render::{BaseKernel, FfccKernel, Renderer};
use crate::image_pipeline::texture::{PixelFormat, Texture};

use super::fft::Fft2d;
use super::model::IlluminantModel;
use super::von_mises::{fit_bivariate_von_mises, softmax};

/// Width of the RGB proxy the histograms are built from.
pub const PROXY_WIDTH: usize = 384;

/// Estimates the scene illuminant from a raw plane by evaluating a trained
/// model over log-chromaticity histograms.
pub struct IlluminantEstimator {
    model: IlluminantModel,
    fft: Fft2d,
}

impl IlluminantEstimator {
    pub fn new(model: IlluminantModel) -> Self {
        let fft = Fft2d::new(model.params().bin_count);
        Self { model, fft }
    }

    pub fn model(&self) -> &IlluminantModel {
        &self.model
    }

    /// Unit-length raw-space illuminant `(r, g, b)`.
    #[instrument(skip_all, fields(width = raw.width(), height = raw.height()))]
    pub fn estimate<R: Renderer>(&self, renderer: &mut R, cfa: &CfaDesc, raw: &Texture) -> Vector3<f64> {
        assert_eq!(raw.format(), PixelFormat::R32Float, "FFCC: raw must be R32Float");
        let w = PROXY_WIDTH;
        let h = ((w * raw.height()) / raw.width()).max(1);

        let mut rgb = renderer.texture_create(PixelFormat::Rgba32Float, w, h);
        renderer.render(&mut rgb, BaseKernel::DebayerDownsample { cfa: *cfa, raw }.into());

        let mut mask = renderer.texture_create(PixelFormat::R32Float, w, h);
        renderer.render(&mut mask, FfccKernel::CreateMask { src: &rgb }.into());

        let mut masked = renderer.texture_create(PixelFormat::Rgba32Float, w, h);
        renderer.render(&mut masked, FfccKernel::ApplyMask { src: &rgb, mask: &mask }.into());

        let mut abs_dev = renderer.texture_create(PixelFormat::Rgba32Float, w, h);
        renderer.render(&mut abs_dev, FfccKernel::LocalAbsDev { src: &rgb, mask: &mask }.into());

        let x1 = self.histogram(renderer, &masked, &mask);
        let x2 = self.histogram(renderer, &abs_dev, &mask);

        let [f0, f1] = self.model.filters();
        let fx_fft = self.fft.forward(&x1).component_mul(f0) + self.fft.forward(&x2).component_mul(f1);
        let fx = self.fft.inverse_real(&fx_fft);

        let p = softmax(&(fx + self.model.bias()));
        let (mu1, mu2) = fit_bivariate_von_mises(&p);

        let params = self.model.params();
        let u = mu1 * params.bin_size + params.starting_uv;
        let v = mu2 * params.bin_size + params.starting_uv;
        let illum = Vector3::new((-u).exp(), 1.0, (-v).exp()).normalize();
        debug!(mu1, mu2, u, v, r = illum.x, g = illum.y, b = illum.z, "Illuminant estimated");
        illum
    }

    /// Histogram of wrapped (u, v) bins over valid pixels, rows indexed by u,
    /// normalised by the valid pixel count.
    fn histogram<R: Renderer>(&self, renderer: &mut R, rgb: &Texture, mask: &Texture) -> DMatrix<f64> {
        let params = self.model.params();
        let (w, h) = (rgb.width(), rgb.height());

        let mut u = renderer.texture_create(PixelFormat::R32Float, w, h);
        renderer.render(&mut u, FfccKernel::CalcU { src: rgb }.into());
        let mut v = renderer.texture_create(PixelFormat::R32Float, w, h);
        renderer.render(&mut v, FfccKernel::CalcV { src: rgb }.into());

        let mut mask_uv = renderer.texture_create(PixelFormat::R32Float, w, h);
        renderer.render(
            &mut mask_uv,
            FfccKernel::CalcMaskUV {
                src: rgb,
                mask,
                min_intensity: params.min_intensity as f32,
            }
            .into(),
        );

        let bin = FfccKernel::CalcBinUV {
            bin_count: params.bin_count as u32,
            bin_size: params.bin_size as f32,
            starting_uv: params.starting_uv as f32,
        };
        renderer.render(&mut u, bin.into());
        renderer.render(&mut v, bin.into());
        renderer.commit_and_wait();

        let n = params.bin_count;
        let mut hist = DMatrix::<f64>::zeros(n, n);
        let mut valid = 0usize;
        for ((&m, &ub), &vb) in mask_uv.data().iter().zip(u.data()).zip(v.data()) {
            if m > 0.0 {
                hist[(ub as usize, vb as usize)] += 1.0;
                valid += 1;
            }
        }
        if valid > 0 {
            hist /= valid as f64;
        }
        hist
    }
}
