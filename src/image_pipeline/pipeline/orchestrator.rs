use nalgebra::{Matrix3, Vector3};
use tracing::{debug, info, info_span, instrument, warn};

use crate::image_pipeline::common::{PipelineError, Result};
use crate::image_pipeline::debayer::{BilinearDebayer, RgbImageData, lmmse};
use crate::image_pipeline::illuminant::IlluminantEstimator;
use crate::image_pipeline::render::{BaseKernel, ColorKernel, Renderer};
use crate::image_pipeline::texture::{PixelFormat, SampleRect, Texture};
use crate::image_pipeline::{defringe, highlights, local_contrast, saturation};

use super::options::{ColorMatrixSource, DisplayFormat, PipelineOptions};

/// Pixels captured inside [`PipelineOptions::sample_rect`], row-major.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagnosticSamples {
    pub rect: SampleRect,
    /// Raw plane, one value per pixel
    pub raw: Vec<f32>,
    /// XYZ.D50 after saturation, RGBA per pixel. Empty in raw mode.
    pub xyz_d50: Vec<f32>,
    /// Gamma-encoded sRGB, RGBA per pixel. Empty in raw mode.
    pub srgb: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// RGBA image in the requested display format
    pub rgb: Texture,
    /// Raw-space illuminant the run used; `None` in raw mode
    pub illum: Option<Vector3<f64>>,
    /// Camera raw -> XYZ.D50 matrix the run used; `None` in raw mode
    pub color_matrix: Option<Matrix3<f64>>,
    pub samples: Option<DiagnosticSamples>,
}

impl PipelineOutput {
    pub fn to_rgb16(&self) -> RgbImageData {
        RgbImageData::from_texture(&self.rgb)
    }
}

/// Raw plane -> display RGB.
///
/// Holds only immutable collaborators; every run works on its own buffers.
pub struct Pipeline {
    estimator: Option<IlluminantEstimator>,
    bilinear: BilinearDebayer,
}

impl Pipeline {
    /// A pipeline without an illuminant estimator. Runs that don't supply an
    /// illuminant fall back to a neutral one.
    pub fn new() -> Self {
        Self {
            estimator: None,
            bilinear: BilinearDebayer::new(),
        }
    }

    pub fn with_estimator(estimator: IlluminantEstimator) -> Self {
        Self {
            estimator: Some(estimator),
            bilinear: BilinearDebayer::new(),
        }
    }

    pub fn estimator(&self) -> Option<&IlluminantEstimator> {
        self.estimator.as_ref()
    }

    fn validate_dimensions(width: usize, height: usize) -> Result<()> {
        if width < 2 || height < 2 {
            return Err(PipelineError::InvalidDimensions(width, height));
        }
        Ok(())
    }

    /// Runs on 12-bit raw samples, row-major.
    pub fn run_pixels<R: Renderer>(
        &self,
        renderer: &mut R,
        opts: &PipelineOptions,
        width: usize,
        height: usize,
        pixels: &[u16],
    ) -> Result<PipelineOutput> {
        Self::validate_dimensions(width, height)?;
        let raw = Texture::from_raw_pixels(width, height, pixels)?;
        self.run(renderer, opts, &raw)
    }

    /// `src_raw` must be an `R32Float` plane normalised to `[0, 1]`; it is
    /// left untouched.
    #[instrument(skip_all, fields(width = src_raw.width(), height = src_raw.height(), raw_mode = opts.raw_mode))]
    pub fn run<R: Renderer>(
        &self,
        renderer: &mut R,
        opts: &PipelineOptions,
        src_raw: &Texture,
    ) -> Result<PipelineOutput> {
        let (w, h) = (src_raw.width(), src_raw.height());
        Self::validate_dimensions(w, h)?;
        info!(width = w, height = h, cfa = %opts.cfa, "Starting pipeline run");

        let mut samples = (!opts.sample_rect.is_empty()).then(|| {
            let _span = info_span!("sample_raw").entered();
            let rect = opts.sample_rect.clipped(w, h);
            DiagnosticSamples {
                rect,
                raw: src_raw.crop(&rect),
                ..Default::default()
            }
        });

        if opts.raw_mode {
            let mut rgb = {
                let _span = info_span!("debayer_bilinear").entered();
                self.bilinear.process(&opts.cfa, src_raw)?
            };
            Self::convert_display_format(renderer, opts.display_format, &mut rgb);
            info!(width = w, height = h, "Pipeline complete (raw mode)");
            return Ok(PipelineOutput {
                rgb,
                illum: None,
                color_matrix: None,
                samples,
            });
        }

        let illum = {
            let _span = info_span!("illuminant").entered();
            self.select_illuminant(renderer, opts, src_raw)
        };

        let mut raw = renderer.texture_create(PixelFormat::R32Float, w, h);
        renderer.copy(src_raw, &mut raw);

        if opts.defringe.en {
            let _span = info_span!("defringe").entered();
            defringe::run(renderer, &opts.cfa, &opts.defringe.opts, &mut raw);
        }

        if opts.reconstruct_highlights.en {
            let _span = info_span!("reconstruct_highlights").entered();
            highlights::run(renderer, &opts.cfa, &illum, &mut raw);
        }

        let mut rgb = renderer.texture_create(PixelFormat::Rgba32Float, w, h);
        {
            let _span = info_span!("debayer_lmmse").entered();
            lmmse::run(renderer, &opts.cfa, opts.debayer_lmmse.apply_gamma, &raw, &mut rgb);
        }

        let matrix = Self::color_matrix(opts, &illum);
        {
            let _span = info_span!("tone").entered();
            debug!(?matrix, "Camera raw -> XYZ.D50");
            for kernel in [
                ColorKernel::XyyD50FromCamRaw { matrix },
                ColorKernel::Exposure { exposure: opts.exposure },
                ColorKernel::XyzD50FromXyyD50,
                ColorKernel::LabD50FromXyzD50,
                ColorKernel::Brightness { brightness: opts.brightness },
                ColorKernel::Contrast { contrast: opts.contrast },
            ] {
                renderer.render(&mut rgb, kernel.into());
            }
        }

        if opts.local_contrast.en {
            let _span = info_span!("local_contrast").entered();
            local_contrast::run(renderer, opts.local_contrast.amount, opts.local_contrast.radius, &mut rgb);
        }

        renderer.render(&mut rgb, ColorKernel::XyzD50FromLabD50.into());

        {
            let _span = info_span!("saturation").entered();
            saturation::run(renderer, opts.saturation, &mut rgb);
        }

        if let Some(samples) = samples.as_mut() {
            let _span = info_span!("sample_xyz_d50").entered();
            renderer.commit_and_wait();
            samples.xyz_d50 = rgb.crop(&samples.rect);
        }

        {
            let _span = info_span!("srgb").entered();
            renderer.render(&mut rgb, ColorKernel::LsrgbD65FromXyzD50.into());
            renderer.render(&mut rgb, BaseKernel::GammaForward.into());
        }

        if let Some(samples) = samples.as_mut() {
            let _span = info_span!("sample_srgb").entered();
            renderer.commit_and_wait();
            samples.srgb = rgb.crop(&samples.rect);
        }

        Self::convert_display_format(renderer, opts.display_format, &mut rgb);

        info!(
            width = w,
            height = h,
            illum_r = illum.x,
            illum_g = illum.y,
            illum_b = illum.z,
            "Pipeline complete"
        );
        Ok(PipelineOutput {
            rgb,
            illum: Some(illum),
            color_matrix: Some(matrix),
            samples,
        })
    }

    fn select_illuminant<R: Renderer>(
        &self,
        renderer: &mut R,
        opts: &PipelineOptions,
        raw: &Texture,
    ) -> Vector3<f64> {
        if let Some(illum) = opts.illum {
            debug!(?illum, "Using supplied illuminant");
            return Vector3::from(illum);
        }
        match &self.estimator {
            Some(estimator) => estimator.estimate(renderer, &opts.cfa, raw),
            None => {
                warn!("No illuminant supplied and no estimator configured, assuming neutral");
                Vector3::new(1.0, 1.0, 1.0).normalize()
            }
        }
    }

    fn color_matrix(opts: &PipelineOptions, illum: &Vector3<f64>) -> Matrix3<f64> {
        match &opts.color_matrix {
            ColorMatrixSource::Fixed(matrix) => *matrix,
            ColorMatrixSource::Calibrated(cal) => {
                let k = cal.interpolation_for(illum);
                debug!(k, "Interpolating color calibration");
                cal.interpolate(k).matrix
            }
        }
    }

    fn convert_display_format<R: Renderer>(renderer: &mut R, format: DisplayFormat, rgb: &mut Texture) {
        match format {
            DisplayFormat::Rgba32Float => renderer.commit_and_wait(),
            DisplayFormat::Rgba8Unorm => {
                renderer.render(rgb, BaseKernel::Saturate.into());
                renderer.commit_and_wait();
                for v in rgb.data_mut() {
                    *v = (v.clamp(0.0, 1.0) * 255.0).round() / 255.0;
                }
            }
        }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
