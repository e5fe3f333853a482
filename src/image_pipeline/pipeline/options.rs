//! Per-run pipeline configuration

use nalgebra::Matrix3;

use crate::image_pipeline::cfa::CfaDesc;
use crate::image_pipeline::color::ColorCalibration;
use crate::image_pipeline::defringe::DefringeOptions;
use crate::image_pipeline::texture::SampleRect;

/// Where the camera raw -> XYZ.D50 matrix comes from
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorMatrixSource {
    /// Used as given
    Fixed(Matrix3<f64>),
    /// Interpolated for the illuminant in use
    Calibrated(ColorCalibration),
}

impl Default for ColorMatrixSource {
    fn default() -> Self {
        ColorMatrixSource::Calibrated(ColorCalibration::default())
    }
}

/// Pixel format of the final output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayFormat {
    /// Unclamped float RGBA
    #[default]
    Rgba32Float,
    /// RGBA clamped to `[0, 1]` and quantised to 8 bits (stored as float)
    Rgba8Unorm,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DefringeStage {
    pub en: bool,
    pub opts: DefringeOptions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HighlightsStage {
    pub en: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DebayerLmmseStage {
    /// Demosaic in sRGB-gamma space instead of linear
    pub apply_gamma: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocalContrastStage {
    pub en: bool,
    pub amount: f32,
    /// Gaussian sigma, in pixels
    pub radius: f32,
}

/// Everything one pipeline run needs to know
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    pub cfa: CfaDesc,
    /// Bilinear demosaic only; every later stage is skipped
    pub raw_mode: bool,
    /// Raw-space illuminant. Estimated when absent.
    pub illum: Option<[f64; 3]>,
    pub color_matrix: ColorMatrixSource,
    pub defringe: DefringeStage,
    pub reconstruct_highlights: HighlightsStage,
    pub debayer_lmmse: DebayerLmmseStage,
    /// Stops
    pub exposure: f32,
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub local_contrast: LocalContrastStage,
    /// Region returned in the diagnostic samples. Empty disables sampling.
    pub sample_rect: SampleRect,
    pub display_format: DisplayFormat,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            cfa: CfaDesc::default(),
            raw_mode: false,
            illum: None,
            color_matrix: ColorMatrixSource::default(),
            defringe: DefringeStage::default(),
            reconstruct_highlights: HighlightsStage::default(),
            debayer_lmmse: DebayerLmmseStage::default(),
            exposure: 0.0,
            brightness: 0.0,
            contrast: 0.0,
            saturation: 0.0,
            local_contrast: LocalContrastStage::default(),
            sample_rect: SampleRect::default(),
            display_format: DisplayFormat::default(),
        }
    }
}

impl PipelineOptions {
    pub fn builder() -> PipelineOptionsBuilder {
        PipelineOptionsBuilder::default()
    }
}

/// Builder for PipelineOptions
#[derive(Default)]
pub struct PipelineOptionsBuilder {
    cfa: Option<CfaDesc>,
    raw_mode: Option<bool>,
    illum: Option<Option<[f64; 3]>>,
    color_matrix: Option<ColorMatrixSource>,
    defringe: Option<DefringeStage>,
    reconstruct_highlights: Option<bool>,
    apply_gamma: Option<bool>,
    exposure: Option<f32>,
    brightness: Option<f32>,
    contrast: Option<f32>,
    saturation: Option<f32>,
    local_contrast: Option<LocalContrastStage>,
    sample_rect: Option<SampleRect>,
    display_format: Option<DisplayFormat>,
}

impl PipelineOptionsBuilder {
    pub fn cfa(mut self, cfa: CfaDesc) -> Self {
        self.cfa = Some(cfa);
        self
    }

    pub fn raw_mode(mut self, enable: bool) -> Self {
        self.raw_mode = Some(enable);
        self
    }

    pub fn illum(mut self, illum: Option<[f64; 3]>) -> Self {
        self.illum = Some(illum);
        self
    }

    pub fn color_matrix(mut self, source: ColorMatrixSource) -> Self {
        self.color_matrix = Some(source);
        self
    }

    pub fn defringe(mut self, enable: bool, opts: DefringeOptions) -> Self {
        self.defringe = Some(DefringeStage { en: enable, opts });
        self
    }

    pub fn reconstruct_highlights(mut self, enable: bool) -> Self {
        self.reconstruct_highlights = Some(enable);
        self
    }

    pub fn apply_gamma(mut self, enable: bool) -> Self {
        self.apply_gamma = Some(enable);
        self
    }

    pub fn exposure(mut self, stops: f32) -> Self {
        self.exposure = Some(stops);
        self
    }

    pub fn brightness(mut self, brightness: f32) -> Self {
        self.brightness = Some(brightness);
        self
    }

    pub fn contrast(mut self, contrast: f32) -> Self {
        self.contrast = Some(contrast);
        self
    }

    pub fn saturation(mut self, saturation: f32) -> Self {
        self.saturation = Some(saturation);
        self
    }

    pub fn local_contrast(mut self, enable: bool, amount: f32, radius: f32) -> Self {
        self.local_contrast = Some(LocalContrastStage { en: enable, amount, radius });
        self
    }

    pub fn sample_rect(mut self, rect: SampleRect) -> Self {
        self.sample_rect = Some(rect);
        self
    }

    pub fn display_format(mut self, format: DisplayFormat) -> Self {
        self.display_format = Some(format);
        self
    }

    pub fn build(self) -> PipelineOptions {
        let default = PipelineOptions::default();
        PipelineOptions {
            cfa: self.cfa.unwrap_or(default.cfa),
            raw_mode: self.raw_mode.unwrap_or(default.raw_mode),
            illum: self.illum.unwrap_or(default.illum),
            color_matrix: self.color_matrix.unwrap_or(default.color_matrix),
            defringe: self.defringe.unwrap_or(default.defringe),
            reconstruct_highlights: self
                .reconstruct_highlights
                .map(|en| HighlightsStage { en })
                .unwrap_or(default.reconstruct_highlights),
            debayer_lmmse: self
                .apply_gamma
                .map(|apply_gamma| DebayerLmmseStage { apply_gamma })
                .unwrap_or(default.debayer_lmmse),
            exposure: self.exposure.unwrap_or(default.exposure),
            brightness: self.brightness.unwrap_or(default.brightness),
            contrast: self.contrast.unwrap_or(default.contrast),
            saturation: self.saturation.unwrap_or(default.saturation),
            local_contrast: self.local_contrast.unwrap_or(default.local_contrast),
            sample_rect: self.sample_rect.unwrap_or(default.sample_rect),
            display_format: self.display_format.unwrap_or(default.display_format),
        }
    }
}
