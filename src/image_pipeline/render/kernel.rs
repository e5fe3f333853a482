//! Closed set of kernels the pipeline can dispatch
//!
//! Each stage owns one sub-enum whose variants carry the kernel's typed
//! constants and input textures. The destination texture is passed to
//! [`Renderer::render`](super::Renderer::render) separately. Pointwise
//! kernels have no input texture and transform the destination in place.

use nalgebra::Matrix3;

use crate::image_pipeline::cfa::CfaDesc;
use crate::image_pipeline::defringe::DefringeOptions;
use crate::image_pipeline::texture::Texture;

#[derive(Debug, Clone, Copy)]
pub enum BaseKernel<'a> {
    /// sRGB transfer curve on the first three channels (or the only one).
    GammaForward,
    GammaReverse,
    /// Averages each 2x2 CFA cell of `raw` into one RGBA pixel, scaled to
    /// the destination size.
    DebayerDownsample { cfa: CfaDesc, raw: &'a Texture },
    /// Copies one channel of `src` into a single-channel destination.
    ExtractChannel { src: &'a Texture, channel: usize },
    /// Separable Gaussian, clamp-to-edge.
    GaussianBlur { src: &'a Texture, sigma: f32 },
    /// 3x3 `[1 2 1]` binomial blur over every channel, mirror-clamped.
    Blur3x3 { src: &'a Texture },
    /// Clamps the first three channels into `[0, 1]`.
    Saturate,
}

#[derive(Debug, Clone, Copy)]
pub enum LmmseKernel<'a> {
    Interp5 { raw: &'a Texture, horizontal: bool },
    NoiseEst { cfa: CfaDesc, raw: &'a Texture, filtered: &'a Texture },
    Smooth9 { src: &'a Texture, horizontal: bool },
    CalcG {
        cfa: CfaDesc,
        raw: &'a Texture,
        smoothed_h: &'a Texture,
        diff_h: &'a Texture,
        smoothed_v: &'a Texture,
        diff_v: &'a Texture,
    },
    CalcDiffGRGB { cfa: CfaDesc, raw: &'a Texture, rgb: &'a Texture, mode_gr: bool },
    CalcDiagAvgDiffGRGB { cfa: CfaDesc, diff: &'a Texture, mode_gr: bool },
    CalcAxialAvgDiffGRGB { cfa: CfaDesc, diff: &'a Texture },
    /// In place on the RGBA destination holding the reconstructed green.
    CalcRB { diff_gr: &'a Texture, diff_gb: &'a Texture },
}

#[derive(Debug, Clone, Copy)]
pub enum DefringeKernel<'a> {
    /// Writes the corrected raw plane into the destination. `shift_red` and
    /// `shift_blue` are coarse `Rg32Float` grids of (x, y) shifts in pixels.
    ApplyCorrection {
        cfa: CfaDesc,
        opts: DefringeOptions,
        raw: &'a Texture,
        g_interp: &'a Texture,
        shift_red: &'a Texture,
        shift_blue: &'a Texture,
    },
}

#[derive(Debug, Clone, Copy)]
pub enum FfccKernel<'a> {
    CreateMask { src: &'a Texture },
    ApplyMask { src: &'a Texture, mask: &'a Texture },
    LocalAbsDev { src: &'a Texture, mask: &'a Texture },
    CalcU { src: &'a Texture },
    CalcV { src: &'a Texture },
    CalcMaskUV { src: &'a Texture, mask: &'a Texture, min_intensity: f32 },
    /// In place: replaces a U (or V) plane by its wrapped histogram bin.
    CalcBinUV { bin_count: u32, bin_size: f32, starting_uv: f32 },
}

#[derive(Debug, Clone, Copy)]
pub enum HighlightsKernel<'a> {
    /// `Rg32Float` map of (blend factor, reconstructed level) from the
    /// half-resolution RGB proxy.
    CreateHighlightMap {
        rgb: &'a Texture,
        illum_min1: [f32; 3],
        scale: [f32; 3],
        cutoff: f32,
    },
    /// In place on the raw plane.
    Reconstruct { cfa: CfaDesc, map: &'a Texture, illum_min1: [f32; 3] },
}

/// Pointwise color-space kernels, all in place on an RGBA destination.
#[derive(Debug, Clone, Copy)]
pub enum ColorKernel {
    XyyD50FromCamRaw { matrix: Matrix3<f64> },
    Exposure { exposure: f32 },
    XyzD50FromXyyD50,
    LabD50FromXyzD50,
    Brightness { brightness: f32 },
    Contrast { contrast: f32 },
    XyzD50FromLabD50,
    LuvD50FromXyzD50,
    LchuvFromLuv,
    /// Scales LCHuv chroma by `satpow`.
    Saturation { satpow: f32 },
    LuvFromLchuv,
    XyzD50FromLuvD50,
    LsrgbD65FromXyzD50,
}

#[derive(Debug, Clone, Copy)]
pub enum LocalContrastKernel<'a> {
    /// Adds `amount * (L - blurred)` to the L* channel of a Lab destination.
    LocalContrast { blurred: &'a Texture, amount: f32 },
}

#[derive(Debug, Clone, Copy)]
pub enum Kernel<'a> {
    Base(BaseKernel<'a>),
    DebayerLmmse(LmmseKernel<'a>),
    Defringe(DefringeKernel<'a>),
    Ffcc(FfccKernel<'a>),
    Highlights(HighlightsKernel<'a>),
    Color(ColorKernel),
    LocalContrast(LocalContrastKernel<'a>),
}

impl Kernel<'_> {
    /// Stable `"Stage::Kernel"` label for logs and timings.
    pub fn name(&self) -> &'static str {
        match self {
            Kernel::Base(k) => match k {
                BaseKernel::GammaForward => "Base::GammaForward",
                BaseKernel::GammaReverse => "Base::GammaReverse",
                BaseKernel::DebayerDownsample { .. } => "Base::DebayerDownsample",
                BaseKernel::ExtractChannel { .. } => "Base::ExtractChannel",
                BaseKernel::GaussianBlur { .. } => "Base::GaussianBlur",
                BaseKernel::Blur3x3 { .. } => "Base::Blur3x3",
                BaseKernel::Saturate => "Base::Saturate",
            },
            Kernel::DebayerLmmse(k) => match k {
                LmmseKernel::Interp5 { .. } => "DebayerLMMSE::Interp5",
                LmmseKernel::NoiseEst { .. } => "DebayerLMMSE::NoiseEst",
                LmmseKernel::Smooth9 { .. } => "DebayerLMMSE::Smooth9",
                LmmseKernel::CalcG { .. } => "DebayerLMMSE::CalcG",
                LmmseKernel::CalcDiffGRGB { .. } => "DebayerLMMSE::CalcDiffGRGB",
                LmmseKernel::CalcDiagAvgDiffGRGB { .. } => "DebayerLMMSE::CalcDiagAvgDiffGRGB",
                LmmseKernel::CalcAxialAvgDiffGRGB { .. } => "DebayerLMMSE::CalcAxialAvgDiffGRGB",
                LmmseKernel::CalcRB { .. } => "DebayerLMMSE::CalcRB",
            },
            Kernel::Defringe(k) => match k {
                DefringeKernel::ApplyCorrection { .. } => "Defringe::ApplyCorrection",
            },
            Kernel::Ffcc(k) => match k {
                FfccKernel::CreateMask { .. } => "FFCC::CreateMask",
                FfccKernel::ApplyMask { .. } => "FFCC::ApplyMask",
                FfccKernel::LocalAbsDev { .. } => "FFCC::LocalAbsDev",
                FfccKernel::CalcU { .. } => "FFCC::CalcU",
                FfccKernel::CalcV { .. } => "FFCC::CalcV",
                FfccKernel::CalcMaskUV { .. } => "FFCC::CalcMaskUV",
                FfccKernel::CalcBinUV { .. } => "FFCC::CalcBinUV",
            },
            Kernel::Highlights(k) => match k {
                HighlightsKernel::CreateHighlightMap { .. } => "Highlights::CreateHighlightMap",
                HighlightsKernel::Reconstruct { .. } => "Highlights::Reconstruct",
            },
            Kernel::Color(k) => match k {
                ColorKernel::XyyD50FromCamRaw { .. } => "Color::XYYD50FromCamRaw",
                ColorKernel::Exposure { .. } => "Color::Exposure",
                ColorKernel::XyzD50FromXyyD50 => "Color::XYZD50FromXYYD50",
                ColorKernel::LabD50FromXyzD50 => "Color::LabD50FromXYZD50",
                ColorKernel::Brightness { .. } => "Color::Brightness",
                ColorKernel::Contrast { .. } => "Color::Contrast",
                ColorKernel::XyzD50FromLabD50 => "Color::XYZD50FromLabD50",
                ColorKernel::LuvD50FromXyzD50 => "Color::LuvD50FromXYZD50",
                ColorKernel::LchuvFromLuv => "Color::LCHuvFromLuv",
                ColorKernel::Saturation { .. } => "Color::Saturation",
                ColorKernel::LuvFromLchuv => "Color::LuvFromLCHuv",
                ColorKernel::XyzD50FromLuvD50 => "Color::XYZD50FromLuvD50",
                ColorKernel::LsrgbD65FromXyzD50 => "Color::LSRGBD65FromXYZD50",
            },
            Kernel::LocalContrast(k) => match k {
                LocalContrastKernel::LocalContrast { .. } => "LocalContrast::LocalContrast",
            },
        }
    }
}

macro_rules! impl_from_stage_kernel {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl<'a> From<$ty> for Kernel<'a> {
                fn from(k: $ty) -> Self {
                    Kernel::$variant(k)
                }
            }
        )*
    };
}

impl_from_stage_kernel! {
    BaseKernel<'a> => Base,
    LmmseKernel<'a> => DebayerLmmse,
    DefringeKernel<'a> => Defringe,
    FfccKernel<'a> => Ffcc,
    HighlightsKernel<'a> => Highlights,
    ColorKernel => Color,
    LocalContrastKernel<'a> => LocalContrast,
}
