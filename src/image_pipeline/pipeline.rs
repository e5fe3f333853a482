//! End-to-end raw -> display pipeline
//!
//! One run goes: demosaic (bilinear only in raw mode), optional defringe and
//! highlight reconstruction on the raw plane, camera raw -> XYZ.D50, tone
//! adjustments in Lab, saturation in LCHuv, and finally gamma-encoded sRGB.

pub mod options;
pub mod orchestrator;


pub use options::{
    ColorMatrixSource, DebayerLmmseStage, DefringeStage, DisplayFormat, HighlightsStage,
    LocalContrastStage, PipelineOptions, PipelineOptionsBuilder,
};
pub use orchestrator::{DiagnosticSamples, Pipeline, PipelineOutput};
