//! Raw image processing pipeline
//!
//! Turns a Bayer-mosaiced sensor plane into display RGB. Stages are written
//! against the [`Renderer`] trait and dispatch a closed set of kernels;
//! [`CpuRenderer`] runs them as plain functions on the calling thread.

pub mod cfa;
pub mod color;
pub mod common;
pub mod debayer;
pub mod defringe;
pub mod highlights;
pub mod illuminant;
pub mod local_contrast;
pub mod pipeline;
pub mod render;
pub mod saturation;
pub mod texture;

pub use cfa::{CfaColor, CfaDesc};

pub use color::{Ccm, ColorCalibration};

pub use common::{PipelineError, PipelineTimings, Result, StepTiming, Timer};

pub use debayer::{BilinearDebayer, RgbImageData};

pub use defringe::DefringeOptions;

pub use illuminant::{HistogramParams, IlluminantEstimator, IlluminantModel};

pub use pipeline::{
    ColorMatrixSource, DiagnosticSamples, DisplayFormat, Pipeline, PipelineOptions,
    PipelineOptionsBuilder, PipelineOutput,
};

pub use render::{CpuRenderer, Kernel, Renderer};

pub use texture::{PixelFormat, SampleRect, Texture};
