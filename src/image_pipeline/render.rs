//! Kernel dispatch layer
//!
//! Stages never touch pixels directly; they describe work as [`Kernel`]
//! values and hand them to a [`Renderer`]. [`CpuRenderer`] executes the
//! reference implementation of every kernel in [`shaders`].

pub mod cpu_renderer;
pub mod kernel;
pub mod renderer;
pub mod shaders;

pub use cpu_renderer::CpuRenderer;
pub use kernel::{
    BaseKernel, ColorKernel, DefringeKernel, FfccKernel, HighlightsKernel, Kernel,
    LmmseKernel, LocalContrastKernel,
};
pub use renderer::Renderer;
