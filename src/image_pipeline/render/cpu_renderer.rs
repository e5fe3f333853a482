use tracing::trace;

use crate::image_pipeline::common::{PipelineTimings, Timer};
use crate::image_pipeline::texture::Texture;

use super::kernel::Kernel;
use super::renderer::Renderer;
use super::shaders;

/// Reference renderer: every kernel runs synchronously on the calling thread.
#[derive(Debug, Default)]
pub struct CpuRenderer {
    timings: PipelineTimings,
}

impl CpuRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timings(&self) -> &PipelineTimings {
        &self.timings
    }

    pub fn reset_timings(&mut self) {
        self.timings.clear();
    }

    pub fn print_summary(&self) {
        self.timings.print_summary();
    }
}

impl Renderer for CpuRenderer {
    fn render(&mut self, dst: &mut Texture, kernel: Kernel<'_>) {
        let timer = Timer::start(kernel.name());
        trace!(
            kernel = kernel.name(),
            width = dst.width(),
            height = dst.height(),
            "dispatch"
        );
        match kernel {
            Kernel::Base(k) => shaders::base::run(dst, k),
            Kernel::DebayerLmmse(k) => shaders::debayer_lmmse::run(dst, k),
            Kernel::Defringe(k) => shaders::defringe::run(dst, k),
            Kernel::Ffcc(k) => shaders::ffcc::run(dst, k),
            Kernel::Highlights(k) => shaders::highlights::run(dst, k),
            Kernel::Color(k) => shaders::color::run(dst, k),
            Kernel::LocalContrast(k) => shaders::local_contrast::run(dst, k),
        }
        let (name, duration) = timer.stop();
        self.timings.add_step(name, duration);
    }

    fn copy(&mut self, src: &Texture, dst: &mut Texture) {
        assert_eq!(src.format(), dst.format(), "copy: pixel format mismatch");
        assert!(src.same_shape(dst), "copy: dimension mismatch");
        dst.data_mut().copy_from_slice(src.data());
    }

    fn commit_and_wait(&mut self) {
        trace!(dispatches = self.timings.steps().len(), "commit");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image_pipeline::render::kernel::BaseKernel;
    use crate::image_pipeline::texture::PixelFormat;

    #[test]
    fn test_dispatch_is_timed_by_kernel_name() {
        let mut renderer = CpuRenderer::new();
        let mut tex = renderer.texture_create(PixelFormat::Rgba32Float, 4, 4);
        renderer.render(&mut tex, BaseKernel::Saturate.into());
        renderer.render(&mut tex, BaseKernel::Saturate.into());
        renderer.commit_and_wait();

        assert_eq!(renderer.timings().steps().len(), 2);
        assert!(renderer.timings().get_step("Base::Saturate").is_some());
    }

    #[test]
    #[should_panic(expected = "dimension mismatch")]
    fn test_copy_rejects_mismatched_textures() {
        let mut renderer = CpuRenderer::new();
        let src = Texture::new(PixelFormat::R32Float, 4, 4);
        let mut dst = Texture::new(PixelFormat::R32Float, 2, 4);
        renderer.copy(&src, &mut dst);
    }
}
