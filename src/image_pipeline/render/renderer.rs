use crate::image_pipeline::texture::{PixelFormat, Texture};

use super::kernel::Kernel;

/// Records kernel dispatches and blits. Work may be deferred until
/// [`commit_and_wait`](Renderer::commit_and_wait); only then are textures
/// guaranteed to hold their results on the CPU side.
///
/// Format or dimension mismatches between a kernel's declared inputs and the
/// textures supplied are programmer errors and abort.
pub trait Renderer {
    fn texture_create(&mut self, format: PixelFormat, width: usize, height: usize) -> Texture {
        Texture::new(format, width, height)
    }

    fn render(&mut self, dst: &mut Texture, kernel: Kernel<'_>);

    fn copy(&mut self, src: &Texture, dst: &mut Texture);

    fn commit_and_wait(&mut self);
}
