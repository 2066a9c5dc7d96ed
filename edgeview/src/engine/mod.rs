//! Per-frame processing: GPU read-back, CPU filter, GPU upload.


use crate::common::{Error, Result};
use crate::filter::{CannyFilter, FrameFilter};
use crate::frame::{FrameSize, PixelBuffer};
use crate::frame_store::FrameStore;
use crate::gpu::{FramebufferHandle, GlBackend, TextureHandle};

pub struct FilterEngine {
    store: FrameStore,
    filter: Box<dyn FrameFilter>,
}

impl Default for FilterEngine {
    fn default() -> Self {
        Self::new(CannyFilter::default())
    }
}

impl FilterEngine {
    pub fn new<F: FrameFilter + 'static>(filter: F) -> Self {
        Self {
            store: FrameStore::new(),
            filter: Box::new(filter),
        }
    }

    pub fn set_filter<F: FrameFilter + 'static>(&mut self, filter: F) {
        tracing::debug!("Filter changed: {} -> {}", self.filter.name(), filter.name());
        self.filter = Box::new(filter);
    }

    pub fn filter_name(&self) -> &str {
        self.filter.name()
    }

    /// Runs one frame from `input` into the output texture.
    ///
    /// Dimensions are validated before any GL call; on rejection nothing on
    /// the GPU is touched. The input texture is read by attaching it to the
    /// store's framebuffer for the duration of the read, after which the
    /// output texture is re-attached. Leaves texture and framebuffer
    /// bindings at 0.
    pub fn process_frame<G: GlBackend + ?Sized>(
        &mut self,
        gl: &G,
        input: TextureHandle,
        width: i32,
        height: i32,
    ) -> Result<()> {
        let size = FrameSize::new(width, height)?;

        self.store.ensure_capacity(gl, size)?;
        let framebuffer = self.store.framebuffer();
        let output = self.store.output_texture();

        gl.bind_framebuffer(framebuffer);
        gl.viewport(0, 0, size.width_i32(), size.height_i32());

        let frame = read_texture(gl, input, size);
        gl.framebuffer_color_texture(output);

        let result = self.filter.apply(&frame);
        if !result.same_shape(&frame) {
            gl.bind_framebuffer(FramebufferHandle::NONE);
            return Err(Error::FilterShapeMismatch {
                filter: self.filter.name().to_string(),
                expected: frame.shape_string(),
                actual: result.shape_string(),
            });
        }

        gl.bind_texture(output);
        gl.tex_sub_image_rgba8(size.width_i32(), size.height_i32(), result.bytes());
        gl.bind_texture(TextureHandle::NONE);
        gl.bind_framebuffer(FramebufferHandle::NONE);

        tracing::trace!("Frame processed: {size} via {}", self.filter.name());

        Ok(())
    }

    /// Texture holding the last processed frame, or NONE before the first.
    pub fn output_texture(&self) -> TextureHandle {
        self.store.output_texture()
    }

    pub fn store(&self) -> &FrameStore {
        &self.store
    }

    pub fn release<G: GlBackend + ?Sized>(&mut self, gl: &G) {
        self.store.release(gl);
    }
}

impl std::fmt::Debug for FilterEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterEngine")
            .field("store", &self.store)
            .field("filter", &self.filter.name())
            .finish()
    }
}

/// Reads `input` through the currently bound framebuffer.
fn read_texture<G: GlBackend + ?Sized>(gl: &G, input: TextureHandle, size: FrameSize) -> PixelBuffer {
    gl.framebuffer_color_texture(input);
    let mut frame = PixelBuffer::for_size(size);
    gl.read_pixels_rgba8(size.width_i32(), size.height_i32(), frame.bytes_mut());
    frame
}
