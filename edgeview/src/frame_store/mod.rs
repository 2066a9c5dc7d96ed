
use crate::common::Result;
use crate::frame::FrameSize;
use crate::gpu::{FramebufferHandle, GlBackend, TextureHandle};

/// Output texture and the framebuffer that renders into it.
///
/// Both objects are created by [`RenderTarget::create`] and deleted by
/// [`RenderTarget::destroy`]; neither exists without the other.
#[derive(Debug)]
pub struct RenderTarget {
    texture: TextureHandle,
    framebuffer: FramebufferHandle,
    size: FrameSize,
    complete: bool,
}

impl RenderTarget {
    /// Allocates an RGBA8 texture (linear filtering, clamp-to-edge) and a
    /// framebuffer with the texture as color attachment 0.
    ///
    /// An incomplete framebuffer is not an error: the pair is returned with
    /// `is_complete() == false`. Leaves texture and framebuffer bindings at 0.
    pub fn create<G: GlBackend + ?Sized>(gl: &G, size: FrameSize) -> Result<Self> {
        let framebuffer = gl.create_framebuffer()?;
        let texture = match gl.create_texture() {
            Ok(texture) => texture,
            Err(e) => {
                gl.delete_framebuffer(framebuffer);
                return Err(e);
            }
        };

        gl.bind_framebuffer(framebuffer);

        gl.bind_texture(texture);
        gl.tex_storage_rgba8(size.width_i32(), size.height_i32());
        gl.tex_parameter(glow::TEXTURE_MIN_FILTER, glow::LINEAR as i32);
        gl.tex_parameter(glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);
        gl.tex_parameter(glow::TEXTURE_WRAP_S, glow::CLAMP_TO_EDGE as i32);
        gl.tex_parameter(glow::TEXTURE_WRAP_T, glow::CLAMP_TO_EDGE as i32);

        gl.framebuffer_color_texture(texture);

        let status = gl.framebuffer_status();
        let complete = status == glow::FRAMEBUFFER_COMPLETE;
        if !complete {
            tracing::warn!(
                "Framebuffer not complete (status 0x{status:x}) for {size} target; output will be undefined"
            );
        }

        gl.bind_framebuffer(FramebufferHandle::NONE);
        gl.bind_texture(TextureHandle::NONE);

        Ok(Self {
            texture,
            framebuffer,
            size,
            complete,
        })
    }

    pub fn destroy<G: GlBackend + ?Sized>(self, gl: &G) {
        gl.delete_texture(self.texture);
        gl.delete_framebuffer(self.framebuffer);
    }

    pub fn texture(&self) -> TextureHandle {
        self.texture
    }

    pub fn framebuffer(&self) -> FramebufferHandle {
        self.framebuffer
    }

    pub fn size(&self) -> FrameSize {
        self.size
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }
}

/// GPU output resources sized to the current frame.
///
/// Either unallocated or holding exactly one [`RenderTarget`] that matches the
/// most recently requested size.
#[derive(Debug, Default)]
pub struct FrameStore {
    target: Option<RenderTarget>,
}

impl FrameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the store hold a target of `size`.
    ///
    /// No GL calls when the current target already matches. Otherwise the old
    /// pair is released before the new one is allocated.
    pub fn ensure_capacity<G: GlBackend + ?Sized>(
        &mut self,
        gl: &G,
        size: FrameSize,
    ) -> Result<()> {
        if self.size() == Some(size) {
            return Ok(());
        }

        self.release(gl);

        let target = RenderTarget::create(gl, size)?;
        tracing::info!("Output target allocated: {size}");
        self.target = Some(target);

        Ok(())
    }

    /// Deletes texture and framebuffer if allocated. Safe to repeat.
    pub fn release<G: GlBackend + ?Sized>(&mut self, gl: &G) {
        if let Some(target) = self.target.take() {
            tracing::debug!("Output target released: {}", target.size());
            target.destroy(gl);
        }
    }

    pub fn is_allocated(&self) -> bool {
        self.target.is_some()
    }

    pub fn size(&self) -> Option<FrameSize> {
        self.target.as_ref().map(|t| t.size())
    }

    /// Output texture, or [`TextureHandle::NONE`] when unallocated.
    pub fn output_texture(&self) -> TextureHandle {
        self.target
            .as_ref()
            .map_or(TextureHandle::NONE, |t| t.texture())
    }

    /// Framebuffer, or [`FramebufferHandle::NONE`] when unallocated.
    pub fn framebuffer(&self) -> FramebufferHandle {
        self.target
            .as_ref()
            .map_or(FramebufferHandle::NONE, |t| t.framebuffer())
    }

    pub fn is_framebuffer_complete(&self) -> bool {
        self.target.as_ref().is_some_and(|t| t.is_complete())
    }
}
