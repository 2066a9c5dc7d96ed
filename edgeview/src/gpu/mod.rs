//! GPU backend seam.
//!
//! [`GlBackend`] is the slice of OpenGL ES 2 that the pipeline issues. The
//! production implementation wraps a `glow` context ([`GlowBackend`]); the
//! headless [`SoftwareGl`] keeps every object in CPU memory so the texture
//! round trip can run without a GPU.
//!
//! Handles are GL object names. Name `0` is never a live object and stands
//! for "unallocated" (or "unbind" when passed to a bind call).

mod glow_backend;
mod software;

pub use glow_backend::GlowBackend;
pub use software::SoftwareGl;

use crate::common::Result;

macro_rules! gl_handle {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
        #[repr(transparent)]
        pub struct $name(pub u32);

        impl $name {
            pub const NONE: $name = $name(0);

            pub fn is_none(&self) -> bool {
                self.0 == 0
            }

            pub fn is_some(&self) -> bool {
                self.0 != 0
            }

            pub fn name(&self) -> u32 {
                self.0
            }
        }

        impl From<u32> for $name {
            fn from(name: u32) -> $name {
                $name(name)
            }
        }
    };
}

gl_handle!(
    /// GPU-resident RGBA8 2D image.
    TextureHandle
);
gl_handle!(
    /// Render target binding one texture as its color attachment.
    FramebufferHandle
);
gl_handle!(BufferHandle);
gl_handle!(ShaderHandle);
gl_handle!(ProgramHandle);

/// Uniform slot inside a linked program.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct UniformLocation(pub u32);

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn label(&self) -> &'static str {
        match self {
            ShaderStage::Vertex => "Vertex",
            ShaderStage::Fragment => "Fragment",
        }
    }

    pub(crate) fn gl_enum(&self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

/// OpenGL ES 2 calls used by the frame pipeline.
///
/// Texture calls act on the `TEXTURE_2D` target of the active texture unit,
/// framebuffer calls on the `FRAMEBUFFER` target, buffer calls on
/// `ARRAY_BUFFER`. All pixel transfers are RGBA / UNSIGNED_BYTE.
///
/// Implementations are bound to the thread that owns the GL context; every
/// call must be issued from that thread.
pub trait GlBackend {
    fn create_texture(&self) -> Result<TextureHandle>;
    fn delete_texture(&self, texture: TextureHandle);
    fn bind_texture(&self, texture: TextureHandle);
    fn active_texture_unit(&self, unit: u32);
    fn tex_parameter(&self, parameter: u32, value: i32);
    /// Allocates RGBA8 storage for the bound texture, contents undefined.
    fn tex_storage_rgba8(&self, width: i32, height: i32);
    /// Overwrites the whole bound texture starting at (0, 0).
    fn tex_sub_image_rgba8(&self, width: i32, height: i32, pixels: &[u8]);

    fn create_framebuffer(&self) -> Result<FramebufferHandle>;
    fn delete_framebuffer(&self, framebuffer: FramebufferHandle);
    fn bind_framebuffer(&self, framebuffer: FramebufferHandle);
    /// Attaches `texture` as color attachment 0 of the bound framebuffer.
    fn framebuffer_color_texture(&self, texture: TextureHandle);
    fn framebuffer_status(&self) -> u32;
    /// Reads the bound framebuffer into `out` (`width * height * 4` bytes).
    fn read_pixels_rgba8(&self, width: i32, height: i32, out: &mut [u8]);

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32);
    fn clear_color_buffer(&self, color: [f32; 4]);

    fn create_buffer(&self) -> Result<BufferHandle>;
    fn delete_buffer(&self, buffer: BufferHandle);
    fn bind_array_buffer(&self, buffer: BufferHandle);
    fn array_buffer_data(&self, data: &[u8]);
    fn enable_vertex_attrib(&self, index: u32);
    fn disable_vertex_attrib(&self, index: u32);
    fn vertex_attrib_f32(&self, index: u32, size: i32, stride: i32, offset: i32);

    fn create_shader(&self, stage: ShaderStage) -> Result<ShaderHandle>;
    /// Sets the source and compiles. Returns the compile status.
    fn compile_shader(&self, shader: ShaderHandle, source: &str) -> bool;
    fn shader_info_log(&self, shader: ShaderHandle) -> String;
    fn delete_shader(&self, shader: ShaderHandle);

    fn create_program(&self) -> Result<ProgramHandle>;
    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle);
    /// Links and returns the link status.
    fn link_program(&self, program: ProgramHandle) -> bool;
    fn program_info_log(&self, program: ProgramHandle) -> String;
    fn delete_program(&self, program: ProgramHandle);
    fn use_program(&self, program: ProgramHandle);
    fn attrib_location(&self, program: ProgramHandle, name: &str) -> Option<u32>;
    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation>;
    fn uniform_matrix4(&self, location: UniformLocation, matrix: &[f32; 16]);
    fn uniform_i32(&self, location: UniformLocation, value: i32);

    fn draw_triangle_strip(&self, first: i32, count: i32);
}
