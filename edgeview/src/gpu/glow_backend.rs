use std::ffi::{c_void, CStr};
use std::marker::PhantomData;
use std::num::NonZeroU32;

use glow::HasContext;

use super::{
    BufferHandle, FramebufferHandle, GlBackend, ProgramHandle, ShaderHandle, ShaderStage,
    TextureHandle, UniformLocation,
};
use crate::common::{Error, Result};

/// [`GlBackend`] over a `glow` OpenGL (ES) context owned by the host.
///
/// Not `Send`: the context is current on exactly one thread.
pub struct GlowBackend {
    gl: glow::Context,
    _thread_bound: PhantomData<*const ()>,
}

impl GlowBackend {
    /// # Safety
    ///
    /// The context behind `gl` must be current on the calling thread and stay
    /// current for as long as the backend is used.
    pub unsafe fn new(gl: glow::Context) -> Self {
        Self {
            gl,
            _thread_bound: PhantomData,
        }
    }

    /// Resolves GL entry points through the platform loader
    /// (`eglGetProcAddress` and friends).
    ///
    /// # Safety
    ///
    /// Same contract as [`GlowBackend::new`]; `loader` must return valid
    /// function pointers for the current context.
    pub unsafe fn from_loader<F>(loader: F) -> Self
    where
        F: FnMut(&CStr) -> *const c_void,
    {
        Self::new(glow::Context::from_loader_function_cstr(loader))
    }

    pub fn context(&self) -> &glow::Context {
        &self.gl
    }
}

impl std::fmt::Debug for GlowBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlowBackend")
            .field("version", self.gl.version())
            .finish()
    }
}

fn texture(handle: TextureHandle) -> Option<glow::NativeTexture> {
    NonZeroU32::new(handle.0).map(glow::NativeTexture)
}

fn framebuffer(handle: FramebufferHandle) -> Option<glow::NativeFramebuffer> {
    NonZeroU32::new(handle.0).map(glow::NativeFramebuffer)
}

fn buffer(handle: BufferHandle) -> Option<glow::NativeBuffer> {
    NonZeroU32::new(handle.0).map(glow::NativeBuffer)
}

fn shader(handle: ShaderHandle) -> Option<glow::NativeShader> {
    NonZeroU32::new(handle.0).map(glow::NativeShader)
}

fn program(handle: ProgramHandle) -> Option<glow::NativeProgram> {
    NonZeroU32::new(handle.0).map(glow::NativeProgram)
}

// SAFETY (all blocks below): `GlowBackend::new` requires the context to be
// current on this thread, and the type is not `Send`. Handles of name 0 are
// filtered out before reaching calls that require a live object.
impl GlBackend for GlowBackend {
    fn create_texture(&self) -> Result<TextureHandle> {
        let tex = unsafe { self.gl.create_texture() }
            .map_err(|e| Error::GlCreate(format!("create_texture failed: {e}")))?;
        Ok(TextureHandle(tex.0.get()))
    }

    fn delete_texture(&self, handle: TextureHandle) {
        if let Some(tex) = texture(handle) {
            unsafe { self.gl.delete_texture(tex) };
        }
    }

    fn bind_texture(&self, handle: TextureHandle) {
        unsafe { self.gl.bind_texture(glow::TEXTURE_2D, texture(handle)) };
    }

    fn active_texture_unit(&self, unit: u32) {
        unsafe { self.gl.active_texture(glow::TEXTURE0 + unit) };
    }

    fn tex_parameter(&self, parameter: u32, value: i32) {
        unsafe { self.gl.tex_parameter_i32(glow::TEXTURE_2D, parameter, value) };
    }

    fn tex_storage_rgba8(&self, width: i32, height: i32) {
        unsafe {
            self.gl.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                glow::RGBA as i32,
                width,
                height,
                0,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                None,
            )
        };
    }

    fn tex_sub_image_rgba8(&self, width: i32, height: i32, pixels: &[u8]) {
        unsafe {
            self.gl.tex_sub_image_2d(
                glow::TEXTURE_2D,
                0,
                0,
                0,
                width,
                height,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(pixels),
            )
        };
    }

    fn create_framebuffer(&self) -> Result<FramebufferHandle> {
        let fbo = unsafe { self.gl.create_framebuffer() }
            .map_err(|e| Error::GlCreate(format!("create_framebuffer failed: {e}")))?;
        Ok(FramebufferHandle(fbo.0.get()))
    }

    fn delete_framebuffer(&self, handle: FramebufferHandle) {
        if let Some(fbo) = framebuffer(handle) {
            unsafe { self.gl.delete_framebuffer(fbo) };
        }
    }

    fn bind_framebuffer(&self, handle: FramebufferHandle) {
        unsafe { self.gl.bind_framebuffer(glow::FRAMEBUFFER, framebuffer(handle)) };
    }

    fn framebuffer_color_texture(&self, handle: TextureHandle) {
        unsafe {
            self.gl.framebuffer_texture_2d(
                glow::FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                texture(handle),
                0,
            )
        };
    }

    fn framebuffer_status(&self) -> u32 {
        unsafe { self.gl.check_framebuffer_status(glow::FRAMEBUFFER) }
    }

    fn read_pixels_rgba8(&self, width: i32, height: i32, out: &mut [u8]) {
        unsafe {
            self.gl.read_pixels(
                0,
                0,
                width,
                height,
                glow::RGBA,
                glow::UNSIGNED_BYTE,
                glow::PixelPackData::Slice(out),
            )
        };
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        unsafe { self.gl.viewport(x, y, width, height) };
    }

    fn clear_color_buffer(&self, color: [f32; 4]) {
        unsafe {
            self.gl.clear_color(color[0], color[1], color[2], color[3]);
            self.gl.clear(glow::COLOR_BUFFER_BIT);
        }
    }

    fn create_buffer(&self) -> Result<BufferHandle> {
        let vbo = unsafe { self.gl.create_buffer() }
            .map_err(|e| Error::GlCreate(format!("create_buffer failed: {e}")))?;
        Ok(BufferHandle(vbo.0.get()))
    }

    fn delete_buffer(&self, handle: BufferHandle) {
        if let Some(vbo) = buffer(handle) {
            unsafe { self.gl.delete_buffer(vbo) };
        }
    }

    fn bind_array_buffer(&self, handle: BufferHandle) {
        unsafe { self.gl.bind_buffer(glow::ARRAY_BUFFER, buffer(handle)) };
    }

    fn array_buffer_data(&self, data: &[u8]) {
        unsafe {
            self.gl
                .buffer_data_u8_slice(glow::ARRAY_BUFFER, data, glow::STATIC_DRAW)
        };
    }

    fn enable_vertex_attrib(&self, index: u32) {
        unsafe { self.gl.enable_vertex_attrib_array(index) };
    }

    fn disable_vertex_attrib(&self, index: u32) {
        unsafe { self.gl.disable_vertex_attrib_array(index) };
    }

    fn vertex_attrib_f32(&self, index: u32, size: i32, stride: i32, offset: i32) {
        unsafe {
            self.gl
                .vertex_attrib_pointer_f32(index, size, glow::FLOAT, false, stride, offset)
        };
    }

    fn create_shader(&self, stage: ShaderStage) -> Result<ShaderHandle> {
        let sh = unsafe { self.gl.create_shader(stage.gl_enum()) }.map_err(|e| {
            Error::GlCreate(format!("create_shader({}) failed: {e}", stage.label()))
        })?;
        Ok(ShaderHandle(sh.0.get()))
    }

    fn compile_shader(&self, handle: ShaderHandle, source: &str) -> bool {
        let Some(sh) = shader(handle) else {
            return false;
        };
        unsafe {
            self.gl.shader_source(sh, source);
            self.gl.compile_shader(sh);
            self.gl.get_shader_compile_status(sh)
        }
    }

    fn shader_info_log(&self, handle: ShaderHandle) -> String {
        shader(handle)
            .map(|sh| unsafe { self.gl.get_shader_info_log(sh) })
            .unwrap_or_default()
    }

    fn delete_shader(&self, handle: ShaderHandle) {
        if let Some(sh) = shader(handle) {
            unsafe { self.gl.delete_shader(sh) };
        }
    }

    fn create_program(&self) -> Result<ProgramHandle> {
        let prog = unsafe { self.gl.create_program() }
            .map_err(|e| Error::GlCreate(format!("create_program failed: {e}")))?;
        Ok(ProgramHandle(prog.0.get()))
    }

    fn attach_shader(&self, prog: ProgramHandle, sh: ShaderHandle) {
        if let (Some(prog), Some(sh)) = (program(prog), shader(sh)) {
            unsafe { self.gl.attach_shader(prog, sh) };
        }
    }

    fn link_program(&self, handle: ProgramHandle) -> bool {
        let Some(prog) = program(handle) else {
            return false;
        };
        unsafe {
            self.gl.link_program(prog);
            self.gl.get_program_link_status(prog)
        }
    }

    fn program_info_log(&self, handle: ProgramHandle) -> String {
        program(handle)
            .map(|prog| unsafe { self.gl.get_program_info_log(prog) })
            .unwrap_or_default()
    }

    fn delete_program(&self, handle: ProgramHandle) {
        if let Some(prog) = program(handle) {
            unsafe { self.gl.delete_program(prog) };
        }
    }

    fn use_program(&self, handle: ProgramHandle) {
        unsafe { self.gl.use_program(program(handle)) };
    }

    fn attrib_location(&self, handle: ProgramHandle, name: &str) -> Option<u32> {
        let prog = program(handle)?;
        unsafe { self.gl.get_attrib_location(prog, name) }
    }

    fn uniform_location(&self, handle: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let prog = program(handle)?;
        unsafe { self.gl.get_uniform_location(prog, name) }.map(|loc| UniformLocation(loc.0))
    }

    fn uniform_matrix4(&self, location: UniformLocation, matrix: &[f32; 16]) {
        let loc = glow::NativeUniformLocation(location.0);
        unsafe { self.gl.uniform_matrix_4_f32_slice(Some(&loc), false, matrix) };
    }

    fn uniform_i32(&self, location: UniformLocation, value: i32) {
        let loc = glow::NativeUniformLocation(location.0);
        unsafe { self.gl.uniform_1_i32(Some(&loc), value) };
    }

    fn draw_triangle_strip(&self, first: i32, count: i32) {
        unsafe { self.gl.draw_arrays(glow::TRIANGLE_STRIP, first, count) };
    }
}
