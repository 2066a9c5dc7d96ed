//! Full-viewport textured quad drawn to the default framebuffer.

#[cfg(test)]
mod tests;

use bytemuck::{Pod, Zeroable};
use glam::Mat4;

use crate::common::{Error, Result};
use crate::gpu::{
    BufferHandle, GlBackend, ProgramHandle, ShaderHandle, ShaderStage, TextureHandle,
    UniformLocation,
};

const VERTEX_SHADER: &str = include_str!("shaders/quad.vert");
const FRAGMENT_SHADER: &str = include_str!("shaders/quad.frag");

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 3],
    pub tex_coord: [f32; 2],
}

impl QuadVertex {
    const STRIDE: i32 = std::mem::size_of::<QuadVertex>() as i32;
    const POSITION_OFFSET: i32 = 0;
    const TEX_COORD_OFFSET: i32 = std::mem::size_of::<[f32; 3]>() as i32;
}

/// Triangle strip covering clip space. Texture row 0 maps to the top edge.
pub const FULLSCREEN_QUAD: [QuadVertex; 4] = [
    QuadVertex {
        position: [-1.0, -1.0, 0.0],
        tex_coord: [0.0, 1.0],
    },
    QuadVertex {
        position: [1.0, -1.0, 0.0],
        tex_coord: [1.0, 1.0],
    },
    QuadVertex {
        position: [-1.0, 1.0, 0.0],
        tex_coord: [0.0, 0.0],
    },
    QuadVertex {
        position: [1.0, 1.0, 0.0],
        tex_coord: [1.0, 0.0],
    },
];

/// Linked program with its stage objects and resolved locations.
#[derive(Debug)]
struct QuadProgram {
    program: ProgramHandle,
    vertex: ShaderHandle,
    fragment: ShaderHandle,
    position: u32,
    tex_coord: u32,
    mvp: UniformLocation,
    sampler: UniformLocation,
}

impl QuadProgram {
    fn build<G: GlBackend + ?Sized>(gl: &G) -> Result<Self> {
        let vertex = compile(gl, ShaderStage::Vertex, VERTEX_SHADER)?;
        let fragment = match compile(gl, ShaderStage::Fragment, FRAGMENT_SHADER) {
            Ok(fragment) => fragment,
            Err(e) => {
                gl.delete_shader(vertex);
                return Err(e);
            }
        };

        let program = match link(gl, vertex, fragment) {
            Ok(program) => program,
            Err(e) => {
                gl.delete_shader(vertex);
                gl.delete_shader(fragment);
                return Err(e);
            }
        };

        let locations = (
            gl.attrib_location(program, "aPosition"),
            gl.attrib_location(program, "aTexCoord"),
            gl.uniform_location(program, "uMVPMatrix"),
            gl.uniform_location(program, "uTexture"),
        );
        let (Some(position), Some(tex_coord), Some(mvp), Some(sampler)) = locations else {
            gl.delete_program(program);
            gl.delete_shader(vertex);
            gl.delete_shader(fragment);
            return Err(Error::ProgramLink(
                "quad program is missing an attribute or uniform".to_string(),
            ));
        };

        Ok(Self {
            program,
            vertex,
            fragment,
            position,
            tex_coord,
            mvp,
            sampler,
        })
    }

    fn delete<G: GlBackend + ?Sized>(self, gl: &G) {
        gl.delete_program(self.program);
        gl.delete_shader(self.vertex);
        gl.delete_shader(self.fragment);
    }
}

fn compile<G: GlBackend + ?Sized>(gl: &G, stage: ShaderStage, source: &str) -> Result<ShaderHandle> {
    let shader = gl.create_shader(stage)?;
    if gl.compile_shader(shader, source) {
        return Ok(shader);
    }

    let log = gl.shader_info_log(shader);
    gl.delete_shader(shader);
    Err(Error::ShaderCompile {
        stage: stage.label(),
        log,
    })
}

fn link<G: GlBackend + ?Sized>(
    gl: &G,
    vertex: ShaderHandle,
    fragment: ShaderHandle,
) -> Result<ProgramHandle> {
    let program = gl.create_program()?;
    gl.attach_shader(program, vertex);
    gl.attach_shader(program, fragment);
    if gl.link_program(program) {
        return Ok(program);
    }

    let log = gl.program_info_log(program);
    gl.delete_program(program);
    Err(Error::ProgramLink(log))
}

/// Draws a texture over the whole viewport with an identity transform.
///
/// A renderer whose program failed to build stays alive but every `render`
/// is a no-op.
#[derive(Debug, Default)]
pub struct DisplayRenderer {
    program: Option<QuadProgram>,
    vertex_buffer: BufferHandle,
    viewport: Option<(i32, i32)>,
    mvp: Mat4,
}

impl DisplayRenderer {
    /// Compiles and links the quad program and uploads the quad vertices.
    /// Failures are logged and leave the renderer non-functional.
    pub fn new<G: GlBackend + ?Sized>(gl: &G) -> Self {
        let mut renderer = Self {
            mvp: Mat4::IDENTITY,
            ..Default::default()
        };

        if let Err(e) = renderer.build(gl) {
            tracing::error!("Display renderer unavailable: {e}");
        }

        renderer
    }

    fn build<G: GlBackend + ?Sized>(&mut self, gl: &G) -> Result<()> {
        let program = QuadProgram::build(gl)?;

        let vertex_buffer = match gl.create_buffer() {
            Ok(buffer) => buffer,
            Err(e) => {
                program.delete(gl);
                return Err(e);
            }
        };
        gl.bind_array_buffer(vertex_buffer);
        gl.array_buffer_data(bytemuck::cast_slice(&FULLSCREEN_QUAD));
        gl.bind_array_buffer(BufferHandle::NONE);

        tracing::debug!("Display renderer ready (program {})", program.program.name());

        self.program = Some(program);
        self.vertex_buffer = vertex_buffer;

        Ok(())
    }

    pub fn is_functional(&self) -> bool {
        self.program.is_some()
    }

    pub fn mvp(&self) -> Mat4 {
        self.mvp
    }

    /// Last size passed to [`DisplayRenderer::resize`].
    pub fn viewport(&self) -> Option<(i32, i32)> {
        self.viewport
    }

    pub fn resize<G: GlBackend + ?Sized>(&mut self, gl: &G, width: i32, height: i32) {
        gl.viewport(0, 0, width, height);
        self.viewport = Some((width, height));
    }

    /// Clears the default framebuffer and draws `texture` across the viewport.
    /// A NONE texture draws the quad with nothing bound.
    ///
    /// The viewport from the last `resize` is restored first, since frame
    /// processing leaves the frame's own viewport active.
    pub fn render<G: GlBackend + ?Sized>(
        &self,
        gl: &G,
        texture: TextureHandle,
        clear_color: [f32; 4],
    ) {
        let Some(program) = &self.program else {
            return;
        };

        if let Some((width, height)) = self.viewport {
            gl.viewport(0, 0, width, height);
        }
        gl.clear_color_buffer(clear_color);
        gl.use_program(program.program);
        gl.uniform_matrix4(program.mvp, &self.mvp.to_cols_array());

        gl.bind_array_buffer(self.vertex_buffer);
        gl.enable_vertex_attrib(program.position);
        gl.vertex_attrib_f32(
            program.position,
            3,
            QuadVertex::STRIDE,
            QuadVertex::POSITION_OFFSET,
        );
        gl.enable_vertex_attrib(program.tex_coord);
        gl.vertex_attrib_f32(
            program.tex_coord,
            2,
            QuadVertex::STRIDE,
            QuadVertex::TEX_COORD_OFFSET,
        );

        if texture.is_some() {
            gl.active_texture_unit(0);
            gl.bind_texture(texture);
            gl.uniform_i32(program.sampler, 0);
        }

        gl.draw_triangle_strip(0, FULLSCREEN_QUAD.len() as i32);

        gl.disable_vertex_attrib(program.position);
        gl.disable_vertex_attrib(program.tex_coord);
        gl.bind_array_buffer(BufferHandle::NONE);
        if texture.is_some() {
            gl.bind_texture(TextureHandle::NONE);
        }
    }

    /// Deletes the program, its shaders and the vertex buffer. Safe to repeat.
    pub fn release<G: GlBackend + ?Sized>(&mut self, gl: &G) {
        if let Some(program) = self.program.take() {
            program.delete(gl);
        }
        if self.vertex_buffer.is_some() {
            gl.delete_buffer(self.vertex_buffer);
            self.vertex_buffer = BufferHandle::NONE;
        }
    }
}
