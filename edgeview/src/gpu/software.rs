use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};

use super::{
    BufferHandle, FramebufferHandle, GlBackend, ProgramHandle, ShaderHandle, ShaderStage,
    TextureHandle, UniformLocation,
};
use crate::common::Result;
use crate::frame::RGBA_BYTES;

const ATTRIBUTES: [&str; 2] = ["aPosition", "aTexCoord"];
const UNIFORMS: [&str; 2] = ["uMVPMatrix", "uTexture"];

/// Headless [`GlBackend`] that keeps every GL object in CPU memory.
///
/// Textures hold RGBA8 bytes in GL row order (row 0 at the bottom).
/// `read_pixels_rgba8` reads the texture attached to the bound framebuffer,
/// or the default framebuffer ("screen") when none is bound. Drawing
/// rasterises the textured quad into the screen with nearest sampling.
///
/// Every trait call is counted and live objects are tracked, which lets
/// callers observe resource lifecycles. Failure switches emulate drivers
/// that reject shaders, programs or framebuffers.
#[derive(Debug, Default)]
pub struct SoftwareGl {
    state: RefCell<State>,
}

#[derive(Debug, Default)]
struct State {
    last_name: u32,
    calls: usize,
    draws: usize,

    textures: HashMap<u32, SoftTexture>,
    framebuffers: HashMap<u32, Option<u32>>,
    buffers: HashMap<u32, Vec<u8>>,
    shaders: HashMap<u32, SoftShader>,
    programs: HashMap<u32, SoftProgram>,

    bound_texture: u32,
    bound_framebuffer: u32,
    bound_buffer: u32,
    current_program: u32,
    active_unit: u32,
    enabled_attribs: BTreeSet<u32>,
    attrib_pointers: HashMap<u32, AttribPointer>,
    viewport: [i32; 4],
    screen: Screen,

    fail_shader_compile: bool,
    fail_program_link: bool,
    fail_framebuffer: bool,
}

#[derive(Debug, Default)]
struct SoftTexture {
    width: i32,
    height: i32,
    bytes: Vec<u8>,
    parameters: HashMap<u32, i32>,
}

#[derive(Debug)]
struct SoftShader {
    compiled: bool,
}

#[derive(Debug, Default)]
struct SoftProgram {
    shaders: Vec<u32>,
    linked: bool,
    matrix: Option<[f32; 16]>,
    sampler_unit: i32,
}

#[derive(Debug, Clone, Copy)]
struct AttribPointer {
    buffer: u32,
    size: i32,
    stride: i32,
    offset: i32,
}

#[derive(Debug, Default)]
struct Screen {
    width: i32,
    height: i32,
    bytes: Vec<u8>,
}

impl Screen {
    fn fit(&mut self, width: i32, height: i32) {
        if self.width != width || self.height != height {
            self.width = width.max(0);
            self.height = height.max(0);
            self.bytes = vec![0; self.width as usize * self.height as usize * RGBA_BYTES];
        }
    }
}

impl State {
    fn next_name(&mut self) -> u32 {
        self.last_name += 1;
        self.last_name
    }

    fn call(&mut self) {
        self.calls += 1;
    }

    fn attached_texture(&self) -> Option<&SoftTexture> {
        let attachment = (*self.framebuffers.get(&self.bound_framebuffer)?)?;
        self.textures.get(&attachment)
    }

    fn read_attrib(&self, index: u32, vertex: usize) -> Option<Vec<f32>> {
        let pointer = self.attrib_pointers.get(&index)?;
        let data = self.buffers.get(&pointer.buffer)?;
        let start = pointer.offset as usize + vertex * pointer.stride as usize;
        let end = start + pointer.size as usize * 4;
        let bytes = data.get(start..end)?;
        Some(
            bytes
                .chunks_exact(4)
                .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
                .collect(),
        )
    }

    /// Rasterises an axis-aligned textured quad given as a 4-vertex strip.
    fn rasterize_quad(&mut self, first: i32) {
        let Some(program) = self.programs.get(&self.current_program) else {
            return;
        };
        if !program.linked {
            return;
        }
        let matrix = program.matrix.unwrap_or(IDENTITY);
        let (position, tex_coord) = (0u32, 1u32);
        if !self.enabled_attribs.contains(&position) || !self.enabled_attribs.contains(&tex_coord)
        {
            return;
        }

        let first = first.max(0) as usize;
        let corners = [first, first + 3];
        let mut ndc = [[0.0f32; 2]; 2];
        let mut uv = [[0.0f32; 2]; 2];
        for (i, &vertex) in corners.iter().enumerate() {
            let (Some(p), Some(t)) = (
                self.read_attrib(position, vertex),
                self.read_attrib(tex_coord, vertex),
            ) else {
                return;
            };
            let p = [
                p[0],
                p.get(1).copied().unwrap_or(0.0),
                p.get(2).copied().unwrap_or(0.0),
                1.0,
            ];
            let clip = transform(&matrix, p);
            ndc[i] = [clip[0] / clip[3], clip[1] / clip[3]];
            uv[i] = [t[0], t.get(1).copied().unwrap_or(0.0)];
        }

        let [vx, vy, vw, vh] = self.viewport;
        self.screen.fit(vx + vw, vy + vh);

        // Unbound or storage-less texture samples as opaque black.
        let texture = self
            .textures
            .get(&self.bound_texture)
            .filter(|t| !t.bytes.is_empty());

        let (x0, x1) = (ndc[0][0], ndc[1][0]);
        let (y0, y1) = (ndc[0][1], ndc[1][1]);
        if x0 == x1 || y0 == y1 {
            return;
        }

        for py in vy..vy + vh {
            let ndc_y = ((py - vy) as f32 + 0.5) / vh as f32 * 2.0 - 1.0;
            let ty = (ndc_y - y0) / (y1 - y0);
            if !(0.0..=1.0).contains(&ty) {
                continue;
            }
            for px in vx..vx + vw {
                let ndc_x = ((px - vx) as f32 + 0.5) / vw as f32 * 2.0 - 1.0;
                let tx = (ndc_x - x0) / (x1 - x0);
                if !(0.0..=1.0).contains(&tx) {
                    continue;
                }

                let color = match texture {
                    Some(tex) => {
                        let u = uv[0][0] + tx * (uv[1][0] - uv[0][0]);
                        let v = uv[0][1] + ty * (uv[1][1] - uv[0][1]);
                        let sx = ((u * tex.width as f32) as i32).clamp(0, tex.width - 1);
                        let sy = ((v * tex.height as f32) as i32).clamp(0, tex.height - 1);
                        let i = (sy as usize * tex.width as usize + sx as usize) * RGBA_BYTES;
                        [
                            tex.bytes[i],
                            tex.bytes[i + 1],
                            tex.bytes[i + 2],
                            tex.bytes[i + 3],
                        ]
                    }
                    None => [0, 0, 0, 255],
                };

                let o = (py as usize * self.screen.width as usize + px as usize) * RGBA_BYTES;
                self.screen.bytes[o..o + RGBA_BYTES].copy_from_slice(&color);
            }
        }
    }
}

const IDENTITY: [f32; 16] = [
    1.0, 0.0, 0.0, 0.0, //
    0.0, 1.0, 0.0, 0.0, //
    0.0, 0.0, 1.0, 0.0, //
    0.0, 0.0, 0.0, 1.0,
];

/// Column-major `m * v`.
fn transform(m: &[f32; 16], v: [f32; 4]) -> [f32; 4] {
    let mut out = [0.0; 4];
    for (row, o) in out.iter_mut().enumerate() {
        *o = (0..4).map(|col| m[col * 4 + row] * v[col]).sum();
    }
    out
}

impl SoftwareGl {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a populated texture, the way a host camera texture arrives.
    pub fn upload_texture(&self, width: i32, height: i32, pixels: &[u8]) -> TextureHandle {
        let mut state = self.state.borrow_mut();
        let name = state.next_name();
        state.textures.insert(
            name,
            SoftTexture {
                width,
                height,
                bytes: pixels.to_vec(),
                parameters: HashMap::new(),
            },
        );
        TextureHandle(name)
    }

    pub fn texture_pixels(&self, texture: TextureHandle) -> Option<Vec<u8>> {
        self.state
            .borrow()
            .textures
            .get(&texture.0)
            .map(|t| t.bytes.clone())
    }

    pub fn texture_size(&self, texture: TextureHandle) -> Option<(i32, i32)> {
        self.state
            .borrow()
            .textures
            .get(&texture.0)
            .map(|t| (t.width, t.height))
    }

    pub fn texture_parameter(&self, texture: TextureHandle, parameter: u32) -> Option<i32> {
        self.state
            .borrow()
            .textures
            .get(&texture.0)
            .and_then(|t| t.parameters.get(&parameter).copied())
    }

    pub fn framebuffer_attachment(&self, framebuffer: FramebufferHandle) -> Option<TextureHandle> {
        self.state
            .borrow()
            .framebuffers
            .get(&framebuffer.0)
            .copied()
            .flatten()
            .map(TextureHandle)
    }

    pub fn has_texture(&self, texture: TextureHandle) -> bool {
        self.state.borrow().textures.contains_key(&texture.0)
    }

    pub fn has_framebuffer(&self, framebuffer: FramebufferHandle) -> bool {
        self.state.borrow().framebuffers.contains_key(&framebuffer.0)
    }

    pub fn live_textures(&self) -> usize {
        self.state.borrow().textures.len()
    }

    pub fn live_framebuffers(&self) -> usize {
        self.state.borrow().framebuffers.len()
    }

    pub fn live_buffers(&self) -> usize {
        self.state.borrow().buffers.len()
    }

    pub fn live_shaders(&self) -> usize {
        self.state.borrow().shaders.len()
    }

    pub fn live_programs(&self) -> usize {
        self.state.borrow().programs.len()
    }

    /// Number of [`GlBackend`] calls issued so far.
    pub fn call_count(&self) -> usize {
        self.state.borrow().calls
    }

    pub fn draw_count(&self) -> usize {
        self.state.borrow().draws
    }

    pub fn bound_texture(&self) -> TextureHandle {
        TextureHandle(self.state.borrow().bound_texture)
    }

    pub fn bound_framebuffer(&self) -> FramebufferHandle {
        FramebufferHandle(self.state.borrow().bound_framebuffer)
    }

    pub fn current_viewport(&self) -> [i32; 4] {
        self.state.borrow().viewport
    }

    pub fn enabled_attribute_count(&self) -> usize {
        self.state.borrow().enabled_attribs.len()
    }

    /// Last matrix uploaded to the current program.
    pub fn program_matrix(&self, program: ProgramHandle) -> Option<[f32; 16]> {
        self.state
            .borrow()
            .programs
            .get(&program.0)
            .and_then(|p| p.matrix)
    }

    /// Default framebuffer pixel, origin at the bottom-left.
    pub fn screen_pixel(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        let state = self.state.borrow();
        let screen = &state.screen;
        if x < 0 || y < 0 || x >= screen.width || y >= screen.height {
            return None;
        }
        let i = (y as usize * screen.width as usize + x as usize) * RGBA_BYTES;
        Some([
            screen.bytes[i],
            screen.bytes[i + 1],
            screen.bytes[i + 2],
            screen.bytes[i + 3],
        ])
    }

    pub fn set_fail_shader_compile(&self, fail: bool) {
        self.state.borrow_mut().fail_shader_compile = fail;
    }

    pub fn set_fail_program_link(&self, fail: bool) {
        self.state.borrow_mut().fail_program_link = fail;
    }

    pub fn set_fail_framebuffer(&self, fail: bool) {
        self.state.borrow_mut().fail_framebuffer = fail;
    }
}

impl GlBackend for SoftwareGl {
    fn create_texture(&self) -> Result<TextureHandle> {
        let mut state = self.state.borrow_mut();
        state.call();
        let name = state.next_name();
        state.textures.insert(name, SoftTexture::default());
        Ok(TextureHandle(name))
    }

    fn delete_texture(&self, texture: TextureHandle) {
        let mut state = self.state.borrow_mut();
        state.call();
        state.textures.remove(&texture.0);
        if state.bound_texture == texture.0 {
            state.bound_texture = 0;
        }
        for attachment in state.framebuffers.values_mut() {
            if *attachment == Some(texture.0) {
                *attachment = None;
            }
        }
    }

    fn bind_texture(&self, texture: TextureHandle) {
        let mut state = self.state.borrow_mut();
        state.call();
        state.bound_texture = texture.0;
    }

    fn active_texture_unit(&self, unit: u32) {
        let mut state = self.state.borrow_mut();
        state.call();
        state.active_unit = unit;
    }

    fn tex_parameter(&self, parameter: u32, value: i32) {
        let mut state = self.state.borrow_mut();
        state.call();
        let bound = state.bound_texture;
        if let Some(tex) = state.textures.get_mut(&bound) {
            tex.parameters.insert(parameter, value);
        }
    }

    fn tex_storage_rgba8(&self, width: i32, height: i32) {
        let mut state = self.state.borrow_mut();
        state.call();
        let bound = state.bound_texture;
        if let Some(tex) = state.textures.get_mut(&bound) {
            tex.width = width;
            tex.height = height;
            tex.bytes = vec![0; width.max(0) as usize * height.max(0) as usize * RGBA_BYTES];
        }
    }

    fn tex_sub_image_rgba8(&self, width: i32, height: i32, pixels: &[u8]) {
        let mut state = self.state.borrow_mut();
        state.call();
        let bound = state.bound_texture;
        let Some(tex) = state.textures.get_mut(&bound) else {
            return;
        };
        if width > tex.width || height > tex.height {
            return;
        }
        let src_row = width as usize * RGBA_BYTES;
        let dst_row = tex.width as usize * RGBA_BYTES;
        for (y, row) in pixels.chunks_exact(src_row).take(height as usize).enumerate() {
            tex.bytes[y * dst_row..y * dst_row + src_row].copy_from_slice(row);
        }
    }

    fn create_framebuffer(&self) -> Result<FramebufferHandle> {
        let mut state = self.state.borrow_mut();
        state.call();
        let name = state.next_name();
        state.framebuffers.insert(name, None);
        Ok(FramebufferHandle(name))
    }

    fn delete_framebuffer(&self, framebuffer: FramebufferHandle) {
        let mut state = self.state.borrow_mut();
        state.call();
        state.framebuffers.remove(&framebuffer.0);
        if state.bound_framebuffer == framebuffer.0 {
            state.bound_framebuffer = 0;
        }
    }

    fn bind_framebuffer(&self, framebuffer: FramebufferHandle) {
        let mut state = self.state.borrow_mut();
        state.call();
        state.bound_framebuffer = framebuffer.0;
    }

    fn framebuffer_color_texture(&self, texture: TextureHandle) {
        let mut state = self.state.borrow_mut();
        state.call();
        let bound = state.bound_framebuffer;
        let attachment = texture.is_some().then_some(texture.0);
        if let Some(slot) = state.framebuffers.get_mut(&bound) {
            *slot = attachment;
        }
    }

    fn framebuffer_status(&self) -> u32 {
        let mut state = self.state.borrow_mut();
        state.call();
        if state.bound_framebuffer == 0 {
            return glow::FRAMEBUFFER_COMPLETE;
        }
        if state.fail_framebuffer {
            return glow::FRAMEBUFFER_UNSUPPORTED;
        }
        match state.attached_texture() {
            Some(tex) if !tex.bytes.is_empty() => glow::FRAMEBUFFER_COMPLETE,
            Some(_) => glow::FRAMEBUFFER_INCOMPLETE_ATTACHMENT,
            None => glow::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT,
        }
    }

    fn read_pixels_rgba8(&self, width: i32, height: i32, out: &mut [u8]) {
        let mut state = self.state.borrow_mut();
        state.call();
        out.fill(0);

        let (src_width, src_height, src) = if state.bound_framebuffer == 0 {
            (state.screen.width, state.screen.height, &state.screen.bytes)
        } else {
            match state.attached_texture() {
                Some(tex) => (tex.width, tex.height, &tex.bytes),
                None => return,
            }
        };

        let rows = height.min(src_height).max(0) as usize;
        let cols = width.min(src_width).max(0) as usize;
        let dst_row = width.max(0) as usize * RGBA_BYTES;
        let src_row = src_width as usize * RGBA_BYTES;
        for y in 0..rows {
            let len = cols * RGBA_BYTES;
            let dst = &mut out[y * dst_row..y * dst_row + len];
            dst.copy_from_slice(&src[y * src_row..y * src_row + len]);
        }
    }

    fn viewport(&self, x: i32, y: i32, width: i32, height: i32) {
        let mut state = self.state.borrow_mut();
        state.call();
        state.viewport = [x, y, width, height];
    }

    fn clear_color_buffer(&self, color: [f32; 4]) {
        let mut state = self.state.borrow_mut();
        state.call();
        let rgba = color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        if state.bound_framebuffer == 0 {
            let [vx, vy, vw, vh] = state.viewport;
            state.screen.fit(vx + vw, vy + vh);
            for px in state.screen.bytes.chunks_exact_mut(RGBA_BYTES) {
                px.copy_from_slice(&rgba);
            }
        } else {
            let bound = state.bound_framebuffer;
            let attachment = state.framebuffers.get(&bound).copied().flatten();
            if let Some(tex) = attachment.and_then(|a| state.textures.get_mut(&a)) {
                for px in tex.bytes.chunks_exact_mut(RGBA_BYTES) {
                    px.copy_from_slice(&rgba);
                }
            }
        }
    }

    fn create_buffer(&self) -> Result<BufferHandle> {
        let mut state = self.state.borrow_mut();
        state.call();
        let name = state.next_name();
        state.buffers.insert(name, Vec::new());
        Ok(BufferHandle(name))
    }

    fn delete_buffer(&self, buffer: BufferHandle) {
        let mut state = self.state.borrow_mut();
        state.call();
        state.buffers.remove(&buffer.0);
        if state.bound_buffer == buffer.0 {
            state.bound_buffer = 0;
        }
    }

    fn bind_array_buffer(&self, buffer: BufferHandle) {
        let mut state = self.state.borrow_mut();
        state.call();
        state.bound_buffer = buffer.0;
    }

    fn array_buffer_data(&self, data: &[u8]) {
        let mut state = self.state.borrow_mut();
        state.call();
        let bound = state.bound_buffer;
        if let Some(buf) = state.buffers.get_mut(&bound) {
            *buf = data.to_vec();
        }
    }

    fn enable_vertex_attrib(&self, index: u32) {
        let mut state = self.state.borrow_mut();
        state.call();
        state.enabled_attribs.insert(index);
    }

    fn disable_vertex_attrib(&self, index: u32) {
        let mut state = self.state.borrow_mut();
        state.call();
        state.enabled_attribs.remove(&index);
    }

    fn vertex_attrib_f32(&self, index: u32, size: i32, stride: i32, offset: i32) {
        let mut state = self.state.borrow_mut();
        state.call();
        let buffer = state.bound_buffer;
        state.attrib_pointers.insert(
            index,
            AttribPointer {
                buffer,
                size,
                stride,
                offset,
            },
        );
    }

    fn create_shader(&self, _stage: ShaderStage) -> Result<ShaderHandle> {
        let mut state = self.state.borrow_mut();
        state.call();
        let name = state.next_name();
        state.shaders.insert(name, SoftShader { compiled: false });
        Ok(ShaderHandle(name))
    }

    fn compile_shader(&self, shader: ShaderHandle, source: &str) -> bool {
        let mut state = self.state.borrow_mut();
        state.call();
        let compiled = !state.fail_shader_compile && !source.trim().is_empty();
        match state.shaders.get_mut(&shader.0) {
            Some(sh) => {
                sh.compiled = compiled;
                compiled
            }
            None => false,
        }
    }

    fn shader_info_log(&self, shader: ShaderHandle) -> String {
        let mut state = self.state.borrow_mut();
        state.call();
        match state.shaders.get(&shader.0) {
            Some(sh) if !sh.compiled => "0:1: software backend rejected shader".to_string(),
            _ => String::new(),
        }
    }

    fn delete_shader(&self, shader: ShaderHandle) {
        let mut state = self.state.borrow_mut();
        state.call();
        state.shaders.remove(&shader.0);
    }

    fn create_program(&self) -> Result<ProgramHandle> {
        let mut state = self.state.borrow_mut();
        state.call();
        let name = state.next_name();
        state.programs.insert(name, SoftProgram::default());
        Ok(ProgramHandle(name))
    }

    fn attach_shader(&self, program: ProgramHandle, shader: ShaderHandle) {
        let mut state = self.state.borrow_mut();
        state.call();
        if let Some(prog) = state.programs.get_mut(&program.0) {
            prog.shaders.push(shader.0);
        }
    }

    fn link_program(&self, program: ProgramHandle) -> bool {
        let mut state = self.state.borrow_mut();
        state.call();
        let Some(prog) = state.programs.get(&program.0) else {
            return false;
        };
        let stages_ok = prog.shaders.len() == 2
            && prog
                .shaders
                .iter()
                .all(|s| state.shaders.get(s).is_some_and(|sh| sh.compiled));
        let linked = stages_ok && !state.fail_program_link;
        if let Some(prog) = state.programs.get_mut(&program.0) {
            prog.linked = linked;
        }
        linked
    }

    fn program_info_log(&self, program: ProgramHandle) -> String {
        let mut state = self.state.borrow_mut();
        state.call();
        match state.programs.get(&program.0) {
            Some(prog) if !prog.linked => "software backend failed to link program".to_string(),
            _ => String::new(),
        }
    }

    fn delete_program(&self, program: ProgramHandle) {
        let mut state = self.state.borrow_mut();
        state.call();
        state.programs.remove(&program.0);
        if state.current_program == program.0 {
            state.current_program = 0;
        }
    }

    fn use_program(&self, program: ProgramHandle) {
        let mut state = self.state.borrow_mut();
        state.call();
        state.current_program = program.0;
    }

    fn attrib_location(&self, program: ProgramHandle, name: &str) -> Option<u32> {
        let mut state = self.state.borrow_mut();
        state.call();
        let linked = state.programs.get(&program.0).is_some_and(|p| p.linked);
        if !linked {
            return None;
        }
        ATTRIBUTES.iter().position(|a| *a == name).map(|i| i as u32)
    }

    fn uniform_location(&self, program: ProgramHandle, name: &str) -> Option<UniformLocation> {
        let mut state = self.state.borrow_mut();
        state.call();
        let linked = state.programs.get(&program.0).is_some_and(|p| p.linked);
        if !linked {
            return None;
        }
        UNIFORMS
            .iter()
            .position(|u| *u == name)
            .map(|i| UniformLocation(i as u32))
    }

    fn uniform_matrix4(&self, location: UniformLocation, matrix: &[f32; 16]) {
        let mut state = self.state.borrow_mut();
        state.call();
        let current = state.current_program;
        if let Some(prog) = state.programs.get_mut(&current) {
            if UNIFORMS.get(location.0 as usize) == Some(&"uMVPMatrix") {
                prog.matrix = Some(*matrix);
            }
        }
    }

    fn uniform_i32(&self, location: UniformLocation, value: i32) {
        let mut state = self.state.borrow_mut();
        state.call();
        let current = state.current_program;
        if let Some(prog) = state.programs.get_mut(&current) {
            if UNIFORMS.get(location.0 as usize) == Some(&"uTexture") {
                prog.sampler_unit = value;
            }
        }
    }

    fn draw_triangle_strip(&self, first: i32, count: i32) {
        let mut state = self.state.borrow_mut();
        state.call();
        state.draws += 1;
        if count == 4 && state.bound_framebuffer == 0 {
            state.rasterize_quad(first);
        }
    }
}
