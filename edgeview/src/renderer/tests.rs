use super::*;
use crate::gpu::SoftwareGl;

const BLACK: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

fn checker_texture(gl: &SoftwareGl, width: i32, height: i32) -> TextureHandle {
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let v = if (x + y) % 2 == 0 { 255 } else { 0 };
            pixels.extend_from_slice(&[v, (y * 10) as u8, 0, 255]);
        }
    }
    gl.upload_texture(width, height, &pixels)
}

#[test]
fn builds_program_and_vertex_buffer() {
    let gl = SoftwareGl::new();
    let renderer = DisplayRenderer::new(&gl);

    assert!(renderer.is_functional());
    assert_eq!(gl.live_programs(), 1);
    assert_eq!(gl.live_shaders(), 2);
    assert_eq!(gl.live_buffers(), 1);
    assert_eq!(renderer.mvp(), Mat4::IDENTITY);
}

#[test]
fn quad_vertex_layout_is_tightly_packed() {
    assert_eq!(QuadVertex::STRIDE, 20);
    assert_eq!(QuadVertex::TEX_COORD_OFFSET, 12);
    assert_eq!(bytemuck::cast_slice::<_, u8>(&FULLSCREEN_QUAD).len(), 80);
}

#[test]
fn compile_failure_leaves_renderer_inert() {
    let gl = SoftwareGl::new();
    gl.set_fail_shader_compile(true);
    let renderer = DisplayRenderer::new(&gl);

    assert!(!renderer.is_functional());
    assert_eq!(gl.live_shaders(), 0);
    assert_eq!(gl.live_programs(), 0);

    let texture = checker_texture(&gl, 4, 4);
    let calls = gl.call_count();
    renderer.render(&gl, texture, BLACK);
    assert_eq!(gl.call_count(), calls);
    assert_eq!(gl.draw_count(), 0);
}

#[test]
fn link_failure_leaves_renderer_inert() {
    let gl = SoftwareGl::new();
    gl.set_fail_program_link(true);
    let renderer = DisplayRenderer::new(&gl);

    assert!(!renderer.is_functional());
    assert_eq!(gl.live_shaders(), 0);
    assert_eq!(gl.live_programs(), 0);
    assert_eq!(gl.live_buffers(), 0);

    renderer.render(&gl, TextureHandle::NONE, BLACK);
    assert_eq!(gl.draw_count(), 0);
}

#[test]
fn render_uploads_identity_matrix() {
    let gl = SoftwareGl::new();
    let mut renderer = DisplayRenderer::new(&gl);
    renderer.resize(&gl, 4, 4);
    let texture = checker_texture(&gl, 4, 4);

    renderer.render(&gl, texture, BLACK);

    let program = renderer.program.as_ref().unwrap().program;
    assert_eq!(gl.program_matrix(program), Some(Mat4::IDENTITY.to_cols_array()));
    assert_eq!(gl.draw_count(), 1);
}

#[test]
fn texture_fills_viewport_with_top_row_first() {
    let gl = SoftwareGl::new();
    let mut renderer = DisplayRenderer::new(&gl);
    renderer.resize(&gl, 4, 4);
    let texture = checker_texture(&gl, 4, 4);
    let source = gl.texture_pixels(texture).unwrap();

    renderer.render(&gl, texture, BLACK);

    for y in 0..4 {
        for x in 0..4 {
            let row = 3 - y;
            let i = ((row * 4 + x) * 4) as usize;
            assert_eq!(
                gl.screen_pixel(x, y),
                Some([source[i], source[i + 1], source[i + 2], source[i + 3]]),
                "screen ({x}, {y})"
            );
        }
    }
}

#[test]
fn render_restores_state() {
    let gl = SoftwareGl::new();
    let mut renderer = DisplayRenderer::new(&gl);
    renderer.resize(&gl, 2, 2);
    let texture = checker_texture(&gl, 2, 2);

    renderer.render(&gl, texture, BLACK);

    assert!(gl.bound_texture().is_none());
    assert_eq!(gl.enabled_attribute_count(), 0);
}

#[test]
fn none_texture_draws_black() {
    let gl = SoftwareGl::new();
    let mut renderer = DisplayRenderer::new(&gl);
    renderer.resize(&gl, 3, 3);

    renderer.render(&gl, TextureHandle::NONE, [1.0, 1.0, 1.0, 1.0]);

    assert_eq!(gl.screen_pixel(1, 1), Some([0, 0, 0, 255]));
}

#[test]
fn resize_sets_viewport() {
    let gl = SoftwareGl::new();
    let mut renderer = DisplayRenderer::new(&gl);
    renderer.resize(&gl, 1080, 1920);

    assert_eq!(gl.current_viewport(), [0, 0, 1080, 1920]);
    assert_eq!(renderer.viewport(), Some((1080, 1920)));
}

#[test]
fn release_is_idempotent() {
    let gl = SoftwareGl::new();
    let mut renderer = DisplayRenderer::new(&gl);

    renderer.release(&gl);
    let calls = gl.call_count();
    renderer.release(&gl);

    assert_eq!(gl.call_count(), calls);
    assert!(!renderer.is_functional());
    assert_eq!(gl.live_programs(), 0);
    assert_eq!(gl.live_shaders(), 0);
    assert_eq!(gl.live_buffers(), 0);
}
