use std::time::{Duration, Instant};

use super::*;
use crate::common::test_utils::*;
use crate::filter::CannyConfig;
use crate::frame::PixelBuffer;
use crate::gpu::SoftwareGl;

fn pipeline() -> Pipeline<SoftwareGl> {
    let mut pipeline = Pipeline::new(SoftwareGl::new());
    pipeline.init();
    pipeline.resize(64, 64);
    pipeline
}

fn upload(pipeline: &Pipeline<SoftwareGl>, frame: &PixelBuffer) -> TextureHandle {
    pipeline
        .gl()
        .upload_texture(frame.width() as i32, frame.height() as i32, frame.bytes())
}

fn output(pipeline: &Pipeline<SoftwareGl>) -> PixelBuffer {
    let gl = pipeline.gl();
    let texture = pipeline.output_texture();
    let (w, h) = gl.texture_size(texture).unwrap();
    PixelBuffer::from_rgba(w as u32, h as u32, gl.texture_pixels(texture).unwrap()).unwrap()
}

#[test]
fn solid_gray_frame_produces_no_edges() {
    let mut pipeline = pipeline();
    let input = upload(&pipeline, &solid_gray(64, 64, 128));

    pipeline.process_and_render(input, 64, 64);

    let output = output(&pipeline);
    assert_eq!(count_lit(&output), 0);
    assert_eq!(pipeline.gl().screen_pixel(10, 10), Some([0, 0, 0, 255]));
    assert_eq!(pipeline.stats().frames_processed(), 1);
}

#[test]
fn vertical_boundary_produces_edge_band() {
    let mut pipeline = pipeline();
    let input = upload(&pipeline, &vertical_step(64, 64, 32, 0, 255));

    pipeline.process_and_render(input, 64, 64);

    let columns = edge_columns(&output(&pipeline));
    assert!(!columns.is_empty());
    assert!(columns.iter().all(|c| (30..=33).contains(c)), "{columns:?}");

    let gl = pipeline.gl();
    assert_eq!(gl.screen_pixel(31, 20), Some([255, 255, 255, 255]));
    assert_eq!(gl.screen_pixel(10, 20), Some([0, 0, 0, 255]));
    assert_eq!(gl.screen_pixel(50, 20), Some([0, 0, 0, 255]));
}

#[test]
fn process_before_init_is_ignored() {
    let mut pipeline = Pipeline::new(SoftwareGl::new());
    let input = upload(&pipeline, &solid_gray(8, 8, 1));
    let calls = pipeline.gl().call_count();

    pipeline.process_and_render(input, 8, 8);
    pipeline.render_only();
    pipeline.resize(8, 8);

    assert_eq!(pipeline.gl().call_count(), calls);
    assert!(pipeline.output_texture().is_none());
    assert_eq!(pipeline.stats().frames_rejected(), 0);
}

#[test]
fn init_is_idempotent() {
    let mut pipeline = pipeline();
    let programs = pipeline.gl().live_programs();

    pipeline.init();
    pipeline.init();

    assert!(pipeline.is_initialized());
    assert_eq!(pipeline.gl().live_programs(), programs);
}

#[test]
fn invalid_dimensions_keep_previous_output() {
    let mut pipeline = pipeline();
    let input = upload(&pipeline, &vertical_step(64, 64, 32, 0, 255));
    pipeline.process_and_render(input, 64, 64);
    let texture = pipeline.output_texture();

    pipeline.process_and_render(input, 0, 64);
    pipeline.process_and_render(input, 64, -1);

    assert_eq!(pipeline.output_texture(), texture);
    assert_eq!(pipeline.stats().frames_rejected(), 2);
    assert_eq!(pipeline.stats().frames_processed(), 1);
    assert_eq!(pipeline.gl().screen_pixel(31, 5), Some([255, 255, 255, 255]));
}

#[test]
fn render_only_redraws_last_output() {
    let mut pipeline = pipeline();
    let input = upload(&pipeline, &vertical_step(64, 64, 32, 0, 255));
    pipeline.process_and_render(input, 64, 64);
    let draws = pipeline.gl().draw_count();

    pipeline.render_only();

    assert_eq!(pipeline.gl().draw_count(), draws + 1);
    assert_eq!(pipeline.gl().screen_pixel(31, 40), Some([255, 255, 255, 255]));
    assert_eq!(pipeline.stats().frames_processed(), 1);
}

#[test]
fn release_twice_leaves_nothing_allocated() {
    let mut pipeline = pipeline();
    let input = upload(&pipeline, &solid_gray(64, 64, 50));
    pipeline.process_and_render(input, 64, 64);

    for _ in 0..2 {
        pipeline.release();

        let gl = pipeline.gl();
        assert!(!pipeline.is_initialized());
        assert!(pipeline.output_texture().is_none());
        assert_eq!(gl.live_framebuffers(), 0);
        assert_eq!(gl.live_programs(), 0);
        assert_eq!(gl.live_shaders(), 0);
        assert_eq!(gl.live_buffers(), 0);
        // Only the caller-owned input texture survives.
        assert_eq!(gl.live_textures(), 1);
    }
}

#[test]
fn reinit_after_release_works() {
    let mut pipeline = pipeline();
    pipeline.release();
    pipeline.init();
    pipeline.resize(16, 16);

    let input = upload(&pipeline, &solid_gray(16, 16, 0));
    pipeline.process_and_render(input, 16, 16);

    assert!(pipeline.output_texture().is_some());
}

#[test]
fn broken_shaders_still_process_frames() {
    let gl = SoftwareGl::new();
    gl.set_fail_shader_compile(true);
    let mut pipeline = Pipeline::new(gl);
    pipeline.init();

    let input = upload(&pipeline, &vertical_step(32, 32, 16, 0, 255));
    pipeline.process_and_render(input, 32, 32);

    assert!(!pipeline.renderer().unwrap().is_functional());
    assert_eq!(pipeline.gl().draw_count(), 0);
    assert_eq!(edge_columns(&output(&pipeline)), vec![15]);
}

#[test]
fn config_thresholds_reach_the_filter() {
    let config = PipelineConfig {
        canny: CannyConfig {
            low_threshold: 10.0,
            high_threshold: 100.0,
            l2_gradient: false,
        },
        ..Default::default()
    };
    let mut pipeline = Pipeline::with_config(SoftwareGl::new(), config).unwrap();
    pipeline.init();

    let input = upload(&pipeline, &vertical_step(32, 32, 16, 100, 130));
    pipeline.process_and_render(input, 32, 32);

    assert_eq!(edge_columns(&output(&pipeline)), vec![15]);
}

#[test]
fn set_config_updates_running_filter() {
    let mut pipeline = pipeline();
    let input = upload(&pipeline, &vertical_step(64, 64, 32, 100, 130));

    pipeline.process_and_render(input, 64, 64);
    assert_eq!(count_lit(&output(&pipeline)), 0);

    let mut config = PipelineConfig::default();
    config.canny.high_threshold = 100.0;
    pipeline.set_config(config).unwrap();
    pipeline.process_and_render(input, 64, 64);
    assert_eq!(edge_columns(&output(&pipeline)), vec![31]);

    let invalid = PipelineConfig {
        clear_color: [0.0, 0.0, 0.0, -1.0],
        ..Default::default()
    };
    assert!(pipeline.set_config(invalid).is_err());
    assert_eq!(pipeline.config().canny.high_threshold, 100.0);
}

#[test]
fn object_safe_trait_drives_pipeline() {
    let mut boxed: Box<dyn FramePipeline> = Box::new(Pipeline::new(SoftwareGl::new()));
    assert!(!boxed.is_initialized());

    boxed.init();
    boxed.resize(8, 8);
    boxed.process_and_render(TextureHandle::NONE, 0, 0);
    boxed.render_only();

    let snapshot = boxed.stats_snapshot();
    assert_eq!(snapshot.frames_rejected, 1);
    assert_eq!(snapshot.frames_processed, 0);

    boxed.release();
    assert!(!boxed.is_initialized());
}

#[test]
fn drop_after_explicit_release_is_quiet() {
    let mut pipeline = pipeline();
    pipeline.release();
    drop(pipeline);
}

#[test]
fn display_viewport_survives_frame_processing() {
    let mut pipeline = Pipeline::new(SoftwareGl::new());
    pipeline.init();
    pipeline.resize(128, 96);

    let input = upload(&pipeline, &vertical_step(32, 32, 16, 0, 255));
    pipeline.process_and_render(input, 32, 32);

    assert_eq!(pipeline.gl().current_viewport(), [0, 0, 128, 96]);
    // Edge column 15 of 32 stretches to screen columns 60..64.
    assert_eq!(pipeline.gl().screen_pixel(61, 50), Some([255, 255, 255, 255]));
    assert_eq!(pipeline.gl().screen_pixel(20, 50), Some([0, 0, 0, 255]));
}

#[test]
fn config_validation() {
    assert!(PipelineConfig::default().validate().is_ok());

    let bad_color = PipelineConfig {
        clear_color: [2.0, 0.0, 0.0, 1.0],
        ..Default::default()
    };
    assert!(matches!(bad_color.validate(), Err(Error::InvalidConfig(_))));
    assert!(Pipeline::with_config(SoftwareGl::new(), bad_color).is_err());
}

#[test]
fn config_json_fills_missing_fields() {
    let config = PipelineConfig::from_json(r#"{ "canny": { "high_threshold": 120.0 } }"#).unwrap();
    assert_eq!(config.canny.low_threshold, 50.0);
    assert_eq!(config.canny.high_threshold, 120.0);
    assert_eq!(config.clear_color, [0.0, 0.0, 0.0, 1.0]);

    let round = PipelineConfig::from_json(&config.to_json().unwrap()).unwrap();
    assert_eq!(round, config);

    assert!(PipelineConfig::from_json("{ not json").is_err());
    assert!(PipelineConfig::from_json(r#"{ "canny": { "low_threshold": 200.0 } }"#).is_err());
}

#[test]
fn stats_window_counts_recent_frames() {
    let size = FrameSize::new(640, 480).unwrap();
    let start = Instant::now();
    let mut stats = FrameStats::default();

    for i in 0..30 {
        let at = start + Duration::from_millis(i * 33);
        stats.record_frame_at(at, size, Duration::from_millis(4));
    }
    assert_eq!(stats.fps(), 30.0);

    stats.record_frame_at(start + Duration::from_millis(2500), size, Duration::from_millis(5));
    assert_eq!(stats.fps(), 1.0);
    assert_eq!(stats.frames_processed(), 31);

    let snapshot = stats.snapshot();
    assert_eq!((snapshot.last_width, snapshot.last_height), (640, 480));
    assert_eq!(snapshot.last_process_micros, 5000);

    stats.reset();
    assert_eq!(stats.snapshot(), StatsSnapshot::default());
}
