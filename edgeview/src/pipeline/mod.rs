//! Host-facing context object tying the engine and the renderer together.
//!
//! One [`Pipeline`] exists per GL context. Every entry point is infallible
//! from the host's point of view: failures are logged and the call returns.
//! All calls must come from the thread that owns the GL context.

mod config;
mod stats;
#[cfg(test)]
mod tests;

pub use config::PipelineConfig;
pub use stats::{FrameStats, StatsSnapshot};

use std::time::Instant;

use crate::common::{Error, Result};
use crate::engine::FilterEngine;
use crate::filter::CannyFilter;
use crate::frame::FrameSize;
use crate::gpu::{GlBackend, TextureHandle};
use crate::renderer::DisplayRenderer;

/// The five host entry points, object safe so differently-backed pipelines
/// can sit behind one pointer type.
pub trait FramePipeline {
    fn init(&mut self);
    fn resize(&mut self, width: i32, height: i32);
    fn process_and_render(&mut self, input: TextureHandle, width: i32, height: i32);
    fn render_only(&mut self);
    fn release(&mut self);

    fn is_initialized(&self) -> bool;
    fn stats_snapshot(&self) -> StatsSnapshot;
}

#[derive(Debug)]
pub struct Pipeline<G: GlBackend> {
    gl: G,
    config: PipelineConfig,
    engine: Option<FilterEngine>,
    renderer: Option<DisplayRenderer>,
    stats: FrameStats,
}

impl<G: GlBackend> Pipeline<G> {
    pub fn new(gl: G) -> Self {
        Self {
            gl,
            config: PipelineConfig::default(),
            engine: None,
            renderer: None,
            stats: FrameStats::default(),
        }
    }

    pub fn with_config(gl: G, config: PipelineConfig) -> Result<Self> {
        let mut pipeline = Self::new(gl);
        pipeline.set_config(config)?;
        Ok(pipeline)
    }

    /// Validates and applies `config`. A running engine gets a fresh filter
    /// with the new thresholds.
    pub fn set_config(&mut self, config: PipelineConfig) -> Result<()> {
        config.validate()?;

        if let Some(engine) = self.engine.as_mut() {
            engine.set_filter(CannyFilter::new(config.canny));
        }
        self.config = config;

        Ok(())
    }

    pub fn gl(&self) -> &G {
        &self.gl
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn engine(&self) -> Option<&FilterEngine> {
        self.engine.as_ref()
    }

    pub fn engine_mut(&mut self) -> Option<&mut FilterEngine> {
        self.engine.as_mut()
    }

    pub fn renderer(&self) -> Option<&DisplayRenderer> {
        self.renderer.as_ref()
    }

    pub fn is_initialized(&self) -> bool {
        self.engine.is_some() && self.renderer.is_some()
    }

    /// Last produced output texture, NONE before the first processed frame.
    pub fn output_texture(&self) -> TextureHandle {
        self.engine
            .as_ref()
            .map_or(TextureHandle::NONE, |e| e.output_texture())
    }

    /// Creates the engine and the renderer if absent.
    pub fn init(&mut self) {
        if self.engine.is_none() {
            self.engine = Some(FilterEngine::new(CannyFilter::new(self.config.canny)));
        }
        if self.renderer.is_none() {
            self.renderer = Some(DisplayRenderer::new(&self.gl));
        }

        tracing::info!("Pipeline initialized");
    }

    pub fn resize(&mut self, width: i32, height: i32) {
        let Some(renderer) = self.renderer.as_mut() else {
            tracing::debug!("Resize to {width}x{height} ignored, renderer absent");
            return;
        };

        renderer.resize(&self.gl, width, height);
        tracing::info!("Viewport resized to {width}x{height}");
    }

    /// Filters `input` into the output texture and draws it.
    ///
    /// A rejected frame still redraws whatever output the previous frame left.
    pub fn process_and_render(&mut self, input: TextureHandle, width: i32, height: i32) {
        let (Some(engine), Some(renderer)) = (self.engine.as_mut(), self.renderer.as_ref()) else {
            tracing::error!("process_and_render: {}", Error::NotInitialized);
            return;
        };

        let started = Instant::now();
        match engine.process_frame(&self.gl, input, width, height) {
            Ok(()) => {
                if let Ok(size) = FrameSize::new(width, height) {
                    self.stats.record_frame(size, started.elapsed());
                }
            }
            Err(e) => {
                self.stats.record_rejected();
                tracing::error!("Frame rejected: {e}");
            }
        }

        renderer.render(&self.gl, engine.output_texture(), self.config.clear_color);
    }

    /// Redraws the last output texture without processing a new frame.
    pub fn render_only(&mut self) {
        let Some(renderer) = self.renderer.as_ref() else {
            return;
        };

        renderer.render(&self.gl, self.output_texture(), self.config.clear_color);
    }

    /// Frees every GPU resource the pipeline owns. Safe to repeat.
    pub fn release(&mut self) {
        let had_resources = self.engine.is_some() || self.renderer.is_some();

        if let Some(mut engine) = self.engine.take() {
            engine.release(&self.gl);
        }
        if let Some(mut renderer) = self.renderer.take() {
            renderer.release(&self.gl);
        }

        if had_resources {
            tracing::info!("Pipeline released");
        }
    }
}

impl<G: GlBackend> Drop for Pipeline<G> {
    fn drop(&mut self) {
        self.release();
    }
}

impl<G: GlBackend> FramePipeline for Pipeline<G> {
    fn init(&mut self) {
        Pipeline::init(self);
    }

    fn resize(&mut self, width: i32, height: i32) {
        Pipeline::resize(self, width, height);
    }

    fn process_and_render(&mut self, input: TextureHandle, width: i32, height: i32) {
        Pipeline::process_and_render(self, input, width, height);
    }

    fn render_only(&mut self) {
        Pipeline::render_only(self);
    }

    fn release(&mut self) {
        Pipeline::release(self);
    }

    fn is_initialized(&self) -> bool {
        Pipeline::is_initialized(self)
    }

    fn stats_snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}
