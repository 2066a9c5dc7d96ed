//! Edgeview - camera frame edge detection on a GL ES 2 context.
//!
//! Each frame takes a GPU texture through three stages:
//! - [`FilterEngine`] reads the texture back to the CPU
//! - a [`FrameFilter`] (Canny by default) transforms the pixels
//! - the result is uploaded into a texture owned by a [`FrameStore`] and
//!   [`DisplayRenderer`] draws it as a full-viewport quad
//!
//! [`Pipeline`] bundles these behind the five host entry points.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use edgeview::prelude::*;
//!
//! let gl = unsafe { GlowBackend::from_loader(|name| loader.get_proc_address(name)) };
//! let mut pipeline = Pipeline::new(gl);
//! pipeline.init();
//! pipeline.resize(1080, 1920);
//!
//! // every frame, with the camera texture
//! pipeline.process_and_render(camera_texture, 1280, 720);
//! ```

pub(crate) mod common;
pub mod engine;
pub mod filter;
pub mod frame;
pub mod frame_store;
pub mod gpu;
pub mod pipeline;
pub mod renderer;

pub mod prelude;

// ============================================================================
// Errors
// ============================================================================

pub use common::{Error, Result};

// ============================================================================
// GPU backend
// ============================================================================

pub use gpu::{
    BufferHandle, FramebufferHandle, GlBackend, GlowBackend, ProgramHandle, ShaderHandle,
    ShaderStage, SoftwareGl, TextureHandle, UniformLocation,
};

// ============================================================================
// Frames and output storage
// ============================================================================

pub use frame::{FrameSize, PixelBuffer, RGBA_BYTES};
pub use frame_store::{FrameStore, RenderTarget};

// ============================================================================
// Processing
// ============================================================================

pub use engine::FilterEngine;
pub use filter::{
    luma, CannyConfig, CannyFilter, FrameFilter, GrayscaleFilter, PassthroughFilter,
};

// ============================================================================
// Display
// ============================================================================

pub use renderer::{DisplayRenderer, QuadVertex, FULLSCREEN_QUAD};

// ============================================================================
// Host entry points
// ============================================================================

pub use pipeline::{FramePipeline, FrameStats, Pipeline, PipelineConfig, StatsSnapshot};
