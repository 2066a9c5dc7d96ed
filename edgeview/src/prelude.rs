//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use edgeview::prelude::*;
//! ```

pub use crate::{Error, Result};

// Backend
pub use crate::{GlBackend, GlowBackend, SoftwareGl, TextureHandle};

// Frames
pub use crate::{FrameSize, PixelBuffer};

// Filters
pub use crate::{CannyConfig, CannyFilter, FrameFilter};

// Pipeline
pub use crate::{FramePipeline, Pipeline, PipelineConfig, StatsSnapshot};
