use edgeview::{FramePipeline, GlowBackend, Pipeline, PipelineConfig, SoftwareGl};

/// Everything a host holds through its opaque context pointer.
pub(crate) struct Context {
    pub(crate) pipeline: Box<dyn FramePipeline>,
    pub(crate) backend: BackendKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BackendKind {
    Gl,
    Headless,
}

impl Context {
    pub(crate) fn with_gl(gl: GlowBackend, config: PipelineConfig) -> Self {
        Self {
            pipeline: Box::new(pipeline_or_default(gl, config)),
            backend: BackendKind::Gl,
        }
    }

    pub(crate) fn headless(config: PipelineConfig) -> Self {
        Self {
            pipeline: Box::new(pipeline_or_default(SoftwareGl::new(), config)),
            backend: BackendKind::Headless,
        }
    }
}

fn pipeline_or_default<G: edgeview::GlBackend>(gl: G, config: PipelineConfig) -> Pipeline<G> {
    let mut pipeline = Pipeline::new(gl);
    if let Err(e) = pipeline.set_config(config) {
        tracing::error!("Rejected pipeline config, using defaults: {e}");
    }
    pipeline
}
