use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid frame dimensions: {width} x {height}")]
    InvalidDimensions { width: i32, height: i32 },

    #[error("Pipeline not initialized")]
    NotInitialized,

    #[error("GL object creation failed: {0}")]
    GlCreate(String),

    #[error("{stage} shader compilation failed: {log}")]
    ShaderCompile { stage: &'static str, log: String },

    #[error("Shader program linking failed: {0}")]
    ProgramLink(String),

    #[error("Filter '{filter}' changed frame shape from {expected} to {actual}")]
    FilterShapeMismatch {
        filter: String,
        expected: String,
        actual: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Pixel data length {actual} does not match expected {expected}")]
    PixelDataLength { expected: usize, actual: usize },
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
