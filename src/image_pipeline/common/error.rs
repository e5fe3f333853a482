use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid image dimensions: width={0}, height={1}")]
    InvalidDimensions(usize, usize),

    #[error("Buffer size mismatch: expected {expected} elements, got {got}")]
    BufferSizeMismatch { expected: usize, got: usize },

    #[error("Unsupported CFA layout: {0}")]
    UnsupportedCfa(String),

    #[error("Malformed illuminant model: {0}")]
    ModelFormat(String),

    #[error("Debayer failed: {0}")]
    Debayer(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
