use thiserror::Error;

/// Errors that terminate a window stream.
///
/// Exhaustion is not represented here: a source that runs dry simply ends
/// the stream.
#[derive(Error, Debug)]
pub enum WindowError {
    #[error("Stream stalled: no observation for {idle_ms}ms (timeout {timeout_ms}ms)")]
    Stall { idle_ms: u64, timeout_ms: u64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Feature index {index} out of range for observation with {width} feature(s)")]
    SelectorOutOfRange { index: usize, width: usize },

    #[error("Malformed observation: {0}")]
    Shape(String),

    #[error("Observation shape changed mid-stream: expected {expected}, found {found}")]
    ShapeMismatch { expected: String, found: String },

    #[error("Source error: {0}")]
    Source(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WindowError {
    pub fn is_stall(&self) -> bool {
        matches!(self, WindowError::Stall { .. })
    }
}

pub type WindowResult<T> = std::result::Result<T, WindowError>;
