//! The unified error type for layout driving and the command line front end.

use quire_layout::LayoutError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuireError {
    #[error("Layout error: {0}")]
    Layout(#[from] LayoutError),
    #[error("Measuring block '{block_id}' failed: {message}")]
    Measure { block_id: String, message: String },
    #[error("Measurer returned a {actual} measure for {expected} block '{block_id}'")]
    MeasureKind {
        block_id: String,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("Pass '{0}' failed: {1}")]
    Pass(String, String),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl QuireError {
    pub fn measure(block_id: impl Into<String>, message: impl Into<String>) -> Self {
        QuireError::Measure {
            block_id: block_id.into(),
            message: message.into(),
        }
    }
}
