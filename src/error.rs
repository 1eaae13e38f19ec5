//! Error types for a4-draft.

use std::io;
use thiserror::Error;

use crate::controller::OperationKind;

/// Result type alias for a4-draft operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// The measurement surface could not report a height.
    #[error("Measurement error: {0}")]
    Measurement(String),

    /// The layout engine rejected the box tree.
    #[error("Layout error: {0}")]
    Layout(String),

    /// Font bytes could not be parsed.
    #[error("Font error: {0}")]
    Font(String),

    /// Rendering the preview to a bitmap failed.
    #[error("Rasterization error: {0}")]
    Rasterization(String),

    /// Placing the bitmap on PDF pages or encoding the PDF failed.
    #[error("PDF composition error: {0}")]
    Composition(String),

    /// The key-value store could not be read or written.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Another command is still running.
    #[error("Busy: {0} in progress")]
    Busy(OperationKind),

    /// Invalid configuration.
    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
