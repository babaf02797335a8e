//! Error types for glycotree-viz.

use std::path::PathBuf;

/// Errors from chart rendering.
#[derive(Debug, thiserror::Error)]
pub enum VizError {
    /// Returned when the drawing backend fails (layout, encoding or file write).
    #[error("cannot render {path}: {message}")]
    Render {
        /// Target file.
        path: PathBuf,
        /// Backend error text.
        message: String,
    },

    /// Returned when there is nothing to draw.
    #[error("nothing to plot: {what} is empty")]
    EmptyInput {
        /// Which input was empty.
        what: &'static str,
    },
}
