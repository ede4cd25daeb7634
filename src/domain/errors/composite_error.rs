//! Compositing error types.

use thiserror::Error;

/// Errors from the placement and paste stage.
#[derive(Debug, Error)]
pub enum CompositeError {
    /// The scale bound left no room to place the source on the canvas.
    /// Raised before any resize work happens.
    #[error(
        "cannot place a {source_width}x{source_height} image on a {canvas_width}x{canvas_height} canvas"
    )]
    SourceLargerThanBound {
        /// Source image width.
        source_width: u32,
        /// Source image height.
        source_height: u32,
        /// Canvas width.
        canvas_width: u32,
        /// Canvas height.
        canvas_height: u32,
    },
}
