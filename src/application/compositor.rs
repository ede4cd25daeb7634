//! Canvas compositing: scale, place, paste.

use image::RgbaImage;
use image::imageops::{self, FilterType};
use rand::Rng;

use crate::domain::entities::Canvas;
use crate::domain::errors::CompositeError;

/// Largest share of each canvas axis a pasted image may cover.
pub const FILL_RATIO: f64 = 0.4;

/// Outcome of a single paste, for logging and assertions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// Left edge of the pasted region.
    pub x: u32,
    /// Top edge of the pasted region.
    pub y: u32,
    /// Width after scaling.
    pub width: u32,
    /// Height after scaling.
    pub height: u32,
    /// Scale factor applied to the source.
    pub scale: f64,
}

/// Scales a source image by a random factor and pastes it at a random
/// position, always fully inside the canvas.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compositor;

impl Compositor {
    /// Creates a compositor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Upper bound for the scale factor so the paste covers at most
    /// [`FILL_RATIO`] of each canvas axis.
    #[must_use]
    pub fn max_scale(
        canvas_width: u32,
        canvas_height: u32,
        source_width: u32,
        source_height: u32,
    ) -> f64 {
        let width_bound = f64::from(canvas_width) * FILL_RATIO / f64::from(source_width);
        let height_bound = f64::from(canvas_height) * FILL_RATIO / f64::from(source_height);
        width_bound.min(height_bound)
    }

    /// Pastes `source` onto the canvas and appends `source_url` to its
    /// history.
    ///
    /// The scale factor is drawn uniformly from `[0, max_scale)` and the
    /// position uniformly over every offset that keeps the scaled image
    /// fully inside the canvas. Alpha is respected: transparent source
    /// pixels leave the canvas untouched.
    ///
    /// # Errors
    /// Returns [`CompositeError::SourceLargerThanBound`] when the scale
    /// bound is degenerate, before any resize work happens.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn composite<R: Rng>(
        self,
        canvas: &mut Canvas,
        source: &RgbaImage,
        source_url: &str,
        rng: &mut R,
    ) -> Result<Placement, CompositeError> {
        let (canvas_width, canvas_height) = (canvas.width(), canvas.height());
        let (source_width, source_height) = (source.width(), source.height());

        let max_scale = Self::max_scale(canvas_width, canvas_height, source_width, source_height);
        if !max_scale.is_finite() || max_scale <= 0.0 {
            return Err(CompositeError::SourceLargerThanBound {
                source_width,
                source_height,
                canvas_width,
                canvas_height,
            });
        }

        let scale = rng.random::<f64>() * max_scale;

        // A zero-size resize is not valid; the smallest draw still pastes
        // one pixel.
        let width = ((f64::from(source_width) * scale).floor() as u32).max(1);
        let height = ((f64::from(source_height) * scale).floor() as u32).max(1);

        let resized = imageops::resize(source, width, height, FilterType::Lanczos3);

        let x = rng.random_range(0..=canvas_width - width);
        let y = rng.random_range(0..=canvas_height - height);

        imageops::overlay(canvas.image_mut(), &resized, i64::from(x), i64::from(y));
        canvas.history_mut().append(source_url);

        Ok(Placement {
            x,
            y,
            width,
            height,
            scale,
        })
    }
}
