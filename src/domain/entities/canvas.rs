//! Per-guild collage canvas.

use image::{Rgba, RgbaImage};

use super::{GuildId, HistoryLog};

/// Default canvas width in pixels.
pub const DEFAULT_CANVAS_WIDTH: u32 = 1920;
/// Default canvas height in pixels.
pub const DEFAULT_CANVAS_HEIGHT: u32 = 1080;

/// A guild's collage canvas: the RGBA raster plus the ordered log of
/// sources composited onto it.
///
/// Dimensions are fixed when the canvas is first created and never change
/// afterwards, even if the configured size does.
#[derive(Clone)]
pub struct Canvas {
    guild_id: GuildId,
    image: RgbaImage,
    history: HistoryLog,
}

impl Canvas {
    /// Creates a fully transparent canvas with an empty history.
    #[must_use]
    pub fn blank(guild_id: GuildId, width: u32, height: u32) -> Self {
        Self {
            guild_id,
            image: RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0])),
            history: HistoryLog::new(),
        }
    }

    /// Reassembles a canvas from a loaded raster and history.
    #[must_use]
    pub fn from_parts(guild_id: GuildId, image: RgbaImage, history: HistoryLog) -> Self {
        Self {
            guild_id,
            image,
            history,
        }
    }

    /// The guild this canvas belongs to.
    #[must_use]
    pub const fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    /// Canvas width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    /// Canvas height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// The raster.
    #[must_use]
    pub const fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Mutable access to the raster for compositing.
    pub fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    /// The source history.
    #[must_use]
    pub const fn history(&self) -> &HistoryLog {
        &self.history
    }

    /// Mutable access to the history.
    pub fn history_mut(&mut self) -> &mut HistoryLog {
        &mut self.history
    }

    /// Encodes the raster as PNG bytes.
    ///
    /// # Errors
    /// Returns an error if PNG encoding fails.
    pub fn encode_png(&self) -> Result<Vec<u8>, image::ImageError> {
        let mut bytes = Vec::new();
        self.image
            .write_to(&mut std::io::Cursor::new(&mut bytes), image::ImageFormat::Png)?;
        Ok(bytes)
    }
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("guild_id", &self.guild_id)
            .field("width", &self.width())
            .field("height", &self.height())
            .field("history_len", &self.history.len())
            .finish_non_exhaustive()
    }
}
