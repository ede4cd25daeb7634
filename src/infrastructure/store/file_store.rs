//! File-backed canvas store.
//!
//! Layout under the data directory, per guild: `{guild}_canvas.png` holds
//! the current raster snapshot and `{guild}_images.txt` the append-only
//! source log, one URL per line.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::domain::entities::{Canvas, GuildId, HistoryLog};
use crate::domain::errors::StoreError;
use crate::domain::ports::{CanvasStorePort, ImageFetchPort};

/// File-backed store: one PNG snapshot and one history log per guild.
///
/// The snapshot is the source of truth. When it is missing or unreadable
/// but a history exists, the store rebuilds a degraded stand-in from the
/// most recent history entry rather than silently discarding the guild's
/// record.
pub struct FileCanvasStore {
    dir: PathBuf,
    width: u32,
    height: u32,
    fetcher: Arc<dyn ImageFetchPort>,
}

impl FileCanvasStore {
    /// Creates a store rooted at `dir`, creating canvases of the given
    /// size for new guilds.
    pub fn new(
        dir: impl Into<PathBuf>,
        width: u32,
        height: u32,
        fetcher: Arc<dyn ImageFetchPort>,
    ) -> Self {
        Self {
            dir: dir.into(),
            width,
            height,
            fetcher,
        }
    }

    fn snapshot_path(&self, guild_id: GuildId) -> PathBuf {
        self.dir.join(format!("{guild_id}_canvas.png"))
    }

    fn history_path(&self, guild_id: GuildId) -> PathBuf {
        self.dir.join(format!("{guild_id}_images.txt"))
    }

    async fn read_history(&self, guild_id: GuildId) -> Result<HistoryLog, StoreError> {
        match tokio::fs::read_to_string(self.history_path(guild_id)).await {
            Ok(content) => Ok(HistoryLog::parse(&content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HistoryLog::new()),
            Err(e) => Err(StoreError::io(format!("failed to read history: {e}"))),
        }
    }

    /// Reads and decodes the snapshot. An unreadable snapshot is treated
    /// as missing so recovery can take over; only filesystem errors
    /// propagate.
    async fn read_snapshot(&self, guild_id: GuildId) -> Result<Option<RgbaImage>, StoreError> {
        let bytes = match tokio::fs::read(self.snapshot_path(guild_id)).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(format!("failed to read snapshot: {e}"))),
        };

        let decoded = tokio::task::spawn_blocking(move || image::load_from_memory(&bytes))
            .await
            .map_err(|e| StoreError::decode(format!("decode task failed: {e}")))?;

        match decoded {
            Ok(img) => Ok(Some(img.to_rgba8())),
            Err(e) => {
                warn!(guild = %guild_id, error = %e, "Snapshot unreadable, will recover from history");
                Ok(None)
            }
        }
    }

    /// Rebuilds a stand-in canvas from the most recent history entry.
    ///
    /// Only the last entry is replayed; earlier placements are gone. If
    /// even that fetch fails, the canvas starts blank but the history is
    /// kept intact.
    async fn recover_from_history(&self, guild_id: GuildId, history: HistoryLog) -> Canvas {
        let blank = || RgbaImage::from_pixel(self.width, self.height, Rgba([0, 0, 0, 0]));

        let Some(last) = history.last() else {
            return Canvas::from_parts(guild_id, blank(), history);
        };

        info!(guild = %guild_id, source = %last, "Recovering canvas from most recent history entry");
        match self.fetcher.fetch(last).await {
            Ok(image) => {
                let raster = center_on_blank(self.width, self.height, &image);
                Canvas::from_parts(guild_id, raster, history)
            }
            Err(e) => {
                warn!(guild = %guild_id, error = %e, "Recovery fetch failed, starting from a blank canvas");
                Canvas::from_parts(guild_id, blank(), history)
            }
        }
    }
}

/// Draws `image` centered on a blank canvas, downscaling only when it
/// exceeds the canvas.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn center_on_blank(width: u32, height: u32, image: &RgbaImage) -> RgbaImage {
    let mut base = RgbaImage::from_pixel(width, height, Rgba([0, 0, 0, 0]));
    let (source_width, source_height) = image.dimensions();
    if source_width == 0 || source_height == 0 || width == 0 || height == 0 {
        return base;
    }

    let scale = (f64::from(width) / f64::from(source_width))
        .min(f64::from(height) / f64::from(source_height))
        .min(1.0);

    let resized;
    let top: &RgbaImage = if scale < 1.0 {
        let w = ((f64::from(source_width) * scale).floor() as u32).max(1);
        let h = ((f64::from(source_height) * scale).floor() as u32).max(1);
        resized = imageops::resize(image, w, h, FilterType::Lanczos3);
        &resized
    } else {
        image
    };

    let x = (width - top.width()) / 2;
    let y = (height - top.height()) / 2;
    imageops::overlay(&mut base, top, i64::from(x), i64::from(y));
    base
}

/// Encodes the raster and atomically replaces the snapshot file.
fn write_snapshot(dir: &Path, path: &Path, raster: &RgbaImage) -> Result<(), StoreError> {
    let mut png = Vec::new();
    raster
        .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
        .map_err(|e| StoreError::encode(e.to_string()))?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)
        .map_err(|e| StoreError::io(format!("failed to create temp snapshot: {e}")))?;
    tmp.write_all(&png)
        .map_err(|e| StoreError::io(format!("failed to write snapshot: {e}")))?;
    tmp.persist(path)
        .map_err(|e| StoreError::io(format!("failed to replace snapshot: {}", e.error)))?;
    Ok(())
}

#[async_trait]
impl CanvasStorePort for FileCanvasStore {
    async fn load_or_create(&self, guild_id: GuildId) -> Result<Canvas, StoreError> {
        let history = self.read_history(guild_id).await?;

        if let Some(image) = self.read_snapshot(guild_id).await? {
            debug!(guild = %guild_id, entries = history.len(), "Loaded canvas snapshot");
            return Ok(Canvas::from_parts(guild_id, image, history));
        }

        if !history.is_empty() {
            return Ok(self.recover_from_history(guild_id, history).await);
        }

        info!(guild = %guild_id, width = self.width, height = self.height, "Generating canvas");
        Ok(Canvas::blank(guild_id, self.width, self.height))
    }

    async fn save(&self, canvas: &mut Canvas) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| StoreError::io(format!("failed to create data dir: {e}")))?;

        // Snapshot first: if the raster write fails, no history entry is
        // recorded and the request is reported as failed.
        let dir = self.dir.clone();
        let path = self.snapshot_path(canvas.guild_id());
        let raster = canvas.image().clone();
        tokio::task::spawn_blocking(move || write_snapshot(&dir, &path, &raster))
            .await
            .map_err(|e| StoreError::io(format!("snapshot task failed: {e}")))??;

        let pending = canvas.history().pending();
        if !pending.is_empty() {
            let mut block = String::new();
            for entry in pending {
                block.push_str(entry);
                block.push('\n');
            }

            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(self.history_path(canvas.guild_id()))
                .await
                .map_err(|e| StoreError::io(format!("failed to open history: {e}")))?;
            file.write_all(block.as_bytes())
                .await
                .map_err(|e| StoreError::io(format!("failed to append history: {e}")))?;
            file.flush()
                .await
                .map_err(|e| StoreError::io(format!("failed to flush history: {e}")))?;
        }

        canvas.history_mut().mark_persisted();
        debug!(
            guild = %canvas.guild_id(),
            entries = canvas.history().len(),
            "Canvas saved"
        );
        Ok(())
    }
}

impl std::fmt::Debug for FileCanvasStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileCanvasStore")
            .field("dir", &self.dir)
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}
