//! Canvas persistence port definition.

use async_trait::async_trait;

use crate::domain::entities::{Canvas, GuildId};
use crate::domain::errors::StoreError;

/// Port for canvas snapshot and history persistence.
#[async_trait]
pub trait CanvasStorePort: Send + Sync {
    /// Loads the guild's canvas, creating a blank one on first use.
    async fn load_or_create(&self, guild_id: GuildId) -> Result<Canvas, StoreError>;

    /// Persists the raster snapshot, then appends any pending history
    /// entries. On success the canvas's persistence watermark advances.
    async fn save(&self, canvas: &mut Canvas) -> Result<(), StoreError>;
}
