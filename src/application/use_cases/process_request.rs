//! Per-request composite pipeline.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info};

use crate::application::compositor::Compositor;
use crate::domain::entities::{CompositeRequest, GuildId};
use crate::domain::errors::{CompositeError, ServiceError};
use crate::domain::ports::{CanvasStorePort, ImageFetchPort};

/// A successful pipeline result, ready to send back.
#[derive(Debug, Clone)]
pub struct CanvasReply {
    /// Attachment filename for the rendered snapshot.
    pub filename: String,
    /// PNG-encoded canvas.
    pub png: Vec<u8>,
}

/// Builds the snapshot filename, `{timestamp}_{guild}_canvas.png`.
#[must_use]
pub fn canvas_filename(guild_id: GuildId, at: DateTime<Utc>) -> String {
    format!("{}_{}_canvas.png", at.format("%y%m%d%H%M%S"), guild_id)
}

/// Executes one composite request end to end: load, fetch, paste, save,
/// encode.
///
/// View requests skip the fetch/paste/save stages and never touch the
/// store beyond the initial load.
pub struct ProcessRequestUseCase {
    store: Arc<dyn CanvasStorePort>,
    fetcher: Arc<dyn ImageFetchPort>,
    compositor: Compositor,
    rng: Mutex<StdRng>,
}

impl ProcessRequestUseCase {
    /// Creates a pipeline with OS-seeded placement randomness.
    #[must_use]
    pub fn new(
        store: Arc<dyn CanvasStorePort>,
        fetcher: Arc<dyn ImageFetchPort>,
        compositor: Compositor,
    ) -> Self {
        Self {
            store,
            fetcher,
            compositor,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Replaces the placement RNG, pinning placement decisions.
    #[must_use]
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = Mutex::new(rng);
        self
    }

    /// Runs the pipeline for one request.
    ///
    /// # Errors
    /// Every failure maps to one [`ServiceError`] variant; the caller
    /// turns it into the request's terminal notice.
    pub async fn execute(&self, request: &CompositeRequest) -> Result<CanvasReply, ServiceError> {
        let guild_id = request.guild_id();
        let mut canvas = self.store.load_or_create(guild_id).await?;

        if let Some(url) = request.source().url() {
            let source = self.fetcher.fetch(url).await?;
            debug!(
                guild = %guild_id,
                width = source.width(),
                height = source.height(),
                "Fetched source image"
            );

            let compositor = self.compositor;
            let source_url = url.to_string();
            let mut rng = self.fork_rng();
            let (updated, placement) = tokio::task::spawn_blocking(move || {
                let placement = compositor.composite(&mut canvas, &source, &source_url, &mut rng)?;
                Ok::<_, CompositeError>((canvas, placement))
            })
            .await
            .map_err(|e| ServiceError::internal(format!("composite task failed: {e}")))??;
            canvas = updated;

            info!(
                guild = %guild_id,
                x = placement.x,
                y = placement.y,
                width = placement.width,
                height = placement.height,
                "Pasted image onto canvas"
            );

            self.store.save(&mut canvas).await?;
        }

        let filename = canvas_filename(guild_id, Utc::now());
        let png = tokio::task::spawn_blocking(move || canvas.encode_png())
            .await
            .map_err(|e| ServiceError::internal(format!("encode task failed: {e}")))?
            .map_err(|e| ServiceError::internal(format!("failed to encode canvas: {e}")))?;

        Ok(CanvasReply { filename, png })
    }

    /// Forks a child RNG for one composite. The parent advances, so
    /// successive requests see independent draws.
    fn fork_rng(&self) -> StdRng {
        let mut parent = self.rng.lock();
        StdRng::from_rng(&mut *parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{CompositeRequest, CompositeSource};
    use crate::domain::errors::FetchError;
    use crate::domain::ports::mocks::{MemoryCanvasStore, MockImageFetcher, RecordingResponder};
    use chrono::TimeZone;

    fn request(source: CompositeSource) -> CompositeRequest {
        let (responder, _rx) = RecordingResponder::channel();
        CompositeRequest::new(GuildId(42), source, responder)
    }

    fn pipeline(
        store: Arc<MemoryCanvasStore>,
        fetcher: Arc<MockImageFetcher>,
    ) -> ProcessRequestUseCase {
        ProcessRequestUseCase::new(store, fetcher, Compositor::new())
    }

    #[test]
    fn test_filename_format() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 4, 5, 6).unwrap();
        assert_eq!(canvas_filename(GuildId(42), at), "240305040506_42_canvas.png");
    }

    #[tokio::test]
    async fn test_view_request_never_saves() {
        let store = Arc::new(MemoryCanvasStore::new(64, 36));
        let fetcher = Arc::new(MockImageFetcher::new(8, 8));
        let use_case = pipeline(store.clone(), fetcher.clone());

        let reply = use_case.execute(&request(CompositeSource::View)).await.unwrap();

        let decoded = image::load_from_memory(&reply.png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (64, 36));
        assert!(!store.contains(GuildId(42)).await);
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_composite_saves_and_appends_history() {
        let store = Arc::new(MemoryCanvasStore::new(64, 36));
        let fetcher = Arc::new(MockImageFetcher::new(8, 8));
        let use_case = pipeline(store.clone(), fetcher.clone());

        let url = "https://x/a.png".to_string();
        let reply = use_case
            .execute(&request(CompositeSource::Url(url.clone())))
            .await
            .unwrap();

        assert!(reply.filename.ends_with("_42_canvas.png"));
        assert_eq!(fetcher.calls(), [url.clone()]);
        assert_eq!(store.history(GuildId(42)).await, [url]);
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_store_untouched() {
        let store = Arc::new(MemoryCanvasStore::new(64, 36));
        let fetcher =
            Arc::new(MockImageFetcher::new(8, 8).failing_on("https://x/broken.png"));
        let use_case = pipeline(store.clone(), fetcher);

        let err = use_case
            .execute(&request(CompositeSource::Url("https://x/broken.png".to_string())))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Fetch(FetchError::Undecodable { .. })));
        assert!(!store.contains(GuildId(42)).await);
    }

    #[tokio::test]
    async fn test_save_failure_surfaces_as_store_error() {
        let store = Arc::new(MemoryCanvasStore::new(64, 36));
        store.set_failing(true);
        let fetcher = Arc::new(MockImageFetcher::new(8, 8));
        let use_case = pipeline(store.clone(), fetcher);

        let err = use_case
            .execute(&request(CompositeSource::Url("https://x/a.png".to_string())))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::Store(_)));
        assert!(store.history(GuildId(42)).await.is_empty());
    }

    #[tokio::test]
    async fn test_same_seed_pipelines_produce_identical_canvases() {
        let run = |seed: u64| async move {
            let store = Arc::new(MemoryCanvasStore::new(64, 36));
            let fetcher = Arc::new(MockImageFetcher::new(8, 8));
            let use_case =
                pipeline(store, fetcher).with_rng(StdRng::seed_from_u64(seed));
            use_case
                .execute(&request(CompositeSource::Url("https://x/a.png".to_string())))
                .await
                .unwrap()
                .png
        };

        assert_eq!(run(11).await, run(11).await);
    }
}
