//! Service facade over the queue and worker.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::application::compositor::Compositor;
use crate::application::use_cases::ProcessRequestUseCase;
use crate::application::worker::{CompositeWorker, WorkerState};
use crate::domain::entities::{Canvas, CompositeRequest, GuildId};
use crate::domain::errors::{ServiceError, StoreError};
use crate::domain::ports::{CanvasStorePort, ImageFetchPort};

/// Service sizing knobs.
#[derive(Debug, Clone, Copy)]
pub struct ServiceConfig {
    /// Maximum requests waiting in the queue before submissions are
    /// rejected as busy.
    pub queue_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self { queue_capacity: 32 }
    }
}

/// Entry point for canvas work.
///
/// Accepts requests into a bounded queue consumed by a single worker and
/// exposes committed canvases for reading. Cloning is cheap; all clones
/// feed the same worker.
#[derive(Clone)]
pub struct CollageService {
    queue_tx: mpsc::Sender<CompositeRequest>,
    state_rx: watch::Receiver<WorkerState>,
    store: Arc<dyn CanvasStorePort>,
}

impl CollageService {
    /// Spawns the worker and returns the facade.
    #[must_use]
    pub fn start(
        store: Arc<dyn CanvasStorePort>,
        fetcher: Arc<dyn ImageFetchPort>,
        config: ServiceConfig,
    ) -> Self {
        let (queue_tx, queue_rx) = mpsc::channel(config.queue_capacity.max(1));
        let (state_tx, state_rx) = watch::channel(WorkerState::Idle);

        let pipeline = ProcessRequestUseCase::new(store.clone(), fetcher, Compositor::new());
        tokio::spawn(CompositeWorker::new(queue_rx, state_tx, pipeline).run());

        info!(queue_capacity = config.queue_capacity, "Collage service started");

        Self {
            queue_tx,
            state_rx,
            store,
        }
    }

    /// Enqueues a request. The terminal response arrives later through
    /// the request's responder.
    ///
    /// # Errors
    /// Returns [`ServiceError::Busy`] when the queue is full; the request
    /// is dropped without side effects.
    pub fn submit(&self, request: CompositeRequest) -> Result<(), ServiceError> {
        match self.queue_tx.try_send(request) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(rejected)) => {
                debug!(guild = %rejected.guild_id(), "Queue full, rejecting request");
                Err(ServiceError::Busy)
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                Err(ServiceError::internal("request queue is closed"))
            }
        }
    }

    /// Reads the most recently committed canvas without queueing.
    ///
    /// # Errors
    /// Returns an error if the stored snapshot cannot be loaded.
    pub async fn peek(&self, guild_id: GuildId) -> Result<Canvas, StoreError> {
        self.store.load_or_create(guild_id).await
    }

    /// Current worker drain state.
    #[must_use]
    pub fn worker_state(&self) -> WorkerState {
        *self.state_rx.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::CompositeSource;
    use crate::domain::ports::Visibility;
    use crate::domain::ports::mocks::{
        MemoryCanvasStore, MockImageFetcher, RecordedReply, RecordingResponder,
    };
    use std::time::Duration;
    use tokio::sync::mpsc::UnboundedReceiver;

    const WIDTH: u32 = 192;
    const HEIGHT: u32 = 108;

    fn service_with(
        store: Arc<MemoryCanvasStore>,
        fetcher: Arc<MockImageFetcher>,
        queue_capacity: usize,
    ) -> CollageService {
        CollageService::start(store, fetcher, ServiceConfig { queue_capacity })
    }

    fn view_request(guild: u64) -> (CompositeRequest, UnboundedReceiver<RecordedReply>) {
        let (responder, rx) = RecordingResponder::channel();
        (
            CompositeRequest::new(GuildId(guild), CompositeSource::View, responder),
            rx,
        )
    }

    fn url_request(guild: u64, url: &str) -> (CompositeRequest, UnboundedReceiver<RecordedReply>) {
        let (responder, rx) = RecordingResponder::channel();
        (
            CompositeRequest::new(
                GuildId(guild),
                CompositeSource::Url(url.to_string()),
                responder,
            ),
            rx,
        )
    }

    #[tokio::test]
    async fn test_view_on_fresh_guild_returns_blank_canvas() {
        let store = Arc::new(MemoryCanvasStore::new(WIDTH, HEIGHT));
        let fetcher = Arc::new(MockImageFetcher::new(16, 16));
        let service = service_with(store.clone(), fetcher, 8);

        let (request, mut rx) = view_request(1);
        service.submit(request).unwrap();

        let reply = rx.recv().await.unwrap();
        let RecordedReply::Canvas { filename, png } = reply else {
            panic!("expected a canvas reply, got {reply:?}");
        };
        assert!(filename.ends_with("_1_canvas.png"));

        let decoded = image::load_from_memory(&png).unwrap().to_rgba8();
        assert_eq!(decoded.dimensions(), (WIDTH, HEIGHT));
        assert_eq!(decoded.get_pixel(0, 0), &image::Rgba([0, 0, 0, 0]));

        // Viewing never persists anything.
        assert!(!store.contains(GuildId(1)).await);
    }

    #[tokio::test]
    async fn test_requests_complete_in_submission_order() {
        let store = Arc::new(MemoryCanvasStore::new(WIDTH, HEIGHT));
        let fetcher =
            Arc::new(MockImageFetcher::new(16, 16).with_delay(Duration::from_millis(10)));
        let service = service_with(store.clone(), fetcher.clone(), 8);

        let urls: Vec<String> = (0..5).map(|i| format!("https://x/{i}.png")).collect();
        let mut receivers = Vec::new();
        for url in &urls {
            let (request, rx) = url_request(9, url);
            service.submit(request).unwrap();
            receivers.push(rx);
        }

        for mut rx in receivers {
            let reply = rx.recv().await.unwrap();
            assert!(matches!(reply, RecordedReply::Canvas { .. }));
        }

        assert_eq!(fetcher.calls(), urls);
        assert_eq!(fetcher.max_concurrent(), 1, "requests overlapped");
        assert_eq!(store.history(GuildId(9)).await, urls);
    }

    #[tokio::test]
    async fn test_full_queue_rejects_with_busy() {
        let store = Arc::new(MemoryCanvasStore::new(WIDTH, HEIGHT));
        let fetcher =
            Arc::new(MockImageFetcher::new(16, 16).with_delay(Duration::from_millis(200)));
        let service = service_with(store, fetcher.clone(), 1);

        let (first, mut first_rx) = url_request(2, "https://x/first.png");
        service.submit(first).unwrap();

        // Wait until the worker has the first request in flight, leaving
        // the queue slot free.
        while fetcher.calls().is_empty() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert_eq!(service.worker_state(), WorkerState::Draining);

        let (second, mut second_rx) = url_request(2, "https://x/second.png");
        service.submit(second).unwrap();

        let (third, mut third_rx) = url_request(2, "https://x/third.png");
        let err = service.submit(third).unwrap_err();
        assert!(matches!(err, ServiceError::Busy));

        // The rejected request got no reply; the admitted ones complete.
        assert!(third_rx.try_recv().is_err());
        assert!(matches!(
            first_rx.recv().await.unwrap(),
            RecordedReply::Canvas { .. }
        ));
        assert!(matches!(
            second_rx.recv().await.unwrap(),
            RecordedReply::Canvas { .. }
        ));
    }

    #[tokio::test]
    async fn test_fetch_failure_reports_notice_and_frees_worker() {
        let store = Arc::new(MemoryCanvasStore::new(WIDTH, HEIGHT));
        let fetcher = Arc::new(MockImageFetcher::new(16, 16).failing_on("https://x/bad.png"));
        let service = service_with(store.clone(), fetcher, 8);

        let (request, mut rx) = url_request(3, "https://x/bad.png");
        service.submit(request).unwrap();

        let reply = rx.recv().await.unwrap();
        assert_eq!(
            reply,
            RecordedReply::Notice {
                message: "Invalid URL".to_string(),
                visibility: Visibility::Private,
            }
        );
        assert!(!store.contains(GuildId(3)).await);

        // The worker takes the next request as usual.
        let (next, mut next_rx) = url_request(3, "https://x/good.png");
        service.submit(next).unwrap();
        assert!(matches!(
            next_rx.recv().await.unwrap(),
            RecordedReply::Canvas { .. }
        ));
        assert_eq!(store.history(GuildId(3)).await, ["https://x/good.png"]);
    }

    #[tokio::test]
    async fn test_save_failure_is_not_reported_as_success() {
        let store = Arc::new(MemoryCanvasStore::new(WIDTH, HEIGHT));
        store.set_failing(true);
        let fetcher = Arc::new(MockImageFetcher::new(16, 16));
        let service = service_with(store.clone(), fetcher, 8);

        let (request, mut rx) = url_request(4, "https://x/a.png");
        service.submit(request).unwrap();

        let reply = rx.recv().await.unwrap();
        let RecordedReply::Notice {
            message,
            visibility,
        } = reply
        else {
            panic!("expected a failure notice, got {reply:?}");
        };
        assert!(message.starts_with("Uh oh!"));
        assert_eq!(visibility, Visibility::Public);
        assert!(!store.contains(GuildId(4)).await);

        // Nothing was committed, so a later view still sees a blank canvas.
        store.set_failing(false);
        let canvas = service.peek(GuildId(4)).await.unwrap();
        assert!(canvas.history().is_empty());
    }

    #[tokio::test]
    async fn test_peek_is_idempotent() {
        let store = Arc::new(MemoryCanvasStore::new(WIDTH, HEIGHT));
        let fetcher = Arc::new(MockImageFetcher::new(16, 16));
        let service = service_with(store, fetcher, 8);

        let first = service.peek(GuildId(5)).await.unwrap().encode_png().unwrap();
        let second = service.peek(GuildId(5)).await.unwrap().encode_png().unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_peek_observes_committed_composites() {
        let store = Arc::new(MemoryCanvasStore::new(WIDTH, HEIGHT));
        let fetcher = Arc::new(MockImageFetcher::new(16, 16));
        let service = service_with(store, fetcher, 8);

        let (request, mut rx) = url_request(6, "https://x/a.png");
        service.submit(request).unwrap();
        rx.recv().await.unwrap();

        let canvas = service.peek(GuildId(6)).await.unwrap();
        assert_eq!(canvas.history().entries(), ["https://x/a.png".to_string()]);
    }

    #[tokio::test]
    async fn test_worker_returns_to_idle_after_drain() {
        let store = Arc::new(MemoryCanvasStore::new(WIDTH, HEIGHT));
        let fetcher = Arc::new(MockImageFetcher::new(16, 16));
        let service = service_with(store, fetcher, 8);

        assert_eq!(service.worker_state(), WorkerState::Idle);

        let (request, mut rx) = url_request(7, "https://x/a.png");
        service.submit(request).unwrap();
        rx.recv().await.unwrap();

        // The reply is sent before the state flips back; give the worker
        // a beat to finish the drain loop.
        let mut state_rx = service.state_rx.clone();
        tokio::time::timeout(Duration::from_secs(1), async {
            while *state_rx.borrow_and_update() != WorkerState::Idle {
                state_rx.changed().await.unwrap();
            }
        })
        .await
        .unwrap();
    }
}
