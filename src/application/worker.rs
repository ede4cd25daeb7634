//! The serialized composite worker.

use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::application::use_cases::ProcessRequestUseCase;
use crate::domain::entities::CompositeRequest;
use crate::domain::ports::Visibility;

/// Queue drain state, observable through the service facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkerState {
    /// No request in flight and the queue is empty.
    #[default]
    Idle,
    /// The worker is processing queued requests.
    Draining,
}

/// Single consumer of the request queue.
///
/// Being the only reader makes the one-at-a-time guarantee structural:
/// no request starts before the previous one has delivered its terminal
/// response.
pub struct CompositeWorker {
    queue_rx: mpsc::Receiver<CompositeRequest>,
    state_tx: watch::Sender<WorkerState>,
    pipeline: ProcessRequestUseCase,
}

impl CompositeWorker {
    pub(crate) fn new(
        queue_rx: mpsc::Receiver<CompositeRequest>,
        state_tx: watch::Sender<WorkerState>,
        pipeline: ProcessRequestUseCase,
    ) -> Self {
        Self {
            queue_rx,
            state_tx,
            pipeline,
        }
    }

    /// Runs until the submit side of the queue is dropped.
    ///
    /// The state flips to `Draining` while requests are flowing and back
    /// to `Idle` only once the queue is observed empty, so a burst does
    /// not flap the state per request.
    pub async fn run(mut self) {
        while let Some(request) = self.queue_rx.recv().await {
            let _ = self.state_tx.send(WorkerState::Draining);
            self.handle(request).await;

            while let Ok(next) = self.queue_rx.try_recv() {
                self.handle(next).await;
            }
            let _ = self.state_tx.send(WorkerState::Idle);
        }
        debug!("Composite worker stopped");
    }

    /// Processes one request and delivers its single terminal response.
    ///
    /// A panic inside the pipeline is contained here so the worker
    /// survives to take the next request.
    #[allow(clippy::cast_possible_truncation)]
    async fn handle(&mut self, request: CompositeRequest) {
        let guild_id = request.guild_id();
        let started = std::time::Instant::now();

        let outcome = AssertUnwindSafe(self.pipeline.execute(&request))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(reply)) => {
                if let Err(e) = request
                    .responder()
                    .send_canvas(&reply.filename, reply.png)
                    .await
                {
                    warn!(guild = %guild_id, error = %e, "Failed to deliver canvas response");
                }
                info!(
                    guild = %guild_id,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Composite request completed"
                );
            }
            Ok(Err(e)) => {
                warn!(guild = %guild_id, error = %e, "Composite request failed");
                let (message, visibility) = e.user_notice();
                if let Err(send_err) = request.responder().send_notice(&message, visibility).await
                {
                    warn!(guild = %guild_id, error = %send_err, "Failed to deliver failure notice");
                }
            }
            Err(panic_info) => {
                let panic_message = panic_info
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic_info.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(guild = %guild_id, panic = %panic_message, "Composite request panicked");
                let _ = request
                    .responder()
                    .send_notice("Uh oh! Something went wrong.", Visibility::Public)
                    .await;
            }
        }
    }
}
