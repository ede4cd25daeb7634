use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use futures_util::FutureExt;
use rand::Rng;
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{error, info, warn};

use super::connection::{ConnectionRunner, WebSocketConnection};
use super::constants::{
    GatewayIntents, MAX_RECONNECT_ATTEMPTS, RECONNECT_DELAY_BASE, RECONNECT_DELAY_MAX,
    RECONNECT_JITTER_MAX,
};
use super::error::{GatewayError, GatewayResult};
use super::events::GatewayEventKind;
use super::heartbeat::HeartbeatTask;
use super::session::ResumeSession;

const STOP_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Reconnect behavior of the gateway loop.
#[derive(Debug, Clone, Copy)]
pub struct ReconnectPolicy {
    /// Whether to reconnect at all after a recoverable failure.
    pub enabled: bool,
    /// Consecutive failed attempts tolerated before giving up.
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: MAX_RECONNECT_ATTEMPTS,
        }
    }
}

/// Owns the background task that keeps one gateway connection alive.
///
/// `connect` spawns the task and hands back an event receiver; the task
/// reconnects on recoverable failures until `disconnect` is called or the
/// reconnect budget runs out.
pub struct GatewayClient {
    intents: GatewayIntents,
    reconnect: ReconnectPolicy,
    running: Arc<AtomicBool>,
}

impl GatewayClient {
    /// Creates a client that identifies with the given intents.
    #[must_use]
    pub fn new(intents: GatewayIntents) -> Self {
        Self {
            intents,
            reconnect: ReconnectPolicy::default(),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Overrides the default reconnect policy.
    #[must_use]
    pub const fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = policy;
        self
    }

    /// Spawns the gateway task and returns its event stream.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::AlreadyConnected`] when the task is already
    /// running.
    pub fn connect(
        &mut self,
        token: &str,
    ) -> GatewayResult<mpsc::UnboundedReceiver<GatewayEventKind>> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(GatewayError::AlreadyConnected);
        }

        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let ctx = LoopContext {
            token: token.to_string(),
            intents: self.intents,
            reconnect: self.reconnect,
        };
        let running = self.running.clone();

        tokio::spawn(async move {
            let looped =
                std::panic::AssertUnwindSafe(run_gateway_loop(ctx, event_tx.clone(), running.clone()))
                    .catch_unwind()
                    .await;

            if let Err(panic_info) = looped {
                let message = panic_message(panic_info.as_ref());
                error!(panic = %message, "Gateway task panicked");
                running.store(false, Ordering::SeqCst);
                let _ = event_tx.send(GatewayEventKind::Error {
                    message: format!("Gateway task panicked: {message}"),
                    recoverable: false,
                });
            }
        });

        Ok(event_rx)
    }

    /// Signals the gateway task to stop after its current poll.
    pub fn disconnect(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Whether the gateway task is still alive.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

fn panic_message(panic_info: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

struct LoopContext {
    token: String,
    intents: GatewayIntents,
    reconnect: ReconnectPolicy,
}

async fn run_gateway_loop(
    ctx: LoopContext,
    event_tx: mpsc::UnboundedSender<GatewayEventKind>,
    running: Arc<AtomicBool>,
) {
    let mut attempts: u32 = 0;
    let mut session = ResumeSession::new();

    while running.load(Ordering::SeqCst) {
        let outcome = run_connection(&ctx, &mut session, &event_tx, &running, &mut attempts).await;

        match outcome {
            Ok(()) => {
                let _ = event_tx.send(GatewayEventKind::Disconnected {
                    reason: "Client disconnected".to_string(),
                    can_resume: false,
                });
                break;
            }
            Err(e) => {
                warn!(error = %e, "Connection error");

                let keeps_session = e.can_resume() && session.can_resume();
                if !keeps_session {
                    session.clear();
                }

                let _ = event_tx.send(GatewayEventKind::Disconnected {
                    reason: e.to_string(),
                    can_resume: keeps_session,
                });

                if !e.should_reconnect() {
                    let _ = event_tx.send(GatewayEventKind::Error {
                        message: e.to_string(),
                        recoverable: false,
                    });
                    break;
                }

                attempts += 1;
            }
        }

        if !ctx.reconnect.enabled || !running.load(Ordering::SeqCst) {
            break;
        }

        if attempts >= ctx.reconnect.max_attempts {
            error!(attempts = attempts, "Reconnect budget exhausted");
            let _ = event_tx.send(GatewayEventKind::Error {
                message: format!(
                    "Gave up after {} reconnect attempts",
                    ctx.reconnect.max_attempts
                ),
                recoverable: false,
            });
            break;
        }

        let delay = backoff_delay(attempts);
        info!(
            attempt = attempts,
            delay_ms = delay.as_millis(),
            "Reconnecting to gateway"
        );
        let _ = event_tx.send(GatewayEventKind::Reconnecting { attempt: attempts });

        sleep(delay).await;
    }

    running.store(false, Ordering::SeqCst);
    info!("Gateway loop terminated");
}

/// Runs a single connection from handshake to failure or shutdown.
///
/// The runner works on a copy of the resume state; whatever it learned by
/// the time the connection ends is copied back for the next attempt.
async fn run_connection(
    ctx: &LoopContext,
    session: &mut ResumeSession,
    event_tx: &mpsc::UnboundedSender<GatewayEventKind>,
    running: &Arc<AtomicBool>,
    attempts: &mut u32,
) -> GatewayResult<()> {
    let (outbound_tx, outbound_rx) = mpsc::channel(16);
    let sequence = Arc::new(AtomicU64::new(session.sequence().unwrap_or(0)));
    let ack_received = Arc::new(AtomicBool::new(true));

    let mut runner = ConnectionRunner::new(
        Box::new(WebSocketConnection::new()),
        session.clone(),
        ctx.token.clone(),
        ctx.intents,
        event_tx.clone(),
        outbound_rx,
        sequence.clone(),
        ack_received.clone(),
    );

    let result = async {
        let interval = runner.establish().await?;
        info!("Gateway connected");
        *attempts = 0;

        let heartbeat = HeartbeatTask::new(interval, sequence, ack_received);
        let beat_handle = heartbeat.start(outbound_tx);

        let result = tokio::select! {
            result = runner.run() => result,
            () = poll_stop(running) => Ok(()),
        };

        heartbeat.stop();
        beat_handle.abort();
        result
    }
    .await;

    if result.is_ok() {
        runner.shutdown().await;
    }

    *session = runner.session().clone();
    result
}

async fn poll_stop(running: &Arc<AtomicBool>) {
    while running.load(Ordering::SeqCst) {
        sleep(STOP_POLL_INTERVAL).await;
    }
}

#[allow(clippy::cast_possible_truncation)]
fn backoff_delay(attempt: u32) -> Duration {
    let base = RECONNECT_DELAY_BASE.as_millis() as u64;
    let cap = RECONNECT_DELAY_MAX.as_millis() as u64;
    let jitter_max = RECONNECT_JITTER_MAX.as_millis() as u64;

    let exponential = base.saturating_mul(2_u64.saturating_pow(attempt.min(6)));
    let jitter = rand::rng().random_range(0..=jitter_max);

    Duration::from_millis(exponential.min(cap).saturating_add(jitter))
}
