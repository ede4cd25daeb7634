use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use rand::Rng;
use tokio::sync::mpsc;
use tokio::time::{Instant, interval_at};
use tracing::{debug, warn};

use super::payloads::GatewayPayload;

/// Periodic heartbeat sender for one gateway connection.
///
/// The sequence and ack cells are shared with the connection runner, which
/// stores the latest sequence number and flips the ack flag when Discord
/// acknowledges a beat.
pub struct HeartbeatTask {
    interval_ms: u64,
    sequence: Arc<AtomicU64>,
    running: Arc<AtomicBool>,
    ack_received: Arc<AtomicBool>,
}

impl HeartbeatTask {
    #[must_use]
    pub fn new(interval_ms: u64, sequence: Arc<AtomicU64>, ack_received: Arc<AtomicBool>) -> Self {
        Self {
            interval_ms,
            sequence,
            running: Arc::new(AtomicBool::new(false)),
            ack_received,
        }
    }

    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn start(&self, payload_tx: mpsc::Sender<GatewayPayload>) -> tokio::task::JoinHandle<()> {
        let interval_ms = self.interval_ms;
        let sequence = self.sequence.clone();
        let running = self.running.clone();
        let ack_received = self.ack_received.clone();

        running.store(true, Ordering::SeqCst);

        tokio::spawn(async move {
            // First beat fires after a random fraction of the interval.
            let first_delay =
                Duration::from_millis((interval_ms as f64 * rand::rng().random::<f64>()) as u64);
            let mut ticker = interval_at(
                Instant::now() + first_delay,
                Duration::from_millis(interval_ms),
            );

            while running.load(Ordering::SeqCst) {
                ticker.tick().await;

                if !running.load(Ordering::SeqCst) {
                    break;
                }

                if !ack_received.swap(false, Ordering::SeqCst) {
                    warn!("Heartbeat ACK not received, connection may be dead");
                }

                let seq = sequence.load(Ordering::SeqCst);
                let seq_opt = if seq == 0 { None } else { Some(seq) };

                if payload_tx
                    .send(GatewayPayload::heartbeat(seq_opt))
                    .await
                    .is_err()
                {
                    debug!("Heartbeat channel closed");
                    break;
                }
                debug!(sequence = ?seq_opt, "Sent heartbeat");
            }

            debug!("Heartbeat loop stopped");
        })
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl Drop for HeartbeatTask {
    fn drop(&mut self) {
        self.stop();
    }
}
