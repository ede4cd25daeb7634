use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout, timeout_at};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, trace, warn};

use super::codec::{EventParser, TransportCodec};
use super::constants::{
    CONNECTION_TIMEOUT, GATEWAY_QUERY, GATEWAY_URL, GatewayIntents, GatewayOpcode,
    HANDSHAKE_TIMEOUT,
};
use super::error::{GatewayError, GatewayResult};
use super::events::{DispatchEvent, GatewayEventKind};
use super::payloads::{GatewayMessage, GatewayPayload};
use super::session::ResumeSession;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, WsMessage>;
type WsReader = SplitStream<WsStream>;

#[async_trait]
pub trait GatewayConnection: Send + Sync {
    async fn connect(&mut self, gateway_url: Option<&str>) -> GatewayResult<()>;
    async fn disconnect(&mut self) -> GatewayResult<()>;
    async fn send(&mut self, payload: &GatewayPayload) -> GatewayResult<()>;
    async fn receive(&mut self) -> GatewayResult<Option<GatewayMessage>>;
    fn is_connected(&self) -> bool;
}

pub struct WebSocketConnection {
    writer: Option<WsWriter>,
    reader: Option<WsReader>,
    codec: TransportCodec,
    connected: bool,
}

impl WebSocketConnection {
    #[must_use]
    pub fn new() -> Self {
        Self {
            writer: None,
            reader: None,
            codec: TransportCodec::new(),
            connected: false,
        }
    }

    async fn connect_internal(&mut self, url: &str) -> GatewayResult<()> {
        let connect_future = connect_async(url);
        let (ws_stream, _) = timeout(CONNECTION_TIMEOUT, connect_future)
            .await
            .map_err(|_| GatewayError::timeout("connection"))?
            .map_err(|e| GatewayError::handshake(e.to_string()))?;

        let (writer, reader) = ws_stream.split();
        self.writer = Some(writer);
        self.reader = Some(reader);
        self.connected = true;
        self.codec.reset();

        Ok(())
    }
}

impl Default for WebSocketConnection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GatewayConnection for WebSocketConnection {
    async fn connect(&mut self, gateway_url: Option<&str>) -> GatewayResult<()> {
        let url = gateway_url.unwrap_or(GATEWAY_URL);
        self.connect_internal(url).await
    }

    async fn disconnect(&mut self) -> GatewayResult<()> {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.close().await;
        }
        self.reader = None;
        self.connected = false;
        self.codec.reset();
        debug!("WebSocket connection closed");
        Ok(())
    }

    async fn send(&mut self, payload: &GatewayPayload) -> GatewayResult<()> {
        let writer = self.writer.as_mut().ok_or(GatewayError::NotConnected)?;

        let json = serde_json::to_string(payload)
            .map_err(|e| GatewayError::protocol(e.to_string()))?;

        writer
            .send(WsMessage::Text(json.into()))
            .await
            .map_err(|e| GatewayError::transport(e.to_string()))?;

        Ok(())
    }

    async fn receive(&mut self) -> GatewayResult<Option<GatewayMessage>> {
        let reader = self.reader.as_mut().ok_or(GatewayError::NotConnected)?;

        loop {
            match reader.next().await {
                Some(Ok(WsMessage::Binary(data))) => {
                    if let Some(json) = self.codec.feed(&data)? {
                        let message = EventParser::parse_message(&json)?;
                        return Ok(Some(message));
                    }
                }
                Some(Ok(WsMessage::Text(text))) => {
                    let message = EventParser::parse_message(&text)?;
                    return Ok(Some(message));
                }
                Some(Ok(WsMessage::Close(frame))) => {
                    self.connected = false;
                    let (code, reason) = frame.map_or_else(
                        || (1000, "Normal closure".to_string()),
                        |f| (f.code.into(), f.reason.to_string()),
                    );

                    return Err(GatewayError::Closed { code, reason });
                }
                Some(Ok(WsMessage::Ping(data))) => {
                    if let Some(writer) = self.writer.as_mut() {
                        let _ = writer.send(WsMessage::Pong(data)).await;
                    }
                }
                Some(Ok(WsMessage::Pong(_) | WsMessage::Frame(_))) => {}
                Some(Err(e)) => {
                    self.connected = false;
                    return Err(GatewayError::transport(e.to_string()));
                }
                None => {
                    self.connected = false;
                    return Err(GatewayError::Closed {
                        code: 1006,
                        reason: "Stream ended".to_string(),
                    });
                }
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

/// Drives one gateway connection from handshake to failure.
///
/// The sequence and ack cells are shared with the heartbeat task so beats
/// always carry the latest sequence number.
pub struct ConnectionRunner {
    connection: Box<dyn GatewayConnection>,
    session: ResumeSession,
    token: String,
    intents: GatewayIntents,
    event_tx: mpsc::UnboundedSender<GatewayEventKind>,
    outbound_rx: mpsc::Receiver<GatewayPayload>,
    sequence: Arc<AtomicU64>,
    ack_received: Arc<AtomicBool>,
}

impl ConnectionRunner {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        connection: Box<dyn GatewayConnection>,
        session: ResumeSession,
        token: String,
        intents: GatewayIntents,
        event_tx: mpsc::UnboundedSender<GatewayEventKind>,
        outbound_rx: mpsc::Receiver<GatewayPayload>,
        sequence: Arc<AtomicU64>,
        ack_received: Arc<AtomicBool>,
    ) -> Self {
        Self {
            connection,
            session,
            token,
            intents,
            event_tx,
            outbound_rx,
            sequence,
            ack_received,
        }
    }

    /// Connects and completes the handshake, returning the heartbeat
    /// interval announced in Hello.
    pub async fn establish(&mut self) -> GatewayResult<u64> {
        let resume_url = self
            .session
            .gateway_url()
            .map(|url| format!("{}{GATEWAY_QUERY}", url.trim_end_matches('/')));
        self.connection.connect(resume_url.as_deref()).await?;

        let interval = self.await_hello().await?;

        if self.session.can_resume() {
            self.resume().await?;
        } else {
            self.identify().await?;
        }

        Ok(interval)
    }

    async fn await_hello(&mut self) -> GatewayResult<u64> {
        let message = timeout(HANDSHAKE_TIMEOUT, self.connection.receive())
            .await
            .map_err(|_| GatewayError::timeout("Hello"))?
            .map_err(|e| GatewayError::handshake(format!("Failed to receive Hello: {e}")))?
            .ok_or_else(|| GatewayError::protocol("Expected Hello message"))?;

        let opcode = GatewayOpcode::from_u8(message.op);
        if opcode != Some(GatewayOpcode::Hello) {
            return Err(GatewayError::UnexpectedOpcode { opcode });
        }

        let data = message
            .d
            .ok_or_else(|| GatewayError::protocol("Hello missing data"))?;

        let hello = EventParser::parse_hello(&data)?;
        debug!(
            interval_ms = hello.heartbeat_interval,
            "Received Hello from gateway"
        );

        Ok(hello.heartbeat_interval)
    }

    async fn identify(&mut self) -> GatewayResult<()> {
        let payload = GatewayPayload::identify(&self.token, self.intents.bits());
        self.connection.send(&payload).await?;

        self.await_ready().await
    }

    async fn resume(&mut self) -> GatewayResult<()> {
        let session_id = self
            .session
            .id()
            .ok_or_else(|| GatewayError::protocol("No session to resume"))?
            .to_string();

        let sequence = self
            .session
            .sequence()
            .ok_or_else(|| GatewayError::protocol("No sequence to resume"))?;

        let payload = GatewayPayload::resume(&self.token, &session_id, sequence);
        self.connection.send(&payload).await?;

        debug!(session_id = %session_id, sequence = sequence, "Sent Resume payload");

        self.await_resumed().await
    }

    async fn await_ready(&mut self) -> GatewayResult<()> {
        let deadline = Instant::now() + HANDSHAKE_TIMEOUT;

        loop {
            let message = timeout_at(deadline, self.connection.receive())
                .await
                .map_err(|_| GatewayError::timeout("Ready"))?
                .map_err(|e| {
                    GatewayError::handshake(format!("Failed to receive Ready: {e}"))
                })?
                .ok_or_else(|| GatewayError::protocol("Expected Ready message"))?;

            self.track_sequence(message.s);

            match GatewayOpcode::from_u8(message.op) {
                Some(GatewayOpcode::Dispatch) if message.t.as_deref() == Some("READY") => {
                    return self.handle_ready(message);
                }
                Some(GatewayOpcode::InvalidSession) => {
                    let resumable = message.d.and_then(|d| d.as_bool()).unwrap_or(false);
                    return Err(GatewayError::SessionInvalidated { resumable });
                }
                // Acks and heartbeat requests may interleave; keep waiting.
                _ => {}
            }
        }
    }

    async fn await_resumed(&mut self) -> GatewayResult<()> {
        let deadline = Instant::now() + HANDSHAKE_TIMEOUT;

        loop {
            let message = timeout_at(deadline, self.connection.receive())
                .await
                .map_err(|_| GatewayError::timeout("Resumed"))?
                .map_err(|e| {
                    GatewayError::handshake(format!("Failed to receive Resumed: {e}"))
                })?
                .ok_or_else(|| GatewayError::protocol("Expected Resumed message"))?;

            self.track_sequence(message.s);

            match GatewayOpcode::from_u8(message.op) {
                Some(GatewayOpcode::Dispatch) => {
                    if message.t.as_deref() == Some("RESUMED") {
                        info!("Session resumed successfully");
                        let _ = self.event_tx.send(GatewayEventKind::Resumed);
                        return Ok(());
                    }

                    // Replayed dispatches arrive before RESUMED.
                    if let Some(event_type) = message.t.as_deref() {
                        self.forward_dispatch(event_type, message.d);
                    }
                }
                Some(GatewayOpcode::InvalidSession) => {
                    let resumable = message.d.and_then(|d| d.as_bool()).unwrap_or(false);

                    if !resumable {
                        self.session.clear();
                    }
                    return Err(GatewayError::SessionInvalidated { resumable });
                }
                _ => {}
            }
        }
    }

    fn handle_ready(&mut self, message: GatewayMessage) -> GatewayResult<()> {
        let dispatch = EventParser::parse_dispatch("READY", message.d)?;

        if let DispatchEvent::Ready(ready) = &dispatch {
            self.session
                .record(ready.session_id.clone(), ready.resume_gateway_url.clone());

            info!(session_id = %ready.session_id, "Gateway ready");

            let _ = self.event_tx.send(GatewayEventKind::Connected {
                session_id: ready.session_id.clone(),
                resume_url: ready.resume_gateway_url.clone(),
            });

            let _ = self.event_tx.send(GatewayEventKind::Dispatch(dispatch));
        }

        Ok(())
    }

    /// Pumps messages until the connection fails or is closed.
    pub async fn run(&mut self) -> GatewayResult<()> {
        loop {
            tokio::select! {
                result = self.connection.receive() => {
                    if let Some(message) = result? {
                        self.handle_message(message).await?;
                    }
                }

                Some(payload) = self.outbound_rx.recv() => {
                    self.connection.send(&payload).await?;
                }
            }
        }
    }

    async fn handle_message(&mut self, message: GatewayMessage) -> GatewayResult<()> {
        self.track_sequence(message.s);

        let opcode = GatewayOpcode::from_u8(message.op);
        match opcode {
            Some(GatewayOpcode::Dispatch) => {
                if let Some(event_type) = message.t.as_deref() {
                    trace!(event = event_type, "Raw dispatch received");
                    self.forward_dispatch(event_type, message.d);
                }
            }
            Some(GatewayOpcode::HeartbeatAck) => {
                self.ack_received.store(true, Ordering::SeqCst);
            }
            Some(GatewayOpcode::Heartbeat) => {
                debug!("Gateway requested immediate heartbeat");
                let beat = GatewayPayload::heartbeat(self.session.sequence());
                self.connection.send(&beat).await?;
            }
            Some(GatewayOpcode::Reconnect) => {
                info!("Gateway requested reconnect");
                return Err(GatewayError::Closed {
                    code: 4000,
                    reason: "Reconnect requested".to_string(),
                });
            }
            Some(GatewayOpcode::InvalidSession) => {
                let resumable = message.d.and_then(|d| d.as_bool()).unwrap_or(false);

                warn!(resumable = resumable, "Session invalidated");

                if !resumable {
                    self.session.clear();
                }

                return Err(GatewayError::SessionInvalidated { resumable });
            }
            _ => {
                debug!(opcode = message.op, "Unhandled opcode");
            }
        }

        Ok(())
    }

    fn forward_dispatch(&self, event_type: &str, data: Option<serde_json::Value>) {
        match EventParser::parse_dispatch(event_type, data) {
            Ok(DispatchEvent::Unknown { event_type }) => {
                trace!(event = %event_type, "Ignoring dispatch");
            }
            Ok(event) => {
                debug!(event = event_type, "Dispatching event");
                let _ = self.event_tx.send(GatewayEventKind::Dispatch(event));
            }
            Err(e) => {
                warn!(event = event_type, error = %e, "Failed to parse dispatch event");
            }
        }
    }

    fn track_sequence(&mut self, sequence: Option<u64>) {
        self.session.record_sequence(sequence);
        if let Some(seq) = sequence {
            self.sequence.store(seq, Ordering::SeqCst);
        }
    }

    /// Closes the underlying connection without surfacing an error.
    pub async fn shutdown(&mut self) {
        if let Err(e) = self.connection.disconnect().await {
            debug!(error = %e, "Error closing gateway connection");
        }
    }

    #[must_use]
    pub const fn session(&self) -> &ResumeSession {
        &self.session
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde_json::{Value, json};
    use std::collections::VecDeque;

    struct MockConnection {
        incoming: VecDeque<GatewayMessage>,
        sent: Arc<Mutex<Vec<(u8, Value)>>>,
        connected: bool,
    }

    impl MockConnection {
        fn new(incoming: Vec<GatewayMessage>) -> (Self, Arc<Mutex<Vec<(u8, Value)>>>) {
            let sent = Arc::new(Mutex::new(Vec::new()));
            (
                Self {
                    incoming: incoming.into(),
                    sent: sent.clone(),
                    connected: false,
                },
                sent,
            )
        }
    }

    #[async_trait]
    impl GatewayConnection for MockConnection {
        async fn connect(&mut self, _gateway_url: Option<&str>) -> GatewayResult<()> {
            self.connected = true;
            Ok(())
        }

        async fn disconnect(&mut self) -> GatewayResult<()> {
            self.connected = false;
            Ok(())
        }

        async fn send(&mut self, payload: &GatewayPayload) -> GatewayResult<()> {
            self.sent.lock().push((payload.op, payload.d.clone()));
            Ok(())
        }

        async fn receive(&mut self) -> GatewayResult<Option<GatewayMessage>> {
            match self.incoming.pop_front() {
                Some(message) => Ok(Some(message)),
                None => Err(GatewayError::Closed {
                    code: 1006,
                    reason: "script exhausted".to_string(),
                }),
            }
        }

        fn is_connected(&self) -> bool {
            self.connected
        }
    }

    fn message(op: u8, d: Value, s: Option<u64>, t: Option<&str>) -> GatewayMessage {
        GatewayMessage {
            op,
            d: Some(d),
            s,
            t: t.map(ToString::to_string),
        }
    }

    fn runner_with(
        incoming: Vec<GatewayMessage>,
        session: ResumeSession,
    ) -> (
        ConnectionRunner,
        mpsc::UnboundedReceiver<GatewayEventKind>,
        Arc<Mutex<Vec<(u8, Value)>>>,
    ) {
        let (connection, sent) = MockConnection::new(incoming);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (_outbound_tx, outbound_rx) = mpsc::channel(8);

        let runner = ConnectionRunner::new(
            Box::new(connection),
            session,
            "token".to_string(),
            GatewayIntents::bot_default(),
            event_tx,
            outbound_rx,
            Arc::new(AtomicU64::new(0)),
            Arc::new(AtomicBool::new(true)),
        );

        (runner, event_rx, sent)
    }

    #[tokio::test]
    async fn test_establish_identifies_and_emits_ready() {
        let incoming = vec![
            message(10, json!({"heartbeat_interval": 41250}), None, None),
            message(
                0,
                json!({
                    "session_id": "sess1",
                    "resume_gateway_url": "wss://resume.gg",
                    "user": {"id": "555"},
                    "application": {"id": "777"}
                }),
                Some(1),
                Some("READY"),
            ),
        ];
        let (mut runner, mut event_rx, sent) = runner_with(incoming, ResumeSession::new());

        let interval = runner.establish().await.unwrap();
        assert_eq!(interval, 41250);
        assert_eq!(runner.session().id(), Some("sess1"));

        // Identify was the only payload sent.
        let sent = sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, 2);

        assert!(matches!(
            event_rx.try_recv().unwrap(),
            GatewayEventKind::Connected { .. }
        ));
        assert!(matches!(
            event_rx.try_recv().unwrap(),
            GatewayEventKind::Dispatch(DispatchEvent::Ready(_))
        ));
    }

    #[tokio::test]
    async fn test_establish_resumes_and_forwards_replay() {
        let mut session = ResumeSession::new();
        session.record("sess1".into(), None);
        session.record_sequence(Some(12));

        let incoming = vec![
            message(10, json!({"heartbeat_interval": 41250}), None, None),
            message(
                0,
                json!({"id": "314", "name": "painting club"}),
                Some(13),
                Some("GUILD_CREATE"),
            ),
            message(0, json!({}), Some(14), Some("RESUMED")),
        ];
        let (mut runner, mut event_rx, sent) = runner_with(incoming, session);

        runner.establish().await.unwrap();

        // Resume, not Identify.
        assert_eq!(sent.lock()[0].0, 6);
        assert_eq!(runner.session().sequence(), Some(14));

        assert!(matches!(
            event_rx.try_recv().unwrap(),
            GatewayEventKind::Dispatch(DispatchEvent::GuildCreate { .. })
        ));
        assert!(matches!(
            event_rx.try_recv().unwrap(),
            GatewayEventKind::Resumed
        ));
    }

    #[tokio::test]
    async fn test_run_answers_heartbeat_request() {
        let (mut runner, _event_rx, sent) = runner_with(
            vec![message(1, Value::Null, None, None)],
            ResumeSession::new(),
        );

        let result = runner.run().await;
        assert!(result.is_err());

        let sent = sent.lock();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, 1);
    }

    #[tokio::test]
    async fn test_invalid_session_clears_resume_state() {
        let mut session = ResumeSession::new();
        session.record("sess1".into(), None);
        session.record_sequence(Some(5));

        let (mut runner, _event_rx, _sent) =
            runner_with(vec![message(9, json!(false), None, None)], session);

        let result = runner.run().await;
        assert!(matches!(
            result,
            Err(GatewayError::SessionInvalidated { resumable: false })
        ));
        assert!(!runner.session().can_resume());
    }

    #[tokio::test]
    async fn test_reconnect_request_surfaces_resumable_close() {
        let (mut runner, _event_rx, _sent) =
            runner_with(vec![message(7, Value::Null, None, None)], ResumeSession::new());

        let error = runner.run().await.unwrap_err();
        assert_eq!(error.close_code(), Some(4000));
        assert!(error.can_resume());
    }

    #[test]
    fn test_websocket_connection_initial_state() {
        let conn = WebSocketConnection::new();
        assert!(!conn.is_connected());
    }
}
