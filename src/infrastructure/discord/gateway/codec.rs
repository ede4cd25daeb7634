use flate2::{Decompress, FlushDecompress, Status};
use serde_json::Value;

use super::constants::ZLIB_SUFFIX;
use super::error::{GatewayError, GatewayResult};
use super::events::{DispatchEvent, IncomingInteraction, ReadySession};
use super::payloads::{GatewayMessage, GuildCreatePayload, HelloPayload, InteractionPayload, ReadyPayload};

use crate::domain::entities::GuildId;
use crate::infrastructure::discord::commands::{OPTION_ATTACHMENT, OPTION_IMAGE_URL};

const INFLATE_CHUNK_SIZE: usize = 32 * 1024;
const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Application command interaction type.
const INTERACTION_KIND_COMMAND: u8 = 2;

/// Decodes zlib-stream transport frames into JSON text.
///
/// Discord shares one zlib context across the whole connection and marks
/// message boundaries with a sync flush suffix, so frames accumulate until
/// the suffix arrives.
pub struct TransportCodec {
    inflater: Decompress,
    pending: Vec<u8>,
}

impl TransportCodec {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inflater: Decompress::new(true),
            pending: Vec::with_capacity(4096),
        }
    }

    /// Feeds one binary frame, returning the decoded message once complete.
    pub fn feed(&mut self, frame: &[u8]) -> GatewayResult<Option<String>> {
        self.pending.extend_from_slice(frame);

        if !self.message_complete() {
            return Ok(None);
        }

        let text = self.inflate_pending()?;
        self.pending.clear();
        Ok(Some(text))
    }

    fn message_complete(&self) -> bool {
        self.pending.len() >= 4 && self.pending[self.pending.len() - 4..] == ZLIB_SUFFIX
    }

    fn inflate_pending(&mut self) -> GatewayResult<String> {
        let mut output = Vec::with_capacity(INFLATE_CHUNK_SIZE);
        let mut chunk = vec![0u8; INFLATE_CHUNK_SIZE];
        let mut consumed_total = 0;

        loop {
            let in_before = self.inflater.total_in();
            let out_before = self.inflater.total_out();

            let status = self
                .inflater
                .decompress(
                    &self.pending[consumed_total..],
                    &mut chunk,
                    FlushDecompress::Sync,
                )
                .map_err(|e| GatewayError::inflate(e.to_string()))?;

            let consumed = usize::try_from(self.inflater.total_in() - in_before).unwrap_or(0);
            let produced = usize::try_from(self.inflater.total_out() - out_before).unwrap_or(0);

            consumed_total += consumed;
            output.extend_from_slice(&chunk[..produced]);

            if output.len() > MAX_MESSAGE_SIZE {
                return Err(GatewayError::inflate(
                    "decompressed message exceeds maximum size",
                ));
            }

            match status {
                Status::StreamEnd => break,
                Status::Ok | Status::BufError => {
                    if consumed_total >= self.pending.len() && produced < chunk.len() {
                        break;
                    }
                    if consumed == 0 && produced == 0 {
                        return Err(GatewayError::inflate("inflater made no progress"));
                    }
                }
            }
        }

        String::from_utf8(output)
            .map_err(|e| GatewayError::inflate(format!("invalid UTF-8: {e}")))
    }

    /// Resets the shared zlib context. Required after every reconnect.
    pub fn reset(&mut self) {
        self.inflater.reset(true);
        self.pending.clear();
    }
}

impl Default for TransportCodec {
    fn default() -> Self {
        Self::new()
    }
}

pub struct EventParser;

impl EventParser {
    pub fn parse_message(json: &str) -> GatewayResult<GatewayMessage> {
        serde_json::from_str(json).map_err(|e| GatewayError::protocol(e.to_string()))
    }

    pub fn parse_hello(data: &Value) -> GatewayResult<HelloPayload> {
        serde_json::from_value(data.clone())
            .map_err(|e| GatewayError::protocol(format!("Failed to parse Hello: {e}")))
    }

    pub fn parse_dispatch(event_type: &str, data: Option<Value>) -> GatewayResult<DispatchEvent> {
        let data = data.ok_or_else(|| GatewayError::protocol("Missing dispatch data"))?;

        match event_type {
            "READY" => Self::parse_ready(data),
            "INTERACTION_CREATE" => Self::parse_interaction_create(data),
            "GUILD_CREATE" => Self::parse_guild_create(data),
            _ => Ok(DispatchEvent::Unknown {
                event_type: event_type.to_string(),
            }),
        }
    }

    fn parse_ready(data: Value) -> GatewayResult<DispatchEvent> {
        let ready: ReadyPayload = serde_json::from_value(data)
            .map_err(|e| GatewayError::protocol(format!("Failed to parse Ready: {e}")))?;

        Ok(DispatchEvent::Ready(ReadySession {
            session_id: ready.session_id,
            resume_gateway_url: ready.resume_gateway_url,
            user_id: ready.user.id,
            application_id: ready.application.id,
        }))
    }

    fn parse_interaction_create(data: Value) -> GatewayResult<DispatchEvent> {
        let payload: InteractionPayload = serde_json::from_value(data).map_err(|e| {
            GatewayError::protocol(format!("Failed to parse InteractionCreate: {e}"))
        })?;

        // Pings and component interactions are not commands.
        if payload.kind != INTERACTION_KIND_COMMAND {
            return Ok(DispatchEvent::Unknown {
                event_type: "INTERACTION_CREATE".to_string(),
            });
        }

        let command_data = payload
            .data
            .ok_or_else(|| GatewayError::protocol("Missing interaction data"))?;

        let guild_id = payload
            .guild_id
            .and_then(|id| id.parse::<u64>().ok())
            .map(GuildId);

        let mut image_url = None;
        let mut attachment_id = None;
        for option in &command_data.options {
            match option.name.as_str() {
                OPTION_IMAGE_URL => {
                    image_url = option
                        .value
                        .as_ref()
                        .and_then(Value::as_str)
                        .map(ToString::to_string);
                }
                OPTION_ATTACHMENT => {
                    attachment_id = option
                        .value
                        .as_ref()
                        .and_then(Value::as_str)
                        .map(ToString::to_string);
                }
                _ => {}
            }
        }

        // Attachment options carry a snowflake; the URL lives in resolved data.
        let attachment_url = attachment_id.and_then(|id| {
            command_data
                .resolved
                .as_ref()
                .and_then(|resolved| resolved.attachments.get(&id))
                .map(|attachment| attachment.url.clone())
        });

        Ok(DispatchEvent::InteractionCreate(IncomingInteraction {
            id: payload.id,
            token: payload.token,
            guild_id,
            command: command_data.name,
            image_url,
            attachment_url,
        }))
    }

    fn parse_guild_create(data: Value) -> GatewayResult<DispatchEvent> {
        let payload: GuildCreatePayload = serde_json::from_value(data).map_err(|e| {
            GatewayError::protocol(format!("Failed to parse GuildCreate: {e}"))
        })?;

        let guild_id = payload
            .id
            .parse::<u64>()
            .map_err(|_| GatewayError::protocol("Invalid guild ID"))?;

        Ok(DispatchEvent::GuildCreate {
            guild_id: GuildId(guild_id),
            name: payload.name,
        })
    }
}
