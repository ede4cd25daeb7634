use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::HashMap;

use super::constants::{
    CLIENT_PROPERTIES_BROWSER, CLIENT_PROPERTIES_DEVICE, CLIENT_PROPERTIES_OS,
};

/// Outbound gateway frame.
#[derive(Debug, Serialize, Deserialize)]
pub struct GatewayPayload {
    pub op: u8,
    pub d: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<String>,
}

impl GatewayPayload {
    fn send(op: u8, d: Value) -> Self {
        Self {
            op,
            d,
            s: None,
            t: None,
        }
    }

    #[must_use]
    pub fn heartbeat(sequence: Option<u64>) -> Self {
        Self::send(1, json!(sequence))
    }

    #[must_use]
    pub fn identify(token: &str, intents: u32) -> Self {
        Self::send(
            2,
            json!({
                "token": token,
                "intents": intents,
                "properties": {
                    "os": CLIENT_PROPERTIES_OS,
                    "browser": CLIENT_PROPERTIES_BROWSER,
                    "device": CLIENT_PROPERTIES_DEVICE,
                },
            }),
        )
    }

    #[must_use]
    pub fn resume(token: &str, session_id: &str, sequence: u64) -> Self {
        Self::send(
            6,
            json!({
                "token": token,
                "session_id": session_id,
                "seq": sequence,
            }),
        )
    }
}

/// Inbound gateway frame before dispatch-specific decoding.
#[derive(Debug, Deserialize)]
pub struct GatewayMessage {
    pub op: u8,
    pub d: Option<Value>,
    pub s: Option<u64>,
    pub t: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HelloPayload {
    pub heartbeat_interval: u64,
}

#[derive(Debug, Deserialize)]
pub struct ReadyPayload {
    pub session_id: String,
    pub resume_gateway_url: Option<String>,
    pub user: ReadyUser,
    pub application: ReadyApplication,
}

#[derive(Debug, Deserialize)]
pub struct ReadyUser {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct ReadyApplication {
    pub id: String,
}

#[derive(Debug, Deserialize)]
pub struct InteractionPayload {
    pub id: String,
    pub token: String,
    #[serde(rename = "type", default)]
    pub kind: u8,
    pub guild_id: Option<String>,
    pub data: Option<InteractionDataPayload>,
}

#[derive(Debug, Deserialize)]
pub struct InteractionDataPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub options: Vec<InteractionOptionPayload>,
    pub resolved: Option<ResolvedDataPayload>,
}

#[derive(Debug, Deserialize)]
pub struct InteractionOptionPayload {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: u8,
    pub value: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct ResolvedDataPayload {
    #[serde(default)]
    pub attachments: HashMap<String, AttachmentPayload>,
}

#[derive(Debug, Deserialize)]
pub struct AttachmentPayload {
    pub url: String,
    pub filename: String,
    pub content_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GuildCreatePayload {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unavailable: bool,
}
