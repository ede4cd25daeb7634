use crate::domain::entities::GuildId;

/// Events surfaced to the gateway client's consumer.
#[derive(Debug, Clone)]
pub enum GatewayEventKind {
    Connected {
        session_id: String,
        resume_url: Option<String>,
    },
    Disconnected {
        reason: String,
        can_resume: bool,
    },
    Reconnecting {
        attempt: u32,
    },
    Resumed,
    Dispatch(DispatchEvent),
    Error {
        message: String,
        recoverable: bool,
    },
}

/// Session identity delivered by the READY dispatch.
#[derive(Debug, Clone)]
pub struct ReadySession {
    pub session_id: String,
    pub resume_gateway_url: Option<String>,
    pub user_id: String,
    pub application_id: String,
}

/// A slash command invocation, reduced to what the bot acts on.
#[derive(Debug, Clone)]
pub struct IncomingInteraction {
    /// Interaction ID, needed to acknowledge within the deadline.
    pub id: String,
    /// Single-use token for followup responses.
    pub token: String,
    /// Guild the command was invoked in, absent for DMs.
    pub guild_id: Option<GuildId>,
    /// Invoked command name.
    pub command: String,
    /// Value of the URL option, when supplied.
    pub image_url: Option<String>,
    /// Resolved URL of the attachment option, when supplied.
    pub attachment_url: Option<String>,
}

#[derive(Debug, Clone)]
pub enum DispatchEvent {
    Ready(ReadySession),
    InteractionCreate(IncomingInteraction),
    GuildCreate {
        guild_id: GuildId,
        name: String,
    },
    Unknown {
        event_type: String,
    },
}

impl DispatchEvent {
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Ready(_) => "READY",
            Self::InteractionCreate(_) => "INTERACTION_CREATE",
            Self::GuildCreate { .. } => "GUILD_CREATE",
            Self::Unknown { .. } => "UNKNOWN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_name() {
        let event = DispatchEvent::GuildCreate {
            guild_id: GuildId(7),
            name: "painting club".to_string(),
        };
        assert_eq!(event.event_name(), "GUILD_CREATE");

        let unknown = DispatchEvent::Unknown {
            event_type: "TYPING_START".to_string(),
        };
        assert_eq!(unknown.event_name(), "UNKNOWN");
    }
}
