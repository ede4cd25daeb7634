//! Discord API client.

mod client;
mod commands;
mod dto;
pub mod gateway;
mod responder;

pub use client::{ApiError, DiscordRestClient};
pub use commands::{COLLAGE_COMMAND, CommandDefinition, command_surface};
pub use gateway::{
    DispatchEvent, GatewayClient, GatewayEventKind, GatewayIntents, IncomingInteraction,
    ReadySession,
};
pub use responder::FollowupResponder;
