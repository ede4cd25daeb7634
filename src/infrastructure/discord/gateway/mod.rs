mod client;
mod codec;
mod connection;
mod constants;
mod error;
mod events;
mod heartbeat;
mod payloads;
mod session;

pub use client::{GatewayClient, ReconnectPolicy};
pub use connection::GatewayConnection;
pub use constants::{GatewayIntents, GatewayOpcode};
pub use error::{CloseAction, GatewayError, GatewayResult, close_action};
pub use events::{DispatchEvent, GatewayEventKind, IncomingInteraction, ReadySession};
pub use session::ResumeSession;
