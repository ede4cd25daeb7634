//! Infrastructure layer with external service adapters.

/// Application configuration.
pub mod config;
/// Discord API client.
pub mod discord;
/// Source image download.
pub mod fetch;
/// Token storage adapters.
pub mod storage;
/// Canvas and history persistence.
pub mod store;

pub use config::{AppConfig, CliArgs, Command, LogLevel, StorageManager};
pub use discord::{
    DiscordRestClient, DispatchEvent, FollowupResponder, GatewayClient, GatewayEventKind,
    GatewayIntents, IncomingInteraction,
};
pub use fetch::HttpImageFetcher;
pub use storage::{FileTokenStorage, prompt_for_token};
pub use store::FileCanvasStore;
