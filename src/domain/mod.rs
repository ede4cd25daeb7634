//! Domain layer with core business entities and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;

pub use entities::{BotToken, Canvas, CompositeRequest, CompositeSource, GuildId};
pub use errors::ServiceError;
pub use ports::{CanvasStorePort, ImageFetchPort, ResponderPort, TokenStoragePort, Visibility};
