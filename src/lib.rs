//! Mosaicord - A Discord bot that grows a shared image collage per server.
//!
//! Every guild owns one persistent canvas. The `/collage` slash command
//! pastes a randomly scaled and placed image onto it, or shows the canvas
//! as it stands when invoked without an image.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing the compositor, queue, and use cases.
pub mod application;
/// Bot composition root wiring the gateway to the collage service.
pub mod bot;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "mosaicord";
