//! Application layer with the compositor, queue, and use cases.

/// Canvas compositing.
pub mod compositor;
/// Service facade over the queue and worker.
pub mod service;
/// Use case implementations.
pub mod use_cases;
/// The serialized composite worker.
pub mod worker;

pub use compositor::{Compositor, FILL_RATIO, Placement};
pub use service::{CollageService, ServiceConfig};
pub use use_cases::{ProcessRequestUseCase, ResolveTokenUseCase};
pub use worker::WorkerState;
