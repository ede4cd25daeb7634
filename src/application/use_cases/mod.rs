//! Use case implementations.

mod process_request;
mod resolve_token;

pub use process_request::{CanvasReply, ProcessRequestUseCase, canvas_filename};
pub use resolve_token::{ResolvedToken, ResolveTokenUseCase, TokenSource};
