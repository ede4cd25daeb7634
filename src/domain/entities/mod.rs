//! Domain entity definitions.

mod canvas;
mod guild;
mod history;
mod request;
mod token;

pub use canvas::{Canvas, DEFAULT_CANVAS_HEIGHT, DEFAULT_CANVAS_WIDTH};
pub use guild::GuildId;
pub use history::HistoryLog;
pub use request::{CompositeRequest, CompositeSource};
pub use token::BotToken;
