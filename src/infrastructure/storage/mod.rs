//! Token storage adapters.

mod token_file;

pub use token_file::{FileTokenStorage, prompt_for_token};
