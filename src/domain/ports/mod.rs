mod canvas_store_port;
mod image_fetch_port;
mod responder_port;
mod token_storage_port;

pub use canvas_store_port::CanvasStorePort;
pub use image_fetch_port::ImageFetchPort;
pub use responder_port::{ResponderPort, Visibility};
pub use token_storage_port::TokenStoragePort;
