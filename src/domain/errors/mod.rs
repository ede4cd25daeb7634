//! Domain error types.

mod composite_error;
mod fetch_error;
mod respond_error;
mod service_error;
mod store_error;
mod token_error;

pub use composite_error::CompositeError;
pub use fetch_error::FetchError;
pub use respond_error::RespondError;
pub use service_error::ServiceError;
pub use store_error::StoreError;
pub use token_error::TokenError;
