//! Remote image fetching.

mod http_fetcher;

pub use http_fetcher::HttpImageFetcher;
