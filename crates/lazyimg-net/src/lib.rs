//! lazyimg Networking
//!
//! Request/response types and the `Fetcher` seam the widget host talks to.

pub mod fetch;
pub mod http;
pub mod loader;
pub mod memory;

use std::future::Future;

pub use fetch::FetchResponse;
pub use http::{HttpFetcher, HttpFetcherBuilder};
pub use loader::{Method, Request};
pub use memory::MemoryFetcher;
pub use url::Url;

/// HTTP Response
#[derive(Debug, Clone, Default)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Network error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetError {
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

/// Something that can perform HTTP requests for the widget host
///
/// Implementations resolve transport failures to `Err`; non-2xx responses
/// come back as `Ok` and are judged by the caller.
pub trait Fetcher {
    fn fetch(&self, request: Request) -> impl Future<Output = Result<FetchResponse, NetError>>;

    /// GET a URL
    fn get(&self, url: &str) -> impl Future<Output = Result<FetchResponse, NetError>> {
        self.fetch(Request::get(url))
    }
}
