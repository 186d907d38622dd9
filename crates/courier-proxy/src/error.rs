//! Proxy error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Raised by a layer stacked on top of the transport rather than by the
    /// network exchange itself.
    #[error("Middleware error: {0}")]
    Middleware(#[source] Box<dyn std::error::Error + Send + Sync>),
}
