//! Courier Upstream Transport
//!
//! This crate provides the HTTP message model shared by every layer of the
//! pipeline, the `Transport` seam that layers stack on, and a reqwest-backed
//! transport that performs the actual network exchange.

pub mod client;
pub mod error;
pub mod message;
pub mod transport;

pub use client::{HttpTransport, HttpTransportConfig};
pub use error::ProxyError;
pub use message::{Body, ByteStream, CONTENT_HEADERS, Request, Response, split_content_headers};
pub use transport::Transport;
