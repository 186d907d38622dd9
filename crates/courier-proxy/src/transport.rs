//! Transport trait

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::ProxyError;
use crate::message::{Request, Response};

/// A single request/response exchange
///
/// Implemented by the network client and by every layer that wraps one, so
/// layers can be stacked in any order.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return the response
    async fn send(&self, request: Request) -> Result<Response, ProxyError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: Request) -> Result<Response, ProxyError> {
        (**self).send(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn send(&self, request: Request) -> Result<Response, ProxyError> {
        (**self).send(request).await
    }
}
