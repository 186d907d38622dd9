//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Proxy error: {0}")]
    Proxy(#[from] courier_proxy::ProxyError),

    #[error("Store error: {0}")]
    Store(#[from] courier_store::StoreError),
}

impl From<CoreError> for courier_proxy::ProxyError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Proxy(e) => e,
            other => courier_proxy::ProxyError::Middleware(Box::new(other)),
        }
    }
}
