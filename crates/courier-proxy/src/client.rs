//! Upstream HTTP client

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::ProxyError;
use crate::message::{Body, Request, Response, split_content_headers};
use crate::transport::Transport;

/// HTTP transport configuration
#[derive(Clone, Debug, Default)]
pub struct HttpTransportConfig {
    /// Total request timeout
    pub timeout: Option<Duration>,
    /// User-Agent sent with every request
    pub user_agent: Option<String>,
    /// Skip TLS certificate verification
    pub skip_tls_verify: bool,
}

/// Network transport backed by reqwest
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a new HTTP transport
    pub fn new(config: HttpTransportConfig) -> Result<Self, ProxyError> {
        let mut builder = Client::builder();

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(ref user_agent) = config.user_agent {
            builder = builder.user_agent(user_agent);
        }

        if config.skip_tls_verify {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build()?;

        info!(
            "Created HTTP transport (timeout: {:?}, skip_tls_verify: {})",
            config.timeout, config.skip_tls_verify
        );

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<Response, ProxyError> {
        let Request {
            method,
            url,
            headers,
        } = request;

        debug!("Sending {} {}", method, url);

        let upstream = self.client.request(method, url).headers(headers).send().await?;

        let status = upstream.status();
        let version = upstream.version();
        let (headers, content_headers) = split_content_headers(upstream.headers());

        debug!("Upstream responded {} ({:?})", status, version);

        let stream = upstream
            .bytes_stream()
            .map(|chunk| chunk.map_err(ProxyError::from));

        Ok(Response {
            status,
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            version,
            headers,
            body: Some(Body::from_stream(Box::pin(stream)).with_headers(content_headers)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_with_options() {
        let transport = HttpTransport::new(HttpTransportConfig {
            timeout: Some(Duration::from_secs(5)),
            user_agent: Some("courier-test".to_string()),
            skip_tls_verify: true,
        });
        assert!(transport.is_ok());
    }

    #[test]
    fn test_build_with_defaults() {
        assert!(HttpTransport::new(HttpTransportConfig::default()).is_ok());
    }
}
