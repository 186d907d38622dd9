//! Immutable response snapshots

use bytes::Bytes;
use courier_proxy::{Body, ProxyError, Response};
use http::{HeaderMap, StatusCode, Version};

/// Buffered body of a snapshot
#[derive(Debug, Clone)]
pub struct SnapshotBody {
    pub headers: HeaderMap,
    pub bytes: Bytes,
}

/// Immutable copy of a response, safe to store and to share
///
/// Every `to_response` call builds a new `Response` with its own `Body`
/// wrapper. Only the immutable `Bytes` buffer is shared between copies.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub status: StatusCode,
    pub reason: String,
    pub version: Version,
    pub headers: HeaderMap,
    pub body: Option<SnapshotBody>,
}

impl Snapshot {
    /// Take ownership of a response and buffer its body
    pub async fn capture(response: Response) -> Result<Self, ProxyError> {
        let body = match response.body {
            Some(body) => {
                let (headers, bytes) = body.collect().await?;
                Some(SnapshotBody { headers, bytes })
            }
            None => None,
        };

        Ok(Self {
            status: response.status,
            reason: response.reason,
            version: response.version,
            headers: response.headers,
            body,
        })
    }

    /// Build an independent response from this snapshot
    pub fn to_response(&self) -> Response {
        Response {
            status: self.status,
            reason: self.reason.clone(),
            version: self.version,
            headers: self.headers.clone(),
            body: self
                .body
                .as_ref()
                .map(|b| Body::from_bytes(b.bytes.clone()).with_headers(b.headers.clone())),
        }
    }

    /// Size of the buffered body in bytes
    pub fn body_len(&self) -> usize {
        self.body.as_ref().map_or(0, |b| b.bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::{HeaderValue, header};

    fn sample() -> Response {
        let chunks: Vec<Result<Bytes, ProxyError>> =
            vec![Ok(Bytes::from_static(b"hello ")), Ok(Bytes::from_static(b"world"))];
        let body = Body::from_stream(Box::pin(futures::stream::iter(chunks)))
            .with_header(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));

        let mut response = Response::new(StatusCode::OK)
            .with_header(header::CACHE_CONTROL, HeaderValue::from_static("max-age=60"))
            .with_header(header::VARY, HeaderValue::from_static("accept"))
            .with_header(header::VARY, HeaderValue::from_static("accept-encoding"))
            .with_body(body);
        response.reason = "Fine".to_string();
        response.version = Version::HTTP_2;
        response
    }

    #[tokio::test]
    async fn test_capture_buffers_stream() {
        let snapshot = Snapshot::capture(sample()).await.unwrap();

        assert_eq!(snapshot.status, StatusCode::OK);
        assert_eq!(snapshot.reason, "Fine");
        assert_eq!(snapshot.version, Version::HTTP_2);
        assert_eq!(snapshot.body_len(), 11);

        let body = snapshot.body.as_ref().unwrap();
        assert_eq!(&body.bytes[..], b"hello world");
        assert_eq!(body.headers[header::CONTENT_TYPE], "text/plain");

        let vary: Vec<_> = snapshot.headers.get_all(header::VARY).iter().collect();
        assert_eq!(vary, vec!["accept", "accept-encoding"]);
    }

    #[tokio::test]
    async fn test_copies_share_bytes_not_wrappers() {
        let snapshot = Snapshot::capture(sample()).await.unwrap();

        let first = snapshot.to_response();
        let second = snapshot.to_response();

        let first_body = first.body.unwrap();
        let second_body = second.body.unwrap();
        assert!(first_body.is_buffered());

        let first_bytes = first_body.bytes().await.unwrap();
        let second_bytes = second_body.bytes().await.unwrap();
        assert_eq!(first_bytes, second_bytes);
        assert_eq!(first_bytes.as_ptr(), snapshot.body.as_ref().unwrap().bytes.as_ptr());
    }

    #[tokio::test]
    async fn test_absent_body_stays_absent() {
        let response = Response::new(StatusCode::NO_CONTENT);
        let snapshot = Snapshot::capture(response).await.unwrap();

        assert!(snapshot.body.is_none());
        assert!(snapshot.to_response().body.is_none());
        assert_eq!(snapshot.body_len(), 0);
    }

    #[tokio::test]
    async fn test_empty_body_stays_present() {
        let response = Response::new(StatusCode::OK).with_body(Body::empty());
        let snapshot = Snapshot::capture(response).await.unwrap();

        let copy = snapshot.to_response();
        assert!(copy.body.is_some());
        assert!(copy.bytes().await.unwrap().is_empty());
    }
}
