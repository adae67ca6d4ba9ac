//! Response primitives consumed by the orchestrator.

use std::pin::Pin;

use delivery_core::{DeliveryError, ResponseHeaders};
use futures::Sink;

/// Body sink exposed by a transport for streamed responses.
pub type BodySink<'a> = Pin<Box<dyn Sink<Vec<u8>, Error = DeliveryError> + Send + 'a>>;

/// Outgoing side of one HTTP exchange.
///
/// Implemented by the HTTP layer. Errors returned here are surfaced to the
/// caller of `Orchestrator::deliver` as-is.
pub trait ResponseTransport: Send {
    /// Whether the response was already ended by an earlier stage.
    fn is_finished(&self) -> bool;

    /// Current status code.
    fn status(&self) -> u16;

    /// Set the status code.
    fn set_status(&mut self, status: u16);

    /// Response headers.
    fn headers(&self) -> &ResponseHeaders;

    /// Mutable response headers.
    fn headers_mut(&mut self) -> &mut ResponseHeaders;

    /// Sink for writing the body incrementally.
    fn body_sink(&mut self) -> BodySink<'_>;

    /// End the response, optionally with a complete body.
    ///
    /// After a streamed body, `end(None)` finishes the exchange and keeps the
    /// bytes already written through `body_sink`.
    fn end(&mut self, body: Option<Vec<u8>>) -> Result<(), DeliveryError>;
}

/// In-process transport that records everything written to it.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    status: u16,
    headers: ResponseHeaders,
    body: Option<Vec<u8>>,
    chunks: Vec<Vec<u8>>,
    finished: bool,
    fail_after_chunks: Option<usize>,
}

impl MemoryTransport {
    /// Create an open transport with status 200.
    pub fn new() -> Self {
        Self {
            status: 200,
            headers: ResponseHeaders::new(),
            body: None,
            chunks: Vec::new(),
            finished: false,
            fail_after_chunks: None,
        }
    }

    /// Mark the exchange as already ended.
    pub fn already_finished(mut self) -> Self {
        self.finished = true;
        self
    }

    /// Reject body writes once `count` chunks have been accepted.
    pub fn failing_after(mut self, count: usize) -> Self {
        self.fail_after_chunks = Some(count);
        self
    }

    /// Pre-set a response header, as an earlier stage would.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, DeliveryError> {
        self.headers.set(name, value)?;
        Ok(self)
    }

    /// Body passed to `end`, if any.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Chunks written through the body sink.
    pub fn chunks(&self) -> &[Vec<u8>] {
        &self.chunks
    }

    /// Full body as seen by the client: the ended body, else streamed chunks.
    pub fn body_bytes(&self) -> Vec<u8> {
        match &self.body {
            Some(body) => body.clone(),
            None => self.chunks.concat(),
        }
    }

    /// Convert into an `http::Response`.
    pub fn into_response(self) -> Result<http::Response<Vec<u8>>, DeliveryError> {
        let body = self.body_bytes();
        let mut response = http::Response::new(body);
        *response.status_mut() = http::StatusCode::from_u16(self.status)
            .map_err(|e| DeliveryError::transport(format!("invalid status {}: {}", self.status, e)))?;
        *response.headers_mut() = self.headers.into_header_map();
        Ok(response)
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseTransport for MemoryTransport {
    fn is_finished(&self) -> bool {
        self.finished
    }

    fn status(&self) -> u16 {
        self.status
    }

    fn set_status(&mut self, status: u16) {
        self.status = status;
    }

    fn headers(&self) -> &ResponseHeaders {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut ResponseHeaders {
        &mut self.headers
    }

    fn body_sink(&mut self) -> BodySink<'_> {
        let limit = self.fail_after_chunks;
        Box::pin(futures::sink::unfold(
            &mut self.chunks,
            move |chunks, chunk: Vec<u8>| async move {
                if limit.is_some_and(|n| chunks.len() >= n) {
                    return Err(DeliveryError::transport("connection reset by peer"));
                }
                chunks.push(chunk);
                Ok(chunks)
            },
        ))
    }

    fn end(&mut self, body: Option<Vec<u8>>) -> Result<(), DeliveryError> {
        if self.finished {
            return Err(DeliveryError::transport("response already ended"));
        }
        self.body = body;
        self.finished = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures::SinkExt;

    use super::*;

    #[test]
    fn test_end_once() {
        let mut transport = MemoryTransport::new();
        transport.end(Some(b"ok".to_vec())).unwrap();

        assert!(transport.is_finished());
        assert_eq!(transport.body(), Some(&b"ok"[..]));
        assert!(transport.end(None).is_err());
    }

    #[tokio::test]
    async fn test_body_sink_records_chunks() {
        let mut transport = MemoryTransport::new();
        {
            let mut sink = transport.body_sink();
            sink.send(b"a".to_vec()).await.unwrap();
            sink.send(b"b".to_vec()).await.unwrap();
        }
        transport.end(None).unwrap();

        assert_eq!(transport.chunks().len(), 2);
        assert_eq!(transport.body_bytes(), b"ab".to_vec());
    }

    #[tokio::test]
    async fn test_failing_sink() {
        let mut transport = MemoryTransport::new().failing_after(1);
        let mut sink = transport.body_sink();
        sink.send(b"a".to_vec()).await.unwrap();
        assert!(sink.send(b"b".to_vec()).await.is_err());
    }

    #[test]
    fn test_into_response() {
        let mut transport = MemoryTransport::new()
            .with_header("Content-Type", "text/plain")
            .unwrap();
        transport.set_status(304);
        transport.end(None).unwrap();

        let response = transport.into_response().unwrap();
        assert_eq!(response.status(), http::StatusCode::NOT_MODIFIED);
        assert_eq!(response.headers()["content-type"], "text/plain");
        assert!(response.body().is_empty());
    }
}
