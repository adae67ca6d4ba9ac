//! Byte-counting wrapper around the transport body sink.

use std::pin::Pin;
use std::task::{Context, Poll};

use delivery_core::DeliveryError;
use futures::Sink;

use crate::transport::BodySink;

/// Sink handed to streaming producers.
///
/// Forwards every call to the transport sink unchanged, so the transport's
/// flow control applies, and counts what was accepted.
pub struct DeliverySink<'a> {
    inner: BodySink<'a>,
    chunks: usize,
    bytes: u64,
}

impl<'a> DeliverySink<'a> {
    /// Wrap a transport body sink.
    pub fn new(inner: BodySink<'a>) -> Self {
        Self {
            inner,
            chunks: 0,
            bytes: 0,
        }
    }

    /// Number of chunks accepted by the transport.
    pub fn chunks_written(&self) -> usize {
        self.chunks
    }

    /// Number of bytes accepted by the transport.
    pub fn bytes_written(&self) -> u64 {
        self.bytes
    }
}

impl Sink<Vec<u8>> for DeliverySink<'_> {
    type Error = DeliveryError;

    fn poll_ready(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.as_mut().poll_ready(cx)
    }

    fn start_send(mut self: Pin<&mut Self>, item: Vec<u8>) -> Result<(), Self::Error> {
        let len = item.len() as u64;
        self.inner.as_mut().start_send(item)?;
        self.chunks += 1;
        self.bytes += len;
        Ok(())
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.as_mut().poll_flush(cx)
    }

    fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.as_mut().poll_close(cx)
    }
}

#[cfg(test)]
mod tests {
    use futures::SinkExt;

    use super::*;

    #[tokio::test]
    async fn test_counts_accepted_chunks() {
        let mut received: Vec<Vec<u8>> = Vec::new();
        {
            let inner: BodySink<'_> = Box::pin(futures::sink::unfold(
                &mut received,
                |acc, chunk: Vec<u8>| async move {
                    acc.push(chunk);
                    Ok::<_, DeliveryError>(acc)
                },
            ));
            let mut sink = DeliverySink::new(inner);
            sink.send(b"<html>".to_vec()).await.unwrap();
            sink.send(b"</html>".to_vec()).await.unwrap();
            sink.close().await.unwrap();

            assert_eq!(sink.chunks_written(), 2);
            assert_eq!(sink.bytes_written(), 13);
        }
        assert_eq!(received.concat(), b"<html></html>".to_vec());
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let inner: BodySink<'_> = Box::pin(futures::sink::unfold((), |_, _chunk: Vec<u8>| async {
            Err::<(), _>(DeliveryError::transport("broken pipe"))
        }));
        let mut sink = DeliverySink::new(inner);

        let err = sink.send(b"x".to_vec()).await.unwrap_err();
        assert!(err.is_transport());
    }
}
