//! Rendered output: a fully materialized payload or an incremental producer.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::error::DeliveryError;

/// Default media type for markup.
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";
/// Default media type for structured data.
pub const JSON_CONTENT_TYPE: &str = "application/json";
/// Default media type for serialized component streams.
pub const COMPONENT_STREAM_CONTENT_TYPE: &str = "text/x-component";

/// Declared kind of rendered content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentKind {
    /// HTML document.
    Markup,
    /// JSON, possibly newline-delimited chunks.
    StructuredData,
    /// Serialized component stream.
    ComponentStream,
}

impl ContentKind {
    /// Media type used when neither the renderer nor an earlier stage set one.
    pub fn default_content_type(&self) -> &'static str {
        match self {
            Self::Markup => HTML_CONTENT_TYPE,
            Self::StructuredData => JSON_CONTENT_TYPE,
            Self::ComponentStream => COMPONENT_STREAM_CONTENT_TYPE,
        }
    }

    /// Kebab-case name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Markup => "markup",
            Self::StructuredData => "structured-data",
            Self::ComponentStream => "component-stream",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown content kind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown content kind: {0} (expected markup, structured-data or component-stream)")]
pub struct UnknownContentKind(pub String);

impl FromStr for ContentKind {
    type Err = UnknownContentKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "markup" | "html" => Ok(Self::Markup),
            "structured-data" | "json" => Ok(Self::StructuredData),
            "component-stream" | "rsc" => Ok(Self::ComponentStream),
            other => Err(UnknownContentKind(other.to_string())),
        }
    }
}

/// Byte sink handed to a streaming producer.
///
/// Flow control is the sink's: producers must await `poll_ready` (for
/// example through `SinkExt::send`) before each write.
pub trait ByteSink: Sink<Vec<u8>, Error = DeliveryError> + Send + Unpin {}

impl<T> ByteSink for T where T: Sink<Vec<u8>, Error = DeliveryError> + Send + Unpin {}

/// A producer that writes its content incrementally into a sink.
#[async_trait]
pub trait StreamProducer: Send {
    /// Write all content into `sink`. Consumed exactly once.
    async fn pipe_into(self: Box<Self>, sink: &mut dyn ByteSink) -> Result<(), DeliveryError>;
}

/// Adapts a `Stream` of byte chunks into a `StreamProducer`.
pub struct StreamBody<S> {
    stream: S,
}

impl<S> StreamBody<S>
where
    S: Stream<Item = Result<Vec<u8>, DeliveryError>> + Send + Unpin,
{
    /// Wrap a chunk stream.
    pub fn new(stream: S) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl<S> StreamProducer for StreamBody<S>
where
    S: Stream<Item = Result<Vec<u8>, DeliveryError>> + Send + Unpin,
{
    async fn pipe_into(mut self: Box<Self>, sink: &mut dyn ByteSink) -> Result<(), DeliveryError> {
        while let Some(chunk) = self.stream.next().await {
            sink.send(chunk?).await?;
        }
        Ok(())
    }
}

/// Body of a rendered output, selected once per exchange.
pub enum Payload {
    /// Fully materialized text.
    Buffered(String),
    /// Incremental producer; the payload is never materialized.
    Streaming(Box<dyn StreamProducer>),
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Buffered(text) => f.debug_tuple("Buffered").field(&text.len()).finish(),
            Self::Streaming(_) => f.write_str("Streaming(..)"),
        }
    }
}

/// Output of a render, consumed exactly once by the orchestrator.
#[derive(Debug)]
pub struct RenderedOutput {
    /// Declared content kind.
    pub kind: ContentKind,
    /// Media type declared by the renderer.
    pub content_type: Option<String>,
    /// Buffered or streaming body.
    pub payload: Payload,
}

impl RenderedOutput {
    /// Create a fully materialized output.
    pub fn buffered(kind: ContentKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            content_type: None,
            payload: Payload::Buffered(text.into()),
        }
    }

    /// Create an incremental output.
    pub fn streaming(kind: ContentKind, producer: impl StreamProducer + 'static) -> Self {
        Self {
            kind,
            content_type: None,
            payload: Payload::Streaming(Box::new(producer)),
        }
    }

    /// Set the renderer-declared media type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Borrow the buffered text, if materialized.
    pub fn buffered_text(&self) -> Option<&str> {
        match &self.payload {
            Payload::Buffered(text) => Some(text),
            Payload::Streaming(_) => None,
        }
    }

    /// Media type to send: the declared one, else the kind's default.
    pub fn resolved_content_type(&self) -> &str {
        self.content_type
            .as_deref()
            .unwrap_or_else(|| self.kind.default_content_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_content_types() {
        assert_eq!(
            ContentKind::Markup.default_content_type(),
            "text/html; charset=utf-8"
        );
        assert_eq!(
            ContentKind::StructuredData.default_content_type(),
            "application/json"
        );
        assert_eq!(
            ContentKind::ComponentStream.default_content_type(),
            "text/x-component"
        );
    }

    #[test]
    fn test_content_kind_parse() {
        assert_eq!("markup".parse::<ContentKind>().unwrap(), ContentKind::Markup);
        assert_eq!(
            "structured-data".parse::<ContentKind>().unwrap(),
            ContentKind::StructuredData
        );
        assert!("xml".parse::<ContentKind>().is_err());
    }

    #[test]
    fn test_content_kind_serde() {
        let json = serde_json::to_string(&ContentKind::ComponentStream).unwrap();
        assert_eq!(json, "\"component-stream\"");
    }

    #[test]
    fn test_resolved_content_type_prefers_declared() {
        let output = RenderedOutput::buffered(ContentKind::Markup, "<p>")
            .with_content_type("application/xhtml+xml");
        assert_eq!(output.resolved_content_type(), "application/xhtml+xml");

        let output = RenderedOutput::buffered(ContentKind::StructuredData, "{}");
        assert_eq!(output.resolved_content_type(), JSON_CONTENT_TYPE);
    }

    #[test]
    fn test_materialization() {
        let output = RenderedOutput::buffered(ContentKind::Markup, "hi");
        assert_eq!(output.buffered_text(), Some("hi"));

        let chunks = futures::stream::iter(vec![Ok(b"a".to_vec())]);
        let output = RenderedOutput::streaming(ContentKind::Markup, StreamBody::new(chunks));
        assert_eq!(output.buffered_text(), None);
    }

    #[tokio::test]
    async fn test_stream_body_forwards_chunks() {
        let chunks = futures::stream::iter(vec![Ok(b"one".to_vec()), Ok(b"two".to_vec())]);
        let producer: Box<dyn StreamProducer> = Box::new(StreamBody::new(chunks));

        let mut collected: Vec<Vec<u8>> = Vec::new();
        let mut sink = Box::pin(futures::sink::unfold(
            &mut collected,
            |acc, chunk: Vec<u8>| async move {
                acc.push(chunk);
                Ok::<_, DeliveryError>(acc)
            },
        ));
        producer.pipe_into(&mut sink).await.unwrap();
        drop(sink);

        assert_eq!(collected, vec![b"one".to_vec(), b"two".to_vec()]);
    }

    #[tokio::test]
    async fn test_stream_body_propagates_chunk_error() {
        let chunks = futures::stream::iter(vec![
            Ok(b"one".to_vec()),
            Err(DeliveryError::transport("upstream closed")),
        ]);
        let producer: Box<dyn StreamProducer> = Box::new(StreamBody::new(chunks));

        let mut sink = futures::sink::drain::<Vec<u8>>().sink_map_err(|_| DeliveryError::transport("drain"));
        let err = producer.pipe_into(&mut sink).await.unwrap_err();
        assert!(err.is_transport());
    }
}
