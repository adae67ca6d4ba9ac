//! Per-exchange delivery policy.

use std::collections::BTreeMap;
use std::time::Duration;

use delivery_cache::{negotiate, CacheDirectives, ConditionalValidators, Fingerprint};
use delivery_core::{
    header_names, ContentKind, DeliveryConfig, DeliveryError, DeliveryLifecycle, DeliveryPhase,
    Payload, RenderedOutput, RequestContext, TimingContext,
};
use delivery_normalize::Normalizer;
use delivery_observability::delivery_span;
use futures::SinkExt;
use serde::Serialize;
use tracing::Instrument;

use crate::sink::DeliverySink;
use crate::transport::ResponseTransport;

/// Status sent when the client's cached copy is still valid.
pub const NOT_MODIFIED: u16 = 304;

/// Caller-supplied options for one exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOptions {
    /// Compute an entity tag and negotiate conditional requests.
    pub enable_fingerprinting: bool,
    /// Identity header value sent on markup responses; `None` disables it.
    pub identity_header: Option<String>,
    /// Caching policy written as `Cache-Control` when none is set yet.
    pub directives: Option<CacheDirectives>,
}

impl DeliveryOptions {
    /// Derive options from process-wide configuration.
    pub fn from_config(config: &DeliveryConfig) -> Self {
        Self {
            enable_fingerprinting: config.generate_etags,
            identity_header: config
                .powered_by_header
                .then(|| config.powered_by_value.clone()),
            directives: None,
        }
    }

    /// Enable or disable fingerprinting.
    pub fn with_fingerprinting(mut self, enabled: bool) -> Self {
        self.enable_fingerprinting = enabled;
        self
    }

    /// Send the identity header with `value`.
    pub fn with_identity_header(mut self, value: impl Into<String>) -> Self {
        self.identity_header = Some(value.into());
        self
    }

    /// Never send the identity header.
    pub fn without_identity_header(mut self) -> Self {
        self.identity_header = None;
        self
    }

    /// Set the caching policy.
    pub fn with_directives(mut self, directives: CacheDirectives) -> Self {
        self.directives = Some(directives);
        self
    }
}

impl Default for DeliveryOptions {
    fn default() -> Self {
        Self::from_config(&DeliveryConfig::default())
    }
}

/// What happened to one exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryOutcome {
    /// Terminal branch taken.
    pub phase: DeliveryPhase,
    /// Final status code.
    pub status: u16,
    /// Entity tag attached to the response.
    pub fingerprint: Option<String>,
    /// Body bytes handed to the transport.
    pub bytes: u64,
    /// Time spent in delivery.
    pub elapsed_us: u64,
    /// Microseconds from the start of delivery to each step reached
    /// (`headers_set`, `negotiated`, `body_sent`, `streamed`).
    pub marks_us: BTreeMap<String, u64>,
}

impl DeliveryOutcome {
    /// Check whether the exchange was answered with 304.
    pub fn is_not_modified(&self) -> bool {
        self.phase == DeliveryPhase::ShortCircuited
    }
}

/// Delivers rendered output over a response transport.
///
/// Holds only read-only configuration, so one instance serves any number of
/// concurrent exchanges.
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    normalizer: Normalizer,
}

impl Orchestrator {
    /// Create an orchestrator around a normalizer.
    pub fn new(normalizer: Normalizer) -> Self {
        Self { normalizer }
    }

    /// Create an orchestrator from delivery configuration.
    pub fn from_config(config: &DeliveryConfig) -> Self {
        Self::new(Normalizer::from_config(config))
    }

    /// The normalizer used for fingerprint input.
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Fingerprint of the normalized form of `payload`.
    pub fn fingerprint(&self, payload: &str, kind: ContentKind) -> Fingerprint {
        let normalized = self.normalizer.normalize(payload, kind);
        Fingerprint::compute(normalized.as_bytes())
    }

    /// Deliver `output` for `request` over `transport`.
    ///
    /// A transport that is already finished is left untouched. Transport
    /// errors are returned unchanged and never retried.
    pub async fn deliver<T>(
        &self,
        request: &RequestContext,
        transport: &mut T,
        output: RenderedOutput,
        options: &DeliveryOptions,
    ) -> Result<DeliveryOutcome, DeliveryError>
    where
        T: ResponseTransport + ?Sized,
    {
        let span = delivery_span(request, output.kind);
        self.run(request, transport, output, options)
            .instrument(span)
            .await
    }

    async fn run<T>(
        &self,
        request: &RequestContext,
        transport: &mut T,
        output: RenderedOutput,
        options: &DeliveryOptions,
    ) -> Result<DeliveryOutcome, DeliveryError>
    where
        T: ResponseTransport + ?Sized,
    {
        let mut timing = TimingContext::new();
        let mut lifecycle = DeliveryLifecycle::new();

        if transport.is_finished() {
            tracing::debug!("response already finished, skipping delivery");
            lifecycle.finish(DeliveryPhase::Skipped)?;
            return Ok(report(&lifecycle, &*transport, None, 0, &timing));
        }

        let kind = output.kind;

        if kind == ContentKind::Markup {
            if let Some(value) = &options.identity_header {
                transport.headers_mut().set(header_names::X_POWERED_BY, value)?;
            }
        }
        if let Some(directives) = &options.directives {
            transport
                .headers_mut()
                .set_if_absent(header_names::CACHE_CONTROL, &directives.cache_control_header())?;
        }
        advance(&mut lifecycle, DeliveryPhase::HeadersSet)?;
        timing.mark("headers_set");

        let mut fingerprint = None;
        if let Some(text) = output.buffered_text().filter(|_| options.enable_fingerprinting) {
            let tag = self.fingerprint(text, kind);
            let validators = ConditionalValidators::from_headers(&request.headers);
            let negotiation = negotiate(&validators, transport.headers_mut(), Some(&tag))?;
            timing.mark("negotiated");
            fingerprint = Some(tag.as_str().to_string());

            if negotiation.is_not_modified() {
                transport.set_status(NOT_MODIFIED);
                transport.end(None)?;
                lifecycle.finish(DeliveryPhase::ShortCircuited)?;
                return Ok(report(&lifecycle, &*transport, fingerprint, 0, &timing));
            }
        }

        transport
            .headers_mut()
            .set_if_absent(header_names::CONTENT_TYPE, output.resolved_content_type())?;
        advance(&mut lifecycle, DeliveryPhase::ContentTypeResolved)?;

        if let Some(text) = output.buffered_text().filter(|text| !text.is_empty()) {
            transport
                .headers_mut()
                .set(header_names::CONTENT_LENGTH, &text.len().to_string())?;
        }

        if request.method.is_metadata_only() {
            transport.end(None)?;
            lifecycle.finish(DeliveryPhase::HeadOnly)?;
            return Ok(report(&lifecycle, &*transport, fingerprint, 0, &timing));
        }

        let bytes = match output.payload {
            Payload::Buffered(text) => {
                let bytes = text.len() as u64;
                transport.end(Some(text.into_bytes()))?;
                timing.mark("body_sent");
                lifecycle.finish(DeliveryPhase::BodySent)?;
                bytes
            }
            Payload::Streaming(producer) => {
                let bytes = {
                    let mut sink = DeliverySink::new(transport.body_sink());
                    producer.pipe_into(&mut sink).await?;
                    sink.close().await?;
                    tracing::debug!(chunks = sink.chunks_written(), "producer finished");
                    sink.bytes_written()
                };
                transport.end(None)?;
                timing.mark("streamed");
                lifecycle.finish(DeliveryPhase::Streamed)?;
                bytes
            }
        };

        Ok(report(&lifecycle, &*transport, fingerprint, bytes, &timing))
    }
}

fn micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

fn advance(lifecycle: &mut DeliveryLifecycle, next: DeliveryPhase) -> Result<(), DeliveryError> {
    lifecycle.advance(next)?;
    tracing::debug!(phase = ?next, "delivery phase");
    Ok(())
}

fn report<T>(
    lifecycle: &DeliveryLifecycle,
    transport: &T,
    fingerprint: Option<String>,
    bytes: u64,
    timing: &TimingContext,
) -> DeliveryOutcome
where
    T: ResponseTransport + ?Sized,
{
    let outcome = DeliveryOutcome {
        phase: lifecycle.outcome(),
        status: transport.status(),
        fingerprint,
        bytes,
        elapsed_us: micros(timing.elapsed()),
        marks_us: timing
            .marks()
            .map(|(name, at)| (name.to_string(), micros(at)))
            .collect(),
    };

    tracing::info!(
        status = outcome.status,
        outcome = ?outcome.phase,
        bytes = outcome.bytes,
        etag = outcome.fingerprint.as_deref().unwrap_or("-"),
        elapsed_us = outcome.elapsed_us,
        "delivery complete"
    );

    outcome
}

#[cfg(test)]
mod tests {
    use delivery_cache::RevalidatePolicy;

    use super::*;

    // === Options Tests ===

    #[test]
    fn test_options_from_default_config() {
        let options = DeliveryOptions::default();
        assert!(options.enable_fingerprinting);
        assert_eq!(options.identity_header.as_deref(), Some("edge-delivery"));
        assert!(options.directives.is_none());
    }

    #[test]
    fn test_options_follow_config_flags() {
        let mut config = DeliveryConfig::default().without_etags();
        config.powered_by_header = false;

        let options = DeliveryOptions::from_config(&config);
        assert!(!options.enable_fingerprinting);
        assert!(options.identity_header.is_none());
    }

    #[test]
    fn test_options_builders() {
        let options = DeliveryOptions::default()
            .with_fingerprinting(false)
            .with_identity_header("shop")
            .with_directives(CacheDirectives::new(RevalidatePolicy::Never));

        assert!(!options.enable_fingerprinting);
        assert_eq!(options.identity_header.as_deref(), Some("shop"));
        assert_eq!(
            options.directives.map(|d| d.revalidate),
            Some(RevalidatePolicy::Never)
        );
        assert!(options.without_identity_header().identity_header.is_none());
    }

    // === Fingerprint Tests ===

    #[test]
    fn test_fingerprint_ignores_line_order() {
        let orchestrator = Orchestrator::default();
        let a = orchestrator.fingerprint("b\na\nc", ContentKind::StructuredData);
        let b = orchestrator.fingerprint("a\nc\nb", ContentKind::StructuredData);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_sensitive_to_content() {
        let orchestrator = Orchestrator::default();
        let a = orchestrator.fingerprint("a\nb", ContentKind::StructuredData);
        let b = orchestrator.fingerprint("a\nc", ContentKind::StructuredData);
        assert_ne!(a, b);
    }

    #[test]
    fn test_fingerprint_uses_configured_marker() {
        let orchestrator =
            Orchestrator::from_config(&DeliveryConfig::default().with_stream_marker("__flight"));
        let a = orchestrator.fingerprint(
            "<body><script>__flight(2)</script><script>__flight(1)</script></body>",
            ContentKind::Markup,
        );
        let b = orchestrator.fingerprint(
            "<body><script>__flight(1)</script><script>__flight(2)</script></body>",
            ContentKind::Markup,
        );
        assert_eq!(a, b);
        assert_eq!(orchestrator.normalizer().stream_marker(), "__flight");
    }
}
