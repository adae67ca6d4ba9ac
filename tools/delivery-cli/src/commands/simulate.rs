//! Full delivery of a rendered file against an in-memory transport.

use std::collections::BTreeMap;

use anyhow::Result;
use delivery_cache::CacheDirectives;
use delivery_core::{
    header_names, DeliveryConfig, DeliveryError, RenderedOutput, RequestContext, StreamBody,
};
use delivery_stream::{
    DeliveryOptions, DeliveryOutcome, MemoryTransport, Orchestrator, ResponseTransport,
};
use serde::Serialize;

use super::SimulateArgs;
use crate::context::Context;
use crate::output::{format_bytes, status_badge};

/// What a client would have received.
#[derive(Debug, Serialize)]
pub struct SimulationReport {
    /// Orchestrator outcome.
    pub outcome: DeliveryOutcome,
    /// Response headers, lower-cased names.
    pub headers: BTreeMap<String, String>,
    /// Body bytes received.
    pub body_bytes: usize,
    /// Streamed chunk count.
    pub chunks: usize,
    #[serde(skip)]
    pub body: Vec<u8>,
}

/// Run the simulate command.
pub async fn run(args: SimulateArgs, ctx: &Context) -> Result<()> {
    let content = ctx.read_input(&args.file)?;
    let report = simulate(&content, &args, &ctx.config.delivery).await?;

    if ctx.output.is_json() {
        ctx.output.json(&report);
        return Ok(());
    }

    ctx.output.header(&format!("{} {}", args.method, args.file));
    ctx.output.kv("status", &status_badge(report.outcome.status));
    ctx.output.kv("outcome", &format!("{:?}", report.outcome.phase));
    for (name, value) in &report.headers {
        ctx.output.kv(name, value);
    }
    ctx.output.kv("body", &format_bytes(report.body_bytes as u64));
    if args.stream {
        ctx.output.kv("chunks", &report.chunks.to_string());
    }
    ctx.output.kv("elapsed", &format!("{} µs", report.outcome.elapsed_us));
    for (mark, at) in &report.outcome.marks_us {
        ctx.output.kv(&format!("  {}", mark), &format!("{} µs", at));
    }

    if args.show_body && !report.body.is_empty() {
        ctx.output.info("");
        ctx.output.raw(&String::from_utf8_lossy(&report.body));
    }

    Ok(())
}

/// Deliver `content` as described by `args` and collect the response.
pub async fn simulate(
    content: &str,
    args: &SimulateArgs,
    config: &DeliveryConfig,
) -> Result<SimulationReport> {
    let mut request = RequestContext::new(args.method, format!("/{}", args.file));
    if let Some(tag) = &args.if_none_match {
        request = request.with_header("If-None-Match", tag);
    }
    if let Some(date) = &args.if_modified_since {
        request = request.with_header("If-Modified-Since", date);
    }

    let mut transport = MemoryTransport::new();
    if let Some(date) = &args.last_modified {
        transport = transport.with_header(header_names::LAST_MODIFIED, date)?;
    }

    let mut options = DeliveryOptions::from_config(config);
    if let Some(policy) = args.revalidate {
        let mut directives = CacheDirectives::new(policy);
        if let Some(stale) = args.stale {
            directives = directives.with_stale_window(stale);
        }
        options = options.with_directives(directives);
    }

    let output = if args.stream {
        let chunks: Vec<Result<Vec<u8>, DeliveryError>> = content
            .split_inclusive('\n')
            .map(|line| Ok(line.as_bytes().to_vec()))
            .collect();
        RenderedOutput::streaming(args.kind, StreamBody::new(futures::stream::iter(chunks)))
    } else {
        RenderedOutput::buffered(args.kind, content)
    };

    let outcome = Orchestrator::from_config(config)
        .deliver(&request, &mut transport, output, &options)
        .await?;

    let headers = transport
        .headers()
        .iter()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();
    let body = transport.body_bytes();

    Ok(SimulationReport {
        outcome,
        headers,
        body_bytes: body.len(),
        chunks: transport.chunks().len(),
        body,
    })
}

#[cfg(test)]
mod tests {
    use delivery_cache::RevalidatePolicy;
    use delivery_core::{ContentKind, DeliveryPhase, Method};

    use super::*;

    fn args(kind: ContentKind) -> SimulateArgs {
        SimulateArgs {
            file: "page.html".to_string(),
            kind,
            method: Method::Get,
            if_none_match: None,
            if_modified_since: None,
            last_modified: None,
            revalidate: None,
            stale: None,
            stream: false,
            show_body: false,
        }
    }

    #[tokio::test]
    async fn test_simulate_full_response() {
        let mut args = args(ContentKind::StructuredData);
        args.revalidate = Some(RevalidatePolicy::Window(60));
        args.stale = Some(30);

        let report = simulate("b\na\n", &args, &DeliveryConfig::default()).await.unwrap();

        assert_eq!(report.outcome.status, 200);
        assert_eq!(report.body_bytes, 4);
        assert_eq!(report.headers["content-type"], "application/json");
        assert_eq!(
            report.headers["cache-control"],
            "s-maxage=60, stale-while-revalidate=30"
        );
        assert!(report.headers.contains_key("etag"));
    }

    #[tokio::test]
    async fn test_simulate_revalidation_round_trip() {
        let config = DeliveryConfig::default();
        let first = simulate("b\na\n", &args(ContentKind::StructuredData), &config)
            .await
            .unwrap();

        let mut args = args(ContentKind::StructuredData);
        args.if_none_match = first.outcome.fingerprint.clone();
        let second = simulate("a\nb\n", &args, &config).await.unwrap();

        assert_eq!(second.outcome.phase, DeliveryPhase::ShortCircuited);
        assert_eq!(second.outcome.status, 304);
        assert_eq!(second.body_bytes, 0);
    }

    #[tokio::test]
    async fn test_simulate_last_modified() {
        let mut args = args(ContentKind::Markup);
        args.if_modified_since = Some("Sun, 06 Nov 1994 08:49:37 GMT".to_string());
        args.last_modified = Some("Sun, 06 Nov 1994 08:49:37 GMT".to_string());

        let report = simulate("<p>x</p>", &args, &DeliveryConfig::default()).await.unwrap();
        assert_eq!(report.outcome.status, 304);
    }

    #[tokio::test]
    async fn test_simulate_stream_by_line() {
        let mut args = args(ContentKind::ComponentStream);
        args.stream = true;

        let report = simulate("0:a\n1:b\n2:c", &args, &DeliveryConfig::default())
            .await
            .unwrap();

        assert_eq!(report.outcome.phase, DeliveryPhase::Streamed);
        assert_eq!(report.chunks, 3);
        assert_eq!(report.body, b"0:a\n1:b\n2:c".to_vec());
        assert_eq!(report.headers["content-type"], "text/x-component");
    }

    #[tokio::test]
    async fn test_simulate_head() {
        let mut args = args(ContentKind::Markup);
        args.method = Method::Head;

        let report = simulate("<p>x</p>", &args, &DeliveryConfig::default()).await.unwrap();
        assert_eq!(report.outcome.phase, DeliveryPhase::HeadOnly);
        assert_eq!(report.body_bytes, 0);
        assert_eq!(report.headers["content-length"], "8");
    }

    #[tokio::test]
    async fn test_simulate_reports_transport_state() {
        let args = args(ContentKind::StructuredData);
        let report = simulate("a\n", &args, &DeliveryConfig::default()).await.unwrap();

        assert_eq!(report.outcome.status, 200);
        assert_eq!(report.chunks, 0);
        assert_eq!(report.body, b"a\n".to_vec());
        assert!(report.outcome.marks_us.contains_key("body_sent"));
    }
}
