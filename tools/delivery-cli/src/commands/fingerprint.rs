//! Entity tag computation for a rendered file.

use anyhow::Result;
use delivery_stream::Orchestrator;
use serde::Serialize;

use super::FingerprintArgs;
use crate::context::Context;
use crate::output::format_bytes;

#[derive(Serialize)]
struct FingerprintReport {
    file: String,
    kind: String,
    bytes: usize,
    etag: String,
}

/// Run the fingerprint command.
pub async fn run(args: FingerprintArgs, ctx: &Context) -> Result<()> {
    let content = ctx.read_input(&args.file)?;
    let etag = Orchestrator::from_config(&ctx.config.delivery).fingerprint(&content, args.kind);

    if ctx.output.is_json() {
        ctx.output.json(&FingerprintReport {
            file: args.file,
            kind: args.kind.to_string(),
            bytes: content.len(),
            etag: etag.to_string(),
        });
        return Ok(());
    }

    println!("{}", etag);
    ctx.output.debug(&format!(
        "{} ({}, {})",
        args.file,
        args.kind,
        format_bytes(content.len() as u64)
    ));

    Ok(())
}
