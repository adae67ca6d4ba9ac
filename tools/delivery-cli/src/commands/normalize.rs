//! Print the canonical form used as fingerprint input.

use anyhow::{Context as _, Result};
use delivery_normalize::Normalizer;

use super::NormalizeArgs;
use crate::context::Context;

/// Run the normalize command.
pub async fn run(args: NormalizeArgs, ctx: &Context) -> Result<()> {
    let content = ctx.read_input(&args.file)?;
    let normalizer = Normalizer::from_config(&ctx.config.delivery);

    let normalized = if args.strict {
        normalizer
            .try_normalize(&content, args.kind)
            .with_context(|| format!("Failed to normalize {}", args.file))?
    } else {
        normalizer.normalize(&content, args.kind)
    };

    if ctx.output.is_json() {
        ctx.output.json(&serde_json::json!({
            "file": args.file,
            "kind": args.kind,
            "changed": normalized != content,
            "content": normalized,
        }));
        return Ok(());
    }

    ctx.output.raw(&normalized);
    Ok(())
}
