//! Pre-render pass: build the page without interactivity.

use anyhow::Result;
use serde_json::json;
use turbo_hydrate::Environment;
use turbo_islands::Storefront;

use super::RenderArgs;
use crate::context::Context;

/// Run the render command.
pub async fn run(args: RenderArgs, ctx: &Context) -> Result<()> {
    let env = Environment::pre_render();
    let page = Storefront::build(&ctx.config, &env)?;
    let report = page.chunk_report();

    if ctx.output.is_json() {
        let mut doc = json!({ "page": page.name(), "chunks": report });
        if args.snapshot {
            doc["snapshot"] = page.snapshot()?;
        }
        ctx.output.json(&doc);
        return Ok(());
    }

    ctx.output.header(&format!("{} (pre-render)", page.name()));
    ctx.output.kv("Source", &ctx.source());
    ctx.output.chunk_report(&report);

    if args.snapshot {
        println!("{}", serde_json::to_string_pretty(&page.snapshot()?)?);
    }

    ctx.output.info(&format!(
        "{} of {} islands rendered, all pending hydration",
        page.loaded_count(),
        report.len()
    ));
    Ok(())
}
