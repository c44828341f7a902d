//! Interactive session: feed host events into the page and watch islands
//! activate.

use std::rc::Rc;

use anyhow::Result;
use serde_json::json;
use turbo_hydrate::{Environment, EventLog};
use turbo_islands::Storefront;

use super::RunArgs;
use crate::context::Context;
use crate::output::format_millis;
use crate::script::Step;

/// Run the run command. Must be called inside a `LocalSet`.
pub async fn run(args: RunArgs, ctx: &Context) -> Result<()> {
    let log = EventLog::new();
    let env = Environment::interactive().with_observer(Rc::new(log.clone()));
    let mut page = Storefront::build(&ctx.config, &env)?;
    page.settle().await;

    ctx.output.header(&format!("{} (interactive)", page.name()));
    ctx.output.kv("Source", &ctx.source());

    let steps = if args.steps.is_empty() {
        vec![Step::Report]
    } else {
        args.steps
    };

    let total = steps.len();
    for (i, step) in steps.iter().enumerate() {
        ctx.output.step(i + 1, total, &step.to_string());
        execute(step, &mut page, ctx).await?;
    }

    if ctx.output.is_json() {
        let mut doc = json!({
            "page": page.name(),
            "events": log.events(),
            "chunks": page.chunk_report(),
        });
        if args.snapshot {
            doc["snapshot"] = page.snapshot()?;
        }
        ctx.output.json(&doc);
        return Ok(());
    }

    if args.snapshot {
        println!("{}", serde_json::to_string_pretty(&page.snapshot()?)?);
    }
    ctx.output.success(&format!(
        "{} of {} islands loaded, {} events recorded",
        page.loaded_count(),
        page.slots().len(),
        log.len()
    ));
    Ok(())
}

async fn execute(step: &Step, page: &mut Storefront, ctx: &Context) -> Result<()> {
    match step {
        Step::Click(island) => {
            let listeners = page.click(island)?;
            ctx.output.debug(&format!("{} listener(s) notified", listeners));
        }
        Step::Hover(island) => {
            page.hover(island)?;
        }
        Step::Show(island) => page.set_visible(island, true)?,
        Step::Hide(island) => page.set_visible(island, false)?,
        Step::Destroy(island) => page.destroy(island)?,
        Step::Wait(duration) => {
            let spinner = ctx
                .output
                .spinner(&format!("Waiting {}", format_millis(duration.as_millis() as u64)));
            tokio::time::sleep(*duration).await;
            spinner.finish_and_clear();
        }
        Step::Act { island, action } => {
            let outcome = page.act(island, action)?;
            ctx.output.outcome(island, action, &outcome);
        }
        Step::Report => {
            page.settle().await;
            ctx.output.chunk_report(&page.chunk_report());
            return Ok(());
        }
    }
    page.settle().await;
    Ok(())
}
