//! Config validation.

use anyhow::Result;

use super::CheckArgs;
use crate::context::Context;

/// Run the check command.
pub async fn run(args: CheckArgs, ctx: &Context) -> Result<()> {
    let config = &ctx.config;
    config.validate()?;

    if ctx.output.is_json() {
        ctx.output.json(config);
        return Ok(());
    }

    ctx.output.header(&config.storefront.name);
    ctx.output.kv("Source", &ctx.source());
    ctx.output.kv("Islands", &config.islands.len().to_string());

    let widths = [12, 10, 24];
    ctx.output.table_row(&["ISLAND", "KIND", "TRIGGER"], &widths);
    for island in &config.islands {
        let trigger = match island.trigger {
            Some(spec) => spec.validate()?.to_string(),
            None => "eager".to_string(),
        };
        ctx.output.table_row(
            &[island.name.as_str(), island.kind.as_str(), trigger.as_str()],
            &widths,
        );
    }

    if args.print {
        println!("\n{}", config.to_toml()?);
    }

    ctx.output.success("Configuration is valid");
    Ok(())
}
