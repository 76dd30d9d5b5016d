use anyhow::{Context, Result};
use gxupload_galaxy::{GalaxyClient, HistoryResolver};
use gxupload_upload::{DestinationResolver, NameFilter};

use crate::args::HistoriesArgs;
use crate::config::CliConfig;
use crate::ui::histories_table;

pub async fn run(args: HistoriesArgs, config: &CliConfig) -> Result<()> {
    let url = config.url(args.server.url.as_deref());
    let client = GalaxyClient::new(&url, &args.server.api_key)
        .with_context(|| format!("cannot connect to {url}"))?;
    let resolver = HistoryResolver::new(client);

    let mut histories = resolver
        .list_destinations()
        .await
        .context("listing histories failed")?;
    if let Some(pattern) = &args.name {
        let filter = NameFilter::new(pattern, args.ignore_case)
            .with_context(|| format!("invalid history name pattern {pattern}"))?;
        histories = filter.apply(histories);
    }

    if !args.quiet {
        println!("Active Histories\n");
    }
    println!("{}", histories_table(&histories, args.quiet));
    Ok(())
}
