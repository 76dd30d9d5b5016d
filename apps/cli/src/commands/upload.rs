use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use gxupload_galaxy::{GalaxyClient, HistoryResolver, TusTransport};
use gxupload_protocol::DEFAULT_CHUNK_SIZE;
use gxupload_transfer::{NoopSink, ProgressSink, ResumeStore};
use gxupload_upload::{
    BatchReport, BatchUploader, DatasetOptions, DestinationSelector, ResolveError, RetryPolicy,
    SessionOptions, UploadError, Uploader,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::args::UploadArgs;
use crate::config::CliConfig;
use crate::ui::{BarSink, candidates_table};

pub async fn run(args: UploadArgs, config: &CliConfig, debug: bool) -> Result<ExitCode> {
    if args.paths.is_empty() {
        warn!("no paths given, nothing to upload");
        return Ok(ExitCode::SUCCESS);
    }

    let url = config.url(args.server.url.as_deref());
    let client = GalaxyClient::new(&url, &args.server.api_key)
        .with_context(|| format!("cannot connect to {url}"))?;
    let transport = TusTransport::new(client.clone());
    let resolver = HistoryResolver::new(client);
    let store = config.storage(args.storage.as_deref()).map(ResumeStore::new);

    let cancel = CancellationToken::new();
    spawn_ctrl_c(cancel.clone());

    let chunk_size = match args.chunk_size {
        Some(n) => usize::try_from(n).context("chunk size too large")?,
        None => config.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
    };
    let options = SessionOptions {
        chunk_size,
        retry: RetryPolicy {
            max_retries: args.max_retries.or(config.max_retries).unwrap_or(3),
            ..RetryPolicy::default()
        },
        cancel,
    };

    let selector = match (&args.history_id, &args.history_name) {
        (Some(id), _) => DestinationSelector::Id(id.clone()),
        (None, Some(pattern)) => DestinationSelector::Name {
            pattern: pattern.clone(),
            ignore_case: args.ignore_case,
        },
        (None, None) => anyhow::bail!("one of --history-id or --history-name is required"),
    };
    let dataset = DatasetOptions {
        file_type: args.file_type.clone(),
        dbkey: args.dbkey.clone(),
        space_to_tab: args.space_to_tab,
        auto_decompress: !args.no_auto_decompress,
        file_name: args.file_name.clone(),
    };

    info!(
        url = %url,
        files = args.paths.len(),
        chunk_size,
        resumable = store.is_some(),
        "starting upload"
    );

    let uploader = Uploader::new(&transport, store.as_ref(), options);
    let batch = BatchUploader::new(uploader, &resolver);
    let silent = args.silent;
    let report = batch
        .upload_all(&args.paths, &selector, &dataset, |_: &Path| -> Box<dyn ProgressSink> {
            if silent {
                Box::new(NoopSink)
            } else {
                Box::new(BarSink::new())
            }
        })
        .await?;

    print_failures(&report, debug);
    Ok(if report.all_succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn spawn_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("interrupted, stopping after the current chunk");
            cancel.cancel();
        }
    });
}

fn print_failures(report: &BatchReport, debug: bool) {
    for outcome in report.failures() {
        let Err(err) = &outcome.result else {
            continue;
        };
        eprintln!("ERROR: {}: {err}", outcome.path.display());
        if let UploadError::Resolve(ResolveError::Ambiguous { candidates, .. }) = err {
            eprintln!("{}", candidates_table(candidates));
        }
        if debug {
            eprintln!("{err:?}");
        }
    }
}
