//! CLI command handler: merge settings, wire Ctrl+C and progress, run, print the summary.

use anyhow::{Context, Result};
use log::{debug, warn};

use crate::CompressionOpts;
use crate::engine::arg_parser::Cli;
use crate::engine::progress::{create_counter, progress_callback, refresh_bar};
use crate::engine::tools::bytes_to_mb;
use crate::pipeline::Pipeline;
use crate::types::{CompressionConfig, RunSummary};
use crate::utils::{apply_file_to_opts, load_settings_toml, setup_logging};

/// Defaults, then `.jpegpress.toml` in the source folder, then CLI flags.
/// Returns (opts, verbose, log_file).
fn setup_opts(cli: &Cli) -> (CompressionOpts, bool, Option<String>) {
    let mut opts = CompressionOpts::default();
    let file = load_settings_toml(&cli.dir);
    if let Some(file) = &file {
        apply_file_to_opts(file, &mut opts);
    }
    cli.apply_to_opts(&mut opts);

    let verbose = cli
        .verbose
        .or_else(|| file.as_ref().and_then(|f| f.verbose()))
        .unwrap_or(false);
    let log_file = cli
        .log_file
        .clone()
        .or_else(|| file.as_ref().and_then(|f| f.log_file().map(str::to_string)));
    (opts, verbose, log_file)
}

fn print_summary(summary: &RunSummary, json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(summary).context("serialize run summary")?
        );
        return Ok(());
    }
    println!(
        "Compressed {} of {} files ({} skipped) in {} ms, {:.2} MB read",
        summary.items_processed,
        summary.items_produced,
        summary.items_skipped,
        summary.elapsed_millis,
        bytes_to_mb(summary.total_bytes_processed)
    );
    if !summary.consistent {
        println!("WARNING: produced and consumed counts do not match");
    }
    Ok(())
}

/// Run one compression pass over `cli.dir`.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let (opts, verbose, log_file) = setup_opts(cli);
    setup_logging(verbose, log_file.as_deref());
    debug!("Options: {:?}", opts);

    let config = CompressionConfig::new(&opts).context("invalid options")?;
    let mut pipeline = Pipeline::new(&cli.dir, config);

    let cancel = pipeline.cancel_token();
    ctrlc::set_handler(move || {
        cancel.cancel();
    })
    .context("set Ctrl+C handler")?;

    let bar = verbose.then(|| create_counter("Compressing"));
    if let Some(bar) = &bar {
        refresh_bar(bar);
        pipeline = pipeline.with_progress(progress_callback(bar));
    }

    match pipeline.run() {
        Ok(summary) => {
            if bar.is_some() {
                eprintln!();
            }
            print_summary(&summary, cli.json)
        }
        Err(failure) => {
            if let Some(partial) = &failure.partial {
                warn!(
                    "Partial result: {} of {} files compressed before the run stopped",
                    partial.items_processed, partial.items_produced
                );
                if cli.json {
                    print_summary(partial, true)?;
                }
            }
            Err::<(), _>(failure).context(format!("compressing {}", cli.dir.display()))
        }
    }
}
