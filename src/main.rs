//! # Paper Harvest
//!
//! Downloads the PDFs of academic conference papers from their public
//! listing pages, keeping only papers whose titles match a keyword filter.
//!
//! ## Features
//!
//! - NLP venues from the ACL Anthology (ACL, EMNLP, NAACL, COLING, ...),
//!   NeurIPS, ICML (PMLR), ICLR (OpenReview) and SIGIR (dblp + ACM DL)
//! - Case-insensitive, OR-matched title keywords
//! - Bounded parallel downloads; one failing paper never stops the batch
//! - Re-runs only fetch what is missing on disk
//! - Failed downloads are listed in `error_id.txt` for follow-up
//!
//! ## Usage
//!
//! ```sh
//! paper_harvest -c acl -y 2019 2020 -k summar-dialog -s ./papers
//! ```
//!
//! ## Architecture
//!
//! For every requested year:
//! 1. **Listing**: the conference source produces candidate papers
//! 2. **Filtering**: keyword match, destination naming, skip-if-exists
//! 3. **Downloading**: bounded worker pool, per-item success/failure
//! 4. **Reporting**: failed items written to `{CONFERENCE}{YEAR}/error_id.txt`
//!
//! The process exits with status 1 when any paper failed to download or any
//! year could not be listed, and with status 2 on invalid configuration.

use chrono::{Datelike, Local};
use clap::Parser;
use std::error::Error;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod cli;
mod download;
mod errors;
mod filter;
mod models;
mod naming;
mod pipeline;
mod report;
mod sources;
mod utils;

use cli::Cli;
use download::{DownloadSettings, Downloader};
use models::Keywords;
use pipeline::{BatchSummary, HarvestOptions, harvest_years};
use sources::Conference;
use utils::prepare_savedir;

#[tokio::main]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    let result = run(args).await;
    if let Err(e) = &result {
        error!(error = %e, "Aborting");
    }
    ExitCode::from(exit_status(&result))
}

/// 0 when everything was downloaded, 1 when some papers or years failed,
/// 2 when the run could not start.
fn exit_status(result: &Result<BatchSummary, Box<dyn Error>>) -> u8 {
    match result {
        Ok(batch) if batch.is_clean() => 0,
        Ok(_) => 1,
        Err(_) => 2,
    }
}

/// Harvest every requested year of the configured conference.
#[instrument(level = "info", skip_all, fields(conference = %args.conference))]
async fn run(args: Cli) -> Result<BatchSummary, Box<dyn Error>> {
    let start_time = std::time::Instant::now();

    let conference: Conference = args.conference.parse()?;
    let source = conference.source();

    let savedir = match &args.savedir {
        Some(dir) => std::path::absolute(dir)?,
        None => std::env::current_dir()?,
    };
    if let Err(e) = prepare_savedir(&savedir).await {
        error!(
            path = %savedir.display(),
            error = %e,
            "Save directory is not writable (fix perms or choose a different path)"
        );
        return Err(e.into());
    }

    let keywords = args
        .keywords
        .as_deref()
        .map(Keywords::parse)
        .filter(|kw| !kw.is_empty());
    let years = if args.year.is_empty() {
        vec![Local::now().year() as u16]
    } else {
        args.year.clone()
    };

    let downloader = Downloader::new(&DownloadSettings {
        timeout: Duration::from_secs(args.timeout_secs),
        accept_invalid_certs: args.insecure,
        verify_pdf: !args.no_verify_pdf,
    })?;
    let options = HarvestOptions {
        savedir,
        keywords,
        concurrency: args.poolnum,
    };
    info!(
        %conference,
        ?years,
        keywords = ?options.keywords.as_ref().map(|k| k.to_string()),
        savedir = %options.savedir.display(),
        pool = options.concurrency,
        "paper_harvest starting up"
    );

    let batch = harvest_years(
        source.as_ref(),
        conference.slug(),
        years,
        &downloader,
        &options,
    )
    .await;

    let elapsed = start_time.elapsed();
    if batch.is_clean() {
        info!(?elapsed, downloaded = batch.downloaded, "Execution complete");
    } else {
        warn!(
            ?elapsed,
            downloaded = batch.downloaded,
            failed_papers = batch.failed_papers,
            skipped_years = ?batch.skipped_years,
            "Execution complete with failures"
        );
    }
    Ok(batch)
}
