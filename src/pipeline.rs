//! Harvest runs for one conference.
//!
//! Per year: list candidates → filter by keyword and existing files →
//! download in parallel → write the failure report. Years run one after
//! another; a year whose listing fails is skipped and the rest still run.

use crate::download::{Downloader, execute};
use crate::filter::filter_candidates;
use crate::models::Keywords;
use crate::naming::DestinationRule;
use crate::report::report;
use crate::sources::PaperSource;
use futures::stream::{self, StreamExt};
use std::error::Error;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, error, info, instrument};

/// Settings shared by every year of a batch.
#[derive(Debug, Clone)]
pub struct HarvestOptions {
    pub savedir: PathBuf,
    pub keywords: Option<Keywords>,
    pub concurrency: usize,
}

/// What happened for one conference/year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct YearSummary {
    pub year: u16,
    pub candidates: usize,
    pub queued: usize,
    pub failed: usize,
}

/// Totals over every requested year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub years: Vec<YearSummary>,
    /// Years whose listing failed; nothing was downloaded for them.
    pub skipped_years: Vec<u16>,
    pub downloaded: usize,
    pub failed_papers: usize,
}

impl BatchSummary {
    /// No paper failed and no year was skipped.
    pub fn is_clean(&self) -> bool {
        self.failed_papers == 0 && self.skipped_years.is_empty()
    }
}

/// Harvest `years` in order. A listing error skips that year only.
#[instrument(level = "info", skip(source, downloader, options), fields(source = source.name()))]
pub async fn harvest_years(
    source: &dyn PaperSource,
    conference: &str,
    years: Vec<u16>,
    downloader: &Downloader,
    options: &HarvestOptions,
) -> BatchSummary {
    let results = stream::iter(years)
        .then(move |year| async move {
            (year, harvest_year(source, conference, year, downloader, options).await)
        })
        .collect::<Vec<_>>()
        .await;

    let mut batch = BatchSummary::default();
    for (year, result) in results {
        match result {
            Ok(summary) => {
                debug!(
                    year = summary.year,
                    candidates = summary.candidates,
                    queued = summary.queued,
                    failed = summary.failed,
                    "Year summary"
                );
                batch.downloaded += summary.queued - summary.failed;
                batch.failed_papers += summary.failed;
                batch.years.push(summary);
            }
            Err(e) => {
                let label = conference.to_uppercase();
                error!(year, error = %e, "Skipping {}{}", label, year);
                batch.skipped_years.push(year);
            }
        }
    }
    batch
}

#[instrument(level = "info", skip(source, downloader, options), fields(source = source.name()))]
pub async fn harvest_year(
    source: &dyn PaperSource,
    conference: &str,
    year: u16,
    downloader: &Downloader,
    options: &HarvestOptions,
) -> Result<YearSummary, Box<dyn Error>> {
    let t0 = Instant::now();
    let rule = DestinationRule::new(&options.savedir, conference, year);

    let entries = source.list_candidates(downloader.client(), year).await?;
    let items = filter_candidates(&entries, options.keywords.as_ref(), |e| {
        rule.destination_for(e)
    });
    let queued = items.len();

    let outcomes = execute(downloader, items, options.concurrency).await;
    let failed = match report(&outcomes, &rule.report_path()).await {
        Ok(failed) => failed,
        Err(e) => {
            let failed = outcomes.iter().filter(|o| !o.succeeded).count();
            error!(
                year,
                failed,
                path = %rule.report_path().display(),
                error = %e,
                "Could not write failure report"
            );
            failed
        }
    };

    info!(
        year,
        candidates = entries.len(),
        queued,
        failed,
        elapsed_secs = t0.elapsed().as_secs(),
        dir = %rule.root.display(),
        "Finished {}{}",
        conference.to_uppercase(),
        year
    );
    Ok(YearSummary {
        year,
        candidates: entries.len(),
        queued,
        failed,
    })
}
