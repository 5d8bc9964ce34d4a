//! Parallel PDF download executor.
//!
//! Work items are drained from a queue by a bounded pool of tokio tasks: at
//! most `concurrency` downloads are in flight and a freed slot is refilled
//! with the next queued item. Every item yields exactly one
//! [`DownloadOutcome`]; transport, HTTP status, filesystem and content errors
//! (and even a panicking task) are folded into a failed outcome so that one
//! bad paper never stops its siblings.
//!
//! # File handling
//!
//! Bytes are written to `<destination>.part` and renamed onto the destination
//! once complete, so an interrupted run never leaves a truncated PDF that the
//! skip-if-exists check would later mistake for a finished download.

use crate::errors::DownloadError;
use crate::models::{DownloadOutcome, WorkItem};
use reqwest::Client;
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

/// Default number of concurrent downloads.
pub const DEFAULT_CONCURRENCY: usize = 8;
/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

const PDF_MAGIC: &[u8] = b"%PDF-";
const PART_SUFFIX: &str = ".part";
const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// HTTP and validation settings shared by all downloads of a run.
#[derive(Debug, Clone)]
pub struct DownloadSettings {
    /// Upper bound for a single request, including reading the body.
    pub timeout: Duration,
    /// Accept self-signed or otherwise invalid TLS certificates.
    pub accept_invalid_certs: bool,
    /// Reject bodies that are empty or do not start with `%PDF-`.
    pub verify_pdf: bool,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            accept_invalid_certs: false,
            verify_pdf: true,
        }
    }
}

/// Cheaply clonable download client; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    verify_pdf: bool,
}

impl Downloader {
    pub fn new(settings: &DownloadSettings) -> Result<Self, reqwest::Error> {
        if settings.accept_invalid_certs {
            warn!("TLS certificate verification is DISABLED for all requests (--insecure)");
        }
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.timeout)
            .danger_accept_invalid_certs(settings.accept_invalid_certs)
            .build()?;
        Ok(Self {
            client,
            verify_pdf: settings.verify_pdf,
        })
    }

    /// The underlying HTTP client, also used by the listing handlers.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Download one item, never failing: errors become a failed outcome.
    #[instrument(level = "debug", skip_all, fields(url = %item.download_url))]
    pub async fn fetch_one(&self, item: WorkItem) -> DownloadOutcome {
        let t0 = Instant::now();
        match self.save(&item).await {
            Ok(bytes) => {
                info!(
                    title = %item.title,
                    bytes,
                    elapsed_ms = t0.elapsed().as_millis() as u64,
                    "Saved paper"
                );
                DownloadOutcome::success(item)
            }
            Err(e) => {
                warn!(
                    title = %item.title,
                    url = %item.download_url,
                    error = %e,
                    "Download failed"
                );
                DownloadOutcome::failure(item, e)
            }
        }
    }

    async fn save(&self, item: &WorkItem) -> Result<usize, DownloadError> {
        let response = self.client.get(&item.download_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status(status.as_u16()));
        }
        let body = response.bytes().await?;
        if self.verify_pdf {
            check_pdf(&body)?;
        }

        if let Some(parent) = item.destination.parent() {
            fs::create_dir_all(parent).await?;
        }
        let part = part_path(&item.destination);
        if let Err(e) = write_then_rename(&part, &item.destination, &body).await {
            let _ = fs::remove_file(&part).await;
            return Err(e.into());
        }
        Ok(body.len())
    }
}

/// Run all downloads with at most `concurrency` in flight.
///
/// Returns once every item has finished, with exactly one outcome per item
/// in completion order. A `concurrency` of 0 is treated as 1.
#[instrument(level = "info", skip_all, fields(items = items.len(), concurrency = concurrency))]
pub async fn execute(
    downloader: &Downloader,
    items: Vec<WorkItem>,
    concurrency: usize,
) -> Vec<DownloadOutcome> {
    let concurrency = concurrency.max(1);
    let total = items.len();
    let t0 = Instant::now();
    info!(total, concurrency, "Start downloading");

    let mut queue: VecDeque<WorkItem> = items.into();
    let mut in_flight: HashMap<tokio::task::Id, WorkItem> = HashMap::new();
    let mut join_set = JoinSet::new();
    let mut outcomes = Vec::with_capacity(total);

    loop {
        while join_set.len() < concurrency {
            let Some(item) = queue.pop_front() else {
                break;
            };
            let downloader = downloader.clone();
            let task_item = item.clone();
            let handle = join_set.spawn(async move { downloader.fetch_one(task_item).await });
            in_flight.insert(handle.id(), item);
        }

        let Some(joined) = join_set.join_next_with_id().await else {
            break;
        };
        match joined {
            Ok((id, outcome)) => {
                in_flight.remove(&id);
                debug!(done = outcomes.len() + 1, total, "Download finished");
                outcomes.push(outcome);
            }
            Err(e) => {
                if let Some(item) = in_flight.remove(&e.id()) {
                    warn!(url = %item.download_url, error = %e, "Download task aborted");
                    outcomes.push(DownloadOutcome::failure(item, format!("task aborted: {e}")));
                }
            }
        }
    }

    let failed = outcomes.iter().filter(|o| !o.succeeded).count();
    info!(
        total,
        succeeded = total - failed,
        failed,
        elapsed_ms = t0.elapsed().as_millis() as u64,
        "Finished downloading"
    );
    outcomes
}

/// Minimal sanity check that a response body is a PDF.
pub fn check_pdf(body: &[u8]) -> Result<(), DownloadError> {
    if body.is_empty() {
        return Err(DownloadError::Empty);
    }
    if !body.starts_with(PDF_MAGIC) {
        let head = String::from_utf8_lossy(&body[..body.len().min(16)]).into_owned();
        return Err(DownloadError::NotPdf(head));
    }
    Ok(())
}

fn part_path(destination: &Path) -> PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(PART_SUFFIX);
    destination.with_file_name(name)
}

async fn write_then_rename(part: &Path, destination: &Path, body: &[u8]) -> std::io::Result<()> {
    fs::write(part, body).await?;
    fs::rename(part, destination).await
}
