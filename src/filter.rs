//! Turns scraped candidates into download work.
//!
//! The filter keeps entries whose title matches the keyword set, computes each
//! destination through the caller's naming rule and drops anything already on
//! disk, so that re-running a harvest only fetches what is missing.

use crate::models::{CandidateEntry, Keywords, WorkItem};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

/// Build the work list for one run.
///
/// * keyword test: case-insensitive substring, OR across `keywords`; `None`
///   or an empty set lets everything through
/// * an entry whose download URL was already accepted in this run is dropped
/// * an entry whose destination collides with an accepted one gets a short
///   URL hash appended to its file name
/// * an entry whose (final) destination already exists is skipped
#[instrument(level = "info", skip_all, fields(candidates = entries.len()))]
pub fn filter_candidates<F>(
    entries: &[CandidateEntry],
    keywords: Option<&Keywords>,
    destination_for: F,
) -> Vec<WorkItem>
where
    F: Fn(&CandidateEntry) -> PathBuf,
{
    let mut seen_urls: HashSet<&str> = HashSet::new();
    let mut claimed: HashSet<PathBuf> = HashSet::new();
    let mut items = Vec::new();
    let mut related = 0usize;

    for entry in entries {
        if !keywords.is_none_or(|kw| kw.matches(&entry.title)) {
            continue;
        }
        if !seen_urls.insert(entry.source_url.as_str()) {
            debug!(url = %entry.source_url, "Duplicate listing entry; ignoring");
            continue;
        }
        related += 1;

        let mut destination = destination_for(entry);
        if claimed.contains(&destination) {
            let renamed = disambiguate(&destination, &entry.source_url);
            debug!(
                original = %destination.display(),
                renamed = %renamed.display(),
                "Destination collides with another paper in this run"
            );
            destination = renamed;
        }

        if destination.exists() {
            debug!(path = %destination.display(), "Already downloaded; skipping");
            claimed.insert(destination);
            continue;
        }

        claimed.insert(destination.clone());
        items.push(WorkItem {
            download_url: entry.source_url.clone(),
            destination,
            title: entry.title.clone(),
        });
    }

    info!(
        related,
        to_download = items.len(),
        already_present = related - items.len(),
        "Found {} papers related",
        related
    );
    items
}

/// Append ` [xxxxxxxx]` (first 8 hex chars of the URL's SHA-256) to the file stem.
pub fn disambiguate(path: &Path, url: &str) -> PathBuf {
    let digest = Sha256::digest(url.as_bytes());
    let tag = &hex::encode(digest)[..8];
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let file_name = match path.extension() {
        Some(ext) => format!("{stem} [{tag}].{}", ext.to_string_lossy()),
        None => format!("{stem} [{tag}]"),
    };
    path.with_file_name(file_name)
}
