//! Data models for paper candidates, download work and outcomes.
//!
//! This module defines the values that flow through the pipeline:
//! - [`CandidateEntry`]: a paper as scraped from a listing page, before filtering
//! - [`WorkItem`]: a candidate that passed filtering and still needs downloading
//! - [`DownloadOutcome`]: the result of attempting one [`WorkItem`]
//! - [`Keywords`]: the OR-matched, case-insensitive title filter

use std::fmt;
use std::path::PathBuf;

/// A paper as listed by a conference source.
///
/// Produced by a handler and discarded once the filter has run. Handlers
/// never emit entries with an empty title or URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateEntry {
    /// The paper title as displayed on the listing page.
    pub title: String,
    /// Direct URL of the paper PDF.
    pub source_url: String,
    /// Whether the paper belongs to a workshop rather than the main track.
    pub is_workshop: bool,
    /// Optional subdirectory (e.g. a NeurIPS track) under the conference directory.
    pub subcategory: Option<String>,
}

impl CandidateEntry {
    /// Main-track entry without subcategory.
    pub fn new(title: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            source_url: source_url.into(),
            is_workshop: false,
            subcategory: None,
        }
    }

    pub fn workshop(mut self, is_workshop: bool) -> Self {
        self.is_workshop = is_workshop;
        self
    }

    pub fn in_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }
}

/// A single download to perform.
///
/// Immutable once created by the filter and consumed exactly once by the
/// executor. `destination` is unique within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub download_url: String,
    pub destination: PathBuf,
    pub title: String,
}

impl WorkItem {
    /// Tab-separated `url, destination, title` line used by the failure report.
    pub fn report_line(&self) -> String {
        format!(
            "{}\t{}\t{}",
            self.download_url,
            self.destination.display(),
            self.title
        )
    }
}

/// Result of one download attempt.
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    pub item: WorkItem,
    pub succeeded: bool,
    /// Human readable reason when `succeeded` is false.
    pub error: Option<String>,
}

impl DownloadOutcome {
    pub fn success(item: WorkItem) -> Self {
        Self {
            item,
            succeeded: true,
            error: None,
        }
    }

    pub fn failure(item: WorkItem, error: impl fmt::Display) -> Self {
        Self {
            item,
            succeeded: false,
            error: Some(error.to_string()),
        }
    }
}

/// Keyword filter applied to paper titles.
///
/// Matching is a case-insensitive substring test, OR-ed across keywords.
/// An empty set matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Keywords(Vec<String>);

impl Keywords {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        )
    }

    /// Parse the hyphen-joined CLI form, e.g. `summar-dialog`.
    pub fn parse(joined: &str) -> Self {
        Self::new(joined.split('-'))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn matches(&self, title: &str) -> bool {
        if self.0.is_empty() {
            return true;
        }
        let title = title.to_lowercase();
        self.0.iter().any(|kw| title.contains(kw.as_str()))
    }
}

impl fmt::Display for Keywords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("-"))
    }
}
