//! ACL Anthology event scraper (ACL, EMNLP, NAACL, COLING, ...).
//!
//! Every venue/year has an event page at
//! `https://aclanthology.org/events/{venue}-{year}/` listing all volumes of
//! the event, main conference and co-located workshops alike. Each paper is a
//! `p.align-items-stretch` row whose non-badge `a.align-middle` link points at the
//! paper page, e.g. `/2020.acl-main.1/`; the PDF lives at the same path with
//! a `.pdf` suffix.
//!
//! Old-style anthology ids for workshop papers carry a `W` marker
//! (`/W19-5901/`), which is how workshop papers are told apart.

use super::{PaperSource, clean_text, fetch_text};
use crate::errors::HandlerError;
use crate::models::CandidateEntry;
use async_trait::async_trait;
use itertools::Itertools;
use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{info, instrument};
use url::Url;

pub const ANTHOLOGY_BASE_URL: &str = "https://aclanthology.org";

static PAPER_ROW: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p.align-items-stretch").expect("valid row selector"));
static TITLE_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.align-middle[href]:not(.badge)").expect("valid title selector"));

#[derive(Debug, Clone)]
pub struct AnthologySource {
    venue: String,
    label: String,
    base_url: Url,
}

impl AnthologySource {
    pub fn new(venue: &str) -> Self {
        Self::with_base_url(venue, Url::parse(ANTHOLOGY_BASE_URL).expect("valid anthology url"))
    }

    pub fn with_base_url(venue: &str, base_url: Url) -> Self {
        Self {
            venue: venue.to_lowercase(),
            label: venue.to_uppercase(),
            base_url,
        }
    }

    fn event_url(&self, year: u16) -> Result<Url, url::ParseError> {
        self.base_url.join(&format!("events/{}-{}/", self.venue, year))
    }
}

#[async_trait]
impl PaperSource for AnthologySource {
    fn name(&self) -> &str {
        &self.label
    }

    #[instrument(level = "info", skip(self, client))]
    async fn list_candidates(
        &self,
        client: &Client,
        year: u16,
    ) -> Result<Vec<CandidateEntry>, HandlerError> {
        let url = self.event_url(year)?;
        let html = fetch_text(client, &url).await?;
        let entries = parse_event_page(&html, &self.base_url);
        if entries.is_empty() {
            return Err(HandlerError::MissingSection {
                what: "paper entries",
                url: url.to_string(),
            });
        }
        info!(
            venue = %self.venue,
            count = entries.len(),
            "{} papers have been found in {}-{}",
            entries.len(),
            self.label,
            year
        );
        Ok(entries)
    }
}

/// Extract all papers from an anthology event page.
pub fn parse_event_page(html: &str, base_url: &Url) -> Vec<CandidateEntry> {
    let document = Html::parse_document(html);
    document
        .select(&PAPER_ROW)
        .filter_map(|row| {
            let link = row.select(&TITLE_LINK).next()?;
            let href = link.value().attr("href")?;
            let title = clean_text(link.text());
            let paper_path = href.trim_end_matches('/');
            if title.is_empty() || paper_path.is_empty() {
                return None;
            }
            let pdf = base_url.join(&format!("{paper_path}.pdf")).ok()?;
            Some(CandidateEntry::new(title, pdf.to_string()).workshop(href.contains('W')))
        })
        .unique_by(|entry| entry.source_url.clone())
        .collect()
}
