//! ICLR papers via the OpenReview API.
//!
//! Accepted papers are the notes whose `content.venueid` is
//! `ICLR.cc/{year}/Conference`. The API is paged with `offset`/`limit`; the
//! newer API (2024 onwards) wraps every content field as `{"value": ...}`
//! while the older one returns plain strings, so both shapes are accepted.
//! PDFs are served from `https://openreview.net/pdf?id={note id}`.

use super::{PaperSource, clean_text, fetch_text};
use crate::errors::HandlerError;
use crate::models::CandidateEntry;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::Url;

pub const OPENREVIEW_API_V1: &str = "https://api.openreview.net";
pub const OPENREVIEW_API_V2: &str = "https://api2.openreview.net";
pub const OPENREVIEW_SITE: &str = "https://openreview.net";

/// First ICLR hosted on OpenReview with a venue id.
const FIRST_YEAR: u16 = 2018;
/// First year served by the v2 API.
const V2_FROM_YEAR: u16 = 2024;
const PAGE_SIZE: usize = 1000;
const MAX_PAGES: usize = 50;

#[derive(Debug, Deserialize)]
struct NotesPage {
    #[serde(default)]
    notes: Vec<Note>,
}

#[derive(Debug, Deserialize)]
struct Note {
    id: String,
    #[serde(default)]
    content: NoteContent,
}

#[derive(Debug, Default, Deserialize)]
struct NoteContent {
    title: Option<FieldValue>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FieldValue {
    Wrapped { value: String },
    Plain(String),
}

impl FieldValue {
    fn as_str(&self) -> &str {
        match self {
            FieldValue::Wrapped { value } => value,
            FieldValue::Plain(value) => value,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IclrSource {
    /// Fixed API base; when unset the API version is chosen by year.
    api_base: Option<Url>,
    site: Url,
}

impl Default for IclrSource {
    fn default() -> Self {
        Self {
            api_base: None,
            site: Url::parse(OPENREVIEW_SITE).expect("valid openreview url"),
        }
    }
}

impl IclrSource {
    pub fn with_base_urls(api_base: Url, site: Url) -> Self {
        Self {
            api_base: Some(api_base),
            site,
        }
    }

    fn api_base(&self, year: u16) -> Result<Url, url::ParseError> {
        match &self.api_base {
            Some(base) => Ok(base.clone()),
            None if year >= V2_FROM_YEAR => Url::parse(OPENREVIEW_API_V2),
            None => Url::parse(OPENREVIEW_API_V1),
        }
    }

    fn page_url(&self, year: u16, offset: usize) -> Result<Url, url::ParseError> {
        let mut url = self.api_base(year)?.join("notes")?;
        url.query_pairs_mut()
            .append_pair("content.venueid", &format!("ICLR.cc/{year}/Conference"))
            .append_pair("offset", &offset.to_string())
            .append_pair("limit", &PAGE_SIZE.to_string());
        Ok(url)
    }

    fn pdf_url(&self, note_id: &str) -> Result<Url, url::ParseError> {
        let mut url = self.site.join("pdf")?;
        url.query_pairs_mut().append_pair("id", note_id);
        Ok(url)
    }
}

#[async_trait]
impl PaperSource for IclrSource {
    fn name(&self) -> &str {
        "ICLR"
    }

    #[instrument(level = "info", skip(self, client))]
    async fn list_candidates(
        &self,
        client: &Client,
        year: u16,
    ) -> Result<Vec<CandidateEntry>, HandlerError> {
        if year < FIRST_YEAR {
            return Err(HandlerError::UnsupportedYear {
                conference: "ICLR".to_string(),
                year,
            });
        }

        let mut entries = Vec::new();
        for page in 0..MAX_PAGES {
            let url = self.page_url(year, page * PAGE_SIZE)?;
            let body = fetch_text(client, &url).await?;
            let notes = serde_json::from_str::<NotesPage>(&body)?.notes;
            let fetched = notes.len();
            debug!(page, fetched, "Fetched OpenReview page");

            for note in notes {
                let Some(title) = note.content.title.as_ref().map(|t| clean_text([t.as_str()])) else {
                    continue;
                };
                if title.is_empty() || note.id.is_empty() {
                    continue;
                }
                entries.push(CandidateEntry::new(title, self.pdf_url(&note.id)?.to_string()));
            }

            if fetched < PAGE_SIZE {
                break;
            }
        }

        if entries.is_empty() {
            return Err(HandlerError::MissingSection {
                what: "accepted papers",
                url: self.page_url(year, 0)?.to_string(),
            });
        }
        info!(count = entries.len(), "{} papers have been found in ICLR-{}", entries.len(), year);
        Ok(entries)
    }
}
