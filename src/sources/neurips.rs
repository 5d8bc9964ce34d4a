//! NeurIPS proceedings scraper.
//!
//! The year index at `https://papers.nips.cc/paper_files/paper/{year}` lists
//! every accepted paper as a link to its abstract page:
//!
//! ```text
//! /paper_files/paper/2023/hash/<hash>-Abstract-Conference.html
//! /paper_files/paper/2023/hash/<hash>-Abstract-Datasets_and_Benchmarks.html
//! ```
//!
//! The PDF sits next to it under `file/` as `<hash>-Paper-<track>.pdf`.
//! Papers outside the main `Conference` track are stored in a subdirectory
//! named after their track.

use super::{PaperSource, clean_text, fetch_text};
use crate::errors::HandlerError;
use crate::models::CandidateEntry;
use async_trait::async_trait;
use itertools::Itertools;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{info, instrument};
use url::Url;

pub const NEURIPS_BASE_URL: &str = "https://papers.nips.cc";

const MAIN_TRACK: &str = "Conference";

static PAPER_LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("ul.paper-list li a[href]").expect("valid paper selector"));
static ABSTRACT_HREF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<dir>.*)/hash/(?P<hash>[0-9a-fA-F]+)-Abstract(?:-(?P<track>[A-Za-z_]+))?\.html$")
        .expect("valid abstract regex")
});

#[derive(Debug, Clone)]
pub struct NeurIpsSource {
    base_url: Url,
}

impl Default for NeurIpsSource {
    fn default() -> Self {
        Self::with_base_url(Url::parse(NEURIPS_BASE_URL).expect("valid neurips url"))
    }
}

impl NeurIpsSource {
    pub fn with_base_url(base_url: Url) -> Self {
        Self { base_url }
    }
}

#[async_trait]
impl PaperSource for NeurIpsSource {
    fn name(&self) -> &str {
        "NEURIPS"
    }

    #[instrument(level = "info", skip(self, client))]
    async fn list_candidates(
        &self,
        client: &Client,
        year: u16,
    ) -> Result<Vec<CandidateEntry>, HandlerError> {
        let url = self.base_url.join(&format!("paper_files/paper/{year}"))?;
        let html = fetch_text(client, &url).await?;
        let entries = parse_year_index(&html, &self.base_url);
        if entries.is_empty() {
            return Err(HandlerError::MissingSection {
                what: "paper list",
                url: url.to_string(),
            });
        }
        info!(count = entries.len(), "{} papers have been found in NEURIPS-{}", entries.len(), year);
        Ok(entries)
    }
}

/// Extract all papers from a NeurIPS year index page.
pub fn parse_year_index(html: &str, base_url: &Url) -> Vec<CandidateEntry> {
    let document = Html::parse_document(html);
    document
        .select(&PAPER_LINK)
        .filter_map(|link| {
            let href = link.value().attr("href")?;
            let (pdf_path, track) = pdf_path_for(href)?;
            let title = clean_text(link.text());
            if title.is_empty() {
                return None;
            }
            let pdf = base_url.join(&pdf_path).ok()?;
            let entry = CandidateEntry::new(title, pdf.to_string());
            Some(match track {
                Some(track) if track != MAIN_TRACK => entry.in_subcategory(track),
                _ => entry,
            })
        })
        .unique_by(|entry| entry.source_url.clone())
        .collect()
}

/// Map an abstract page link to its PDF path and optional track name.
fn pdf_path_for(href: &str) -> Option<(String, Option<String>)> {
    let caps = ABSTRACT_HREF.captures(href)?;
    let dir = &caps["dir"];
    let hash = &caps["hash"];
    let track = caps.name("track").map(|m| m.as_str().to_string());
    let pdf = match &track {
        Some(track) => format!("{dir}/file/{hash}-Paper-{track}.pdf"),
        None => format!("{dir}/file/{hash}-Paper.pdf"),
    };
    Some((pdf, track))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const YEAR_INDEX: &str = r#"
        <html><body><div class="container-fluid">
        <ul class="paper-list">
          <li class="conference"><div class="paper-content">
            <a title="paper title" href="/paper_files/paper/2023/hash/00a1b2-Abstract-Conference.html">Efficient
              Summarization</a>
            <span class="paper-authors">Ann Author</span>
          </div></li>
          <li class="datasets_and_benchmarks"><div class="paper-content">
            <a href="/paper_files/paper/2023/hash/ffee99-Abstract-Datasets_and_Benchmarks.html">A Benchmark</a>
          </div></li>
          <li><a href="/paper_files/paper/2023/hash/ffee99-Abstract-Datasets_and_Benchmarks.html">A Benchmark</a></li>
          <li><a href="/paper_files/paper/2023">Back to index</a></li>
        </ul>
        </div></body></html>
    "#;

    #[test]
    fn test_pdf_path_for() {
        assert_eq!(
            pdf_path_for("/paper/2019/hash/abc123-Abstract.html"),
            Some(("/paper/2019/file/abc123-Paper.pdf".to_string(), None))
        );
        assert_eq!(
            pdf_path_for("/paper_files/paper/2023/hash/abc-Abstract-Conference.html"),
            Some((
                "/paper_files/paper/2023/file/abc-Paper-Conference.pdf".to_string(),
                Some("Conference".to_string())
            ))
        );
        assert_eq!(pdf_path_for("/paper_files/paper/2023"), None);
    }

    #[test]
    fn test_parse_year_index() {
        let base = Url::parse(NEURIPS_BASE_URL).unwrap();
        let entries = parse_year_index(YEAR_INDEX, &base);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Efficient Summarization");
        assert_eq!(
            entries[0].source_url,
            "https://papers.nips.cc/paper_files/paper/2023/file/00a1b2-Paper-Conference.pdf"
        );
        assert_eq!(entries[0].subcategory, None);
        assert_eq!(entries[1].subcategory.as_deref(), Some("Datasets_and_Benchmarks"));
    }

    #[tokio::test]
    async fn test_list_candidates_from_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/paper_files/paper/2023"))
            .respond_with(ResponseTemplate::new(200).set_body_string(YEAR_INDEX))
            .mount(&server)
            .await;

        let source = NeurIpsSource::with_base_url(Url::parse(&server.uri()).unwrap());
        let entries = source.list_candidates(&Client::new(), 2023).await.unwrap();
        assert_eq!(entries.len(), 2);

        let err = source.list_candidates(&Client::new(), 1900).await.unwrap_err();
        assert!(matches!(err, HandlerError::Status { status: 404, .. }));
    }
}
