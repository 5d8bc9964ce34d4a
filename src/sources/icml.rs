//! ICML proceedings scraper (Proceedings of Machine Learning Research).
//!
//! PMLR publishes each ICML edition as a numbered volume, so a year is first
//! mapped to its volume and the listing is fetched from
//! `https://proceedings.mlr.press/v{volume}/`. Each paper is a `div.paper`
//! with a `p.title` and a `p.links` block containing a "Download PDF" link.

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

pub const PMLR_BASE_URL: &str = "https://proceedings.mlr.press";

/// ICML year to PMLR volume.
const VOLUMES: &[(u16, u16)] = &[
    (2013, 28),
    (2014, 32),
    (2015, 37),
    (2016, 48),
    (2017, 70),
    (2018, 80),
    (2019, 97),
    (2020, 119),
    (2021, 139),
    (2022, 162),
    (2023, 202),
    (2024, 235),
    (2025, 267),
];

static PAPER: Lazy<Selector> = Lazy::new(|| Selector::parse("div.paper").expect("valid paper selector"));
static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("p.title").expect("valid title selector"));
static LINK: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p.links a[href]").expect("valid link selector"));

pub fn volume_for(year: u16) -> Option<u16> {
    VOLUMES.iter().find(|(y, _)| *y == year).map(|(_, v)| *v)
}

#[derive(Debug, Clone)]
pub struct IcmlSource {
    base_url: Url,
}

impl Default for IcmlSource {
    fn default() -> Self {
        Self::with_base_url(Url::parse(PMLR_BASE_URL).expect("valid pmlr url"))
    }
}

impl IcmlSource {
    pub fn with_base_url(base_url: Url) -> Self {
        Self { base_url }
    }
}

#[async_trait]
impl PaperSource for IcmlSource {
    fn name(&self) -> &str {
        "ICML"
    }

    #[instrument(level = "info", skip(self, client))]
    async fn list_candidates(
        &self,
        client: &Client,
        year: u16,
    ) -> Result<Vec<CandidateEntry>, HandlerError> {
        let volume = volume_for(year).ok_or_else(|| HandlerError::UnsupportedYear {
            conference: "ICML".to_string(),
            year,
        })?;
        let url = self.base_url.join(&format!("v{volume}/"))?;
        let html = fetch_text(client, &url).await?;
        let entries = parse_volume(&html, &url);
        if entries.is_empty() {
            return Err(HandlerError::MissingSection {
                what: "papers",
                url: url.to_string(),
            });
        }
        info!(volume, count = entries.len(), "{} papers have been found in ICML-{}", entries.len(), year);
        Ok(entries)
    }
}

/// Extract all papers from a PMLR volume page; relative links resolve against `page_url`.
pub fn parse_volume(html: &str, page_url: &Url) -> Vec<CandidateEntry> {
    let document = Html::parse_document(html);
    document
        .select(&PAPER)
        .filter_map(|paper| {
            let title = clean_text(paper.select(&TITLE).next()?.text());
            let pdf_href = paper
                .select(&LINK)
                .find(|a| {
                    clean_text(a.text()).eq_ignore_ascii_case("download pdf")
                        || a.value().attr("href").is_some_and(|h| h.ends_with(".pdf"))
                })?
                .value()
                .attr("href")?;
            if title.is_empty() {
                return None;
            }
            let pdf = page_url.join(pdf_href).ok()?;
            Some(CandidateEntry::new(title, pdf.to_string()))
        })
        .unique_by(|entry| entry.source_url.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VOLUME_PAGE: &str = r#"
        <html><body>
        <div class="paper">
          <p class="title">Scaling   Laws for
             Retrieval</p>
          <p class="details"><span class="authors">A. Author</span></p>
          <p class="links">
            [<a href="https://proceedings.mlr.press/v202/author23a.html">abs</a>]
            [<a href="https://proceedings.mlr.press/v202/author23a/author23a.pdf" target="_blank">Download PDF</a>]
          </p>
        </div>
        <div class="paper">
          <p class="title">Relative Links Work Too</p>
          <p class="links">[<a href="b23b/b23b.pdf">Download PDF</a>]</p>
        </div>
        <div class="paper">
          <p class="title">No PDF Here</p>
          <p class="links">[<a href="c23c.html">abs</a>]</p>
        </div>
        </body></html>
    "#;

    #[test]
    fn test_volume_for() {
        assert_eq!(volume_for(2023), Some(202));
        assert_eq!(volume_for(2019), Some(97));
        assert_eq!(volume_for(2001), None);
    }

    #[test]
    fn test_parse_volume() {
        let page = Url::parse("https://proceedings.mlr.press/v202/").unwrap();
        let entries = parse_volume(VOLUME_PAGE, &page);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "Scaling Laws for Retrieval");
        assert_eq!(
            entries[0].source_url,
            "https://proceedings.mlr.press/v202/author23a/author23a.pdf"
        );
        assert_eq!(entries[1].source_url, "https://proceedings.mlr.press/v202/b23b/b23b.pdf");
    }

    #[tokio::test]
    async fn test_unknown_year_is_unsupported() {
        let source = IcmlSource::default();
        let err = source.list_candidates(&Client::new(), 1999).await.unwrap_err();
        assert!(matches!(err, HandlerError::UnsupportedYear { year: 1999, .. }));
    }

    #[tokio::test]
    async fn test_list_candidates_from_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v202/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(VOLUME_PAGE))
            .mount(&server)
            .await;

        let source = IcmlSource::with_base_url(Url::parse(&server.uri()).unwrap());
        let entries = source.list_candidates(&Client::new(), 2023).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].source_url, format!("{}/v202/b23b/b23b.pdf", server.uri()));
    }
}
