//! SIGIR papers via the dblp search API.
//!
//! dblp indexes every SIGIR table of contents as
//! `db/conf/sigir/sigir{year}.bht`; a `toc:` query returns its papers with
//! their DOIs, and the ACM Digital Library serves the PDF at
//! `https://dl.acm.org/doi/pdf/{doi}`. Many ACM PDFs are not open access;
//! those come back as HTML and end up in the failure report.

use super::{PaperSource, clean_text, fetch_text};
use crate::errors::HandlerError;
use crate::models::CandidateEntry;
use async_trait::async_trait;
use itertools::Itertools;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, instrument};
use url::Url;

pub const DBLP_BASE_URL: &str = "https://dblp.org";
pub const ACM_PDF_BASE_URL: &str = "https://dl.acm.org/doi/pdf/";

const PAGE_SIZE: usize = 1000;
const MAX_PAGES: usize = 10;
/// dblp record type of proceedings front matter.
const EDITORSHIP: &str = "Editorship";

#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: SearchResult,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    hits: Hits,
}

#[derive(Debug, Deserialize)]
struct Hits {
    #[serde(rename = "@total", default)]
    total: Option<String>,
    #[serde(default)]
    hit: Vec<Hit>,
}

#[derive(Debug, Deserialize)]
struct Hit {
    info: HitInfo,
}

#[derive(Debug, Deserialize)]
struct HitInfo {
    title: Option<String>,
    doi: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SigirSource {
    dblp_base: Url,
    pdf_base: Url,
}

impl Default for SigirSource {
    fn default() -> Self {
        Self::with_base_urls(
            Url::parse(DBLP_BASE_URL).expect("valid dblp url"),
            Url::parse(ACM_PDF_BASE_URL).expect("valid acm url"),
        )
    }
}

impl SigirSource {
    pub fn with_base_urls(dblp_base: Url, pdf_base: Url) -> Self {
        Self { dblp_base, pdf_base }
    }

    fn page_url(&self, year: u16, offset: usize) -> Result<Url, url::ParseError> {
        let mut url = self.dblp_base.join("search/publ/api")?;
        url.query_pairs_mut()
            .append_pair("q", &format!("toc:db/conf/sigir/sigir{year}.bht:"))
            .append_pair("h", &PAGE_SIZE.to_string())
            .append_pair("f", &offset.to_string())
            .append_pair("format", "json");
        Ok(url)
    }
}

#[async_trait]
impl PaperSource for SigirSource {
    fn name(&self) -> &str {
        "SIGIR"
    }

    #[instrument(level = "info", skip(self, client))]
    async fn list_candidates(
        &self,
        client: &Client,
        year: u16,
    ) -> Result<Vec<CandidateEntry>, HandlerError> {
        let mut infos = Vec::new();
        for page in 0..MAX_PAGES {
            let url = self.page_url(year, page * PAGE_SIZE)?;
            let body = fetch_text(client, &url).await?;
            let hits = serde_json::from_str::<SearchResponse>(&body)?.result.hits;
            let fetched = hits.hit.len();
            debug!(page, fetched, total = ?hits.total, "Fetched dblp page");
            infos.extend(hits.hit.into_iter().map(|h| h.info));
            if fetched < PAGE_SIZE {
                break;
            }
        }

        let entries = to_candidates(infos, &self.pdf_base);
        if entries.is_empty() {
            return Err(HandlerError::MissingSection {
                what: "proceedings",
                url: self.page_url(year, 0)?.to_string(),
            });
        }
        info!(count = entries.len(), "{} papers have been found in SIGIR-{}", entries.len(), year);
        Ok(entries)
    }
}

fn to_candidates(infos: Vec<HitInfo>, pdf_base: &Url) -> Vec<CandidateEntry> {
    infos
        .into_iter()
        .filter(|info| info.kind.as_deref() != Some(EDITORSHIP))
        .filter_map(|info| {
            let title = clean_text([info.title.as_deref()?]);
            let title = title.trim_end_matches('.').to_string();
            let doi = info.doi?;
            if title.is_empty() || doi.is_empty() {
                return None;
            }
            let pdf = pdf_base.join(&doi).ok()?;
            Some(CandidateEntry::new(title, pdf.to_string()))
        })
        .unique_by(|entry| entry.source_url.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DBLP_PAGE: &str = r#"{"result":{"hits":{"@total":"3","@sent":"3","hit":[
        {"info":{"title":"Proceedings of SIGIR 2023.","doi":"10.1145/3539618","type":"Editorship"}},
        {"info":{"title":"Dense Retrieval  at Scale.","doi":"10.1145/3539618.3591001","type":"Conference and Workshop Papers"}},
        {"info":{"title":"A Paper Without DOI.","type":"Conference and Workshop Papers"}}
    ]}}}"#;

    #[test]
    fn test_to_candidates() {
        let response: SearchResponse = serde_json::from_str(DBLP_PAGE).unwrap();
        let infos = response.result.hits.hit.into_iter().map(|h| h.info).collect();
        let entries = to_candidates(infos, &Url::parse(ACM_PDF_BASE_URL).unwrap());

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Dense Retrieval at Scale");
        assert_eq!(
            entries[0].source_url,
            "https://dl.acm.org/doi/pdf/10.1145/3539618.3591001"
        );
    }

    #[test]
    fn test_empty_hits_deserialize() {
        let body = r#"{"result":{"hits":{"@total":"0","@sent":"0","@first":"0"}}}"#;
        let response: SearchResponse = serde_json::from_str(body).unwrap();
        assert!(response.result.hits.hit.is_empty());
    }

    #[tokio::test]
    async fn test_list_candidates_from_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/search/publ/api"))
            .and(query_param("q", "toc:db/conf/sigir/sigir2023.bht:"))
            .respond_with(ResponseTemplate::new(200).set_body_string(DBLP_PAGE))
            .mount(&server)
            .await;

        let base = Url::parse(&server.uri()).unwrap();
        let pdf_base = base.join("doi/pdf/").unwrap();
        let source = SigirSource::with_base_urls(base, pdf_base);

        let entries = source.list_candidates(&Client::new(), 2023).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            entries[0].source_url,
            format!("{}/doi/pdf/10.1145/3539618.3591001", server.uri())
        );

        let err = source.list_candidates(&Client::new(), 2022).await.unwrap_err();
        assert!(matches!(err, HandlerError::Status { status: 404, .. }));
    }
}
