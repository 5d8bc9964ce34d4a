//! Conference listing sources.
//!
//! Each source knows how to turn one conference/year into a list of
//! [`CandidateEntry`] values. They all implement [`PaperSource`]; the rest of
//! the pipeline only ever sees that trait.
//!
//! # Supported Sources
//!
//! | Conference | Module | Method |
//! |------------|--------|--------|
//! | ACL, EMNLP, NAACL, ... | [`anthology`] | ACL Anthology event page scraping |
//! | NeurIPS | [`neurips`] | papers.nips.cc year index scraping |
//! | ICML | [`icml`] | PMLR volume page scraping |
//! | ICLR | [`iclr`] | OpenReview notes API (JSON) |
//! | SIGIR | [`sigir`] | dblp search API (JSON), PDFs from the ACM DL |

use crate::errors::{ConfigError, HandlerError};
use crate::models::CandidateEntry;
use async_trait::async_trait;
use reqwest::Client;
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use url::Url;

pub mod anthology;
pub mod iclr;
pub mod icml;
pub mod neurips;
pub mod sigir;

/// Capability shared by every conference source.
#[async_trait]
pub trait PaperSource: Send + Sync {
    /// Short label used in log lines.
    fn name(&self) -> &str;

    /// Fetch the listing for `year` and return every downloadable paper on it.
    ///
    /// Entries without a title or PDF link are dropped here, never passed on.
    async fn list_candidates(
        &self,
        client: &Client,
        year: u16,
    ) -> Result<Vec<CandidateEntry>, HandlerError>;
}

/// Venues hosted on the ACL Anthology, addressed by their event slug.
pub const ANTHOLOGY_VENUES: &[&str] = &[
    "acl", "emnlp", "naacl", "eacl", "aacl", "coling", "conll", "cl", "tacl", "lrec", "semeval",
    "findings", "ijcnlp", "ws",
];

/// A conference selectable from the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conference {
    Anthology(String),
    NeurIps,
    Icml,
    Iclr,
    Sigir,
}

impl Conference {
    /// Lowercase identifier used in file names, e.g. `[acl2020] ...`.
    pub fn slug(&self) -> &str {
        match self {
            Conference::Anthology(venue) => venue,
            Conference::NeurIps => "neurips",
            Conference::Icml => "icml",
            Conference::Iclr => "iclr",
            Conference::Sigir => "sigir",
        }
    }

    /// The listing source serving this conference.
    pub fn source(&self) -> Box<dyn PaperSource> {
        match self {
            Conference::Anthology(venue) => Box::new(anthology::AnthologySource::new(venue)),
            Conference::NeurIps => Box::new(neurips::NeurIpsSource::default()),
            Conference::Icml => Box::new(icml::IcmlSource::default()),
            Conference::Iclr => Box::new(iclr::IclrSource::default()),
            Conference::Sigir => Box::new(sigir::SigirSource::default()),
        }
    }
}

impl FromStr for Conference {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        match lower.as_str() {
            "neurips" | "nips" => Ok(Conference::NeurIps),
            "icml" => Ok(Conference::Icml),
            "iclr" => Ok(Conference::Iclr),
            "sigir" => Ok(Conference::Sigir),
            v if ANTHOLOGY_VENUES.contains(&v) => Ok(Conference::Anthology(lower)),
            _ => Err(ConfigError::UnsupportedConference(s.to_string())),
        }
    }
}

impl fmt::Display for Conference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.slug().to_uppercase())
    }
}

/// GET a listing page, treating any non-2xx status as an error.
pub(crate) async fn fetch_text(client: &Client, url: &Url) -> Result<String, HandlerError> {
    debug!(%url, "Fetching listing");
    let response = client.get(url.clone()).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(HandlerError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(response.text().await?)
}

/// Collapse all whitespace runs in scraped text into single spaces.
pub(crate) fn clean_text<'a>(parts: impl IntoIterator<Item = &'a str>) -> String {
    parts
        .into_iter()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conference_from_str() {
        assert_eq!("ACL".parse::<Conference>().unwrap(), Conference::Anthology("acl".into()));
        assert_eq!("NeurIPS".parse::<Conference>().unwrap(), Conference::NeurIps);
        assert_eq!("nips".parse::<Conference>().unwrap(), Conference::NeurIps);
        assert_eq!(" iclr ".parse::<Conference>().unwrap(), Conference::Iclr);
        assert!(matches!(
            "cvpr".parse::<Conference>(),
            Err(ConfigError::UnsupportedConference(name)) if name == "cvpr"
        ));
    }

    #[test]
    fn test_conference_slug_and_display() {
        let conf = Conference::Anthology("emnlp".into());
        assert_eq!(conf.slug(), "emnlp");
        assert_eq!(conf.to_string(), "EMNLP");
        assert_eq!(Conference::Sigir.source().name(), "SIGIR");
        assert_eq!(conf.source().name(), "EMNLP");
    }

    #[test]
    fn test_clean_text() {
        assert_eq!(clean_text(["  Deep\n   Learning ", "for  NLP"]), "Deep Learning for NLP");
        assert_eq!(clean_text(std::iter::empty()), "");
    }
}
