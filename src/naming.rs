//! Directory layout and file naming for downloaded papers.
//!
//! # Layout
//!
//! ```text
//! savedir/
//! └── ACL2020/
//!     ├── [acl2020] Some Paper Title.pdf
//!     ├── [acl2020WorkShop] Some Workshop Paper.pdf
//!     ├── Datasets_and_Benchmarks/      # optional per-source subcategory
//!     │   └── [neurips2023] ....pdf
//!     └── error_id.txt                  # only when downloads failed
//! ```

use crate::models::CandidateEntry;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

/// File name of the failure report inside a conference directory.
pub const REPORT_FILE_NAME: &str = "error_id.txt";

/// Byte budget for the title part of a file name. Names are limited to 255
/// bytes on common filesystems; the rest is left for the `[conf year]`
/// prefix, a disambiguation tag and the `.pdf.part` suffix.
const MAX_TITLE_BYTES: usize = 180;

static UNSAFE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[\\/*?:"<>|\x00-\x1f]"#).expect("valid filename regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Make a paper title safe to use as a file name.
///
/// Characters rejected by common filesystems become `_`, runs of whitespace
/// collapse to a single space, and the result is capped at 180 bytes of
/// UTF-8 without splitting a character.
pub fn sanitize_title(title: &str) -> String {
    let replaced = UNSAFE_CHARS.replace_all(title, "_");
    let collapsed = WHITESPACE.replace_all(&replaced, " ");
    let trimmed = collapsed.trim_matches(|c: char| c == '.' || c.is_whitespace());
    truncate_bytes(trimmed, MAX_TITLE_BYTES).trim_end().to_string()
}

fn truncate_bytes(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// `[{conference}{year}[WorkShop]] {title}.pdf`
pub fn paper_filename(conference: &str, year: u16, title: &str, is_workshop: bool) -> String {
    let marker = if is_workshop { "WorkShop" } else { "" };
    format!("[{conference}{year}{marker}] {}.pdf", sanitize_title(title))
}

/// `{savedir}/{CONFERENCE}{YEAR}`
pub fn conference_dir(savedir: &Path, conference: &str, year: u16) -> PathBuf {
    savedir.join(format!("{}{}", conference.to_uppercase(), year))
}

/// Naming rule for one conference/year run.
#[derive(Debug, Clone)]
pub struct DestinationRule {
    pub root: PathBuf,
    pub conference: String,
    pub year: u16,
}

impl DestinationRule {
    pub fn new(savedir: &Path, conference: &str, year: u16) -> Self {
        Self {
            root: conference_dir(savedir, conference, year),
            conference: conference.to_string(),
            year,
        }
    }

    pub fn destination_for(&self, entry: &CandidateEntry) -> PathBuf {
        let dir = match &entry.subcategory {
            Some(sub) => self.root.join(sanitize_title(sub)),
            None => self.root.clone(),
        };
        dir.join(paper_filename(
            &self.conference,
            self.year,
            &entry.title,
            entry.is_workshop,
        ))
    }

    pub fn report_path(&self) -> PathBuf {
        self.root.join(REPORT_FILE_NAME)
    }
}
