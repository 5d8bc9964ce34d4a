//! Command-line interface definitions for Paper Harvest.
//!
//! This module defines the CLI arguments and options using the `clap` crate.
//! Directory and HTTP options can also be provided via environment variables.

use crate::download::DEFAULT_CONCURRENCY;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the Paper Harvest application.
///
/// # Examples
///
/// ```sh
/// # All ACL 2020 papers about summarization or dialogue
/// paper_harvest -c acl -y 2020 -k summar-dialog
///
/// # Several NeurIPS years into a given directory, 16 downloads at a time
/// paper_harvest -c neurips -y 2022 2023 -s ~/papers -p 16
///
/// # A mirror with a broken certificate
/// paper_harvest -c sigir -y 2023 --insecure
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Conference: acl, emnlp, naacl, eacl, aacl, coling, conll, cl, tacl, lrec,
    /// semeval, findings, ijcnlp, ws, neurips, icml, iclr or sigir
    #[arg(short, long)]
    pub conference: String,

    /// One or more years to harvest (defaults to the current year)
    #[arg(short, long, num_args = 1..)]
    pub year: Vec<u16>,

    /// Hyphen-joined keywords; a paper is kept when its title contains any of them
    #[arg(short, long)]
    pub keywords: Option<String>,

    /// Directory under which `{CONFERENCE}{YEAR}/` folders are created (defaults to the current directory)
    #[arg(short, long, env = "PAPER_HARVEST_SAVEDIR")]
    pub savedir: Option<PathBuf>,

    /// Number of concurrent downloads
    #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY, value_parser = parse_pool_size)]
    pub poolnum: usize,

    /// Per-request timeout in seconds
    #[arg(long, env = "PAPER_HARVEST_TIMEOUT_SECS", default_value_t = 60)]
    pub timeout_secs: u64,

    /// Accept invalid TLS certificates (self-signed or misconfigured mirrors)
    #[arg(long, env = "PAPER_HARVEST_INSECURE")]
    pub insecure: bool,

    /// Save response bodies even when they do not look like a PDF
    #[arg(long)]
    pub no_verify_pdf: bool,
}

fn parse_pool_size(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("pool size must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}
