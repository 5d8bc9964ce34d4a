//! Failure report for a finished download batch.
//!
//! Failed items are written one per line as `url \t destination \t title`,
//! which is enough for an operator to retry them by hand. A clean batch
//! writes nothing and removes the report left by an earlier run.

use crate::models::DownloadOutcome;
use std::error::Error;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tracing::{debug, info, instrument, warn};

/// Persist failed outcomes to `report_path` and return how many failed.
///
/// Failures are written in the order they appear in `outcomes`; an existing
/// report at the same path is replaced.
#[instrument(level = "info", skip_all, fields(report_path = %report_path.display()))]
pub async fn report(
    outcomes: &[DownloadOutcome],
    report_path: &Path,
) -> Result<usize, Box<dyn Error>> {
    let (failed, succeeded): (Vec<&DownloadOutcome>, Vec<&DownloadOutcome>) =
        outcomes.iter().partition(|o| !o.succeeded);

    if failed.is_empty() {
        info!(succeeded = succeeded.len(), "Downloading success");
        match fs::remove_file(report_path).await {
            Ok(()) => info!("Removed failure report of a previous run"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        return Ok(0);
    }

    let mut body = String::new();
    for outcome in &failed {
        debug!(
            url = %outcome.item.download_url,
            reason = outcome.error.as_deref().unwrap_or("unknown"),
            "Recording failed download"
        );
        body.push_str(&outcome.item.report_line());
        body.push('\n');
    }

    if let Some(parent) = report_path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(report_path, body).await?;
    warn!(
        failed = failed.len(),
        succeeded = succeeded.len(),
        path = %report_path.display(),
        "{} papers downloading failed, see {} for details",
        failed.len(),
        report_path.display()
    );

    Ok(failed.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WorkItem;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn outcome(n: u8, succeeded: bool) -> DownloadOutcome {
        let item = WorkItem {
            download_url: format!("https://example.org/{n}.pdf"),
            destination: PathBuf::from(format!("/papers/ACL2020/[acl2020] P{n}.pdf")),
            title: format!("P{n}"),
        };
        if succeeded {
            DownloadOutcome::success(item)
        } else {
            DownloadOutcome::failure(item, "HTTP 500")
        }
    }

    #[tokio::test]
    async fn test_no_failures_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("error_id.txt");

        let count = report(&[outcome(1, true), outcome(2, true)], &path).await.unwrap();

        assert_eq!(count, 0);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_clean_rerun_removes_stale_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("error_id.txt");
        std::fs::write(&path, "https://example.org/1.pdf\t/papers/P1.pdf\tP1\n").unwrap();

        let count = report(&[outcome(1, true)], &path).await.unwrap();

        assert_eq!(count, 0);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_empty_outcomes_write_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("error_id.txt");
        assert_eq!(report(&[], &path).await.unwrap(), 0);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_one_line_per_failure_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ACL2020").join("error_id.txt");
        let outcomes = [outcome(3, false), outcome(1, true), outcome(2, false)];

        let count = report(&outcomes, &path).await.unwrap();

        assert_eq!(count, 2);
        let written = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(
            lines,
            vec![
                "https://example.org/3.pdf\t/papers/ACL2020/[acl2020] P3.pdf\tP3",
                "https://example.org/2.pdf\t/papers/ACL2020/[acl2020] P2.pdf\tP2",
            ]
        );
    }

    #[tokio::test]
    async fn test_report_overwrites_previous_run() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("error_id.txt");
        std::fs::write(&path, "stale\nstale\nstale\n").unwrap();

        report(&[outcome(9, false)], &path).await.unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert_eq!(written.lines().count(), 1);
        assert!(written.starts_with("https://example.org/9.pdf\t"));
    }
}
