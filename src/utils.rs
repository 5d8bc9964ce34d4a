//! Save directory checks.

use std::io;
use std::path::Path;
use tokio::fs;
use tracing::{info, instrument};

/// Create the save directory if needed and make sure files can be created in it.
///
/// Write access is checked by creating and closing a throwaway temp file.
#[instrument(level = "info", skip_all, fields(path = %savedir.display()))]
pub async fn prepare_savedir(savedir: &Path) -> io::Result<()> {
    fs::create_dir_all(savedir).await?;
    let scratch = tempfile::Builder::new()
        .prefix(".paper_harvest-")
        .tempfile_in(savedir)?;
    scratch.close()?;
    info!("Save directory is writable");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_prepare_savedir_creates_missing_dirs() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("a").join("b");

        prepare_savedir(&target).await.unwrap();

        assert!(target.is_dir());
        assert_eq!(std::fs::read_dir(&target).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_prepare_savedir_rejects_file_path() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("not_a_dir");
        std::fs::write(&file, b"x").unwrap();

        assert!(prepare_savedir(&file).await.is_err());
    }
}
