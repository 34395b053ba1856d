use std::path::{Component, Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::info;

/// Side effect run when a simulated report download reaches 100%.
pub trait FileSaver {
    /// Saves the asset behind `file_ref` and returns where it landed.
    fn save(&self, file_ref: &str) -> Result<PathBuf>;
}

/// Copies static report assets into a download directory.
#[derive(Debug, Clone)]
pub struct AssetSaver {
    assets_dir: PathBuf,
    download_dir: PathBuf,
}

impl AssetSaver {
    pub fn new(assets_dir: impl Into<PathBuf>, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            assets_dir: assets_dir.into(),
            download_dir: download_dir.into(),
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }
}

impl FileSaver for AssetSaver {
    fn save(&self, file_ref: &str) -> Result<PathBuf> {
        let relative = Path::new(file_ref);
        if relative
            .components()
            .any(|part| !matches!(part, Component::Normal(_)))
        {
            bail!("asset reference {file_ref:?} must be a plain relative path");
        }
        let Some(file_name) = relative.file_name() else {
            bail!("asset reference {file_ref:?} has no file name");
        };

        let source = self.assets_dir.join(relative);
        std::fs::create_dir_all(&self.download_dir).with_context(|| {
            format!("failed to create download dir {}", self.download_dir.display())
        })?;
        let target = self.download_dir.join(file_name);
        std::fs::copy(&source, &target)
            .with_context(|| format!("failed to copy {} to {}", source.display(), target.display()))?;

        info!(asset = file_ref, target = %target.display(), "report saved");
        Ok(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copies_asset_into_download_dir() {
        let assets = tempfile::tempdir().expect("assets");
        let downloads = tempfile::tempdir().expect("downloads");
        std::fs::create_dir_all(assets.path().join("reports")).expect("mkdir");
        std::fs::write(assets.path().join("reports/q2.pdf"), b"%PDF-1.4").expect("write");

        let saver = AssetSaver::new(assets.path(), downloads.path().join("nested"));
        let saved = saver.save("reports/q2.pdf").expect("save");

        assert_eq!(saved, downloads.path().join("nested").join("q2.pdf"));
        assert_eq!(std::fs::read(saved).expect("read"), b"%PDF-1.4");
    }

    #[test]
    fn missing_asset_is_an_error() {
        let assets = tempfile::tempdir().expect("assets");
        let downloads = tempfile::tempdir().expect("downloads");
        let saver = AssetSaver::new(assets.path(), downloads.path());

        let err = saver.save("reports/absent.pdf").expect_err("missing");
        assert!(err.to_string().contains("failed to copy"));
    }

    #[test]
    fn escaping_references_are_refused() {
        let saver = AssetSaver::new("/tmp/assets", "/tmp/downloads");
        assert!(saver.save("../secrets.pdf").is_err());
        assert!(saver.save("/etc/passwd").is_err());
    }
}
