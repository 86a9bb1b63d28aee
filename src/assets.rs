//! Static asset resolution.
//!
//! Assets are looked up by filename convention under one assets directory:
//! `<SystemType>.png` is the report watermark and `<SystemType>.pdf` is the
//! reference-defaults document for that configuration. The directory is the
//! first of: an explicit setting, the `IONIFY_ASSETS` environment variable,
//! an `assets` directory next to the executable, `./assets`.

use crate::error::{AppResult, IonifyError};
use crate::signals::SystemType;
use std::path::{Path, PathBuf};

pub const ASSETS_ENV_VAR: &str = "IONIFY_ASSETS";

/// Resolved assets directory for one run.
#[derive(Clone, Debug)]
pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Locate the assets directory, falling back through the documented
    /// chain. The directory is not required to exist; individual lookups
    /// handle absence.
    pub fn discover(configured: Option<&Path>) -> Self {
        if let Some(dir) = configured {
            return Self::new(dir);
        }
        if let Some(dir) = std::env::var_os(ASSETS_ENV_VAR) {
            return Self::new(PathBuf::from(dir));
        }
        if let Some(dir) = std::env::current_exe()
            .ok()
            .and_then(|exe| Some(exe.parent()?.join("assets")))
        {
            if dir.is_dir() {
                return Self::new(dir);
            }
        }
        Self::new("assets")
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Watermark image for a system type, if present. Absence is not an
    /// error; the report simply renders without a background.
    pub fn watermark(&self, system_type: SystemType) -> Option<PathBuf> {
        let path = self.root.join(format!("{}.png", system_type.as_str()));
        if path.is_file() {
            Some(path)
        } else {
            tracing::warn!(path = %path.display(), "watermark image missing, report will be plain");
            None
        }
    }

    /// Reference-defaults document for a system type.
    pub fn defaults_document(&self, system_type: SystemType) -> AppResult<PathBuf> {
        let path = self.root.join(format!("{}.pdf", system_type.as_str()));
        if path.is_file() {
            Ok(path)
        } else {
            Err(IonifyError::AssetMissing(path))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_directory_wins() {
        let store = AssetStore::discover(Some(Path::new("/opt/ionify/assets")));
        assert_eq!(store.root(), Path::new("/opt/ionify/assets"));
    }

    #[test]
    fn defaults_document_resolves_by_convention() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("ESQ_MAGCIS.pdf");
        std::fs::write(&pdf, b"%PDF-1.5\n").unwrap();

        let store = AssetStore::new(dir.path());
        assert_eq!(
            store.defaults_document(SystemType::EsqMagcis).unwrap(),
            pdf
        );
        let err = store.defaults_document(SystemType::NexsaEx06).unwrap_err();
        assert!(matches!(err, IonifyError::AssetMissing(_)));
    }

    #[test]
    fn missing_watermark_degrades_to_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = AssetStore::new(dir.path());
        assert!(store.watermark(SystemType::EsqEx06).is_none());
    }
}
