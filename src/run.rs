//! Folder-driven processing: one invocation scans a calibration folder and
//! produces the contact sheet plus one validated report per log file.
//!
//! The two documents live in independent failure domains: a broken bitmap
//! kills only the contact sheet, and every log file is parsed and reported
//! on its own, with signal state reset per file.

use crate::assets::AssetStore;
use crate::config::Settings;
use crate::contact_sheet::{self, SheetImage};
use crate::error::AppResult;
use crate::parser;
use crate::report::{self, Finding};
use crate::signals::Family;
use std::path::{Path, PathBuf};

/// Outcome of one log file.
#[derive(Debug)]
pub struct ReportOutcome {
    pub source: PathBuf,
    pub result: AppResult<Vec<Finding>>,
}

/// Everything one folder scan produced.
#[derive(Debug)]
pub struct RunSummary {
    /// Path of the contact sheet, when at least one image converted.
    pub contact_sheet: Option<PathBuf>,
    pub reports: Vec<ReportOutcome>,
}

fn files_with_extension(folder: &Path, extension: &str) -> AppResult<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(folder)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Scan `folder`, write the documents next to the inputs and collect per-log
/// findings. Only an unreadable folder fails the whole run.
pub fn run_folder(folder: &Path, family: Family, settings: &Settings) -> AppResult<RunSummary> {
    let assets = AssetStore::discover(settings.assets_dir.as_deref().map(Path::new));

    let contact_sheet = match files_with_extension(folder, "bmp") {
        Ok(bmps) if !bmps.is_empty() => {
            let images: Vec<SheetImage> = bmps
                .iter()
                .map(|path| {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    SheetImage::new(name, path.clone())
                })
                .collect();
            let output = folder.join(&settings.images_file_name);
            match contact_sheet::export_images_pdf(&images, &output) {
                Ok(()) => Some(output),
                Err(err) => {
                    tracing::error!(%err, "contact sheet failed; continuing with the report");
                    None
                }
            }
        }
        Ok(_) => None,
        Err(err) => return Err(err),
    };

    let mut reports = Vec::new();
    for log_path in files_with_extension(folder, "txt")? {
        let output = folder.join(&settings.table_file_name);
        let result = parser::parse_log_file(&log_path, family)
            .and_then(|parsed| report::export_report(&parsed, &output, &assets));
        if let Err(err) = &result {
            tracing::error!(source = %log_path.display(), %err, "report failed");
        }
        reports.push(ReportOutcome {
            source: log_path,
            result,
        });
    }

    Ok(RunSummary {
        contact_sheet,
        reports,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "Date Time Setup IonE IonI ElE ElI Fil Ext Cond Drift Mag Focus X Y Ratio Work Max Aim Mode Spec";

    #[test]
    fn empty_folder_produces_an_empty_summary() {
        let dir = tempfile::tempdir().unwrap();
        let summary =
            run_folder(dir.path(), Family::Escalab, &Settings::default()).unwrap();
        assert!(summary.contact_sheet.is_none());
        assert!(summary.reports.is_empty());
    }

    #[test]
    fn broken_bitmap_does_not_block_the_report() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("map.bmp"), b"not a bitmap").unwrap();
        let log = format!(
            "{HEADER}\n[0] 01/31/2025 09:12:44 Med 500 1.2 120 0.4 2.1 35 61 14 0.1 71 1.5 -2.0 1.02 0.8 1.0 0.9 Depth OK\n"
        );
        std::fs::write(dir.path().join("BestModeData.txt"), log).unwrap();

        let summary =
            run_folder(dir.path(), Family::Escalab, &Settings::default()).unwrap();
        assert!(summary.contact_sheet.is_none());
        assert_eq!(summary.reports.len(), 1);
        assert!(summary.reports[0].result.is_ok());
        assert!(dir.path().join("BestModeData_V3.pdf").is_file());
    }
}
