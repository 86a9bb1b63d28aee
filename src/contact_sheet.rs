//! Image contact-sheet builder.
//!
//! Turns the beam-map bitmaps captured alongside a calibration run into a
//! thumbnail gallery: every image is downscaled to a fixed square, laid out
//! two per row with its display name (extension stripped) beneath it, and
//! written as its own document. No validation happens here, and a failure in
//! this pipeline must never block the tabular report.

use crate::document::{self, ImageCell};
use crate::error::AppResult;
use image::imageops::FilterType;
use std::path::{Path, PathBuf};

/// Fixed square thumbnail edge, in pixels and points.
const THUMBNAIL_EDGE: u32 = 250;

/// One gallery entry: display name plus the image file it came from.
#[derive(Clone, Debug)]
pub struct SheetImage {
    pub name: String,
    pub path: PathBuf,
}

impl SheetImage {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Caption shown under the thumbnail.
    fn caption(&self) -> String {
        Path::new(&self.name)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.name.clone())
    }
}

/// Downscale every image and write the gallery document to `output`.
pub fn export_images_pdf(images: &[SheetImage], output: &Path) -> AppResult<()> {
    let mut cells = Vec::with_capacity(images.len());
    for entry in images {
        let img = image::open(&entry.path)?.to_rgb8();
        let thumb = image::imageops::resize(&img, THUMBNAIL_EDGE, THUMBNAIL_EDGE, FilterType::Lanczos3);
        cells.push(ImageCell {
            caption: entry.caption(),
            width: THUMBNAIL_EDGE,
            height: THUMBNAIL_EDGE,
            rgb: thumb.into_raw(),
        });
    }

    document::write_image_grid_pdf(&cells, output)?;
    tracing::info!(path = %output.display(), images = images.len(), "contact sheet written");
    Ok(())
}
