//! Minimal paginated PDF output.
//!
//! This is presentation plumbing: it lays a styled grid table or an image
//! gallery onto fixed-size pages and writes the file. Validation results
//! only reach it as per-cell styles; nothing here inspects measurements.
//!
//! Pages carry Helvetica as a base-14 font (WinAnsi encoded, no embedding),
//! images are DeviceRGB XObjects with Flate-compressed raw pixels, and the
//! watermark is painted first under a low-alpha graphics state so the table
//! stays legible on top of it.

use crate::error::{AppResult, IonifyError};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use std::io::Write;
use std::path::Path;

/// A3 landscape page, in points.
pub const A3_LANDSCAPE: (f64, f64) = (1190.55, 841.89);
/// A4 portrait page, in points.
pub const A4_PORTRAIT: (f64, f64) = (595.28, 841.89);

const PAGE_MARGIN: f64 = 36.0;
const GRID_LINE_WIDTH: f64 = 0.25;
/// reportlab's `lightgrey`, kept for continuity with the legacy reports.
const HEADER_GREY: f64 = 0.827;

/// How one table cell is rendered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CellStyle {
    /// Grey background, bold text.
    Header,
    /// Plain black text.
    Body,
    /// Bold red text, the out-of-range marker.
    Flagged,
}

#[derive(Clone, Debug)]
pub struct Cell {
    pub text: String,
    pub style: CellStyle,
}

impl Cell {
    pub fn header(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: CellStyle::Header,
        }
    }

    pub fn body(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: CellStyle::Body,
        }
    }

    pub fn flagged(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: CellStyle::Flagged,
        }
    }
}

/// Inclusive rectangular merge of header cells.
#[derive(Clone, Copy, Debug)]
pub struct Span {
    pub first_col: usize,
    pub first_row: usize,
    pub last_col: usize,
    pub last_row: usize,
}

/// Full-page background image with its opacity.
#[derive(Clone)]
pub struct Watermark {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
    pub opacity: f64,
}

impl Watermark {
    pub fn from_image(img: &image::RgbImage, opacity: f64) -> Self {
        Self {
            width: img.width(),
            height: img.height(),
            rgb: img.as_raw().clone(),
            opacity,
        }
    }
}

/// One grid table laid onto pages of a fixed size.
pub struct TableDoc {
    pub page_size: (f64, f64),
    pub font_size: f64,
    /// Leading rows styled as the (possibly merged) header block.
    pub header_rows: usize,
    pub rows: Vec<Vec<Cell>>,
    pub spans: Vec<Span>,
    pub watermark: Option<Watermark>,
}

/// One thumbnail plus caption for the image grid document.
pub struct ImageCell {
    pub caption: String,
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

/// Write a table document to `path`.
pub fn write_table_pdf(table: &TableDoc, path: &Path) -> AppResult<()> {
    let mut builder = PdfBuilder::new();
    let (page_w, page_h) = table.page_size;

    let watermark_ops = table
        .watermark
        .as_ref()
        .map(|wm| builder.watermark_ops(wm, page_w, page_h));

    let col_widths = column_widths(table, page_w);
    let row_height = table.font_size + 7.0;
    let table_width: f64 = col_widths.iter().sum();
    let x0 = PAGE_MARGIN + ((page_w - 2.0 * PAGE_MARGIN) - table_width).max(0.0) / 2.0;

    let mut row_cursor = 0;
    while row_cursor < table.rows.len() {
        let mut ops = watermark_ops.clone().unwrap_or_default();
        let mut y = page_h - PAGE_MARGIN;
        let page_start = row_cursor;

        while row_cursor < table.rows.len() {
            let block_rows = row_block_rows(table, row_cursor);
            let block_h = block_rows as f64 * row_height;
            // an oversized block on a fresh page is drawn anyway so the
            // loop always makes progress
            if y - block_h < PAGE_MARGIN && row_cursor != page_start {
                break;
            }
            for row in row_cursor..row_cursor + block_rows {
                draw_row(&mut ops, table, &col_widths, row, x0, y, row_height);
                y -= row_height;
            }
            row_cursor += block_rows;
        }

        builder.push_page(page_w, page_h, ops);
    }

    if table.rows.is_empty() {
        builder.push_page(page_w, page_h, watermark_ops.unwrap_or_default());
    }

    builder.save(path)
}

/// Number of consecutive rows that must stay on one page starting at `row`
/// (the merged header block moves as a unit).
fn row_block_rows(table: &TableDoc, row: usize) -> usize {
    if row == 0 && table.header_rows > 1 {
        table.header_rows.min(table.rows.len())
    } else {
        1
    }
}

/// Write the thumbnail gallery, two cells per row, to `path`.
pub fn write_image_grid_pdf(cells: &[ImageCell], path: &Path) -> AppResult<()> {
    let mut builder = PdfBuilder::new();
    let (page_w, page_h) = A4_PORTRAIT;

    let col_width = 255.1; // 90 mm, two columns centred on the page
    let caption_size = 10.0;
    let x0 = (page_w - 2.0 * col_width) / 2.0;

    let mut ops: Vec<Operation> = Vec::new();
    let mut y = page_h - PAGE_MARGIN;

    for pair in cells.chunks(2) {
        let image_h = pair.iter().map(|c| c.height as f64).fold(0.0, f64::max);
        let block_h = image_h + 6.0 + caption_size + 10.0;
        if y - block_h < PAGE_MARGIN {
            builder.push_page(page_w, page_h, std::mem::take(&mut ops));
            y = page_h - PAGE_MARGIN;
        }

        for (slot, cell) in pair.iter().enumerate() {
            let name = builder.add_image(cell.width, cell.height, &cell.rgb);
            let x = x0 + slot as f64 * col_width + 5.0;
            let img_y = y - cell.height as f64;
            ops.push(Operation::new("q", vec![]));
            ops.push(Operation::new(
                "cm",
                vec![
                    (cell.width as f64).into(),
                    0.into(),
                    0.into(),
                    (cell.height as f64).into(),
                    x.into(),
                    img_y.into(),
                ],
            ));
            ops.push(Operation::new("Do", vec![Object::Name(name.into_bytes())]));
            ops.push(Operation::new("Q", vec![]));
            text_ops(
                &mut ops,
                &cell.caption,
                x,
                img_y - 6.0 - caption_size,
                "F1",
                caption_size,
                (0.0, 0.0, 0.0),
            );
        }
        y -= block_h;
    }

    builder.push_page(page_w, page_h, ops);
    builder.save(path)
}

// ---------------------------------------------------------------------------
// layout helpers

/// Rough Helvetica advance; good enough to size columns without embedding
/// a width table.
fn text_width(text: &str, font_size: f64) -> f64 {
    text.chars().count() as f64 * font_size * 0.5
}

fn column_widths(table: &TableDoc, page_w: f64) -> Vec<f64> {
    let columns = table.rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![28.0f64; columns];
    for row in &table.rows {
        for (col, cell) in row.iter().enumerate() {
            widths[col] = widths[col].max(text_width(&cell.text, table.font_size) + 6.0);
        }
    }
    let available = page_w - 2.0 * PAGE_MARGIN;
    let total: f64 = widths.iter().sum();
    if total > available && total > 0.0 {
        let scale = available / total;
        for w in &mut widths {
            *w *= scale;
        }
    }
    widths
}

/// Merged-region lookup: the span anchored at a cell, or whether the cell is
/// shadowed by some other anchor.
fn span_at(table: &TableDoc, row: usize, col: usize) -> Option<Span> {
    table
        .spans
        .iter()
        .copied()
        .find(|s| s.first_row == row && s.first_col == col)
}

fn covered_by_span(table: &TableDoc, row: usize, col: usize) -> bool {
    table.spans.iter().any(|s| {
        row >= s.first_row
            && row <= s.last_row
            && col >= s.first_col
            && col <= s.last_col
            && !(s.first_row == row && s.first_col == col)
    })
}

fn draw_row(
    ops: &mut Vec<Operation>,
    table: &TableDoc,
    col_widths: &[f64],
    row: usize,
    x0: f64,
    y_top: f64,
    row_height: f64,
) {
    let cells = &table.rows[row];
    let mut x = x0;
    for (col, cell) in cells.iter().enumerate() {
        let width = col_widths[col];
        if covered_by_span(table, row, col) {
            x += width;
            continue;
        }

        let (cell_w, cell_h) = match span_at(table, row, col) {
            Some(span) => (
                col_widths[span.first_col..=span.last_col].iter().sum(),
                (span.last_row - span.first_row + 1) as f64 * row_height,
            ),
            None => (width, row_height),
        };
        let y_bottom = y_top - cell_h;

        if cell.style == CellStyle::Header {
            ops.push(Operation::new(
                "rg",
                vec![HEADER_GREY.into(), HEADER_GREY.into(), HEADER_GREY.into()],
            ));
            ops.push(Operation::new(
                "re",
                vec![x.into(), y_bottom.into(), cell_w.into(), cell_h.into()],
            ));
            ops.push(Operation::new("f", vec![]));
        }

        ops.push(Operation::new("w", vec![GRID_LINE_WIDTH.into()]));
        ops.push(Operation::new("RG", vec![0.into(), 0.into(), 0.into()]));
        ops.push(Operation::new(
            "re",
            vec![x.into(), y_bottom.into(), cell_w.into(), cell_h.into()],
        ));
        ops.push(Operation::new("S", vec![]));

        if !cell.text.is_empty() {
            let font = match cell.style {
                CellStyle::Body => "F1",
                CellStyle::Header | CellStyle::Flagged => "F2",
            };
            let color = if cell.style == CellStyle::Flagged {
                (1.0, 0.0, 0.0)
            } else {
                (0.0, 0.0, 0.0)
            };
            let tw = text_width(&cell.text, table.font_size).min(cell_w);
            let tx = x + (cell_w - tw) / 2.0;
            let ty = y_bottom + (cell_h - table.font_size * 0.72) / 2.0;
            text_ops(ops, &cell.text, tx, ty, font, table.font_size, color);
        }

        x += width;
    }
}

fn text_ops(
    ops: &mut Vec<Operation>,
    text: &str,
    x: f64,
    y: f64,
    font: &str,
    size: f64,
    color: (f64, f64, f64),
) {
    ops.push(Operation::new(
        "rg",
        vec![color.0.into(), color.1.into(), color.2.into()],
    ));
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![Object::Name(font.as_bytes().to_vec()), size.into()],
    ));
    ops.push(Operation::new("Td", vec![x.into(), y.into()]));
    ops.push(Operation::new(
        "Tj",
        vec![Object::String(
            encode_win_ansi(text),
            StringFormat::Literal,
        )],
    ));
    ops.push(Operation::new("ET", vec![]));
}

/// Base-14 Helvetica is WinAnsi encoded; anything outside Latin-1 renders
/// as a question mark rather than corrupting the stream.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| if (c as u32) < 0x100 { c as u8 } else { b'?' })
        .collect()
}

// ---------------------------------------------------------------------------
// PDF assembly

struct PdfBuilder {
    doc: Document,
    pages: Vec<(f64, f64, Vec<Operation>)>,
    images: Vec<(String, ObjectId)>,
    graphics_states: Vec<(String, ObjectId)>,
}

impl PdfBuilder {
    fn new() -> Self {
        Self {
            doc: Document::with_version("1.5"),
            pages: Vec::new(),
            images: Vec::new(),
            graphics_states: Vec::new(),
        }
    }

    /// Register an RGB image XObject; returns its resource name.
    fn add_image(&mut self, width: u32, height: u32, rgb: &[u8]) -> String {
        let name = format!("Im{}", self.images.len());
        let compressed = zlib_compress(rgb);
        let stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            compressed,
        );
        let id = self.doc.add_object(stream);
        self.images.push((name.clone(), id));
        name
    }

    fn add_alpha_state(&mut self, opacity: f64) -> String {
        let name = format!("GS{}", self.graphics_states.len());
        let id = self.doc.add_object(dictionary! {
            "Type" => "ExtGState",
            "ca" => opacity,
            "CA" => opacity,
        });
        self.graphics_states.push((name.clone(), id));
        name
    }

    /// Operations painting a centred watermark scaled to 70% of the page
    /// width under a low-alpha graphics state.
    fn watermark_ops(&mut self, wm: &Watermark, page_w: f64, page_h: f64) -> Vec<Operation> {
        let image_name = self.add_image(wm.width, wm.height, &wm.rgb);
        let state_name = self.add_alpha_state(wm.opacity);

        let scale = (page_w * 0.7) / wm.width as f64;
        let w = wm.width as f64 * scale;
        let h = wm.height as f64 * scale;
        let x = (page_w - w) / 2.0;
        let y = (page_h - h) / 2.0;

        vec![
            Operation::new("q", vec![]),
            Operation::new("gs", vec![Object::Name(state_name.into_bytes())]),
            Operation::new(
                "cm",
                vec![
                    w.into(),
                    0.into(),
                    0.into(),
                    h.into(),
                    x.into(),
                    y.into(),
                ],
            ),
            Operation::new("Do", vec![Object::Name(image_name.into_bytes())]),
            Operation::new("Q", vec![]),
        ]
    }

    fn push_page(&mut self, width: f64, height: f64, ops: Vec<Operation>) {
        self.pages.push((width, height, ops));
    }

    fn save(mut self, path: &Path) -> AppResult<()> {
        let pages_id = self.doc.new_object_id();

        let font_regular = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let font_bold = self.doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });

        let mut xobjects = Dictionary::new();
        for (name, id) in &self.images {
            xobjects.set(name.as_bytes(), *id);
        }
        let mut gstates = Dictionary::new();
        for (name, id) in &self.graphics_states {
            gstates.set(name.as_bytes(), *id);
        }
        let resources_id = self.doc.add_object(dictionary! {
            "Font" => dictionary! {
                "F1" => font_regular,
                "F2" => font_bold,
            },
            "XObject" => xobjects,
            "ExtGState" => gstates,
        });

        let mut kids: Vec<Object> = Vec::new();
        let mut count = 0i64;
        for (width, height, ops) in std::mem::take(&mut self.pages) {
            let content = Content { operations: ops };
            let content_id = self
                .doc
                .add_object(Stream::new(dictionary! {}, content.encode()?));
            let page_id = self.doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
                "Contents" => content_id,
                "Resources" => resources_id,
            });
            kids.push(page_id.into());
            count += 1;
        }

        self.doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let file = std::fs::File::create(path).map_err(|_| IonifyError::DocumentWrite {
            path: path.to_path_buf(),
        })?;
        let mut writer = std::io::BufWriter::new(file);
        self.doc.save_to(&mut writer)?;
        writer.flush().map_err(|_| IonifyError::DocumentWrite {
            path: path.to_path_buf(),
        })?;
        Ok(())
    }
}

fn zlib_compress(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    // writing into a Vec cannot fail
    let _ = encoder.write_all(data);
    encoder.finish().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn win_ansi_keeps_latin1_and_replaces_the_rest() {
        assert_eq!(encode_win_ansi("OK"), b"OK".to_vec());
        assert_eq!(encode_win_ansi("(\u{b5}A)"), vec![b'(', 0xB5, b'A', b')']);
        assert_eq!(encode_win_ansi("\u{2713}"), vec![b'?']);
    }

    #[test]
    fn column_widths_fit_the_page() {
        let table = TableDoc {
            page_size: A3_LANDSCAPE,
            font_size: 9.0,
            header_rows: 0,
            rows: vec![vec![Cell::body("x".repeat(400)), Cell::body("y")]],
            spans: vec![],
            watermark: None,
        };
        let widths = column_widths(&table, A3_LANDSCAPE.0);
        let total: f64 = widths.iter().sum();
        assert!(total <= A3_LANDSCAPE.0 - 2.0 * PAGE_MARGIN + 0.01);
    }

    #[test]
    fn spans_shadow_covered_cells_only() {
        let table = TableDoc {
            page_size: A3_LANDSCAPE,
            font_size: 9.0,
            header_rows: 2,
            rows: vec![
                vec![Cell::header("a"), Cell::header(""), Cell::header("b")],
                vec![Cell::header(""), Cell::header(""), Cell::header("")],
            ],
            spans: vec![Span {
                first_col: 0,
                first_row: 0,
                last_col: 1,
                last_row: 0,
            }],
            watermark: None,
        };
        assert!(!covered_by_span(&table, 0, 0));
        assert!(covered_by_span(&table, 0, 1));
        assert!(!covered_by_span(&table, 1, 1));
        assert!(span_at(&table, 0, 0).is_some());
        assert!(span_at(&table, 0, 1).is_none());
    }

    #[test]
    fn table_writes_a_parsable_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.pdf");
        let table = TableDoc {
            page_size: A3_LANDSCAPE,
            font_size: 9.0,
            header_rows: 1,
            rows: vec![
                vec![Cell::header("H1"), Cell::header("H2")],
                vec![Cell::body("1.0"), Cell::flagged("2.0")],
            ],
            spans: vec![],
            watermark: None,
        };
        write_table_pdf(&table, &path).unwrap();
        let reloaded = Document::load(&path).unwrap();
        assert_eq!(reloaded.get_pages().len(), 1);
    }

    #[test]
    fn unwritable_destination_is_a_document_write_error() {
        let dir = tempfile::tempdir().unwrap();
        // a directory cannot be opened for writing as a file
        let err = write_table_pdf(
            &TableDoc {
                page_size: A4_PORTRAIT,
                font_size: 9.0,
                header_rows: 0,
                rows: vec![],
                spans: vec![],
                watermark: None,
            },
            dir.path(),
        )
        .unwrap_err();
        assert!(matches!(err, IonifyError::DocumentWrite { .. }));
    }
}
