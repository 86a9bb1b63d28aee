//! Report assembly: merge parsed records with validation results into the
//! tabular document model and drive document production.
//!
//! The row count and meaning of the report are fixed by the resolved
//! hardware configuration, not by how many lines happened to parse: rows run
//! densely from mode 0 to the configuration's maximum index, and an index
//! with no record renders as an all-blank row. Resolution and rule lookup
//! fail closed, so no partial document is ever written.

use crate::assets::AssetStore;
use crate::document::{self, Cell, Span, TableDoc, Watermark};
use crate::error::{AppResult, IonifyError};
use crate::measurement::{Measurement, Parameter};
use crate::parser::ParsedLog;
use crate::rules::{
    self, Range, RATIO_RANGE_ESCALAB, RATIO_RANGE_NEXSA, RATIO_RANGE_SPEC, SHIFT_RANGE,
};
use crate::signals::{self, Family, SystemType};
use crate::validation::{in_range, specification_passed, validate_row};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

const COLUMNS: usize = 20;
const HEADER_ROWS: usize = 2;
const FONT_SIZE: f64 = 9.0;
const WATERMARK_OPACITY: f64 = 0.15;

const HEADER_TITLES: [&str; COLUMNS] = [
    "Date and Time",
    "",
    "Ion Energy",
    "",
    "Electron Energy",
    "",
    "Fil",
    "Extractor",
    "Condenser",
    "Drift",
    "Magnet",
    "Focus",
    "X Shift",
    "Y Shift",
    "Ratio",
    "Sample Current",
    "",
    "",
    "Mode Type",
    "Passed Specification",
];

const HEADER_UNITS: [&str; COLUMNS] = [
    "", "", "(eV)", "(\u{b5}A)", "(eV)", "(mA)", "(eV)", "(eV)", "(eV)", "(eV)", "(A)", "(eV)",
    "", "", "", "(work)", "(max)", "(aim)", "", "",
];

/// Grouped header merges: three horizontal unit groups plus the single
/// columns that span both header rows.
fn header_spans() -> Vec<Span> {
    let mut spans = vec![
        Span { first_col: 2, first_row: 0, last_col: 3, last_row: 0 },
        Span { first_col: 4, first_row: 0, last_col: 5, last_row: 0 },
        Span { first_col: 15, first_row: 0, last_col: 17, last_row: 0 },
    ];
    for col in [0, 1, 12, 13, 14, 18, 19] {
        spans.push(Span {
            first_col: col,
            first_row: 0,
            last_col: col,
            last_row: 1,
        });
    }
    spans
}

/// One out-of-range or invalid-value detection.
#[derive(Clone, Debug, PartialEq)]
pub struct Finding {
    /// Raw mode index of the offending record, brackets included.
    pub index: String,
    pub parameter: Parameter,
    /// The violated band for table-driven findings; `None` for the fixed
    /// ratio/shift/specification checks.
    pub range: Option<Range>,
}

impl Finding {
    /// One user-facing summary line.
    pub fn summary_line(&self) -> String {
        format!("Mode {}: {} value", self.index, self.parameter)
    }
}

/// Assembled report, ready for document production or inspection.
#[derive(Clone, Debug)]
pub struct ReportModel {
    pub system_type: SystemType,
    pub max_index: u32,
    /// Two header rows followed by `max_index + 1` dense data rows.
    pub rows: Vec<Vec<String>>,
    /// `(row, column)` cells to render flagged; empty under extended access.
    pub flagged_cells: Vec<(usize, usize)>,
    pub findings: Vec<Finding>,
}

/// Build the report model from a parsed log.
///
/// Fails closed: an unresolvable configuration or a missing rule table
/// aborts before any row is produced.
pub fn assemble(parsed: &ParsedLog) -> AppResult<ReportModel> {
    let config = signals::resolve(&parsed.signals)?;
    let rules = rules::get_rules_for(config.system_type, "default")?;

    let mut by_index: BTreeMap<u32, &Measurement> = BTreeMap::new();
    for m in &parsed.system.results {
        let index = m.index_number().ok_or_else(|| {
            IonifyError::LogFormat(format!("unusable mode index '{}'", m.index))
        })?;
        by_index.insert(index, m);
    }

    let family_ratio_range = match parsed.signals.family {
        Family::Nexsa => RATIO_RANGE_NEXSA,
        Family::Escalab => RATIO_RANGE_ESCALAB,
    };

    let mut rows = vec![
        HEADER_TITLES.iter().map(|s| s.to_string()).collect(),
        HEADER_UNITS.iter().map(|s| s.to_string()).collect(),
    ];
    let mut flagged_cells = Vec::new();
    let mut findings = Vec::new();

    for index in 0..=config.max_index {
        let row_position = rows.len();
        let Some(m) = by_index.get(&index) else {
            rows.push(vec![String::new(); COLUMNS]);
            continue;
        };
        rows.push(data_row(m));

        let mut flag = |parameter: Parameter, range: Option<Range>| {
            findings.push(Finding {
                index: m.index.clone(),
                parameter,
                range,
            });
            if !parsed.extended_access {
                flagged_cells.push((row_position, parameter.column()));
            }
        };

        for (parameter, range) in validate_row(m, rules) {
            flag(parameter, Some(range));
        }

        // the spec ratio band takes precedence once a record passed
        // specification; otherwise the family band applies
        if m.specification == "OK" && !in_range(m.ratio, RATIO_RANGE_SPEC) {
            flag(Parameter::Ratio, None);
        } else if !in_range(m.ratio, family_ratio_range) {
            flag(Parameter::Ratio, None);
        }

        if !in_range(m.x_shift, SHIFT_RANGE) {
            flag(Parameter::XShift, None);
        }
        if !in_range(m.y_shift, SHIFT_RANGE) {
            flag(Parameter::YShift, None);
        }

        if !m.specification.is_empty() && !specification_passed(&m.specification) {
            flag(Parameter::Specification, None);
        }
    }

    Ok(ReportModel {
        system_type: config.system_type,
        max_index: config.max_index,
        rows,
        flagged_cells,
        findings,
    })
}

/// Assemble and write the report document, returning the findings.
///
/// The findings come back even when every cell rendered clean; a
/// [`IonifyError::DocumentWrite`] error is the one outcome that must never
/// be confused with "zero findings".
pub fn export_report(
    parsed: &ParsedLog,
    output: &Path,
    assets: &AssetStore,
) -> AppResult<Vec<Finding>> {
    let model = assemble(parsed)?;
    let watermark = load_watermark(assets, model.system_type);

    let flagged: HashSet<(usize, usize)> = model.flagged_cells.iter().copied().collect();
    let rows = model
        .rows
        .iter()
        .enumerate()
        .map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .map(|(col, text)| {
                    if row < HEADER_ROWS {
                        Cell::header(text.clone())
                    } else if flagged.contains(&(row, col)) {
                        Cell::flagged(text.clone())
                    } else {
                        Cell::body(text.clone())
                    }
                })
                .collect()
        })
        .collect();

    let table = TableDoc {
        page_size: document::A3_LANDSCAPE,
        font_size: FONT_SIZE,
        header_rows: HEADER_ROWS,
        rows,
        spans: header_spans(),
        watermark,
    };
    document::write_table_pdf(&table, output)?;

    tracing::info!(
        path = %output.display(),
        system = model.system_type.as_str(),
        findings = model.findings.len(),
        "report written"
    );
    Ok(model.findings)
}

fn load_watermark(assets: &AssetStore, system_type: SystemType) -> Option<Watermark> {
    let path = assets.watermark(system_type)?;
    match image::open(&path) {
        Ok(img) => Some(Watermark::from_image(&img.to_rgb8(), WATERMARK_OPACITY)),
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "watermark unreadable, report will be plain");
            None
        }
    }
}

fn data_row(m: &Measurement) -> Vec<String> {
    vec![
        format!("{} {}", m.index, m.date),
        m.setup.clone(),
        fmt_value(m.ion_energy_ev),
        fmt_value(m.ion_energy_ua),
        fmt_value(m.electron_energy_ev),
        fmt_value(m.electron_energy_ma),
        fmt_value(m.fil),
        fmt_value(m.extractor),
        fmt_value(m.condenser),
        fmt_value(m.drift),
        fmt_value(m.magnet),
        fmt_value(m.focus),
        fmt_value(m.x_shift),
        fmt_value(m.y_shift),
        fmt_value(m.ratio),
        fmt_value(m.sample_current_work),
        fmt_value(m.sample_current_max),
        fmt_value(m.sample_current_aim),
        m.mode.clone(),
        m.specification.clone(),
    ]
}

/// Render a measured value the way the legacy reports did: integral values
/// keep one decimal place, everything else prints its shortest form.
fn fmt_value(v: f64) -> String {
    if v.fract() == 0.0 && v.is_finite() {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}
