//! Log parsing: byte decoding, line scanning and signal inference.
//!
//! A calibration log is a whitespace-delimited text file of unknown
//! encoding. The first meaningful line starts with `Date` and names the
//! record columns; every following well-formed line is one measurement.
//! Lines that split into fewer than 21 fields are expected noise and are
//! dropped silently. A non-numeric token in a numeric position of a
//! well-formed line is a real format violation and fails the whole parse.

use crate::error::{AppResult, IonifyError};
use crate::measurement::{Measurement, System};
use crate::signals::{Family, SignalState};
use encoding_rs::{Encoding, UTF_16LE, UTF_8, WINDOWS_1252};
use std::path::Path;

/// Sentinel lines that unlock extended access. Highlighting is suppressed
/// downstream when any of them appears; findings are still collected.
const EXTENDED_ACCESS_TOKENS: [&str; 3] = [
    "isolemnlyswearthatiamuptonogood",
    "slavnostneprisahamzejsempripravenkekazdespatnosti",
    "slavnostneprisahamzenemamzalubomnicdobre",
];

/// Everything one log file parses into.
#[derive(Clone, Debug)]
pub struct ParsedLog {
    pub system: System,
    pub signals: SignalState,
    pub extended_access: bool,
}

/// Decode raw log bytes into text.
///
/// Priority: byte-order mark, then a UTF-16LE heuristic (instrument
/// software on Windows writes UTF-16 without a BOM often enough to matter),
/// then strict UTF-8, then WINDOWS-1252 as the lossy fallback.
pub fn decode_bytes(bytes: &[u8]) -> String {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        let (text, _) = encoding.decode_without_bom_handling(&bytes[bom_len..]);
        return text.into_owned();
    }

    if looks_like_utf16le(bytes) {
        let (text, _) = UTF_16LE.decode_without_bom_handling(bytes);
        return text.into_owned();
    }

    let (text, had_errors) = UTF_8.decode_without_bom_handling(bytes);
    if !had_errors {
        return text.into_owned();
    }

    let (text, _) = WINDOWS_1252.decode_without_bom_handling(bytes);
    text.into_owned()
}

/// BOM-less UTF-16LE shows up as a NUL in the high byte of nearly every
/// ASCII character.
fn looks_like_utf16le(bytes: &[u8]) -> bool {
    if bytes.len() < 4 || bytes.len() % 2 != 0 {
        return false;
    }
    let high_nuls = bytes.iter().skip(1).step_by(2).filter(|b| **b == 0).count();
    high_nuls * 10 >= bytes.len() * 4
}

/// Parse a log file from disk.
pub fn parse_log_file(path: &Path, family: Family) -> AppResult<ParsedLog> {
    let bytes = std::fs::read(path)?;
    let text = decode_bytes(&bytes);
    parse_log_text(&text, family)
}

/// Parse decoded log text.
///
/// Signals are reset here; nothing carries over from a previous parse. A
/// `Date` line starts a new [`System`] and discards any previous one. The
/// per-record signal inference runs before the numeric fields are parsed,
/// matching the order the scan has always used.
pub fn parse_log_text(text: &str, family: Family) -> AppResult<ParsedLog> {
    let mut signals = SignalState::new(family);
    let mut extended_access = false;
    let mut system: Option<System> = None;

    for (line_no, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        if EXTENDED_ACCESS_TOKENS.contains(&line) {
            extended_access = true;
            continue;
        }
        if line.starts_with("Date") {
            system = Some(System::new(line));
            continue;
        }

        let tokens: Vec<&str> = line.split_whitespace().collect();
        if tokens.len() < 21 {
            continue;
        }

        signals.observe_record(&tokens);

        let record = build_record(&tokens, line_no + 1)?;
        system
            .as_mut()
            .ok_or_else(|| {
                IonifyError::LogFormat(format!(
                    "line {}: record before any 'Date' header",
                    line_no + 1
                ))
            })?
            .results
            .push(record);
    }

    let system = system
        .ok_or_else(|| IonifyError::LogFormat("no 'Date' header line found".to_string()))?;

    tracing::debug!(
        records = system.results.len(),
        ion_gun = signals.ion_gun,
        iss_modes = signals.iss_modes,
        extended_access,
        "log parsed"
    );

    Ok(ParsedLog {
        system,
        signals,
        extended_access,
    })
}

fn build_record(tokens: &[&str], line_no: usize) -> AppResult<Measurement> {
    let number = |position: usize| -> AppResult<f64> {
        tokens[position].parse().map_err(|_| {
            IonifyError::LogFormat(format!(
                "line {line_no}: field {} is not numeric: '{}'",
                position + 1,
                tokens[position]
            ))
        })
    };

    Ok(Measurement {
        index: tokens[0].to_string(),
        date: format!("{} {}", tokens[1], tokens[2]),
        setup: tokens[3].to_string(),
        ion_energy_ev: number(4)?,
        ion_energy_ua: number(5)?,
        electron_energy_ev: number(6)?,
        electron_energy_ma: number(7)?,
        fil: number(8)?,
        extractor: number(9)?,
        condenser: number(10)?,
        drift: number(11)?,
        magnet: number(12)?,
        focus: number(13)?,
        x_shift: number(14)?,
        y_shift: number(15)?,
        ratio: number(16)?,
        sample_current_work: number(17)?,
        sample_current_max: number(18)?,
        sample_current_aim: number(19)?,
        mode: tokens[20].to_string(),
        specification: tokens.get(21).unwrap_or(&"").to_string(),
    })
}
