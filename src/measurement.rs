//! Measurement data types shared between the parser, validator and report.
//!
//! One `Measurement` is a single calibration data point produced by the ion
//! gun routine: one mode index, the date/time it ran, the power setup label
//! and the measured electrical values. A `System` is the container one log
//! file populates: the raw header line plus every record in parse order.

use serde::{Deserialize, Serialize};

/// One parsed calibration data point.
///
/// Field order follows the positional layout of a log record line. `index`
/// keeps the raw bracketed form (e.g. `[14]`); use [`Measurement::index_number`]
/// for sorting and rule lookups.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Bracketed mode identifier, e.g. `[14]`.
    pub index: String,
    /// Date and time, the two source tokens joined by one space.
    pub date: String,
    /// Power setup label: a numeric token or the literal `Med`.
    pub setup: String,
    pub ion_energy_ev: f64,
    pub ion_energy_ua: f64,
    pub electron_energy_ev: f64,
    pub electron_energy_ma: f64,
    pub fil: f64,
    pub extractor: f64,
    pub condenser: f64,
    pub drift: f64,
    pub magnet: f64,
    pub focus: f64,
    pub x_shift: f64,
    pub y_shift: f64,
    pub ratio: f64,
    pub sample_current_work: f64,
    pub sample_current_max: f64,
    pub sample_current_aim: f64,
    /// Mode tag, e.g. `ISS` or `Cluster`.
    pub mode: String,
    /// `OK` or a failure descriptor; empty when the line had only 21 fields.
    pub specification: String,
}

impl Measurement {
    /// Numeric mode index with the brackets stripped, or `None` when the
    /// index token is not of the `[N]` form.
    pub fn index_number(&self) -> Option<u32> {
        self.index
            .trim()
            .strip_prefix('[')?
            .strip_suffix(']')?
            .parse()
            .ok()
    }

    /// Typed accessor for the numeric validated parameters.
    ///
    /// Returns `None` for [`Parameter::Specification`], which is textual.
    pub fn value_of(&self, parameter: Parameter) -> Option<f64> {
        match parameter {
            Parameter::Extractor => Some(self.extractor),
            Parameter::Condenser => Some(self.condenser),
            Parameter::Drift => Some(self.drift),
            Parameter::Magnet => Some(self.magnet),
            Parameter::XShift => Some(self.x_shift),
            Parameter::YShift => Some(self.y_shift),
            Parameter::Ratio => Some(self.ratio),
            Parameter::Specification => None,
        }
    }
}

/// The closed set of parameters that validation can flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Parameter {
    Extractor,
    Condenser,
    Drift,
    Magnet,
    XShift,
    YShift,
    Ratio,
    Specification,
}

impl Parameter {
    /// Stable lowercase key, used by rule presets and user-facing summaries.
    pub fn key(self) -> &'static str {
        match self {
            Parameter::Extractor => "extractor",
            Parameter::Condenser => "condenser",
            Parameter::Drift => "drift",
            Parameter::Magnet => "magnet",
            Parameter::XShift => "Xshift",
            Parameter::YShift => "Yshift",
            Parameter::Ratio => "ratio",
            Parameter::Specification => "specification",
        }
    }

    /// Parse a rule-preset key back into a parameter.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "extractor" => Some(Parameter::Extractor),
            "condenser" => Some(Parameter::Condenser),
            "drift" => Some(Parameter::Drift),
            "magnet" => Some(Parameter::Magnet),
            "Xshift" => Some(Parameter::XShift),
            "Yshift" => Some(Parameter::YShift),
            "ratio" => Some(Parameter::Ratio),
            "specification" => Some(Parameter::Specification),
            _ => None,
        }
    }

    /// Report column carrying this parameter.
    pub fn column(self) -> usize {
        match self {
            Parameter::Extractor => 7,
            Parameter::Condenser => 8,
            Parameter::Drift => 9,
            Parameter::Magnet => 10,
            Parameter::XShift => 12,
            Parameter::YShift => 13,
            Parameter::Ratio => 14,
            Parameter::Specification => 19,
        }
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Records parsed from one log, in file order.
///
/// `name` is the raw header line (the line starting with `Date`). The parser
/// appends to `results` while scanning; nothing mutates a `System` afterwards.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct System {
    pub name: String,
    pub results: Vec<Measurement>,
}

impl System {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            results: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Measurement {
        Measurement {
            index: "[14]".to_string(),
            date: "01/31/2025 09:12:44".to_string(),
            setup: "75".to_string(),
            ion_energy_ev: 500.0,
            ion_energy_ua: 1.2,
            electron_energy_ev: 120.0,
            electron_energy_ma: 0.4,
            fil: 2.1,
            extractor: 36.0,
            condenser: 61.5,
            drift: 14.0,
            magnet: -0.2,
            focus: 71.0,
            x_shift: 1.5,
            y_shift: -2.0,
            ratio: 1.02,
            sample_current_work: 0.8,
            sample_current_max: 1.0,
            sample_current_aim: 0.9,
            mode: "ISS".to_string(),
            specification: "OK".to_string(),
        }
    }

    #[test]
    fn index_number_strips_brackets() {
        assert_eq!(sample().index_number(), Some(14));
    }

    #[test]
    fn index_number_rejects_unbracketed_tokens() {
        let mut m = sample();
        m.index = "14".to_string();
        assert_eq!(m.index_number(), None);
        m.index = "[x]".to_string();
        assert_eq!(m.index_number(), None);
    }

    #[test]
    fn value_of_maps_every_numeric_parameter() {
        let m = sample();
        assert_eq!(m.value_of(Parameter::Extractor), Some(36.0));
        assert_eq!(m.value_of(Parameter::Condenser), Some(61.5));
        assert_eq!(m.value_of(Parameter::Drift), Some(14.0));
        assert_eq!(m.value_of(Parameter::Magnet), Some(-0.2));
        assert_eq!(m.value_of(Parameter::XShift), Some(1.5));
        assert_eq!(m.value_of(Parameter::YShift), Some(-2.0));
        assert_eq!(m.value_of(Parameter::Ratio), Some(1.02));
        assert_eq!(m.value_of(Parameter::Specification), None);
    }

    #[test]
    fn parameter_keys_round_trip() {
        for p in [
            Parameter::Extractor,
            Parameter::Condenser,
            Parameter::Drift,
            Parameter::Magnet,
            Parameter::XShift,
            Parameter::YShift,
            Parameter::Ratio,
            Parameter::Specification,
        ] {
            assert_eq!(Parameter::from_key(p.key()), Some(p));
        }
        assert_eq!(Parameter::from_key("focus"), None);
    }
}
