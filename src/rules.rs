//! Tolerance rule tables and fixed validation ranges.
//!
//! Tables are versioned TOML presets embedded in the binary. A preset maps
//! each system type to per-parameter tables keyed by mode index; an index
//! absent from a parameter's table carries no constraint for that parameter
//! (it does not make the index invalid). Only the `default` preset ships
//! today, but lookups accept arbitrary preset names so revised tables can be
//! added without touching the callers.

use crate::error::{AppResult, IonifyError};
use crate::measurement::Parameter;
use crate::signals::SystemType;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// Inclusive numeric tolerance band.
pub type Range = (f64, f64);

/// Ratio acceptance band for Nexsa-family systems.
pub const RATIO_RANGE_NEXSA: Range = (0.75, 1.45);
/// Ratio acceptance band for Escalab-family systems.
pub const RATIO_RANGE_ESCALAB: Range = (0.6, 1.6);
/// Stricter ratio band applied whenever a record passed specification.
pub const RATIO_RANGE_SPEC: Range = (0.9, 1.2);
/// Beam shift band, shared by the X and Y shift columns on every system.
pub const SHIFT_RANGE: Range = (-9.0, 9.0);

/// Iteration order for table-driven validation, so findings come out in a
/// stable sequence regardless of preset file layout.
const TABLE_PARAMETER_ORDER: [Parameter; 8] = [
    Parameter::Extractor,
    Parameter::Condenser,
    Parameter::Drift,
    Parameter::Magnet,
    Parameter::XShift,
    Parameter::YShift,
    Parameter::Ratio,
    Parameter::Specification,
];

/// Per-system tolerance table: parameter -> mode index -> inclusive range.
#[derive(Clone, Debug, Default)]
pub struct RuleTable {
    entries: HashMap<Parameter, BTreeMap<u32, Range>>,
}

impl RuleTable {
    /// Parameters constrained by this table, in canonical order.
    pub fn parameters(&self) -> impl Iterator<Item = Parameter> + '_ {
        TABLE_PARAMETER_ORDER
            .into_iter()
            .filter(|p| self.entries.contains_key(p))
    }

    /// Range for one parameter at one mode index, if constrained.
    pub fn range_for(&self, parameter: Parameter, index: u32) -> Option<Range> {
        self.entries.get(&parameter)?.get(&index).copied()
    }
}

#[derive(Debug, Deserialize)]
struct PresetDoc {
    version: u32,
    #[serde(flatten)]
    systems: BTreeMap<String, BTreeMap<String, BTreeMap<String, [f64; 2]>>>,
}

struct Preset {
    version: u32,
    tables: HashMap<String, RuleTable>,
}

const DEFAULT_PRESET_TOML: &str = include_str!("rules/default.toml");

static PRESETS: Lazy<Result<HashMap<&'static str, Preset>, String>> = Lazy::new(|| {
    let mut presets = HashMap::new();
    presets.insert("default", parse_preset(DEFAULT_PRESET_TOML)?);
    Ok(presets)
});

fn parse_preset(raw: &str) -> Result<Preset, String> {
    let doc: PresetDoc = toml::from_str(raw).map_err(|e| e.to_string())?;

    let mut tables = HashMap::new();
    for (system, params) in doc.systems {
        let mut entries: HashMap<Parameter, BTreeMap<u32, Range>> = HashMap::new();
        for (param_key, by_index) in params {
            let parameter = Parameter::from_key(&param_key)
                .ok_or_else(|| format!("unknown parameter '{param_key}' under '{system}'"))?;
            let mut ranges = BTreeMap::new();
            for (index_key, [min, max]) in by_index {
                let index: u32 = index_key.parse().map_err(|_| {
                    format!("bad mode index '{index_key}' under '{system}.{param_key}'")
                })?;
                if min > max {
                    return Err(format!(
                        "inverted range at '{system}.{param_key}.{index_key}'"
                    ));
                }
                ranges.insert(index, (min, max));
            }
            entries.insert(parameter, ranges);
        }
        tables.insert(system, RuleTable { entries });
    }
    Ok(Preset {
        version: doc.version,
        tables,
    })
}

/// Look up the tolerance table for one system type and preset.
///
/// Fails with [`IonifyError::RulesUnavailable`] when the preset is unknown,
/// fails to parse, or has no table for the system type; callers must abort
/// report generation on that rather than emit a partially validated report.
pub fn get_rules_for(system_type: SystemType, preset: &str) -> AppResult<&'static RuleTable> {
    let unavailable = |reason: String| IonifyError::RulesUnavailable {
        system_type: system_type.as_str().to_string(),
        preset: preset.to_string(),
        reason,
    };

    let presets = PRESETS
        .as_ref()
        .map_err(|e| unavailable(format!("preset data invalid: {e}")))?;
    let found = presets
        .get(preset)
        .ok_or_else(|| unavailable("unknown preset".to_string()))?;

    tracing::debug!(
        preset,
        version = found.version,
        system = system_type.as_str(),
        "rule table lookup"
    );

    found
        .tables
        .get(system_type.as_str())
        .ok_or_else(|| unavailable("no table for this system type".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_preset_has_a_table_for_every_system_type() {
        for system_type in [
            SystemType::NexsaMagcisIss,
            SystemType::NexsaMagcis,
            SystemType::NexsaEx06Iss,
            SystemType::NexsaEx06,
            SystemType::EsqMagcis,
            SystemType::EsqEx06,
        ] {
            let table = get_rules_for(system_type, "default").unwrap();
            assert!(table.parameters().count() >= 4, "{system_type} table empty");
        }
    }

    #[test]
    fn tables_cover_the_full_index_span_for_the_extractor() {
        let table = get_rules_for(SystemType::EsqMagcis, "default").unwrap();
        for index in 0..=SystemType::EsqMagcis.max_index() {
            assert!(
                table.range_for(Parameter::Extractor, index).is_some(),
                "extractor unconstrained at index {index}"
            );
        }
    }

    #[test]
    fn absent_indices_mean_no_constraint() {
        let table = get_rules_for(SystemType::EsqEx06, "default").unwrap();
        assert!(table.range_for(Parameter::Drift, 0).is_none());
        assert!(table.range_for(Parameter::Drift, 5).is_some());
        assert!(table.range_for(Parameter::Extractor, 99).is_none());
    }

    #[test]
    fn unknown_preset_is_rules_unavailable() {
        let err = get_rules_for(SystemType::NexsaEx06, "experimental").unwrap_err();
        match err {
            IonifyError::RulesUnavailable {
                system_type,
                preset,
                ..
            } => {
                assert_eq!(system_type, "NEXSA_EX06");
                assert_eq!(preset, "experimental");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn parse_rejects_inverted_ranges_and_unknown_parameters() {
        let inverted = "version = 1\n[ESQ_EX06.extractor]\n\"0\" = [5.0, 1.0]\n";
        assert!(parse_preset(inverted).is_err());
        let unknown = "version = 1\n[ESQ_EX06.voltage]\n\"0\" = [1.0, 5.0]\n";
        assert!(parse_preset(unknown).is_err());
    }
}
