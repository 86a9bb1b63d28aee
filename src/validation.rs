//! Pure validation helpers for measurement records.
//!
//! `validate_row` covers the table-driven checks: every parameter the rule
//! table constrains is compared against the band registered for the record's
//! mode index. The three fixed checks (ratio, beam shifts, specification
//! text) are not table-driven and are applied by the report assembler.

use crate::measurement::{Measurement, Parameter};
use crate::rules::{Range, RuleTable};

/// Inclusive range check.
pub fn in_range(value: f64, range: Range) -> bool {
    let (min, max) = range;
    min <= value && value <= max
}

/// Whether a specification field counts as passed.
///
/// Comparison is trimmed and case-insensitive; an empty field is not a
/// failure (the log simply carried no verdict).
pub fn specification_passed(specification: &str) -> bool {
    specification.trim().eq_ignore_ascii_case("OK")
}

/// Table-driven validation of one record.
///
/// Returns the out-of-range parameters together with the violated band, in
/// the table's canonical parameter order. A record whose index is absent
/// from a parameter's table produces no finding for that parameter, and a
/// record with a malformed index token produces no table findings at all
/// (the assembler rejects such records before rendering).
pub fn validate_row(m: &Measurement, rules: &RuleTable) -> Vec<(Parameter, Range)> {
    let mut issues = Vec::new();
    let Some(index) = m.index_number() else {
        return issues;
    };

    for parameter in rules.parameters() {
        let Some(range) = rules.range_for(parameter, index) else {
            continue;
        };
        match m.value_of(parameter) {
            Some(value) if in_range(value, range) => {}
            // out of band, or a textual parameter constrained by the table
            _ => issues.push((parameter, range)),
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::get_rules_for;
    use crate::signals::SystemType;

    fn record(index: &str, extractor: f64, magnet: f64) -> Measurement {
        Measurement {
            index: index.to_string(),
            date: "01/31/2025 09:12:44".to_string(),
            setup: "Med".to_string(),
            ion_energy_ev: 500.0,
            ion_energy_ua: 1.2,
            electron_energy_ev: 120.0,
            electron_energy_ma: 0.4,
            fil: 2.1,
            extractor,
            condenser: 60.0,
            drift: 12.0,
            magnet,
            focus: 71.0,
            x_shift: 1.5,
            y_shift: -2.0,
            ratio: 1.02,
            sample_current_work: 0.8,
            sample_current_max: 1.0,
            sample_current_aim: 0.9,
            mode: "Depth".to_string(),
            specification: "OK".to_string(),
        }
    }

    #[test]
    fn in_range_is_inclusive() {
        assert!(in_range(1.0, (1.0, 2.0)));
        assert!(in_range(2.0, (1.0, 2.0)));
        assert!(!in_range(2.000001, (1.0, 2.0)));
    }

    #[test]
    fn specification_passed_trims_and_ignores_case() {
        assert!(specification_passed("OK"));
        assert!(specification_passed(" ok "));
        assert!(!specification_passed("Fail"));
    }

    #[test]
    fn in_band_record_produces_no_issues() {
        let rules = get_rules_for(SystemType::EsqEx06, "default").unwrap();
        let m = record("[3]", 35.0, 0.0);
        assert!(validate_row(&m, rules).is_empty());
    }

    #[test]
    fn out_of_band_extractor_is_reported_with_its_range() {
        let rules = get_rules_for(SystemType::EsqEx06, "default").unwrap();
        let m = record("[3]", 120.0, 0.0);
        let issues = validate_row(&m, rules);
        assert_eq!(issues.len(), 1);
        let (parameter, range) = issues[0];
        assert_eq!(parameter, Parameter::Extractor);
        assert!(!in_range(m.extractor, range));
    }

    #[test]
    fn unconstrained_index_is_not_an_issue() {
        let rules = get_rules_for(SystemType::EsqEx06, "default").unwrap();
        // drift carries no band at index 0
        let mut m = record("[0]", 35.0, 0.0);
        m.drift = 999.0;
        let issues = validate_row(&m, rules);
        assert!(issues.iter().all(|(p, _)| *p != Parameter::Drift));
    }

    #[test]
    fn malformed_index_yields_no_table_findings() {
        let rules = get_rules_for(SystemType::EsqEx06, "default").unwrap();
        let m = record("bad", 999.0, 999.0);
        assert!(validate_row(&m, rules).is_empty());
    }
}
