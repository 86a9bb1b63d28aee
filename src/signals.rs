//! Configuration signals and system-type resolution.
//!
//! Three booleans decide which hardware configuration produced a log: the
//! system family (chosen by the operator), whether an ion gun was fitted and
//! whether ISS modes were exercised. The last two are inferred while
//! scanning record lines; the inference is an *ordered* rule list where later
//! rules deliberately override earlier ones:
//!
//! 1. six index-group / power-token coincidences set both flags;
//! 2. a non-zero extractor token together with a magnet token other than
//!    `-0` sets the ion-gun flag;
//! 3. a `Med` setup clears the ion-gun flag;
//! 4. an `ISS` mode tag sets the ISS flag;
//! 5. a `Cluster` mode tag sets the ion-gun flag.
//!
//! Do not reorder these: rule 3 must run after rules 1 and 2 and before
//! rules 4 and 5 so that last write wins both within one record and across
//! records.

use crate::error::{AppResult, IonifyError};
use serde::{Deserialize, Serialize};

/// The two hardware platforms a log can come from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Family {
    Escalab,
    Nexsa,
}

/// Mode-index groups paired with the power-setup token that marks an
/// ISS-capable ion-gun run. Each match sets both inferred flags.
const POWER_STEP_GROUPS: [([&str; 4], &str); 6] = [
    (["[14]", "[20]", "[26]", "[32]"], "75"),
    (["[15]", "[21]", "[27]", "[33]"], "150"),
    (["[16]", "[22]", "[28]", "[34]"], "300"),
    (["[17]", "[23]", "[29]", "[35]"], "500"),
    (["[18]", "[24]", "[30]", "[36]"], "1000"),
    (["[19]", "[25]", "[31]", "[37]"], "2000"),
];

/// Immutable-by-convention signal record threaded through the pipeline.
///
/// A fresh value is created per parse; only [`SignalState::observe_record`]
/// mutates it, and only during the scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalState {
    pub family: Family,
    pub ion_gun: bool,
    pub iss_modes: bool,
}

impl SignalState {
    pub fn new(family: Family) -> Self {
        Self {
            family,
            ion_gun: false,
            iss_modes: false,
        }
    }

    /// Apply the ordered inference rules to one record line.
    ///
    /// `tokens` are the raw whitespace-split fields of a well-formed line
    /// (at least 21 of them); the comparisons here are on the raw tokens,
    /// not on parsed numbers.
    pub fn observe_record(&mut self, tokens: &[&str]) {
        debug_assert!(tokens.len() >= 21);

        for (indices, power) in &POWER_STEP_GROUPS {
            if indices.contains(&tokens[0]) && tokens[3] == *power {
                self.iss_modes = true;
                self.ion_gun = true;
                break;
            }
        }

        if tokens[9] != "0" && tokens[12] != "-0" {
            self.ion_gun = true;
        }

        if tokens[3] == "Med" {
            self.ion_gun = false;
        }
        if tokens[20] == "ISS" {
            self.iss_modes = true;
        }
        if tokens[20] == "Cluster" {
            self.ion_gun = true;
        }
    }
}

/// The six hardware configurations a signal triple can resolve to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SystemType {
    NexsaMagcisIss,
    NexsaMagcis,
    NexsaEx06Iss,
    NexsaEx06,
    EsqMagcis,
    EsqEx06,
}

impl SystemType {
    /// Canonical tag, used for rule lookup and asset filenames.
    pub fn as_str(self) -> &'static str {
        match self {
            SystemType::NexsaMagcisIss => "NEXSA_MAGCIS_ISS",
            SystemType::NexsaMagcis => "NEXSA_MAGCIS",
            SystemType::NexsaEx06Iss => "NEXSA_EX06_ISS",
            SystemType::NexsaEx06 => "NEXSA_EX06",
            SystemType::EsqMagcis => "ESQ_MAGCIS",
            SystemType::EsqEx06 => "ESQ_EX06",
        }
    }

    /// Highest mode index the configuration calibrates. The report renders
    /// exactly `max_index() + 1` data rows regardless of how many lines the
    /// log contained.
    pub fn max_index(self) -> u32 {
        match self {
            SystemType::NexsaMagcisIss => 37,
            SystemType::NexsaMagcis => 35,
            SystemType::NexsaEx06Iss => 23,
            SystemType::NexsaEx06 => 17,
            SystemType::EsqMagcis => 33,
            SystemType::EsqEx06 => 17,
        }
    }
}

impl std::fmt::Display for SystemType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved configuration: the system tag plus its fixed row bound.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SystemConfig {
    pub system_type: SystemType,
    pub max_index: u32,
}

/// Map a signal triple to its system configuration.
///
/// Exactly six triples are legal; anything else is invalid input and yields
/// [`IonifyError::UnresolvedConfiguration`] so the caller can tell the user
/// to correct the system selection rather than crash.
pub fn resolve(signals: &SignalState) -> AppResult<SystemConfig> {
    let system_type = match (signals.family, signals.ion_gun, signals.iss_modes) {
        (Family::Nexsa, true, true) => SystemType::NexsaMagcisIss,
        (Family::Nexsa, true, false) => SystemType::NexsaMagcis,
        (Family::Nexsa, false, true) => SystemType::NexsaEx06Iss,
        (Family::Nexsa, false, false) => SystemType::NexsaEx06,
        (Family::Escalab, true, false) => SystemType::EsqMagcis,
        (Family::Escalab, false, false) => SystemType::EsqEx06,
        (Family::Escalab, ion_gun, iss) => {
            return Err(IonifyError::UnresolvedConfiguration { ion_gun, iss });
        }
    };
    Ok(SystemConfig {
        system_type,
        max_index: system_type.max_index(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_tokens<'a>(index: &'a str, setup: &'a str, mode: &'a str) -> Vec<&'a str> {
        let mut tokens = vec![index, "01/31/2025", "09:12:44", setup];
        tokens.extend(["500", "1.2", "120", "0.4", "2.1", "0", "61", "14"]);
        tokens.push("-0");
        tokens.extend(["71", "1.5", "-2.0", "1.02", "0.8", "1.0", "0.9"]);
        tokens.push(mode);
        tokens
    }

    #[test]
    fn coincidence_group_sets_both_flags() {
        let mut s = SignalState::new(Family::Nexsa);
        s.observe_record(&record_tokens("[14]", "75", "Depth"));
        assert!(s.ion_gun);
        assert!(s.iss_modes);
    }

    #[test]
    fn coincidence_requires_matching_power_token() {
        let mut s = SignalState::new(Family::Nexsa);
        s.observe_record(&record_tokens("[14]", "150", "Depth"));
        assert!(!s.ion_gun);
        assert!(!s.iss_modes);
    }

    #[test]
    fn nonzero_extractor_and_magnet_tokens_set_ion_gun() {
        let mut s = SignalState::new(Family::Escalab);
        let mut tokens = record_tokens("[3]", "Low", "Depth");
        tokens[9] = "36";
        tokens[12] = "-0.2";
        s.observe_record(&tokens);
        assert!(s.ion_gun);
        assert!(!s.iss_modes);
    }

    #[test]
    fn med_setup_overrides_earlier_assertions() {
        let mut s = SignalState::new(Family::Nexsa);
        s.observe_record(&record_tokens("[14]", "75", "Depth"));
        assert!(s.ion_gun);
        s.observe_record(&record_tokens("[2]", "Med", "Depth"));
        assert!(!s.ion_gun, "a later Med record must clear the ion-gun flag");
        assert!(s.iss_modes, "the ISS flag is not touched by the override");
    }

    #[test]
    fn cluster_tag_reasserts_ion_gun_after_med_on_the_same_record() {
        let mut s = SignalState::new(Family::Nexsa);
        s.observe_record(&record_tokens("[5]", "Med", "Cluster"));
        assert!(s.ion_gun);
    }

    #[test]
    fn iss_tag_sets_iss_flag() {
        let mut s = SignalState::new(Family::Nexsa);
        s.observe_record(&record_tokens("[2]", "Low", "ISS"));
        assert!(s.iss_modes);
    }

    #[test]
    fn resolution_is_total_over_the_six_legal_triples() {
        let cases = [
            (Family::Nexsa, true, true, SystemType::NexsaMagcisIss, 37),
            (Family::Nexsa, true, false, SystemType::NexsaMagcis, 35),
            (Family::Nexsa, false, true, SystemType::NexsaEx06Iss, 23),
            (Family::Nexsa, false, false, SystemType::NexsaEx06, 17),
            (Family::Escalab, true, false, SystemType::EsqMagcis, 33),
            (Family::Escalab, false, false, SystemType::EsqEx06, 17),
        ];
        for (family, ion_gun, iss_modes, expected, rows) in cases {
            let config = resolve(&SignalState {
                family,
                ion_gun,
                iss_modes,
            })
            .unwrap();
            assert_eq!(config.system_type, expected);
            assert_eq!(config.max_index, rows);
        }
    }

    #[test]
    fn illegal_triples_fail_explicitly() {
        for ion_gun in [true, false] {
            let result = resolve(&SignalState {
                family: Family::Escalab,
                ion_gun,
                iss_modes: true,
            });
            assert!(matches!(
                result,
                Err(IonifyError::UnresolvedConfiguration { .. })
            ));
        }
    }
}
