// SPDX-License-Identifier: AGPL-3.0-only
// Copyright (C) 2024 Jonathan Lee
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License version 3
// as published by the Free Software Foundation.
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.
// See the GNU Affero General Public License for more details.
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see https://www.gnu.org/licenses/.

//! Heuristic pre-filter for columns that may identify people.
//!
//! Matches are "pattern-flagged" for human review. They are not confirmed
//! personal data and carry no compliance meaning.

use crate::config::PrivacyThresholds;
use crate::error::{ConfigError, ConfigResult};
use crate::metrics::ColumnProfile;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

pub const DETECTION_LABEL: &str = "pattern-flagged";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacyRisks {
    pub potential_identifiers: Vec<String>,
    pub quasi_identifiers: Vec<String>,
    pub uniqueness_ratio: f64,
    pub detection: String,
}

#[derive(Debug, Clone)]
pub struct PrivacyRiskAssessor {
    patterns: Vec<Regex>,
    identifier_ratio: f64,
    quasi_identifier_ratio: f64,
}

impl PrivacyRiskAssessor {
    pub fn new(thresholds: &PrivacyThresholds) -> ConfigResult<Self> {
        let patterns = thresholds
            .identifier_patterns
            .iter()
            .map(|pattern| {
                RegexBuilder::new(pattern)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| ConfigError::InvalidPattern {
                        pattern: pattern.clone(),
                        source,
                    })
            })
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(Self {
            patterns,
            identifier_ratio: thresholds.identifier_ratio,
            quasi_identifier_ratio: thresholds.quasi_identifier_ratio,
        })
    }

    pub fn matches_identifier_name(&self, name: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(name))
    }

    /// Name pattern and near-uniqueness are independent triggers.
    pub fn is_potential_identifier(&self, name: &str, uniqueness_ratio: f64) -> bool {
        self.matches_identifier_name(name) || uniqueness_ratio > self.identifier_ratio
    }

    pub fn is_quasi_identifier(&self, uniqueness_ratio: f64) -> bool {
        uniqueness_ratio > self.quasi_identifier_ratio && uniqueness_ratio < self.identifier_ratio
    }

    pub fn assess(&self, profiles: &[ColumnProfile], uniqueness_ratio: f64) -> PrivacyRisks {
        let mut potential_identifiers = Vec::new();
        let mut quasi_identifiers = Vec::new();
        for profile in profiles {
            if profile.potential_identifier {
                potential_identifiers.push(profile.name.clone());
            } else if self.is_quasi_identifier(profile.uniqueness_ratio()) {
                quasi_identifiers.push(profile.name.clone());
            }
        }
        PrivacyRisks {
            potential_identifiers,
            quasi_identifiers,
            uniqueness_ratio,
            detection: DETECTION_LABEL.to_string(),
        }
    }
}

impl Default for PrivacyRiskAssessor {
    fn default() -> Self {
        Self::new(&PrivacyThresholds::default()).expect("default identifier patterns compile")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_patterns_are_case_insensitive() {
        let assessor = PrivacyRiskAssessor::default();
        for name in ["ID", "user_id", "Email", "FirstName", "phone_number", "api_key"] {
            assert!(assessor.matches_identifier_name(name), "{name}");
        }
        for name in ["status", "region", "score"] {
            assert!(!assessor.matches_identifier_name(name), "{name}");
        }
    }

    #[test]
    fn uniqueness_triggers_independently_of_name() {
        let assessor = PrivacyRiskAssessor::default();
        assert!(assessor.is_potential_identifier("reference", 0.99));
        assert!(!assessor.is_potential_identifier("reference", 0.95));
        assert!(assessor.is_potential_identifier("email", 0.01));
    }

    #[test]
    fn quasi_band_is_exclusive_at_both_ends() {
        let assessor = PrivacyRiskAssessor::default();
        assert!(!assessor.is_quasi_identifier(0.3));
        assert!(assessor.is_quasi_identifier(0.31));
        assert!(assessor.is_quasi_identifier(0.94));
        assert!(!assessor.is_quasi_identifier(0.95));
    }

    #[test]
    fn invalid_pattern_is_a_config_error() {
        let thresholds = PrivacyThresholds {
            identifier_patterns: vec!["(unclosed".to_string()],
            ..Default::default()
        };
        assert!(matches!(
            PrivacyRiskAssessor::new(&thresholds),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }
}
