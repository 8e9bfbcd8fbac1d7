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

use crate::types::RiskLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Structured assessment returned by the ethical-analysis collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EthicalAnalysis {
    pub suitability_score: f64,
    pub overall_risk_level: RiskLevel,
    pub privacy_assessment: PrivacyAssessment,
    pub bias_assessment: BiasAssessment,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrivacyAssessment {
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub concerns: Vec<String>,
    #[serde(default)]
    pub mitigations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasAssessment {
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub concerns: Vec<String>,
    #[serde(default)]
    pub affected_groups: Vec<String>,
}

impl EthicalAnalysis {
    /// Clamps the score into `0..=100`; the collaborator is not trusted to.
    pub fn normalised(mut self) -> Self {
        self.suitability_score = if self.suitability_score.is_finite() {
            self.suitability_score.clamp(0.0, 100.0)
        } else {
            0.0
        };
        self
    }
}
