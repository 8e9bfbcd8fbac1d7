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

use crate::config::SuitabilityThresholds;
use crate::statistics::DatasetStatistics;
use ethics_contracts::{Confidence, EthicalAnalysis, SuitabilityLevel};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuitabilitySignal {
    pub score: f64,
    pub level: SuitabilityLevel,
    pub confidence: Confidence,
    pub rationale: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SuitabilityAssessor {
    thresholds: SuitabilityThresholds,
}

impl SuitabilityAssessor {
    pub fn new(thresholds: SuitabilityThresholds) -> Self {
        Self { thresholds }
    }

    pub fn level_for(&self, score: f64) -> SuitabilityLevel {
        if score >= self.thresholds.suitable_score {
            SuitabilityLevel::Suitable
        } else if score >= self.thresholds.review_score {
            SuitabilityLevel::NeedsReview
        } else {
            SuitabilityLevel::Unsuitable
        }
    }

    /// Verdict derived from the statistics alone, used when the ethical
    /// analysis is unavailable. Always low confidence.
    pub fn from_statistics(&self, statistics: &DatasetStatistics) -> SuitabilitySignal {
        let t = &self.thresholds;
        let quality = &statistics.quality_assessment;
        let base = (quality.completeness_score + quality.consistency_score) / 2.0;
        let mut rationale = vec![format!(
            "Data quality baseline {base:.1} (completeness {:.1}, consistency {:.1})",
            quality.completeness_score, quality.consistency_score
        )];

        let identifiers = statistics.privacy_risks.potential_identifiers.len();
        let identifier_penalty =
            (identifiers as f64 * t.identifier_penalty).min(t.identifier_penalty_cap);
        if identifiers > 0 {
            rationale.push(format!(
                "{identifiers} potential identifier column(s): -{identifier_penalty:.0}"
            ));
        }

        let concerns = statistics.bias_indicators.representation_concerns.len();
        let concern_penalty = concerns as f64 * t.concern_penalty;
        if concerns > 0 {
            rationale.push(format!(
                "{concerns} representation concern(s): -{concern_penalty:.0}"
            ));
        }

        let small_groups = statistics.bias_indicators.small_group_sizes.len();
        let small_group_penalty =
            (small_groups as f64 * t.small_group_penalty).min(t.small_group_penalty_cap);
        if small_groups > 0 {
            rationale.push(format!(
                "{small_groups} small subgroup(s): -{small_group_penalty:.0}"
            ));
        }

        let score = (base - identifier_penalty - concern_penalty - small_group_penalty)
            .clamp(0.0, 100.0)
            .round();
        SuitabilitySignal {
            score,
            level: self.level_for(score),
            confidence: Confidence::Low,
            rationale,
        }
    }

    pub fn from_analysis(&self, analysis: &EthicalAnalysis) -> SuitabilitySignal {
        let score = analysis.suitability_score.clamp(0.0, 100.0).round();
        let mut rationale = vec![format!(
            "Ethical analysis: overall risk {}",
            analysis.overall_risk_level
        )];
        rationale.extend(analysis.recommendations.iter().cloned());
        SuitabilitySignal {
            score,
            level: self.level_for(score),
            confidence: Confidence::High,
            rationale,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::DatasetAnalyzer;
    use ethics_contracts::{BiasAssessment, PrivacyAssessment, RiskLevel};

    fn statistics(csv: &str) -> DatasetStatistics {
        DatasetAnalyzer::new().analyze_bytes("data.csv", csv.as_bytes()).unwrap()
    }

    #[test]
    fn clean_dataset_is_suitable_with_low_confidence() {
        let stats = statistics("region,score\nnorth,1\nsouth,1\nnorth,2\nsouth,2\n");
        let signal = SuitabilityAssessor::default().from_statistics(&stats);
        assert_eq!(signal.score, 100.0);
        assert_eq!(signal.level, SuitabilityLevel::Suitable);
        assert_eq!(signal.confidence, Confidence::Low);
    }

    #[test]
    fn identifier_penalty_is_capped() {
        let stats = statistics(
            "user_id,email,phone,full_name,score\n1,a@x.org,555,Ann,1\n2,b@x.org,556,Bob,2\n",
        );
        let signal = SuitabilityAssessor::default().from_statistics(&stats);
        assert_eq!(stats.privacy_risks.potential_identifiers.len(), 5);
        assert_eq!(signal.score, 70.0);
        assert_eq!(signal.level, SuitabilityLevel::Suitable);
    }

    #[test]
    fn levels_follow_thresholds() {
        let assessor = SuitabilityAssessor::default();
        assert_eq!(assessor.level_for(70.0), SuitabilityLevel::Suitable);
        assert_eq!(assessor.level_for(69.9), SuitabilityLevel::NeedsReview);
        assert_eq!(assessor.level_for(40.0), SuitabilityLevel::NeedsReview);
        assert_eq!(assessor.level_for(39.0), SuitabilityLevel::Unsuitable);
    }

    #[test]
    fn collaborator_score_has_high_confidence() {
        let analysis = EthicalAnalysis {
            suitability_score: 35.4,
            overall_risk_level: RiskLevel::High,
            privacy_assessment: PrivacyAssessment {
                risk_level: RiskLevel::High,
                concerns: vec![],
                mitigations: vec![],
            },
            bias_assessment: BiasAssessment {
                risk_level: RiskLevel::Low,
                concerns: vec![],
                affected_groups: vec![],
            },
            recommendations: vec!["Remove direct identifiers".to_string()],
            generated_at: None,
        };
        let signal = SuitabilityAssessor::default().from_analysis(&analysis);
        assert_eq!(signal.score, 35.0);
        assert_eq!(signal.level, SuitabilityLevel::Unsuitable);
        assert_eq!(signal.confidence, Confidence::High);
        assert_eq!(signal.rationale.len(), 2);
    }
}
