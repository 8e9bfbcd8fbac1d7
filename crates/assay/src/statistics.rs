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

use crate::bias::BiasIndicators;
use crate::distribution::DistributionStats;
use crate::metrics::{BasicMetrics, ColumnProfile};
use crate::privacy::PrivacyRisks;
use crate::quality::QualityAssessment;
use crate::table::SourceFormat;
use serde::{Deserialize, Serialize};

/// Complete result of one analysis run. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetStatistics {
    pub basic_metrics: BasicMetrics,
    pub column_analysis: Vec<ColumnProfile>,
    pub distribution_stats: DistributionStats,
    pub quality_assessment: QualityAssessment,
    pub bias_indicators: BiasIndicators,
    pub privacy_risks: PrivacyRisks,
    pub source_format: SourceFormat,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl DatasetStatistics {
    pub fn profile(&self, name: &str) -> Option<&ColumnProfile> {
        self.column_analysis.iter().find(|profile| profile.name == name)
    }
}
