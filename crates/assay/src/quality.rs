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

use crate::metrics::ColumnProfile;
use serde::{Deserialize, Serialize};

const CONSISTENCY_NULL_PENALTY: f64 = 30.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityAssessment {
    pub completeness_score: f64,
    pub consistency_score: f64,
    pub uniqueness_ratio: f64,
}

pub struct QualityAssessor;

impl QualityAssessor {
    pub fn assess(profiles: &[ColumnProfile], total_rows: usize) -> QualityAssessment {
        QualityAssessment {
            completeness_score: Self::completeness(profiles, total_rows),
            consistency_score: Self::consistency(profiles),
            uniqueness_ratio: Self::uniqueness_ratio(profiles),
        }
    }

    /// Percentage of non-missing cells, rounded.
    pub fn completeness(profiles: &[ColumnProfile], total_rows: usize) -> f64 {
        let total_cells = total_rows * profiles.len();
        if total_cells == 0 {
            return 0.0;
        }
        let missing: usize = profiles.iter().map(|p| p.null_count).sum();
        let score = 100.0 * (total_cells - missing.min(total_cells)) as f64 / total_cells as f64;
        score.round().clamp(0.0, 100.0)
    }

    /// Mean over columns of `100 - 30 * nulls / (unique + nulls)`. Sparse
    /// columns with few distinct values lose the most.
    pub fn consistency(profiles: &[ColumnProfile]) -> f64 {
        if profiles.is_empty() {
            return 0.0;
        }
        let total: f64 = profiles
            .iter()
            .map(|profile| {
                let denominator = (profile.unique_count + profile.null_count).max(1) as f64;
                (100.0 - CONSISTENCY_NULL_PENALTY * profile.null_count as f64 / denominator)
                    .max(0.0)
            })
            .sum();
        (total / profiles.len() as f64).round().clamp(0.0, 100.0)
    }

    pub fn uniqueness_ratio(profiles: &[ColumnProfile]) -> f64 {
        if profiles.is_empty() {
            return 0.0;
        }
        profiles
            .iter()
            .map(ColumnProfile::uniqueness_ratio)
            .sum::<f64>()
            / profiles.len() as f64
    }
}
