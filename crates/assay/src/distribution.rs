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

use crate::config::SummaryConfig;
use crate::inference::ColumnType;
use crate::metrics::ColumnProfile;
use crate::table::{value_frequencies, Table, ValueCount};
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoricalSummary {
    pub unique_values: usize,
    pub top_values: Vec<ValueCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionStats {
    pub numerical_summary: IndexMap<String, NumericSummary>,
    pub categorical_summary: IndexMap<String, CategoricalSummary>,
    pub outlier_count: usize,
}

enum ColumnSummary {
    Numeric(NumericSummary, usize),
    Categorical(CategoricalSummary),
}

#[derive(Debug, Clone, Default)]
pub struct DistributionSummarizer {
    config: SummaryConfig,
}

impl DistributionSummarizer {
    pub fn new(config: SummaryConfig) -> Self {
        Self { config }
    }

    pub fn summarize(&self, table: &Table, profiles: &[ColumnProfile]) -> DistributionStats {
        let summaries: Vec<(String, ColumnSummary)> = profiles
            .par_iter()
            .enumerate()
            .filter_map(|(index, profile)| {
                let summary = match profile.column_type {
                    ColumnType::Numeric => {
                        let mut values: Vec<f64> = table
                            .column_values(index)
                            .into_iter()
                            .filter_map(|value| value.as_number())
                            .collect();
                        values.sort_by(f64::total_cmp);
                        let summary = numeric_summary(&values)?;
                        let outliers = count_outliers(&values, self.config.outlier_iqr_multiplier);
                        ColumnSummary::Numeric(summary, outliers)
                    }
                    ColumnType::Categorical => {
                        let frequencies = value_frequencies(table.column_values(index));
                        ColumnSummary::Categorical(CategoricalSummary {
                            unique_values: frequencies.len(),
                            top_values: frequencies
                                .into_iter()
                                .take(self.config.top_values)
                                .collect(),
                        })
                    }
                    _ => return None,
                };
                Some((profile.name.clone(), summary))
            })
            .collect();

        let mut stats = DistributionStats {
            numerical_summary: IndexMap::new(),
            categorical_summary: IndexMap::new(),
            outlier_count: 0,
        };
        for (name, summary) in summaries {
            match summary {
                ColumnSummary::Numeric(summary, outliers) => {
                    stats.outlier_count += outliers;
                    stats.numerical_summary.insert(name, summary);
                }
                ColumnSummary::Categorical(summary) => {
                    stats.categorical_summary.insert(name, summary);
                }
            }
        }
        stats
    }
}

/// Expects `sorted` in ascending order. Median is the element at `len / 2`.
pub fn numeric_summary(sorted: &[f64]) -> Option<NumericSummary> {
    let (&min, &max) = (sorted.first()?, sorted.last()?);
    let count = sorted.len();
    Some(NumericSummary {
        count,
        mean: sorted.iter().sum::<f64>() / count as f64,
        median: sorted[count / 2],
        min,
        max,
    })
}

/// Values outside `[Q1 - k*IQR, Q3 + k*IQR]`; zero when the IQR is zero.
pub fn count_outliers(sorted: &[f64], multiplier: f64) -> usize {
    if sorted.len() < 4 {
        return 0;
    }
    let q1 = sorted[sorted.len() / 4];
    let q3 = sorted[sorted.len() * 3 / 4];
    let iqr = q3 - q1;
    if iqr <= 0.0 {
        return 0;
    }
    let lower = q1 - multiplier * iqr;
    let upper = q3 + multiplier * iqr;
    sorted.iter().filter(|v| **v < lower || **v > upper).count()
}
