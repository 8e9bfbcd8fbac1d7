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

//! Representation checks on demographic-looking categorical columns.
//!
//! Columns are selected by name only and the flags are prompts for human
//! review. There is no significance testing.

use crate::config::BiasThresholds;
use crate::error::{ConfigError, ConfigResult};
use crate::inference::ColumnType;
use crate::metrics::ColumnProfile;
use crate::table::{value_frequencies, Table};
use indexmap::IndexMap;
use rayon::prelude::*;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupShare {
    pub value: String,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BiasIndicators {
    pub demographic_balance: IndexMap<String, Vec<GroupShare>>,
    pub small_group_sizes: Vec<String>,
    pub representation_concerns: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct BiasDetector {
    demographic_pattern: Regex,
    small_group_pct: f64,
    dominant_group_pct: f64,
}

impl BiasDetector {
    pub fn new(thresholds: &BiasThresholds) -> ConfigResult<Self> {
        let demographic_pattern = RegexBuilder::new(&thresholds.demographic_pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| ConfigError::InvalidPattern {
                pattern: thresholds.demographic_pattern.clone(),
                source,
            })?;
        Ok(Self {
            demographic_pattern,
            small_group_pct: thresholds.small_group_pct,
            dominant_group_pct: thresholds.dominant_group_pct,
        })
    }

    pub fn is_demographic(&self, profile: &ColumnProfile) -> bool {
        profile.column_type == ColumnType::Categorical
            && self.demographic_pattern.is_match(&profile.name)
    }

    /// Share of each value among the column's non-missing cells, largest first.
    pub fn distribution(table: &Table, column_index: usize) -> Vec<GroupShare> {
        let frequencies = value_frequencies(table.column_values(column_index));
        let total: usize = frequencies.iter().map(|f| f.count).sum();
        frequencies
            .into_iter()
            .map(|frequency| GroupShare {
                percentage: if total == 0 {
                    0.0
                } else {
                    frequency.count as f64 * 100.0 / total as f64
                },
                value: frequency.value,
                count: frequency.count,
            })
            .collect()
    }

    pub fn detect(&self, table: &Table, profiles: &[ColumnProfile]) -> BiasIndicators {
        let balances: Vec<(String, Vec<GroupShare>)> = profiles
            .par_iter()
            .enumerate()
            .filter(|(_, profile)| self.is_demographic(profile))
            .map(|(index, profile)| (profile.name.clone(), Self::distribution(table, index)))
            .collect();

        let mut small_group_sizes = Vec::new();
        let mut representation_concerns = Vec::new();
        for (column, shares) in &balances {
            for share in shares {
                if share.percentage <= self.small_group_pct {
                    small_group_sizes.push(format!(
                        "{column}: \"{}\" ({:.1}%)",
                        share.value, share.percentage
                    ));
                }
            }
            if let Some(dominant) = shares
                .iter()
                .find(|share| share.percentage > self.dominant_group_pct)
            {
                representation_concerns.push(format!(
                    "{column}: heavily skewed toward \"{}\" ({:.1}%)",
                    dominant.value, dominant.percentage
                ));
            }
        }

        BiasIndicators {
            demographic_balance: balances.into_iter().collect(),
            small_group_sizes,
            representation_concerns,
        }
    }
}

impl Default for BiasDetector {
    fn default() -> Self {
        Self::new(&BiasThresholds::default()).expect("default demographic pattern compiles")
    }
}
