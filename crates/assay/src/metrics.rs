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

use crate::inference::ColumnType;
use crate::table::{Scalar, Table, ValueKey};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnProfile {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub null_count: usize,
    pub unique_count: usize,
    pub total_rows: usize,
    pub potential_identifier: bool,
}

impl ColumnProfile {
    /// `uniqueCount / totalRows`, zero for an empty table.
    pub fn uniqueness_ratio(&self) -> f64 {
        if self.total_rows == 0 {
            0.0
        } else {
            self.unique_count as f64 / self.total_rows as f64
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicMetrics {
    pub total_rows: usize,
    pub total_columns: usize,
    pub column_types: BTreeMap<ColumnType, usize>,
    pub missing_values: IndexMap<String, usize>,
    pub duplicate_rows: usize,
    pub file_size: u64,
}

/// Null and distinct counts for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnScan {
    pub null_count: usize,
    pub unique_count: usize,
}

pub fn scan_column(values: &[&Scalar]) -> ColumnScan {
    let mut distinct: HashSet<ValueKey> = HashSet::new();
    let mut null_count = 0;
    for value in values {
        if value.is_missing() {
            null_count += 1;
        } else {
            distinct.insert(value.key());
        }
    }
    ColumnScan {
        null_count,
        unique_count: distinct.len(),
    }
}

pub struct BasicMetricsCalculator;

impl BasicMetricsCalculator {
    pub fn calculate(table: &Table, profiles: &[ColumnProfile]) -> BasicMetrics {
        let mut column_types = BTreeMap::new();
        for profile in profiles {
            *column_types.entry(profile.column_type).or_insert(0) += 1;
        }
        let missing_values = profiles
            .iter()
            .map(|profile| (profile.name.clone(), profile.null_count))
            .collect();
        BasicMetrics {
            total_rows: table.row_count(),
            total_columns: table.column_count(),
            column_types,
            missing_values,
            duplicate_rows: Self::count_duplicate_rows(table),
            file_size: table.file_size(),
        }
    }

    /// Rows equal to an earlier row in every column. Values must match
    /// exactly: null equals null, but blank text is not null.
    pub fn count_duplicate_rows(table: &Table) -> usize {
        let mut seen: HashSet<Vec<ValueKey>> = HashSet::with_capacity(table.row_count());
        table
            .rows()
            .iter()
            .filter(|row| !seen.insert(row.iter().map(Scalar::key).collect()))
            .count()
    }
}
