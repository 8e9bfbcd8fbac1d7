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

use crate::config::InferenceThresholds;
use crate::table::{Scalar, ValueKey};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    Categorical,
    Datetime,
    Text,
    Boolean,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ColumnType::Numeric => "numeric",
            ColumnType::Categorical => "categorical",
            ColumnType::Datetime => "datetime",
            ColumnType::Text => "text",
            ColumnType::Boolean => "boolean",
        };
        f.pad(label)
    }
}

const BOOLEAN_WORDS: &[&str] = &["true", "false", "t", "f", "yes", "no", "y", "n"];

/// Classifies a column from its values. Rules run in order, first match wins:
/// all missing is text, mostly numeric is numeric, low-cardinality is
/// categorical, everything else is text. Datetime and boolean are only
/// considered when `detect_extended_types` is set.
#[derive(Debug, Clone, Default)]
pub struct ColumnTypeInferencer {
    thresholds: InferenceThresholds,
}

impl ColumnTypeInferencer {
    pub fn new(thresholds: InferenceThresholds) -> Self {
        Self { thresholds }
    }

    pub fn infer(&self, values: &[&Scalar]) -> ColumnType {
        let present: Vec<&Scalar> = values
            .iter()
            .copied()
            .filter(|value| !value.is_missing())
            .collect();
        if present.is_empty() {
            return ColumnType::Text;
        }
        let total = present.len() as f64;

        let numeric = present.iter().filter(|v| v.as_number().is_some()).count();
        if numeric as f64 / total >= self.thresholds.numeric_ratio {
            return ColumnType::Numeric;
        }

        if self.thresholds.detect_extended_types {
            let temporal = present.iter().filter(|v| self.is_temporal(v)).count();
            if temporal as f64 / total >= self.thresholds.numeric_ratio {
                return ColumnType::Datetime;
            }
            if present.iter().all(|v| is_boolean_like(v)) {
                return ColumnType::Boolean;
            }
        }

        let unique = present
            .iter()
            .map(|value| value.key())
            .collect::<HashSet<ValueKey>>()
            .len();
        if (unique as f64 / total) < self.thresholds.categorical_ratio
            && unique < self.thresholds.categorical_max_unique
        {
            return ColumnType::Categorical;
        }
        ColumnType::Text
    }

    fn is_temporal(&self, value: &Scalar) -> bool {
        let Scalar::Text(text) = value else {
            return false;
        };
        let text = text.trim();
        if DateTime::parse_from_rfc3339(text).is_ok() {
            return true;
        }
        self.thresholds.temporal_formats.iter().any(|format| {
            NaiveDateTime::parse_from_str(text, format).is_ok()
                || NaiveDate::parse_from_str(text, format).is_ok()
        })
    }
}

fn is_boolean_like(value: &Scalar) -> bool {
    match value {
        Scalar::Bool(_) => true,
        Scalar::Text(s) => BOOLEAN_WORDS.contains(&s.trim().to_lowercase().as_str()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(values: &[&str]) -> Vec<Scalar> {
        values.iter().map(|v| Scalar::from(*v)).collect()
    }

    fn infer_with(inferencer: &ColumnTypeInferencer, values: &[Scalar]) -> ColumnType {
        let refs: Vec<&Scalar> = values.iter().collect();
        inferencer.infer(&refs)
    }

    fn infer(values: &[Scalar]) -> ColumnType {
        infer_with(&ColumnTypeInferencer::default(), values)
    }

    #[test]
    fn all_missing_column_is_text() {
        assert_eq!(infer(&[Scalar::Null, "".into(), "  ".into()]), ColumnType::Text);
        assert_eq!(infer(&[]), ColumnType::Text);
    }

    #[test]
    fn numeric_at_exactly_eighty_percent() {
        let mut values = texts(&["1", "2", "3", "4,000", "n/a"]);
        assert_eq!(infer(&values), ColumnType::Numeric);
        values.push("unknown".into());
        assert_ne!(infer(&values), ColumnType::Numeric);
    }

    #[test]
    fn low_cardinality_is_categorical() {
        let mut values = Vec::new();
        for i in 0..100 {
            values.push(Scalar::from(["active", "closed", "pending"][i % 3]));
        }
        assert_eq!(infer(&values), ColumnType::Categorical);
    }

    #[test]
    fn categorical_needs_both_ratio_and_count() {
        // 50 distinct values over 1000 rows: ratio passes, count does not
        let values: Vec<Scalar> = (0..1000)
            .map(|i| Scalar::Text(format!("v{}", i % 50)))
            .collect();
        assert_eq!(infer(&values), ColumnType::Text);

        let values: Vec<Scalar> = (0..10).map(|i| Scalar::Text(format!("v{i}"))).collect();
        assert_eq!(infer(&values), ColumnType::Text);
    }

    #[test]
    fn extended_types_are_opt_in() {
        let dates = texts(&["2024-01-01", "2024-01-02", "2024-02-03", "2024-03-04"]);
        let flags = texts(&["yes", "no", "Yes", "N"]);
        assert_eq!(infer(&dates), ColumnType::Text);

        let extended = ColumnTypeInferencer::new(InferenceThresholds {
            detect_extended_types: true,
            ..Default::default()
        });
        assert_eq!(infer_with(&extended, &dates), ColumnType::Datetime);
        assert_eq!(infer_with(&extended, &flags), ColumnType::Boolean);
    }
}
