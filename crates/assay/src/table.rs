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

//! Uniform in-memory table produced by every parser backend.

use crate::error::{AnalysisError, Result, UnsupportedKind};
use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single cell as found in the source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

/// One record keyed by column name, in source column order.
pub type RawRow = IndexMap<String, Scalar>;

/// Hashable identity of a non-missing value. `Number(1)` and `Text("1")` differ.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueKey {
    Null,
    Bool(bool),
    Number(u64),
    Text(String),
}

impl Scalar {
    /// Null and blank text both count as missing.
    pub fn is_missing(&self) -> bool {
        match self {
            Scalar::Null => true,
            Scalar::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Numeric reading of the cell, tolerating thousands separators and padding.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Scalar::Number(v) if v.is_finite() => Some(*v),
            Scalar::Text(s) => parse_number(s),
            _ => None,
        }
    }

    pub fn key(&self) -> ValueKey {
        match self {
            Scalar::Null => ValueKey::Null,
            Scalar::Bool(b) => ValueKey::Bool(*b),
            // -0.0 and 0.0 are the same value
            Scalar::Number(v) if *v == 0.0 => ValueKey::Number(0.0f64.to_bits()),
            Scalar::Number(v) => ValueKey::Number(v.to_bits()),
            Scalar::Text(s) => ValueKey::Text(s.clone()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Null => Ok(()),
            Scalar::Bool(b) => write!(f, "{b}"),
            Scalar::Number(v) => write!(f, "{v}"),
            Scalar::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Number(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

/// Parses a finite number after dropping whitespace, `,` and `_` separators.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',' && *c != '_')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a finite number with no separator tolerance, as delimited-text
/// coercion requires.
pub fn parse_number_strict(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    Delimited,
    Spreadsheet,
    Json,
    JsonLines,
}

const CONVERTIBLE_EXTENSIONS: &[&str] = &[
    "dta", "sav", "rds", "rdata", "parquet", "feather", "sas7bdat", "arrow",
];
const MANUAL_ONLY_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "gif", "bmp", "tif", "tiff", "webp", "svg", "db", "sqlite", "sqlite3",
    "mdb", "accdb", "sql", "pdf", "doc", "docx", "ppt", "pptx",
];

impl SourceFormat {
    pub fn from_extension(extension: &str) -> Result<Self> {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        match extension.as_str() {
            "csv" | "tsv" | "txt" => Ok(SourceFormat::Delimited),
            "xlsx" | "xls" | "xlsm" | "ods" => Ok(SourceFormat::Spreadsheet),
            "json" => Ok(SourceFormat::Json),
            "jsonl" => Ok(SourceFormat::JsonLines),
            other => {
                let kind = if CONVERTIBLE_EXTENSIONS.contains(&other) {
                    UnsupportedKind::Convertible
                } else if MANUAL_ONLY_EXTENSIONS.contains(&other) {
                    UnsupportedKind::ManualOnly
                } else {
                    UnsupportedKind::Unknown
                };
                Err(AnalysisError::UnsupportedFormat {
                    extension: other.to_string(),
                    kind,
                })
            }
        }
    }

    /// Format for a file name by its extension. A name without an extension
    /// is an unknown format.
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        let extension = std::path::Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::from_extension(extension)
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SourceFormat::Delimited => "delimited text",
            SourceFormat::Spreadsheet => "spreadsheet",
            SourceFormat::Json => "JSON",
            SourceFormat::JsonLines => "JSON Lines",
        };
        f.write_str(label)
    }
}

/// Rows aligned to one header. The header is the union of every record's keys
/// in first-seen order; keys a record lacks are `Null`.
#[derive(Debug, Clone)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Scalar>>,
    format: SourceFormat,
    file_size: u64,
    warnings: Vec<String>,
}

impl Table {
    pub fn from_records(records: Vec<RawRow>, format: SourceFormat) -> Self {
        let columns: IndexSet<String> = records
            .iter()
            .flat_map(|record| record.keys().cloned())
            .collect();
        let rows = records
            .into_iter()
            .map(|mut record| {
                columns
                    .iter()
                    .map(|name| record.swap_remove(name).unwrap_or(Scalar::Null))
                    .collect()
            })
            .collect();
        Self {
            columns: columns.into_iter().collect(),
            rows,
            format,
            file_size: 0,
            warnings: Vec::new(),
        }
    }

    pub fn with_file_size(mut self, file_size: u64) -> Self {
        self.file_size = file_size;
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<String>) -> Self {
        self.warnings.extend(warnings);
        self
    }

    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn rows(&self) -> &[Vec<Scalar>] {
        &self.rows
    }

    pub fn format(&self) -> SourceFormat {
        self.format
    }

    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn column_values(&self, index: usize) -> Vec<&Scalar> {
        self.rows.iter().filter_map(|row| row.get(index)).collect()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Row `index` rebuilt as a keyed record.
    pub fn record(&self, index: usize) -> Option<RawRow> {
        let row = self.rows.get(index)?;
        Some(
            self.columns
                .iter()
                .cloned()
                .zip(row.iter().cloned())
                .collect(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: String,
    pub count: usize,
}

/// Counts of non-missing values, most frequent first; ties keep first appearance.
pub fn value_frequencies<'a, I>(values: I) -> Vec<ValueCount>
where
    I: IntoIterator<Item = &'a Scalar>,
{
    let mut counts: IndexMap<ValueKey, ValueCount> = IndexMap::new();
    for value in values.into_iter().filter(|value| !value.is_missing()) {
        counts
            .entry(value.key())
            .or_insert_with(|| ValueCount {
                value: value.to_string(),
                count: 0,
            })
            .count += 1;
    }
    let mut frequencies: Vec<ValueCount> = counts.into_values().collect();
    frequencies.sort_by(|a, b| b.count.cmp(&a.count));
    frequencies
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(pairs: &[(&str, Scalar)]) -> RawRow {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn header_is_union_of_keys_in_first_seen_order() {
        let table = Table::from_records(
            vec![
                row(&[("a", 1.0.into()), ("b", "x".into())]),
                row(&[("c", true.into()), ("a", 2.0.into())]),
            ],
            SourceFormat::Json,
        );
        assert_eq!(table.column_names(), &["a", "b", "c"]);
        assert_eq!(table.rows()[0][2], Scalar::Null);
        assert_eq!(table.rows()[1][1], Scalar::Null);
        assert_eq!(table.record(1).unwrap()["a"], Scalar::Number(2.0));
    }

    #[test]
    fn number_parsing_strips_separators_and_rejects_non_finite() {
        assert_eq!(parse_number(" 1,234.5 "), Some(1234.5));
        assert_eq!(parse_number("1_000"), Some(1000.0));
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("   "), None);
    }

    #[test]
    fn frequencies_break_ties_by_first_appearance() {
        let values: Vec<Scalar> = ["b", "a", "a", "b", "c", "", "c", "c"]
            .iter()
            .map(|v| Scalar::from(*v))
            .collect();
        let frequencies = value_frequencies(&values);
        let order: Vec<_> = frequencies.iter().map(|f| f.value.as_str()).collect();
        assert_eq!(order, vec!["c", "b", "a"]);
        assert_eq!(frequencies[0].count, 3);
    }

    #[test]
    fn extensions_are_classified() {
        assert_eq!(
            SourceFormat::from_extension("CSV").unwrap(),
            SourceFormat::Delimited
        );
        assert_eq!(
            SourceFormat::from_file_name("survey.jsonl").unwrap(),
            SourceFormat::JsonLines
        );
        assert!(matches!(
            SourceFormat::from_extension("parquet"),
            Err(AnalysisError::UnsupportedFormat {
                kind: UnsupportedKind::Convertible,
                ..
            })
        ));
        assert!(matches!(
            SourceFormat::from_file_name("scan.png"),
            Err(AnalysisError::UnsupportedFormat {
                kind: UnsupportedKind::ManualOnly,
                ..
            })
        ));
        assert!(matches!(
            SourceFormat::from_file_name("README"),
            Err(AnalysisError::UnsupportedFormat {
                kind: UnsupportedKind::Unknown,
                ..
            })
        ));
    }
}
