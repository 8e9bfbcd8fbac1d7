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

//! File-to-table conversion, dispatched on the file extension.

pub mod delimited;
pub mod json;
pub mod spreadsheet;

use crate::config::FileLimits;
use crate::error::{AnalysisError, Result};
use crate::table::{RawRow, SourceFormat, Table};
use std::path::Path;
use tracing::{debug, warn};

/// Rows from one backend plus the non-fatal problems met on the way.
#[derive(Debug, Default)]
pub struct ParsedRows {
    pub records: Vec<RawRow>,
    pub warnings: Vec<String>,
}

impl ParsedRows {
    pub fn new(records: Vec<RawRow>) -> Self {
        Self {
            records,
            warnings: Vec::new(),
        }
    }
}

/// Trims header names, names blank ones `column_{index}` and suffixes repeats
/// so every column name is unique.
pub(crate) fn normalise_headers<I>(raw: I, warnings: &mut Vec<String>) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = std::collections::HashSet::new();
    let mut headers = Vec::new();
    for (index, name) in raw.into_iter().enumerate() {
        let trimmed = name.trim();
        let base = if trimmed.is_empty() {
            format!("column_{index}")
        } else {
            trimmed.to_string()
        };
        let mut candidate = base.clone();
        let mut suffix = 2;
        while !seen.insert(candidate.clone()) {
            candidate = format!("{base}_{suffix}");
            suffix += 1;
        }
        if candidate != base {
            warnings.push(format!(
                "Duplicate column name '{base}' renamed to '{candidate}'"
            ));
        }
        headers.push(candidate);
    }
    headers
}

#[derive(Debug, Clone, Default)]
pub struct FormatParser {
    limits: FileLimits,
}

impl FormatParser {
    pub fn new(limits: FileLimits) -> Self {
        Self { limits }
    }

    /// Reads and parses a file. The extension is checked before the file is
    /// opened and the size before it is read.
    pub fn parse_path<P: AsRef<Path>>(&self, path: P) -> Result<Table> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        SourceFormat::from_file_name(file_name)?;
        let size = std::fs::metadata(path)?.len();
        self.check_size(size)?;
        let bytes = std::fs::read(path)?;
        self.parse_bytes(file_name, &bytes)
    }

    /// Parses an in-memory upload named `file_name`.
    pub fn parse_bytes(&self, file_name: &str, bytes: &[u8]) -> Result<Table> {
        let format = SourceFormat::from_file_name(file_name)?;
        let size = bytes.len() as u64;
        let mut warnings = self.check_size(size)?;
        debug!(file = file_name, %format, size, "Parsing dataset");

        let parsed = match format {
            SourceFormat::Delimited => delimited::parse(bytes)?,
            SourceFormat::Spreadsheet => spreadsheet::parse(bytes)?,
            SourceFormat::Json => json::parse_document(bytes)?,
            SourceFormat::JsonLines => json::parse_lines(bytes)?,
        };
        warnings.extend(parsed.warnings);

        if parsed.records.is_empty() {
            return Err(AnalysisError::empty(format!(
                "'{file_name}' contains no data rows"
            )));
        }
        let table = Table::from_records(parsed.records, format)
            .with_file_size(size)
            .with_warnings(warnings);
        if table.column_count() == 0 {
            return Err(AnalysisError::empty(format!(
                "'{file_name}' contains no columns"
            )));
        }
        Ok(table)
    }

    fn check_size(&self, size: u64) -> Result<Vec<String>> {
        if size > self.limits.max_file_size_bytes {
            return Err(AnalysisError::FileTooLarge {
                size,
                limit: self.limits.max_file_size_bytes,
            });
        }
        let mut warnings = Vec::new();
        if size > self.limits.warn_file_size_bytes {
            let message = format!(
                "File is {} MB; analysis of large files may be slow",
                size / (1024 * 1024)
            );
            warn!("{message}");
            warnings.push(message);
        }
        Ok(warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UnsupportedKind;

    #[test]
    fn headers_are_made_unique() {
        let mut warnings = Vec::new();
        let headers = normalise_headers(
            ["id", " id ", "", "name"].iter().map(|s| s.to_string()),
            &mut warnings,
        );
        assert_eq!(headers, vec!["id", "id_2", "column_2", "name"]);
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn rejects_files_above_hard_limit() {
        let parser = FormatParser::new(FileLimits {
            max_file_size_bytes: 8,
            warn_file_size_bytes: 4,
        });
        let err = parser.parse_bytes("data.csv", b"a,b\n1,2\n3,4\n").unwrap_err();
        assert!(matches!(err, AnalysisError::FileTooLarge { limit: 8, .. }));
    }

    #[test]
    fn warns_above_soft_limit() {
        let parser = FormatParser::new(FileLimits {
            max_file_size_bytes: 1024,
            warn_file_size_bytes: 4,
        });
        let table = parser.parse_bytes("data.csv", b"a,b\n1,2\n").unwrap();
        assert_eq!(table.warnings().len(), 1);
        assert_eq!(table.file_size(), 8);
    }

    #[test]
    fn header_only_file_is_empty() {
        let err = FormatParser::default()
            .parse_bytes("data.csv", b"id,age,gender\n")
            .unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyDataset { .. }));
    }

    #[test]
    fn object_without_fields_is_empty() {
        let err = FormatParser::default()
            .parse_bytes("data.json", b"{}")
            .unwrap_err();
        assert!(matches!(err, AnalysisError::EmptyDataset { .. }));
    }

    #[test]
    fn unsupported_extension_is_rejected_before_parsing() {
        let err = FormatParser::default()
            .parse_bytes("export.sav", b"\x00\x01")
            .unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::UnsupportedFormat {
                kind: UnsupportedKind::Convertible,
                ..
            }
        ));
    }
}
