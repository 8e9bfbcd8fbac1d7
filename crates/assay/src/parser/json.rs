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

use super::ParsedRows;
use crate::error::{AnalysisError, Result};
use crate::table::{RawRow, Scalar, SourceFormat};
use serde_json::Value;

const SCALAR_ROW_KEY: &str = "value";

/// Array documents are rows; objects contribute their first array-valued
/// property; any other object becomes a single row.
pub fn parse_document(bytes: &[u8]) -> Result<ParsedRows> {
    let document: Value = serde_json::from_slice(bytes)
        .map_err(|e| AnalysisError::parse(SourceFormat::Json, e.to_string()))?;
    let records = match document {
        Value::Array(items) => items.into_iter().map(value_to_row).collect(),
        Value::Object(map) => {
            let first_array = map.iter().find_map(|(_, value)| match value {
                Value::Array(items) => Some(items.clone()),
                _ => None,
            });
            match first_array {
                Some(items) => items.into_iter().map(value_to_row).collect(),
                None => vec![object_to_row(map)],
            }
        }
        scalar => vec![value_to_row(scalar)],
    };
    Ok(ParsedRows::new(records))
}

/// One JSON value per non-empty line.
pub fn parse_lines(bytes: &[u8]) -> Result<ParsedRows> {
    let text = String::from_utf8_lossy(bytes);
    let mut records = Vec::new();
    for (index, line) in text.lines().enumerate() {
        let line = line.trim().trim_start_matches('\u{feff}');
        if line.is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(line).map_err(|e| {
            AnalysisError::parse(SourceFormat::JsonLines, format!("line {}: {e}", index + 1))
        })?;
        records.push(value_to_row(value));
    }
    Ok(ParsedRows::new(records))
}

fn value_to_row(value: Value) -> RawRow {
    match value {
        Value::Object(map) => object_to_row(map),
        other => {
            let mut row = RawRow::new();
            row.insert(SCALAR_ROW_KEY.to_string(), to_scalar(other));
            row
        }
    }
}

fn object_to_row(map: serde_json::Map<String, Value>) -> RawRow {
    map.into_iter()
        .map(|(key, value)| (key, to_scalar(value)))
        .collect()
}

/// Nested arrays and objects are kept as compact JSON text.
fn to_scalar(value: Value) -> Scalar {
    match value {
        Value::Null => Scalar::Null,
        Value::Bool(b) => Scalar::Bool(b),
        Value::Number(n) => n.as_f64().map(Scalar::Number).unwrap_or(Scalar::Null),
        Value::String(s) => Scalar::Text(s),
        nested => Scalar::Text(nested.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_document_is_used_directly() {
        let parsed = parse_document(br#"[{"a": 1, "b": "x"}, {"a": null, "b": true}]"#).unwrap();
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0]["a"], Scalar::Number(1.0));
        assert_eq!(parsed.records[1]["a"], Scalar::Null);
        assert_eq!(parsed.records[1]["b"], Scalar::Bool(true));
    }

    #[test]
    fn object_uses_first_array_property_in_document_order() {
        let parsed = parse_document(
            br#"{"meta": {"v": 1}, "zeta": [{"k": 1}], "alpha": [{"k": 2}, {"k": 3}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0]["k"], Scalar::Number(1.0));
    }

    #[test]
    fn plain_object_becomes_one_row_with_nested_values_as_text() {
        let parsed = parse_document(br#"{"region": "North", "tags": {"a": 1}}"#).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0]["tags"], Scalar::Text(r#"{"a":1}"#.into()));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let err = parse_document(b"[{\"a\": 1,,]").unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Parse {
                format: SourceFormat::Json,
                ..
            }
        ));
    }

    #[test]
    fn json_lines_report_the_failing_line() {
        let parsed = parse_lines(b"{\"a\": 1}\n\n{\"a\": 2}\n7\n").unwrap();
        assert_eq!(parsed.records.len(), 3);
        assert_eq!(parsed.records[2]["value"], Scalar::Number(7.0));

        let err = parse_lines(b"{\"a\": 1}\n{oops}\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }
}
