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

use super::{normalise_headers, ParsedRows};
use crate::error::{AnalysisError, Result};
use crate::table::{parse_number_strict, RawRow, Scalar, SourceFormat};
use tracing::{debug, warn};

const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b'\t', b'|', b';'];
const SNIFF_LINES: usize = 10;

/// Picks the candidate that appears on every sampled line with the most
/// consistent count. Quoted text is ignored. Falls back to `,`.
pub fn detect_delimiter(text: &str) -> u8 {
    let lines: Vec<String> = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .take(SNIFF_LINES)
        .map(strip_quoted)
        .collect();
    if lines.is_empty() {
        return b',';
    }

    let mut best = (b',', 0usize);
    for delimiter in CANDIDATE_DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| line.bytes().filter(|b| *b == delimiter).count())
            .collect();
        let min_count = counts.iter().copied().min().unwrap_or(0);
        let max_count = counts.iter().copied().max().unwrap_or(0);
        if min_count == 0 {
            continue;
        }
        let consistency = match max_count - min_count {
            0 => 100,
            1 => 50,
            _ => 10,
        };
        let score = min_count * consistency;
        if score > best.1 {
            best = (delimiter, score);
        }
    }
    best.0
}

fn strip_quoted(line: &str) -> String {
    let mut in_quotes = false;
    line.chars()
        .filter(|ch| {
            if *ch == '"' {
                in_quotes = !in_quotes;
                return false;
            }
            !in_quotes
        })
        .collect()
}

/// Dynamic typing for one cell: blank is null, finite numbers become numbers,
/// anything else stays text.
pub fn coerce_cell(raw: &str) -> Scalar {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Scalar::Null;
    }
    match parse_number_strict(trimmed) {
        Some(number) => Scalar::Number(number),
        None => Scalar::Text(trimmed.to_string()),
    }
}

pub fn parse(bytes: &[u8]) -> Result<ParsedRows> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_start_matches('\u{feff}');
    let delimiter = detect_delimiter(text);
    debug!(delimiter = %(delimiter as char).escape_default(), "Detected delimiter");

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut warnings = Vec::new();
    let raw_headers = reader
        .headers()
        .map_err(|e| AnalysisError::parse(SourceFormat::Delimited, e.to_string()))?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    let headers = normalise_headers(raw_headers, &mut warnings);

    let mut records = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let row_number = index + 1;
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let message = format!("Row {row_number}: skipped unreadable row ({e})");
                warn!("{message}");
                warnings.push(message);
                continue;
            }
        };
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        if record.len() != headers.len() {
            let message = format!(
                "Row {row_number}: expected {} fields, found {}",
                headers.len(),
                record.len()
            );
            warn!("{message}");
            warnings.push(message);
        }
        let row: RawRow = headers
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let value = record.get(i).map(coerce_cell).unwrap_or(Scalar::Null);
                (name.clone(), value)
            })
            .collect();
        records.push(row);
    }

    Ok(ParsedRows { records, warnings })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_each_candidate_delimiter() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3\n"), b',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3\n"), b'\t');
        assert_eq!(detect_delimiter("a|b\n1|2\n"), b'|');
        assert_eq!(detect_delimiter("a;b;c\n1,5;2,5;3\n"), b';');
        assert_eq!(detect_delimiter("single\n1\n2\n"), b',');
    }

    #[test]
    fn quoted_delimiters_do_not_count() {
        let text = "name;note\n\"Smith, J\";\"a, b, c\"\n\"Doe, K\";\"d\"\n";
        assert_eq!(detect_delimiter(text), b';');
    }

    #[test]
    fn coerces_numbers_and_keeps_text() {
        assert_eq!(coerce_cell(" 42 "), Scalar::Number(42.0));
        assert_eq!(coerce_cell("-1.5e3"), Scalar::Number(-1500.0));
        assert_eq!(coerce_cell(""), Scalar::Null);
        assert_eq!(coerce_cell("1,000"), Scalar::Text("1,000".into()));
        assert_eq!(coerce_cell("NaN"), Scalar::Text("NaN".into()));
        assert_eq!(coerce_cell("F"), Scalar::Text("F".into()));
    }

    #[test]
    fn pads_short_rows_and_skips_blank_lines() {
        let parsed = parse(b"id,age,gender\n1,34,F\n\n2,41\n,,\n3,29,M\n").unwrap();
        assert_eq!(parsed.records.len(), 3);
        assert_eq!(parsed.records[1]["gender"], Scalar::Null);
        assert_eq!(parsed.records[2]["age"], Scalar::Number(29.0));
        assert_eq!(parsed.warnings.len(), 1);
    }

    #[test]
    fn strips_byte_order_mark_from_first_header() {
        let parsed = parse("\u{feff}id\tscore\n1\t0.5\n".as_bytes()).unwrap();
        assert!(parsed.records[0].contains_key("id"));
        assert_eq!(parsed.records[0]["score"], Scalar::Number(0.5));
    }
}
