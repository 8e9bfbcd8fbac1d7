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
use crate::table::{RawRow, Scalar, SourceFormat};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::Timelike;
use std::io::Cursor;
use tracing::debug;

/// Reads the first sheet; its first non-empty row is the header.
pub fn parse(bytes: &[u8]) -> Result<ParsedRows> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| AnalysisError::parse(SourceFormat::Spreadsheet, e.to_string()))?;
    let sheet_names = workbook.sheet_names();
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => {
            range.map_err(|e| AnalysisError::parse(SourceFormat::Spreadsheet, e.to_string()))?
        }
        None => return Err(AnalysisError::empty("workbook has no sheets")),
    };
    debug!(
        sheet = sheet_names.first().map(String::as_str).unwrap_or_default(),
        rows = range.height(),
        columns = range.width(),
        "Read first worksheet"
    );
    Ok(rows_from_cells(range.rows()))
}

fn rows_from_cells<'a, I>(mut rows: I) -> ParsedRows
where
    I: Iterator<Item = &'a [Data]>,
{
    let Some(header_row) = rows.next() else {
        return ParsedRows::default();
    };
    let mut warnings = Vec::new();
    let headers = normalise_headers(header_row.iter().map(header_text), &mut warnings);
    let records = rows
        .filter(|row| !row.iter().all(is_blank))
        .map(|row| -> RawRow {
            headers
                .iter()
                .enumerate()
                .map(|(i, name)| {
                    let value = row.get(i).map(cell_to_scalar).unwrap_or(Scalar::Null);
                    (name.clone(), value)
                })
                .collect()
        })
        .collect();
    ParsedRows { records, warnings }
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Cells keep the type the workbook stored; nothing is re-parsed.
pub fn cell_to_scalar(cell: &Data) -> Scalar {
    match cell {
        Data::Empty | Data::Error(_) => Scalar::Null,
        Data::Int(v) => Scalar::Number(*v as f64),
        Data::Float(v) => Scalar::Number(*v),
        Data::Bool(b) => Scalar::Bool(*b),
        Data::String(s) if s.trim().is_empty() => Scalar::Null,
        Data::String(s) => Scalar::Text(s.clone()),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(value) if value.num_seconds_from_midnight() == 0 => {
                Scalar::Text(value.format("%Y-%m-%d").to_string())
            }
            Some(value) => Scalar::Text(value.format("%Y-%m-%dT%H:%M:%S").to_string()),
            None => Scalar::Number(dt.as_f64()),
        },
        other => Scalar::Text(other.to_string()),
    }
}
