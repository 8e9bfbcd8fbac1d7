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

use crate::table::SourceFormat;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Unsupported file format '.{extension}': {}", .kind.guidance())]
    UnsupportedFormat {
        extension: String,
        kind: UnsupportedKind,
    },
    #[error("File is {size} bytes, above the {limit} byte limit")]
    FileTooLarge { size: u64, limit: u64 },
    #[error("Empty dataset: {reason}")]
    EmptyDataset { reason: String },
    #[error("Failed to parse {format} data: {reason}")]
    Parse { format: SourceFormat, reason: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Analysis superseded by a newer upload")]
    Superseded,
    #[error("Analysis task failed: {0}")]
    Task(String),
}

/// Why an extension was refused, which decides where the user is sent next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedKind {
    /// Statistical or columnar formats the user can export to CSV.
    Convertible,
    /// Images, databases and documents; only a manual assessment applies.
    ManualOnly,
    Unknown,
}

impl UnsupportedKind {
    pub fn guidance(&self) -> &'static str {
        match self {
            UnsupportedKind::Convertible => {
                "export the data to CSV, TSV, JSON or Excel and upload it again"
            }
            UnsupportedKind::ManualOnly => {
                "this file cannot be analysed automatically, use the manual assessment instead"
            }
            UnsupportedKind::Unknown => {
                "supported formats are csv, tsv, txt, json, jsonl, xlsx and xls"
            }
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid threshold: {field} = {value}")]
    InvalidThreshold { field: String, value: String },
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Conflicting configuration options: {details}")]
    ConflictingOptions { details: String },
    #[error("Failed to read configuration file '{path}': {source}")]
    ConfigFileError {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Ethical analysis client could not be built: {0}")]
    EthicsClient(String),
    #[error("Failed to parse YAML configuration: {source}")]
    YamlParseError {
        #[from]
        source: serde_yaml::Error,
    },
}

pub type Result<T> = std::result::Result<T, AnalysisError>;
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

impl AnalysisError {
    pub fn parse(format: SourceFormat, reason: impl Into<String>) -> Self {
        AnalysisError::Parse {
            format,
            reason: reason.into(),
        }
    }

    pub fn empty(reason: impl Into<String>) -> Self {
        AnalysisError::EmptyDataset {
            reason: reason.into(),
        }
    }

    /// Retrying with the same input cannot succeed for anything but I/O and
    /// task failures.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AnalysisError::Io(_) | AnalysisError::Task(_))
    }

    /// The caller should route the user to the questionnaire path.
    pub fn requires_manual_assessment(&self) -> bool {
        matches!(
            self,
            AnalysisError::UnsupportedFormat {
                kind: UnsupportedKind::ManualOnly | UnsupportedKind::Unknown,
                ..
            }
        )
    }

    pub fn category(&self) -> &'static str {
        match self {
            AnalysisError::UnsupportedFormat { .. } => "Format",
            AnalysisError::FileTooLarge { .. } => "Size",
            AnalysisError::EmptyDataset { .. } | AnalysisError::Parse { .. } => "Data",
            AnalysisError::Io(_) => "I/O",
            AnalysisError::Config(_) => "Configuration",
            AnalysisError::Superseded | AnalysisError::Task(_) => "Runtime",
        }
    }

    pub fn suggestions(&self) -> Vec<String> {
        match self {
            AnalysisError::UnsupportedFormat { kind, .. } => vec![kind.guidance().to_string()],
            AnalysisError::FileTooLarge { limit, .. } => vec![
                format!("Upload a file smaller than {} MB", limit / (1024 * 1024)),
                "Sample or split the dataset before uploading".to_string(),
            ],
            AnalysisError::EmptyDataset { .. } => vec![
                "Check that the file has a header row and at least one data row".to_string(),
                "For spreadsheets, make sure the data is on the first sheet".to_string(),
            ],
            AnalysisError::Parse { .. } => vec![
                "Check the file is not truncated or corrupted".to_string(),
                "Re-export the data from the source application".to_string(),
            ],
            _ => vec!["Check the error message for specific guidance".to_string()],
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::EmptyDataset { .. } => {
                "The dataset appears to be empty. Please provide data with at least one row."
                    .to_string()
            }
            AnalysisError::FileTooLarge { limit, .. } => format!(
                "The file is too large to analyse. The maximum size is {} MB.",
                limit / (1024 * 1024)
            ),
            AnalysisError::UnsupportedFormat { extension, kind } => format!(
                "Files of type '.{extension}' are not supported: {}.",
                kind.guidance()
            ),
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_only_formats_route_to_manual_assessment() {
        let image = AnalysisError::UnsupportedFormat {
            extension: "png".into(),
            kind: UnsupportedKind::ManualOnly,
        };
        let stata = AnalysisError::UnsupportedFormat {
            extension: "dta".into(),
            kind: UnsupportedKind::Convertible,
        };
        assert!(image.requires_manual_assessment());
        assert!(!stata.requires_manual_assessment());
        assert!(!image.is_retryable());
        assert!(stata.to_string().contains("export the data to CSV"));
    }

    #[test]
    fn file_too_large_message_names_limit_in_megabytes() {
        let err = AnalysisError::FileTooLarge {
            size: 200 * 1024 * 1024,
            limit: 100 * 1024 * 1024,
        };
        assert!(err.user_message().contains("100 MB"));
        assert_eq!(err.category(), "Size");
    }
}
