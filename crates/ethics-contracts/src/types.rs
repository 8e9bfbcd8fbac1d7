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

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Deserialised leniently: casing is ignored and unknown labels read as `Medium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// Coarse verdict on whether a dataset can back an AI project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuitabilityLevel {
    Suitable,
    NeedsReview,
    Unsuitable,
}

/// `High` when the collaborator answered, `Low` for statistics-only verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Low,
}

#[derive(Debug, Error)]
pub enum EthicsError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Ethical analysis service unavailable: {0}")]
    Unavailable(String),

    #[error("Ethical analysis service returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Serialisation error: {0}")]
    Serialisation(String),

    #[error("Timeout error after {0} seconds")]
    Timeout(u64),

    #[error("Ethical analysis cancelled")]
    Cancelled,
}

pub type EthicsResult<T> = Result<T, EthicsError>;

impl EthicsError {
    /// Whether the same request could succeed if sent again later.
    pub fn is_retryable(&self) -> bool {
        match self {
            EthicsError::Unavailable(_) | EthicsError::Timeout(_) | EthicsError::Cancelled => true,
            EthicsError::Http { status, .. } => *status >= 500 || *status == 429,
            EthicsError::Configuration(_) | EthicsError::Serialisation(_) => false,
        }
    }
}

impl From<String> for RiskLevel {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "low" => RiskLevel::Low,
            "medium" => RiskLevel::Medium,
            "high" => RiskLevel::High,
            "critical" => RiskLevel::Critical,
            _ => RiskLevel::Medium,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        };
        f.write_str(label)
    }
}

impl fmt::Display for SuitabilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SuitabilityLevel::Suitable => "suitable",
            SuitabilityLevel::NeedsReview => "needs review",
            SuitabilityLevel::Unsuitable => "unsuitable",
        };
        f.write_str(label)
    }
}
