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

//! Policy thresholds for the analysis engine.
//!
//! Every cutoff the heuristics use lives here so tests and deployments can
//! move them without touching the components. Partial YAML files are accepted;
//! omitted fields keep their defaults.

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

const MEGABYTE: u64 = 1024 * 1024;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub limits: FileLimits,
    pub inference: InferenceThresholds,
    pub privacy: PrivacyThresholds,
    pub bias: BiasThresholds,
    pub summary: SummaryConfig,
    pub suitability: SuitabilityThresholds,
    pub ethics: EthicsClientConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLimits {
    pub max_file_size_bytes: u64,
    pub warn_file_size_bytes: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceThresholds {
    /// Share of non-null values that must parse as numbers.
    pub numeric_ratio: f64,
    /// `unique / non_null` must stay below this for a categorical column.
    pub categorical_ratio: f64,
    pub categorical_max_unique: usize,
    /// Enables the datetime and boolean classes.
    pub detect_extended_types: bool,
    pub temporal_formats: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacyThresholds {
    pub identifier_ratio: f64,
    pub quasi_identifier_ratio: f64,
    pub identifier_patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BiasThresholds {
    pub demographic_pattern: String,
    pub small_group_pct: f64,
    pub dominant_group_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub top_values: usize,
    pub outlier_iqr_multiplier: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuitabilityThresholds {
    pub suitable_score: f64,
    pub review_score: f64,
    pub identifier_penalty: f64,
    pub identifier_penalty_cap: f64,
    pub concern_penalty: f64,
    pub small_group_penalty: f64,
    pub small_group_penalty_cap: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EthicsClientConfig {
    pub endpoint: Option<String>,
    pub timeout_seconds: u64,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
}

impl Default for FileLimits {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 100 * MEGABYTE,
            warn_file_size_bytes: 50 * MEGABYTE,
        }
    }
}

impl Default for InferenceThresholds {
    fn default() -> Self {
        Self {
            numeric_ratio: 0.8,
            categorical_ratio: 0.1,
            categorical_max_unique: 50,
            detect_extended_types: false,
            temporal_formats: vec![
                "%Y-%m-%d".to_string(),
                "%Y-%m-%d %H:%M:%S".to_string(),
                "%Y-%m-%dT%H:%M:%S".to_string(),
                "%Y-%m-%dT%H:%M:%SZ".to_string(),
                "%m/%d/%Y".to_string(),
                "%d/%m/%Y".to_string(),
            ],
        }
    }
}

impl Default for PrivacyThresholds {
    fn default() -> Self {
        Self {
            identifier_ratio: 0.95,
            quasi_identifier_ratio: 0.3,
            identifier_patterns: vec![
                "id|identifier|key".to_string(),
                "name|firstname|lastname".to_string(),
                "email|mail".to_string(),
                "phone|tel".to_string(),
            ],
        }
    }
}

impl Default for BiasThresholds {
    fn default() -> Self {
        Self {
            demographic_pattern: "gender|sex|age|race|country|income|education".to_string(),
            small_group_pct: 5.0,
            dominant_group_pct: 80.0,
        }
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            top_values: 5,
            outlier_iqr_multiplier: 1.5,
        }
    }
}

impl Default for SuitabilityThresholds {
    fn default() -> Self {
        Self {
            suitable_score: 70.0,
            review_score: 40.0,
            identifier_penalty: 10.0,
            identifier_penalty_cap: 30.0,
            concern_penalty: 5.0,
            small_group_penalty: 2.0,
            small_group_penalty_cap: 10.0,
        }
    }
}

impl Default for EthicsClientConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            timeout_seconds: 20,
            api_key: None,
        }
    }
}

impl AnalysisConfig {
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents =
            std::fs::read_to_string(path).map_err(|source| ConfigError::ConfigFileError {
                path: path.display().to_string(),
                source,
            })?;
        Self::from_yaml_str(&contents)
    }

    /// Flags more columns: lower identifier ratio, wider small-group band.
    pub fn strict() -> Self {
        Self {
            privacy: PrivacyThresholds {
                identifier_ratio: 0.9,
                quasi_identifier_ratio: 0.2,
                ..Default::default()
            },
            bias: BiasThresholds {
                small_group_pct: 10.0,
                dominant_group_pct: 70.0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn lenient() -> Self {
        Self {
            inference: InferenceThresholds {
                numeric_ratio: 0.7,
                ..Default::default()
            },
            privacy: PrivacyThresholds {
                quasi_identifier_ratio: 0.5,
                ..Default::default()
            },
            bias: BiasThresholds {
                small_group_pct: 2.0,
                dominant_group_pct: 90.0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        check_ratio("inference.numeric_ratio", self.inference.numeric_ratio)?;
        check_ratio("inference.categorical_ratio", self.inference.categorical_ratio)?;
        check_ratio("privacy.identifier_ratio", self.privacy.identifier_ratio)?;
        check_ratio(
            "privacy.quasi_identifier_ratio",
            self.privacy.quasi_identifier_ratio,
        )?;
        if self.privacy.quasi_identifier_ratio >= self.privacy.identifier_ratio {
            return Err(ConfigError::ConflictingOptions {
                details: "privacy.quasi_identifier_ratio must be below privacy.identifier_ratio"
                    .to_string(),
            });
        }
        check_percentage("bias.small_group_pct", self.bias.small_group_pct)?;
        check_percentage("bias.dominant_group_pct", self.bias.dominant_group_pct)?;
        check_percentage("suitability.suitable_score", self.suitability.suitable_score)?;
        check_percentage("suitability.review_score", self.suitability.review_score)?;
        if self.suitability.review_score > self.suitability.suitable_score {
            return Err(ConfigError::ConflictingOptions {
                details: "suitability.review_score must not exceed suitability.suitable_score"
                    .to_string(),
            });
        }
        if self.limits.warn_file_size_bytes > self.limits.max_file_size_bytes {
            return Err(ConfigError::ConflictingOptions {
                details: "limits.warn_file_size_bytes must not exceed limits.max_file_size_bytes"
                    .to_string(),
            });
        }
        if self.summary.top_values == 0 {
            return Err(invalid("summary.top_values", 0));
        }
        if self.ethics.timeout_seconds == 0 {
            return Err(invalid("ethics.timeout_seconds", 0));
        }
        Ok(())
    }
}

fn invalid(field: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidThreshold {
        field: field.to_string(),
        value: value.to_string(),
    }
}

fn check_ratio(field: &str, value: f64) -> ConfigResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, value))
    }
}

fn check_percentage(field: &str, value: f64) -> ConfigResult<()> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(invalid(field, value))
    }
}
