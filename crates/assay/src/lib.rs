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

pub mod analyzer;
pub mod bias;
pub mod config;
pub mod distribution;
pub mod error;
pub mod ethics;
pub mod inference;
pub mod metrics;
pub mod parser;
pub mod privacy;
pub mod quality;
pub mod session;
pub mod statistics;
pub mod suitability;
pub mod table;

pub use analyzer::DatasetAnalyzer;
pub use bias::{BiasDetector, BiasIndicators, GroupShare};
pub use config::{
    AnalysisConfig, BiasThresholds, EthicsClientConfig, FileLimits, InferenceThresholds,
    PrivacyThresholds, SuitabilityThresholds, SummaryConfig,
};
pub use distribution::{
    CategoricalSummary, DistributionStats, DistributionSummarizer, NumericSummary,
};
pub use error::{AnalysisError, ConfigError, ConfigResult, Result, UnsupportedKind};
pub use ethics::{EthicalAnalysisService, HttpEthicsClient, UnconfiguredEthicsService};
pub use inference::{ColumnType, ColumnTypeInferencer};
pub use metrics::{BasicMetrics, BasicMetricsCalculator, ColumnProfile};
pub use parser::FormatParser;
pub use privacy::{PrivacyRiskAssessor, PrivacyRisks};
pub use quality::{QualityAssessment, QualityAssessor};
pub use session::{AnalysisSession, AssessmentOutcome};
pub use statistics::DatasetStatistics;
pub use suitability::{SuitabilityAssessor, SuitabilitySignal};
pub use table::{RawRow, Scalar, SourceFormat, Table, ValueCount};

/// Analyses one file with the default configuration.
pub async fn analyze_dataset<P: AsRef<std::path::Path>>(path: P) -> Result<DatasetStatistics> {
    DatasetAnalyzer::new().analyze_dataset(path).await
}
