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

use crate::bias::BiasDetector;
use crate::config::AnalysisConfig;
use crate::distribution::DistributionSummarizer;
use crate::error::{AnalysisError, Result};
use crate::inference::ColumnTypeInferencer;
use crate::metrics::{scan_column, BasicMetricsCalculator, ColumnProfile};
use crate::parser::FormatParser;
use crate::privacy::PrivacyRiskAssessor;
use crate::quality::QualityAssessor;
use crate::statistics::DatasetStatistics;
use crate::table::Table;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Runs every analysis stage over one file and assembles a [`DatasetStatistics`].
///
/// Cheap to clone; the configured detectors are shared.
#[derive(Debug, Clone)]
pub struct DatasetAnalyzer {
    inner: Arc<AnalyzerParts>,
}

#[derive(Debug)]
struct AnalyzerParts {
    config: AnalysisConfig,
    parser: FormatParser,
    inferencer: ColumnTypeInferencer,
    privacy: PrivacyRiskAssessor,
    bias: BiasDetector,
    summarizer: DistributionSummarizer,
}

impl DatasetAnalyzer {
    pub fn new() -> Self {
        Self::from_parts(
            AnalysisConfig::default(),
            PrivacyRiskAssessor::default(),
            BiasDetector::default(),
        )
    }

    pub fn with_config(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        let privacy = PrivacyRiskAssessor::new(&config.privacy)?;
        let bias = BiasDetector::new(&config.bias)?;
        Ok(Self::from_parts(config, privacy, bias))
    }

    fn from_parts(config: AnalysisConfig, privacy: PrivacyRiskAssessor, bias: BiasDetector) -> Self {
        let parts = AnalyzerParts {
            parser: FormatParser::new(config.limits.clone()),
            inferencer: ColumnTypeInferencer::new(config.inference.clone()),
            summarizer: DistributionSummarizer::new(config.summary.clone()),
            privacy,
            bias,
            config,
        };
        Self {
            inner: Arc::new(parts),
        }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.inner.config
    }

    /// Async entry point. Parsing and profiling run on the blocking pool.
    pub async fn analyze_dataset<P: AsRef<Path>>(&self, path: P) -> Result<DatasetStatistics> {
        let analyzer = self.clone();
        let path: PathBuf = path.as_ref().to_path_buf();
        tokio::task::spawn_blocking(move || analyzer.analyze_file(&path))
            .await
            .map_err(|e| AnalysisError::Task(e.to_string()))?
    }

    /// Async variant of [`DatasetAnalyzer::analyze_bytes`].
    pub async fn analyze_upload(
        &self,
        file_name: String,
        bytes: Vec<u8>,
    ) -> Result<DatasetStatistics> {
        let analyzer = self.clone();
        tokio::task::spawn_blocking(move || analyzer.analyze_bytes(&file_name, &bytes))
            .await
            .map_err(|e| AnalysisError::Task(e.to_string()))?
    }

    pub fn analyze_file<P: AsRef<Path>>(&self, path: P) -> Result<DatasetStatistics> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Starting dataset analysis");
        let table = self.inner.parser.parse_path(path)?;
        Ok(self.analyze_table(&table))
    }

    pub fn analyze_bytes(&self, file_name: &str, bytes: &[u8]) -> Result<DatasetStatistics> {
        debug!(file = file_name, "Starting dataset analysis");
        let table = self.inner.parser.parse_bytes(file_name, bytes)?;
        Ok(self.analyze_table(&table))
    }

    /// Analyses an already parsed table. Infallible: every stage has a
    /// defined result for any non-empty table.
    pub fn analyze_table(&self, table: &Table) -> DatasetStatistics {
        let column_analysis = self.profile_columns(table);
        debug!(columns = column_analysis.len(), "Column profiling complete");

        let basic_metrics = BasicMetricsCalculator::calculate(table, &column_analysis);
        let quality_assessment = QualityAssessor::assess(&column_analysis, table.row_count());
        debug!(
            completeness = quality_assessment.completeness_score,
            consistency = quality_assessment.consistency_score,
            "Quality assessed"
        );
        let privacy_risks = self
            .inner
            .privacy
            .assess(&column_analysis, quality_assessment.uniqueness_ratio);
        let bias_indicators = self.inner.bias.detect(table, &column_analysis);
        let distribution_stats = self.inner.summarizer.summarize(table, &column_analysis);

        info!(
            rows = basic_metrics.total_rows,
            columns = basic_metrics.total_columns,
            identifiers = privacy_risks.potential_identifiers.len(),
            concerns = bias_indicators.representation_concerns.len(),
            "Dataset analysis complete"
        );

        DatasetStatistics {
            basic_metrics,
            column_analysis,
            distribution_stats,
            quality_assessment,
            bias_indicators,
            privacy_risks,
            source_format: table.format(),
            warnings: table.warnings().to_vec(),
        }
    }

    /// Profiles are returned in column order.
    pub fn profile_columns(&self, table: &Table) -> Vec<ColumnProfile> {
        let total_rows = table.row_count();
        table
            .column_names()
            .par_iter()
            .enumerate()
            .map(|(index, name)| {
                let values = table.column_values(index);
                let scan = scan_column(&values);
                let column_type = self.inner.inferencer.infer(&values);
                let uniqueness = if total_rows == 0 {
                    0.0
                } else {
                    scan.unique_count as f64 / total_rows as f64
                };
                ColumnProfile {
                    name: name.clone(),
                    column_type,
                    null_count: scan.null_count,
                    unique_count: scan.unique_count,
                    total_rows,
                    potential_identifier: self
                        .inner
                        .privacy
                        .is_potential_identifier(name, uniqueness),
                }
            })
            .collect()
    }

    pub fn export_json(statistics: &DatasetStatistics) -> Result<String> {
        serde_json::to_string_pretty(statistics)
            .map_err(|e| AnalysisError::Task(format!("Failed to serialise statistics: {e}")))
    }
}

impl Default for DatasetAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::ColumnType;

    fn survey_csv() -> String {
        let mut csv = String::from("id,age,gender,outcome\n");
        for i in 0..100 {
            let gender = if i % 2 == 0 { "M" } else { "F" };
            let outcome = if i % 3 == 0 { "yes" } else { "no" };
            csv.push_str(&format!("{},{},{},{}\n", i + 1, 20 + i % 40, gender, outcome));
        }
        csv
    }

    #[test]
    fn analyses_balanced_survey() {
        let stats = DatasetAnalyzer::new()
            .analyze_bytes("survey.csv", survey_csv().as_bytes())
            .unwrap();

        assert_eq!(stats.basic_metrics.total_rows, 100);
        assert_eq!(stats.basic_metrics.total_columns, 4);
        assert_eq!(stats.quality_assessment.completeness_score, 100.0);
        assert_eq!(stats.privacy_risks.potential_identifiers, vec!["id"]);
        assert!(stats.bias_indicators.small_group_sizes.is_empty());
        assert!(stats.bias_indicators.representation_concerns.is_empty());
        assert_eq!(stats.profile("gender").unwrap().column_type, ColumnType::Categorical);
        assert!(stats.bias_indicators.demographic_balance.contains_key("gender"));
    }

    #[test]
    fn profiles_follow_column_order() {
        let stats = DatasetAnalyzer::new()
            .analyze_bytes("survey.csv", survey_csv().as_bytes())
            .unwrap();
        let names: Vec<_> = stats.column_analysis.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["id", "age", "gender", "outcome"]);
        let missing: Vec<_> = stats.basic_metrics.missing_values.keys().cloned().collect();
        assert_eq!(missing, names);
    }

    #[test]
    fn rejects_invalid_configuration() {
        let mut config = AnalysisConfig::default();
        config.bias.demographic_pattern = "(unclosed".to_string();
        assert!(matches!(
            DatasetAnalyzer::with_config(config),
            Err(AnalysisError::Config(_))
        ));
    }

    #[tokio::test]
    async fn async_entry_point_reports_missing_file() {
        let result = DatasetAnalyzer::new()
            .analyze_dataset("/nonexistent/data.csv")
            .await;
        assert!(matches!(result, Err(AnalysisError::Io(_))));
    }
}
