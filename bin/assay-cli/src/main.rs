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

mod cli;

use anyhow::{Context, Result};
use assay::{AnalysisConfig, AnalysisSession, AssessmentOutcome, ColumnProfile, DatasetAnalyzer};
use clap::Parser;
use cli::{Args, Preset};
use ethics_contracts::ProjectContext;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const ENDPOINT_VAR: &str = "ASSAY_ETHICS_ENDPOINT";
const API_KEY_VAR: &str = "ASSAY_ETHICS_API_KEY";

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let level = args.log_level.map(|level| level.as_str()).unwrap_or("warn");
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&args)?;
    let context = args
        .project
        .clone()
        .map(ProjectContext::new)
        .unwrap_or_else(ProjectContext::anonymous);
    debug!(project = %context.project_identifier, "Project context");

    let session = if args.statistics_only {
        let analyzer = DatasetAnalyzer::with_config(config)?;
        AnalysisSession::new(
            analyzer,
            Arc::new(assay::UnconfiguredEthicsService),
            context,
        )
    } else {
        AnalysisSession::from_config(config, context)?
    };

    let outcome = session.submit(&args.file).await.map_err(|e| {
        let mut message = e.user_message();
        for suggestion in e.suggestions() {
            message.push_str(&format!("\n  - {suggestion}"));
        }
        anyhow::anyhow!(message)
    })?;
    info!(file = %args.file.display(), "Analysis finished");

    if args.json {
        println!("{}", serde_json::to_string_pretty(outcome.as_ref())?);
    } else {
        print_report(&outcome);
    }
    Ok(())
}

fn load_config(args: &Args) -> Result<AnalysisConfig> {
    let mut config = match (&args.config, args.preset) {
        (Some(path), _) => AnalysisConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        (None, Some(Preset::Strict)) => AnalysisConfig::strict(),
        (None, Some(Preset::Lenient)) => AnalysisConfig::lenient(),
        (None, _) => AnalysisConfig::default(),
    };
    if let Some(endpoint) = args
        .ethics_endpoint
        .clone()
        .or_else(|| std::env::var(ENDPOINT_VAR).ok())
    {
        config.ethics.endpoint = Some(endpoint);
    }
    if config.ethics.api_key.is_none() {
        config.ethics.api_key = std::env::var(API_KEY_VAR).ok();
    }
    Ok(config)
}

fn print_report(outcome: &AssessmentOutcome) {
    let stats = &outcome.statistics;
    let metrics = &stats.basic_metrics;
    let quality = &stats.quality_assessment;

    println!(
        "Dataset: {} rows x {} columns ({})",
        metrics.total_rows, metrics.total_columns, stats.source_format
    );
    println!("Duplicate rows: {}", metrics.duplicate_rows);
    println!(
        "Completeness: {:.0}%  Consistency: {:.0}%",
        quality.completeness_score, quality.consistency_score
    );

    println!("\nColumns:");
    for profile in &stats.column_analysis {
        let marker = column_marker(profile);
        println!(
            "  {:<24} {:<12} nulls={:<6} unique={}{}",
            profile.name, profile.column_type, profile.null_count, profile.unique_count, marker
        );
    }

    let privacy = &stats.privacy_risks;
    if !privacy.quasi_identifiers.is_empty() {
        println!(
            "\nQuasi-identifiers ({}): {}",
            privacy.detection,
            privacy.quasi_identifiers.join(", ")
        );
    }
    let bias = &stats.bias_indicators;
    for group in &bias.small_group_sizes {
        println!("  ! small group {group}");
    }
    for concern in &bias.representation_concerns {
        println!("  ! {concern}");
    }
    for warning in &stats.warnings {
        println!("  warning: {warning}");
    }

    let suitability = &outcome.suitability;
    println!(
        "\nSuitability: {} ({:.0}/100, {:?} confidence)",
        suitability.level, suitability.score, suitability.confidence
    );
    for reason in &suitability.rationale {
        println!("  - {reason}");
    }
    if let Some(error) = &outcome.ethics_error {
        println!("\nEthical analysis unavailable: {error}");
    }
}

/// Name-pattern and uniqueness matches are leads for review, not confirmed
/// personal data.
fn column_marker(profile: &ColumnProfile) -> &'static str {
    if profile.potential_identifier {
        " [pattern-flagged identifier]"
    } else {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assay::ColumnType;

    fn profile(potential_identifier: bool) -> ColumnProfile {
        ColumnProfile {
            name: "email".to_string(),
            column_type: ColumnType::Text,
            null_count: 0,
            unique_count: 10,
            total_rows: 10,
            potential_identifier,
        }
    }

    #[test]
    fn identifiers_are_reported_as_pattern_flagged() {
        assert_eq!(column_marker(&profile(true)), " [pattern-flagged identifier]");
        assert_eq!(column_marker(&profile(false)), "");
    }
}
