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

//! One user's sequence of uploads and the latest assessment they produced.
//!
//! Each submission gets a generation number. A newer submission cancels the
//! ethics call of the one before it, and only the current generation may
//! store its outcome. The generation only changes while `in_flight` is held,
//! so checks made under that lock cannot race a newer submission.

use crate::analyzer::DatasetAnalyzer;
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, ConfigError, Result};
use crate::ethics::{EthicalAnalysisService, HttpEthicsClient, UnconfiguredEthicsService};
use crate::statistics::DatasetStatistics;
use crate::suitability::{SuitabilityAssessor, SuitabilitySignal};
use ethics_contracts::{EthicalAnalysis, EthicsError, ProjectContext};
use serde::Serialize;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentOutcome {
    pub statistics: DatasetStatistics,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ethical_analysis: Option<EthicalAnalysis>,
    pub suitability: SuitabilitySignal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ethics_error: Option<String>,
}

impl AssessmentOutcome {
    pub fn is_degraded(&self) -> bool {
        self.ethical_analysis.is_none()
    }
}

pub struct AnalysisSession {
    analyzer: DatasetAnalyzer,
    ethics: Arc<dyn EthicalAnalysisService>,
    context: ProjectContext,
    suitability: SuitabilityAssessor,
    ethics_timeout: Duration,
    generation: AtomicU64,
    in_flight: Mutex<Option<(u64, CancellationToken)>>,
    current: RwLock<Option<Arc<AssessmentOutcome>>>,
}

impl AnalysisSession {
    pub fn new(
        analyzer: DatasetAnalyzer,
        ethics: Arc<dyn EthicalAnalysisService>,
        context: ProjectContext,
    ) -> Self {
        let config = analyzer.config();
        let suitability = SuitabilityAssessor::new(config.suitability.clone());
        let ethics_timeout = Duration::from_secs(config.ethics.timeout_seconds);
        Self {
            analyzer,
            ethics,
            context,
            suitability,
            ethics_timeout,
            generation: AtomicU64::new(0),
            in_flight: Mutex::new(None),
            current: RwLock::new(None),
        }
    }

    /// Builds the analyzer and picks the HTTP client when a non-blank
    /// endpoint is set.
    pub fn from_config(config: AnalysisConfig, context: ProjectContext) -> Result<Self> {
        let endpoint = config
            .ethics
            .endpoint
            .as_deref()
            .filter(|endpoint| !endpoint.trim().is_empty());
        let ethics: Arc<dyn EthicalAnalysisService> = match endpoint {
            Some(_) => Arc::new(
                HttpEthicsClient::new(&config.ethics)
                    .map_err(|e| ConfigError::EthicsClient(e.to_string()))?,
            ),
            None => Arc::new(UnconfiguredEthicsService),
        };
        let analyzer = DatasetAnalyzer::with_config(config)?;
        Ok(Self::new(analyzer, ethics, context))
    }

    pub fn context(&self) -> &ProjectContext {
        &self.context
    }

    pub async fn submit<P: AsRef<Path>>(&self, path: P) -> Result<Arc<AssessmentOutcome>> {
        let (generation, token) = self.begin().await;
        let statistics = self.analyzer.analyze_dataset(path).await;
        self.finish(generation, token, statistics).await
    }

    pub async fn submit_bytes(
        &self,
        file_name: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Arc<AssessmentOutcome>> {
        let (generation, token) = self.begin().await;
        let statistics = self.analyzer.analyze_upload(file_name.into(), bytes).await;
        self.finish(generation, token, statistics).await
    }

    /// Abandons whatever submission is in flight. The stored outcome is kept.
    pub async fn cancel(&self) {
        let mut in_flight = self.in_flight.lock().await;
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some((_, token)) = in_flight.take() {
            token.cancel();
        }
    }

    pub async fn current(&self) -> Option<Arc<AssessmentOutcome>> {
        self.current.read().await.clone()
    }

    async fn begin(&self) -> (u64, CancellationToken) {
        let mut in_flight = self.in_flight.lock().await;
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let token = CancellationToken::new();
        if let Some((previous, stale)) = in_flight.replace((generation, token.clone())) {
            debug!(generation, superseded = previous, "Cancelling superseded analysis");
            stale.cancel();
        }
        (generation, token)
    }

    async fn release(&self, generation: u64) {
        let mut in_flight = self.in_flight.lock().await;
        if self.is_current(generation) {
            in_flight.take();
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    async fn finish(
        &self,
        generation: u64,
        token: CancellationToken,
        statistics: Result<DatasetStatistics>,
    ) -> Result<Arc<AssessmentOutcome>> {
        if !self.is_current(generation) {
            return Err(AnalysisError::Superseded);
        }
        let statistics = match statistics {
            Ok(statistics) => statistics,
            Err(e) => {
                self.release(generation).await;
                return Err(e);
            }
        };

        let ethics = tokio::select! {
            _ = token.cancelled() => Err(EthicsError::Cancelled),
            result = tokio::time::timeout(
                self.ethics_timeout,
                self.ethics.analyze_ethics(&statistics, &self.context),
            ) => result.unwrap_or(Err(EthicsError::Timeout(self.ethics_timeout.as_secs()))),
        };

        let outcome = match ethics {
            Ok(analysis) => AssessmentOutcome {
                suitability: self.suitability.from_analysis(&analysis),
                ethical_analysis: Some(analysis),
                ethics_error: None,
                statistics,
            },
            Err(e) => {
                warn!(
                    service = self.ethics.name(),
                    error = %e,
                    "Ethical analysis unavailable, using statistics-only suitability"
                );
                AssessmentOutcome {
                    suitability: self.suitability.from_statistics(&statistics),
                    ethical_analysis: None,
                    ethics_error: Some(e.to_string()),
                    statistics,
                }
            }
        };

        let mut in_flight = self.in_flight.lock().await;
        if !self.is_current(generation) {
            return Err(AnalysisError::Superseded);
        }
        let outcome = Arc::new(outcome);
        *self.current.write().await = Some(Arc::clone(&outcome));
        in_flight.take();
        drop(in_flight);
        info!(
            generation,
            score = outcome.suitability.score,
            degraded = outcome.is_degraded(),
            "Assessment stored"
        );
        Ok(outcome)
    }
}
