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

//! Client side of the external ethical-analysis collaborator.
//!
//! The collaborator is a black box: statistics go in, a structured
//! assessment comes out. Failures are reported as [`EthicsError`] and the
//! caller decides how to degrade.

use crate::config::EthicsClientConfig;
use crate::statistics::DatasetStatistics;
use async_trait::async_trait;
use ethics_contracts::{
    EthicalAnalysis, EthicsError, EthicsRequest, EthicsResult, ProjectContext,
};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

#[async_trait]
pub trait EthicalAnalysisService: Send + Sync {
    async fn analyze_ethics(
        &self,
        statistics: &DatasetStatistics,
        context: &ProjectContext,
    ) -> EthicsResult<EthicalAnalysis>;

    fn name(&self) -> &str {
        "ethics"
    }
}

#[derive(Debug, Clone)]
pub struct HttpEthicsClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpEthicsClient {
    pub fn new(config: &EthicsClientConfig) -> EthicsResult<Self> {
        let endpoint = config
            .endpoint
            .clone()
            .filter(|endpoint| !endpoint.trim().is_empty())
            .ok_or_else(|| {
                EthicsError::Configuration("no ethical analysis endpoint configured".to_string())
            })?;
        let timeout = Duration::from_secs(config.timeout_seconds);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EthicsError::Configuration(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl EthicalAnalysisService for HttpEthicsClient {
    async fn analyze_ethics(
        &self,
        statistics: &DatasetStatistics,
        context: &ProjectContext,
    ) -> EthicsResult<EthicalAnalysis> {
        let request = EthicsRequest::new(statistics, context);
        debug!(
            endpoint = %self.endpoint,
            project = %context.project_identifier,
            "Requesting ethical analysis"
        );

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = match tokio::time::timeout(self.timeout, builder.send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) if e.is_timeout() => {
                return Err(EthicsError::Timeout(self.timeout.as_secs()));
            }
            Ok(Err(e)) => return Err(EthicsError::Unavailable(e.to_string())),
            Err(_) => return Err(EthicsError::Timeout(self.timeout.as_secs())),
        };

        let status = response.status();
        info!("Received response from ethical analysis service: {}", status);
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("failed to read error body: {e}"));
            warn!(status = status.as_u16(), "Ethical analysis request failed");
            return Err(EthicsError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let analysis = response
            .json::<EthicalAnalysis>()
            .await
            .map_err(|e| EthicsError::Serialisation(format!("Failed to parse response: {e}")))?;
        Ok(analysis.normalised())
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Stand-in used when no endpoint is configured. Always unavailable, so the
/// caller falls back to the statistics-only verdict.
#[derive(Debug, Clone, Default)]
pub struct UnconfiguredEthicsService;

#[async_trait]
impl EthicalAnalysisService for UnconfiguredEthicsService {
    async fn analyze_ethics(
        &self,
        _statistics: &DatasetStatistics,
        _context: &ProjectContext,
    ) -> EthicsResult<EthicalAnalysis> {
        Err(EthicsError::Unavailable(
            "no ethical analysis endpoint configured".to_string(),
        ))
    }

    fn name(&self) -> &str {
        "unconfigured"
    }
}
