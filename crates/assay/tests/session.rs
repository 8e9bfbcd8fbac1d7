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

use assay::{
    AnalysisConfig, AnalysisError, AnalysisSession, DatasetAnalyzer, DatasetStatistics,
    EthicalAnalysisService, EthicsClientConfig, HttpEthicsClient,
};
use async_trait::async_trait;
use ethics_contracts::{
    BiasAssessment, Confidence, EthicalAnalysis, EthicsError, EthicsResult, PrivacyAssessment,
    ProjectContext, RiskLevel, SuitabilityLevel,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CSV: &[u8] = b"region,households\nnorth,10\nsouth,10\nnorth,20\n";

fn analysis(score: f64) -> EthicalAnalysis {
    EthicalAnalysis {
        suitability_score: score,
        overall_risk_level: RiskLevel::Low,
        privacy_assessment: PrivacyAssessment {
            risk_level: RiskLevel::Low,
            concerns: vec![],
            mitigations: vec![],
        },
        bias_assessment: BiasAssessment {
            risk_level: RiskLevel::Low,
            concerns: vec![],
            affected_groups: vec![],
        },
        recommendations: vec![],
        generated_at: None,
    }
}

struct FailingService;

#[async_trait]
impl EthicalAnalysisService for FailingService {
    async fn analyze_ethics(
        &self,
        _statistics: &DatasetStatistics,
        _context: &ProjectContext,
    ) -> EthicsResult<EthicalAnalysis> {
        Err(EthicsError::Unavailable("connection refused".to_string()))
    }
}

/// Answers after `delay`, counting how many calls it has seen.
struct SlowService {
    delay: Duration,
    calls: AtomicUsize,
}

#[async_trait]
impl EthicalAnalysisService for SlowService {
    async fn analyze_ethics(
        &self,
        _statistics: &DatasetStatistics,
        _context: &ProjectContext,
    ) -> EthicsResult<EthicalAnalysis> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call == 0 {
            tokio::time::sleep(self.delay).await;
        }
        Ok(analysis(80.0 + call as f64))
    }
}

fn session(service: Arc<dyn EthicalAnalysisService>) -> AnalysisSession {
    AnalysisSession::new(DatasetAnalyzer::new(), service, ProjectContext::new("proj-7"))
}

#[tokio::test]
async fn service_failure_keeps_statistics_and_falls_back() {
    let session = session(Arc::new(FailingService));
    let outcome = session.submit_bytes("data.csv", CSV.to_vec()).await.unwrap();

    assert_eq!(outcome.statistics.basic_metrics.total_rows, 3);
    assert!(outcome.ethical_analysis.is_none());
    assert!(outcome
        .ethics_error
        .as_deref()
        .is_some_and(|e| e.contains("connection refused")));
    assert_eq!(outcome.suitability.confidence, Confidence::Low);
    assert_eq!(outcome.suitability.level, SuitabilityLevel::Suitable);
}

#[tokio::test]
async fn newer_submission_supersedes_slow_one() {
    let service = Arc::new(SlowService {
        delay: Duration::from_secs(5),
        calls: AtomicUsize::new(0),
    });
    let session = Arc::new(session(service.clone()));

    let first = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.submit_bytes("first.csv", CSV.to_vec()).await })
    };
    while service.calls.load(Ordering::SeqCst) == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    let second = session.submit_bytes("second.csv", CSV.to_vec()).await.unwrap();

    let first = first.await.unwrap();
    assert!(matches!(first, Err(AnalysisError::Superseded)));
    assert_eq!(second.suitability.score, 81.0);
    assert_eq!(second.suitability.confidence, Confidence::High);

    let current = session.current().await.unwrap();
    assert!(Arc::ptr_eq(&current, &second));
}

#[tokio::test]
async fn cancel_discards_in_flight_result() {
    let service = Arc::new(SlowService {
        delay: Duration::from_secs(5),
        calls: AtomicUsize::new(0),
    });
    let session = Arc::new(session(service.clone()));

    let pending = {
        let session = Arc::clone(&session);
        tokio::spawn(async move { session.submit_bytes("data.csv", CSV.to_vec()).await })
    };
    while service.calls.load(Ordering::SeqCst) == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    session.cancel().await;

    assert!(matches!(pending.await.unwrap(), Err(AnalysisError::Superseded)));
    assert!(session.current().await.is_none());
}

#[tokio::test]
async fn slow_service_times_out_into_fallback() {
    let mut config = AnalysisConfig::default();
    config.ethics.timeout_seconds = 1;
    let service = Arc::new(SlowService {
        delay: Duration::from_secs(10),
        calls: AtomicUsize::new(0),
    });
    let session = AnalysisSession::new(
        DatasetAnalyzer::with_config(config).unwrap(),
        service,
        ProjectContext::new("proj-7"),
    );

    let outcome = session.submit_bytes("data.csv", CSV.to_vec()).await.unwrap();
    assert!(outcome.is_degraded());
    assert!(outcome.ethics_error.as_deref().is_some_and(|e| e.contains("Timeout")));
}

async fn http_client(server: &MockServer) -> HttpEthicsClient {
    HttpEthicsClient::new(&EthicsClientConfig {
        endpoint: Some(format!("{}/ethics", server.uri())),
        timeout_seconds: 5,
        api_key: None,
    })
    .unwrap()
}

#[tokio::test]
async fn http_client_posts_statistics_and_project() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/ethics"))
        .and(body_partial_json(json!({"project_identifier": "proj-7"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "suitability_score": 64.0,
            "overall_risk_level": "medium",
            "privacy_assessment": {"risk_level": "low", "concerns": []},
            "bias_assessment": {"risk_level": "medium", "affected_groups": ["south"]},
            "recommendations": ["Collect more southern households"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = http_client(&server).await;
    let statistics = DatasetAnalyzer::new().analyze_bytes("data.csv", CSV).unwrap();
    let result = client
        .analyze_ethics(&statistics, &ProjectContext::new("proj-7"))
        .await
        .unwrap();

    assert_eq!(result.suitability_score, 64.0);
    assert_eq!(result.overall_risk_level, RiskLevel::Medium);
    assert_eq!(result.bias_assessment.affected_groups, vec!["south"]);

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["statistics"]["basicMetrics"]["totalRows"], 3);
}

#[tokio::test]
async fn http_server_error_is_retryable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let client = http_client(&server).await;
    let statistics = DatasetAnalyzer::new().analyze_bytes("data.csv", CSV).unwrap();
    let err = client
        .analyze_ethics(&statistics, &ProjectContext::new("proj-7"))
        .await
        .unwrap_err();

    assert!(matches!(err, EthicsError::Http { status: 503, ref body } if body == "maintenance"));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn malformed_response_is_a_serialisation_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": true})))
        .mount(&server)
        .await;

    let client = http_client(&server).await;
    let session = AnalysisSession::new(
        DatasetAnalyzer::new(),
        Arc::new(client),
        ProjectContext::new("proj-7"),
    );
    let outcome = session.submit_bytes("data.csv", CSV.to_vec()).await.unwrap();
    assert!(outcome.is_degraded());
    assert!(outcome
        .ethics_error
        .as_deref()
        .is_some_and(|e| e.starts_with("Serialisation error")));
}
