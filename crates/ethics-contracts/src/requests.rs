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
use std::collections::HashMap;
use uuid::Uuid;

/// Project the dataset is being assessed for. Passed explicitly by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectContext {
    pub project_identifier: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl ProjectContext {
    pub fn new(project_identifier: impl Into<String>) -> Self {
        Self {
            project_identifier: project_identifier.into(),
            title: None,
            description: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Context for analyses not tied to a saved project.
    pub fn anonymous() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }
}

/// Request body for the collaborator: `{statistics, project_identifier}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EthicsRequest<S> {
    pub statistics: S,
    pub project_identifier: String,
}

impl<S> EthicsRequest<S> {
    pub fn new(statistics: S, context: &ProjectContext) -> Self {
        Self {
            statistics,
            project_identifier: context.project_identifier.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_body_has_statistics_and_project_identifier() {
        let context = ProjectContext::new("proj-42").with_title("Flood response");
        let request = EthicsRequest::new(json!({"rows": 3}), &context);
        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body,
            json!({"statistics": {"rows": 3}, "project_identifier": "proj-42"})
        );
    }
}
