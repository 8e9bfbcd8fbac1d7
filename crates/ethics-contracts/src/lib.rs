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

//! Wire contract for the external ethical-analysis collaborator.
//!
//! The engine sends dataset statistics plus a project identifier and receives
//! a structured assessment. The statistics payload is generic so this crate
//! stays free of engine types.

pub mod requests;
pub mod responses;
pub mod types;

pub use requests::{EthicsRequest, ProjectContext};
pub use responses::{BiasAssessment, EthicalAnalysis, PrivacyAssessment};
pub use types::{Confidence, EthicsError, EthicsResult, RiskLevel, SuitabilityLevel};
