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

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "assay")]
#[command(about = "Profile a tabular dataset and assess its privacy and representation risks")]
#[command(version)]
pub struct Args {
    /// Dataset to analyse (csv, tsv, txt, json, jsonl, xlsx, xls, xlsm, ods)
    pub file: PathBuf,

    #[arg(long, value_enum, help = "Set the logging level")]
    pub log_level: Option<LogLevel>,

    #[arg(long, help = "YAML file overriding the default thresholds")]
    pub config: Option<PathBuf>,

    #[arg(long, value_enum, help = "Start from a threshold preset")]
    pub preset: Option<Preset>,

    #[arg(
        long,
        help = "Ethical analysis service URL, falls back to ASSAY_ETHICS_ENDPOINT"
    )]
    pub ethics_endpoint: Option<String>,

    #[arg(long, help = "Project identifier sent with the ethics request")]
    pub project: Option<String>,

    #[arg(long, help = "Skip the ethical analysis service entirely")]
    pub statistics_only: bool,

    #[arg(long, help = "Print the full result as JSON")]
    pub json: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum Preset {
    Default,
    Strict,
    Lenient,
}
