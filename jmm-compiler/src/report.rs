//! Diagnostics passed between compiler stages.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    Log,
    Debug,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Syntactic,
    Semantic,
    Llir,
    Optimization,
    Generation,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Syntactic => write!(f, "SYNTACTIC"),
            Stage::Semantic => write!(f, "SEMANTIC"),
            Stage::Llir => write!(f, "LLIR"),
            Stage::Optimization => write!(f, "OPTIMIZATION"),
            Stage::Generation => write!(f, "GENERATION"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    #[serde(rename = "type")]
    pub kind: ReportType,
    pub stage: Stage,
    #[serde(default)]
    pub line: Option<u32>,
    pub message: String,
}

impl Report {
    pub fn new(kind: ReportType, stage: Stage, line: Option<u32>, message: impl Into<String>) -> Self {
        Self {
            kind,
            stage,
            line,
            message: message.into(),
        }
    }

    pub fn error(stage: Stage, line: Option<u32>, message: impl Into<String>) -> Self {
        Self::new(ReportType::Error, stage, line, message)
    }

    pub fn is_error(&self) -> bool {
        self.kind == ReportType::Error
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ReportType::Log => "LOG",
            ReportType::Debug => "DEBUG",
            ReportType::Warning => "WARNING",
            ReportType::Error => "ERROR",
        };
        match self.line {
            Some(line) => write!(f, "{kind}@{}, line {line}: {}", self.stage, self.message),
            None => write!(f, "{kind}@{}: {}", self.stage, self.message),
        }
    }
}

pub fn has_errors(reports: &[Report]) -> bool {
    reports.iter().any(Report::is_error)
}
