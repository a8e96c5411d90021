//! Report options

use crate::error::ModelError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Generated document format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// PDF document
    Pdf,
    /// Word document
    Docx,
}

impl ReportFormat {
    /// Wire name, also the file extension
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Pdf => "pdf",
            ReportFormat::Docx => "docx",
        }
    }

    /// Download name used when the server sends none
    #[must_use]
    pub fn fallback_filename(&self) -> String {
        format!("report.{}", self.as_str())
    }
}

/// Report layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportMode {
    /// Tabular timeline
    Timeline,
    /// Prose narrative
    Narrative,
}

impl ReportMode {
    /// Wire name
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportMode::Timeline => "timeline",
            ReportMode::Narrative => "narrative",
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ReportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportFormat {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pdf" => Ok(ReportFormat::Pdf),
            "docx" => Ok(ReportFormat::Docx),
            other => Err(ModelError::UnknownReportOption(other.to_string())),
        }
    }
}

impl FromStr for ReportMode {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "timeline" => Ok(ReportMode::Timeline),
            "narrative" => Ok(ReportMode::Narrative),
            other => Err(ModelError::UnknownReportOption(other.to_string())),
        }
    }
}
