//! Parser for the pre-aggregated `vulnerability.report; version=1.1` schema

use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;

use super::traits::ScanReportParser;
use crate::application::errors::ParseError;
use crate::domain::{ScanReportFormat, SeverityBucket, VulnerabilitySummary};

#[derive(Debug, Deserialize)]
struct ReportOverview {
    #[serde(default)]
    severity: String,
    /// Absent while a scan is pending or after it failed
    summary: Option<ReportSummary>,
}

#[derive(Debug, Deserialize)]
struct ReportSummary {
    total: i64,
    #[serde(default)]
    summary: Option<HashMap<String, i64>>,
}

/// Parser for reports that carry their own totals
pub struct VulnerabilityReportParser;

impl Default for VulnerabilityReportParser {
    fn default() -> Self {
        Self::new()
    }
}

impl VulnerabilityReportParser {
    pub fn new() -> Self {
        Self
    }
}

impl ScanReportParser for VulnerabilityReportParser {
    fn format(&self) -> ScanReportFormat {
        ScanReportFormat::VulnerabilityReportV1_1
    }

    fn summarize(&self, report: &Value) -> Result<VulnerabilitySummary, ParseError> {
        let overview = ReportOverview::deserialize(report)?;

        let Some(summary) = overview.summary else {
            return Ok(VulnerabilitySummary::unknown());
        };

        let counts = summary.summary.unwrap_or_default();
        let count_of = |bucket: SeverityBucket| counts.get(bucket.label()).copied().unwrap_or(0);

        Ok(VulnerabilitySummary::from_counts(
            overview.severity,
            summary.total,
            count_of(SeverityBucket::Critical),
            count_of(SeverityBucket::High),
            count_of(SeverityBucket::Medium),
            count_of(SeverityBucket::Low),
        ))
    }
}
