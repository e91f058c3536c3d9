//! Parser for the scanner adapter `vuln.report.harbor+json; version=1.0` schema

use serde::Deserialize;
use serde_json::Value;

use super::traits::ScanReportParser;
use crate::application::errors::ParseError;
use crate::domain::{ScanReportFormat, SeverityBucket, VulnerabilitySummary};

#[derive(Debug, Deserialize)]
struct AdapterReport {
    #[serde(default)]
    severity: String,
    #[serde(default)]
    vulnerabilities: Option<Vec<AdapterVulnerability>>,
}

#[derive(Debug, Deserialize)]
struct AdapterVulnerability {
    #[serde(default)]
    severity: String,
}

/// Parser for reports listing every vulnerability individually
pub struct HarborAdapterReportParser;

impl Default for HarborAdapterReportParser {
    fn default() -> Self {
        Self::new()
    }
}

impl HarborAdapterReportParser {
    pub fn new() -> Self {
        Self
    }
}

impl ScanReportParser for HarborAdapterReportParser {
    fn format(&self) -> ScanReportFormat {
        ScanReportFormat::HarborAdapterV1_0
    }

    fn summarize(&self, report: &Value) -> Result<VulnerabilitySummary, ParseError> {
        let report = AdapterReport::deserialize(report)?;
        let vulnerabilities = report.vulnerabilities.unwrap_or_default();

        let count_of = |bucket: SeverityBucket| {
            vulnerabilities
                .iter()
                .filter(|vuln| SeverityBucket::classify(&vuln.severity) == Some(bucket))
                .count() as i64
        };

        Ok(VulnerabilitySummary::from_counts(
            report.severity,
            vulnerabilities.len() as i64,
            count_of(SeverityBucket::Critical),
            count_of(SeverityBucket::High),
            count_of(SeverityBucket::Medium),
            count_of(SeverityBucket::Low),
        ))
    }
}
