//! Traits for scan report parsers

use serde_json::{Map, Value};
use tracing::debug;

use crate::application::errors::ParseError;
use crate::domain::{ScanReportFormat, VulnerabilitySummary};

/// Trait for turning one scanner report into a vulnerability summary
pub trait ScanReportParser: Send + Sync {
    /// The report schema this parser understands
    fn format(&self) -> ScanReportFormat;

    /// Summarize the report stored under this parser's MIME type
    fn summarize(&self, report: &Value) -> Result<VulnerabilitySummary, ParseError>;
}

/// Dispatches a Harbor `scan_overview` map to the parser for its schema
pub struct ScanOverviewNormalizer {
    parsers: Vec<Box<dyn ScanReportParser>>,
}

impl ScanOverviewNormalizer {
    /// Create a normalizer with all known report parsers
    pub fn new() -> Self {
        let parsers: Vec<Box<dyn ScanReportParser>> = vec![
            Box::new(super::vulnerability_report::VulnerabilityReportParser::new()),
            Box::new(super::harbor_adapter::HarborAdapterReportParser::new()),
        ];

        Self { parsers }
    }

    /// Get the parser registered for a MIME type, if the schema is known
    pub fn parser_for(&self, mime_type: &str) -> Option<&dyn ScanReportParser> {
        let format = ScanReportFormat::from_mime_type(mime_type)?;
        self.parsers
            .iter()
            .find(|parser| parser.format() == format)
            .map(|parser| parser.as_ref())
    }

    /// Normalize a scan overview. Absent, empty, unknown or malformed overviews
    /// all produce the unknown summary.
    pub fn normalize(&self, scan_overview: Option<&Map<String, Value>>) -> VulnerabilitySummary {
        let Some(scan_overview) = scan_overview else {
            return VulnerabilitySummary::unknown();
        };

        let Some((mime_type, report, parser)) = scan_overview
            .iter()
            .find_map(|(mime_type, report)| {
                self.parser_for(mime_type)
                    .map(|parser| (mime_type, report, parser))
            })
        else {
            if !scan_overview.is_empty() {
                debug!(
                    mime_types = ?scan_overview.keys().collect::<Vec<_>>(),
                    "No parser for scan overview"
                );
            }
            return VulnerabilitySummary::unknown();
        };

        match parser.summarize(report) {
            Ok(summary) => summary,
            Err(e) => {
                debug!(mime_type = %mime_type, error = %e, "Malformed scan report");
                VulnerabilitySummary::unknown()
            }
        }
    }
}

impl Default for ScanOverviewNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HARBOR_ADAPTER_REPORT_V1_0, VULNERABILITY_REPORT_V1_1};
    use serde_json::json;

    fn overview(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    fn assert_consistent(summary: &VulnerabilitySummary) {
        if !summary.is_unknown() {
            assert_eq!(
                summary.none,
                summary.count - summary.critical - summary.high - summary.medium - summary.low
            );
        }
    }

    #[test]
    fn test_absent_or_empty_overview_is_unknown() {
        let normalizer = ScanOverviewNormalizer::new();
        assert_eq!(normalizer.normalize(None), VulnerabilitySummary::unknown());
        assert_eq!(
            normalizer.normalize(Some(&Map::new())),
            VulnerabilitySummary::unknown()
        );
    }

    #[test]
    fn test_unknown_mime_type_is_unknown() {
        let normalizer = ScanOverviewNormalizer::new();
        let overview = overview(json!({
            "application/vnd.cyclonedx+json": {"severity": "High", "summary": {"total": 3}}
        }));
        assert_eq!(
            normalizer.normalize(Some(&overview)),
            VulnerabilitySummary::unknown()
        );
    }

    #[test]
    fn test_dispatches_vulnerability_report() {
        let normalizer = ScanOverviewNormalizer::new();
        let overview = overview(json!({
            VULNERABILITY_REPORT_V1_1: {
                "severity": "Critical",
                "summary": {
                    "total": 12,
                    "summary": {"Critical": 1, "High": 2, "Medium": 3, "Low": 4}
                }
            }
        }));

        let summary = normalizer.normalize(Some(&overview));
        assert_eq!(summary, VulnerabilitySummary::from_counts("Critical", 12, 1, 2, 3, 4));
        assert_eq!(summary.none, 2);
        assert_consistent(&summary);
    }

    #[test]
    fn test_dispatches_adapter_report() {
        let normalizer = ScanOverviewNormalizer::new();
        let overview = overview(json!({
            HARBOR_ADAPTER_REPORT_V1_0: {
                "severity": "High",
                "vulnerabilities": [
                    {"id": "CVE-1", "severity": "High"},
                    {"id": "CVE-2", "severity": "Negligible"}
                ]
            }
        }));

        let summary = normalizer.normalize(Some(&overview));
        assert_eq!(summary.count, 2);
        assert_eq!(summary.high, 1);
        assert_eq!(summary.none, 1);
        assert_consistent(&summary);
    }

    #[test]
    fn test_known_key_found_next_to_unknown_key() {
        let normalizer = ScanOverviewNormalizer::new();
        let overview = overview(json!({
            "application/vnd.something.else": {},
            VULNERABILITY_REPORT_V1_1: {
                "severity": "Low",
                "summary": {"total": 1, "summary": {"Low": 1}}
            }
        }));

        let summary = normalizer.normalize(Some(&overview));
        assert_eq!(summary.low, 1);
        assert_eq!(summary.none, 0);
    }

    #[test]
    fn test_malformed_report_falls_back() {
        let normalizer = ScanOverviewNormalizer::new();
        let overview = overview(json!({
            HARBOR_ADAPTER_REPORT_V1_0: {"vulnerabilities": "not-a-list"}
        }));
        assert_eq!(
            normalizer.normalize(Some(&overview)),
            VulnerabilitySummary::unknown()
        );
    }
}
