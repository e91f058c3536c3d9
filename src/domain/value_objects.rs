//! Domain value objects representing immutable concepts

use serde::{Deserialize, Serialize};
use std::fmt;

/// MIME type keys Harbor uses in an artifact's `scan_overview` map
pub const VULNERABILITY_REPORT_V1_1: &str =
    "application/vnd.security.vulnerability.report; version=1.1";
pub const HARBOR_ADAPTER_REPORT_V1_0: &str =
    "application/vnd.scanner.adapter.vuln.report.harbor+json; version=1.0";

/// Known scan report schemas, keyed by their exact MIME type string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScanReportFormat {
    /// Pre-aggregated summary with `total` and per-severity counts
    VulnerabilityReportV1_1,
    /// Flat list of vulnerability records produced by the scanner adapter
    HarborAdapterV1_0,
}

impl ScanReportFormat {
    /// Look up a report format by exact MIME type. Matching is case-sensitive.
    pub fn from_mime_type(mime_type: &str) -> Option<Self> {
        match mime_type {
            VULNERABILITY_REPORT_V1_1 => Some(Self::VulnerabilityReportV1_1),
            HARBOR_ADAPTER_REPORT_V1_0 => Some(Self::HarborAdapterV1_0),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::VulnerabilityReportV1_1 => VULNERABILITY_REPORT_V1_1,
            Self::HarborAdapterV1_0 => HARBOR_ADAPTER_REPORT_V1_0,
        }
    }
}

impl fmt::Display for ScanReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// Severity buckets tracked individually in a vulnerability summary.
/// Everything else Harbor reports (`Negligible`, `Unknown`, ...) lands in `none`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeverityBucket {
    Critical,
    High,
    Medium,
    Low,
}

impl SeverityBucket {
    pub const ALL: [SeverityBucket; 4] = [Self::Critical, Self::High, Self::Medium, Self::Low];

    /// The exact label Harbor uses for this bucket
    pub fn label(&self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    /// Classify an upstream severity label. Case-sensitive on purpose:
    /// `critical` is not `Critical` for Harbor's scanners.
    pub fn classify(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|bucket| bucket.label() == label)
    }
}
