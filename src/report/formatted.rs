//! Flattened report consumed by document renderers.

use crate::aggregation::SeverityCounts;
use crate::models::{round_to, AnalysisReport, VulnerabilityFinding};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    pub total_vulnerabilities: usize,
    /// 0 to 100, higher is better.
    pub security_score: f64,
    pub by_severity: SeverityCounts,
    pub by_file: BTreeMap<String, usize>,
    pub by_type: BTreeMap<String, usize>,
    pub by_language: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormattedReport {
    pub repo_name: String,
    pub analysis_date: DateTime<Utc>,
    /// Most severe first.
    pub vulnerabilities: Vec<VulnerabilityFinding>,
    pub best_model: Option<String>,
    pub summary: ReportSummary,
}

/// `100 - Σweights × 100 / (n × 10)`, floored at 0. An empty set scores 100.
pub fn security_score(findings: &[VulnerabilityFinding]) -> f64 {
    if findings.is_empty() {
        return 100.0;
    }
    let total_weight: f64 = findings.iter().map(|f| f.severity.weight()).sum();
    let max_weight = findings.len() as f64 * 10.0;
    round_to((100.0 - total_weight * 100.0 / max_weight).max(0.0), 1)
}

fn count_by<F>(findings: &[VulnerabilityFinding], key: F) -> BTreeMap<String, usize>
where
    F: Fn(&VulnerabilityFinding) -> &str,
{
    let mut counts = BTreeMap::new();
    for finding in findings {
        *counts.entry(key(finding).to_string()).or_default() += 1;
    }
    counts
}

impl FormattedReport {
    pub fn from_report(report: &AnalysisReport) -> Self {
        let mut vulnerabilities = report.findings.clone();
        vulnerabilities.sort_by_key(|f| Reverse(f.severity));

        let summary = ReportSummary {
            total_vulnerabilities: vulnerabilities.len(),
            security_score: security_score(&vulnerabilities),
            by_severity: SeverityCounts::of(&vulnerabilities),
            by_file: count_by(&vulnerabilities, |f| f.file_path.as_str()),
            by_type: count_by(&vulnerabilities, |f| f.vulnerability_type.as_str()),
            by_language: count_by(&vulnerabilities, |f| f.language.as_str()),
        };

        Self {
            repo_name: report.repository.clone(),
            analysis_date: report.repository_context.analysis_timestamp,
            vulnerabilities,
            best_model: report.best_model.clone(),
            summary,
        }
    }
}
