//! Recurring vulnerability patterns and security debt.

use super::top_by_count;
use crate::models::{round_to, LineRef, Severity, VulnerabilityFinding};
use serde::Serialize;
use std::collections::BTreeMap;

/// One occurrence inside a vulnerability cluster.
#[derive(Debug, Clone, Serialize)]
pub struct ClusterEntry {
    pub file: String,
    pub severity: Severity,
    pub lines: Vec<LineRef>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaintenancePriority {
    pub file: String,
    pub vulnerability_count: usize,
    pub priority: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SecurityDebt {
    pub technical_debt_score: f64,
    pub maintenance_priority: Vec<MaintenancePriority>,
    pub refactoring_candidates: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct TrendAnalysis {
    pub common_mistakes: BTreeMap<String, usize>,
    pub language_specific_issues: BTreeMap<String, BTreeMap<String, usize>>,
    pub severity_distribution_by_type: BTreeMap<String, BTreeMap<Severity, usize>>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SecurityPatterns {
    /// Finding count per file.
    pub hotspots: BTreeMap<String, usize>,
    pub vulnerability_clusters: BTreeMap<String, Vec<ClusterEntry>>,
    /// Finding count per top-level directory.
    pub affected_components: BTreeMap<String, usize>,
    pub security_debt: SecurityDebt,
    pub trend_analysis: TrendAnalysis,
}

/// Broad mistake family a vulnerability type belongs to.
fn mistake_family(vulnerability_type: &str) -> Option<&'static str> {
    let kind = vulnerability_type.to_lowercase();
    if kind.contains("injection") {
        Some("Injection Attacks")
    } else if kind.contains("auth") {
        Some("Authentication Issues")
    } else if kind.contains("exposure") || kind.contains("exposition") {
        Some("Data Exposure")
    } else if kind.contains("validation") {
        Some("Input Validation")
    } else {
        None
    }
}

/// Group findings into recurring patterns.
pub fn analyze_patterns(findings: &[VulnerabilityFinding]) -> SecurityPatterns {
    let mut patterns = SecurityPatterns::default();
    if findings.is_empty() {
        return patterns;
    }

    let mut high = 0usize;
    for finding in findings {
        *patterns
            .hotspots
            .entry(finding.file_path.clone())
            .or_default() += 1;

        if let Some((component, _)) = finding.file_path.split_once('/') {
            *patterns
                .affected_components
                .entry(component.to_string())
                .or_default() += 1;
        }

        patterns
            .vulnerability_clusters
            .entry(finding.vulnerability_type.clone())
            .or_default()
            .push(ClusterEntry {
                file: finding.file_path.clone(),
                severity: finding.severity,
                lines: finding.line_numbers.clone(),
            });

        let trends = &mut patterns.trend_analysis;
        if let Some(family) = mistake_family(&finding.vulnerability_type) {
            *trends.common_mistakes.entry(family.to_string()).or_default() += 1;
        }
        *trends
            .language_specific_issues
            .entry(finding.language.clone())
            .or_default()
            .entry(finding.vulnerability_type.clone())
            .or_default() += 1;
        *trends
            .severity_distribution_by_type
            .entry(finding.vulnerability_type.clone())
            .or_default()
            .entry(finding.severity)
            .or_default() += 1;

        if finding.severity == Severity::High {
            high += 1;
        }
    }

    let total = findings.len() as f64;
    let debt = &mut patterns.security_debt;
    debt.technical_debt_score = round_to((3.0 * high as f64 + total) / total * 100.0, 1);
    debt.maintenance_priority = top_by_count(&patterns.hotspots, 5)
        .into_iter()
        .map(|(file, count)| MaintenancePriority {
            file,
            vulnerability_count: count,
            priority: if count > 3 { "High" } else { "Medium" }.to_string(),
        })
        .collect();
    debt.refactoring_candidates = patterns
        .hotspots
        .iter()
        .filter(|(_, count)| **count > 2)
        .map(|(file, _)| file.clone())
        .collect();

    patterns
}
