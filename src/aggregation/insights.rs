//! Remediation advice derived from the finding set.

use super::{top_by_count, AnalysisStats};
use crate::models::{Severity, VulnerabilityFinding};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Default, Serialize)]
pub struct InsightMetrics {
    pub security_maturity_level: String,
    pub improvement_priority: String,
    pub estimated_fix_time: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ActionableInsights {
    pub immediate_actions: Vec<String>,
    pub short_term_goals: Vec<String>,
    pub long_term_strategy: Vec<String>,
    pub process_improvements: Vec<String>,
    pub training_needs: Vec<String>,
    pub tool_recommendations: Vec<String>,
    pub metrics: InsightMetrics,
}

fn maturity_level(high: usize, total: usize) -> &'static str {
    if total == 0 {
        return "High";
    }
    let high_ratio = high as f64 / total as f64;
    if high_ratio < 0.1 && total < 10 {
        "High"
    } else if high_ratio < 0.2 && total < 20 {
        "Medium"
    } else {
        "Low"
    }
}

fn format_fix_time(hours: f64) -> String {
    if hours < 8.0 {
        format!("{}h (< 1 day)", hours as u64)
    } else if hours < 40.0 {
        format!("{}h (~{} days)", hours as u64, (hours / 8.0) as u64)
    } else {
        format!("{}h (~{} weeks)", hours as u64, (hours / 40.0) as u64)
    }
}

fn tool_for(language: &str) -> Option<&'static str> {
    match language {
        "Python" => Some("Python: run Bandit for static security analysis"),
        "JavaScript" | "TypeScript" => Some("JavaScript/TypeScript: enable ESLint security plugins"),
        "Java" => Some("Java: integrate SpotBugs or SonarQube"),
        "PHP" => Some("PHP: add PHPStan or Psalm with security rules"),
        "Ruby" => Some("Ruby: run Brakeman"),
        "Go" => Some("Go: run gosec"),
        "C#" => Some("C#: add Security Code Scan analyzers"),
        "Rust" => Some("Rust: run cargo-audit and clippy"),
        _ => None,
    }
}

/// Turn findings and run statistics into prioritized advice.
pub fn generate_insights(
    findings: &[VulnerabilityFinding],
    stats: &AnalysisStats,
) -> ActionableInsights {
    let mut insights = ActionableInsights::default();

    let count = |severity| findings.iter().filter(|f| f.severity == severity).count();
    let (high, medium, low) = (count(Severity::High), count(Severity::Medium), count(Severity::Low));
    let total = findings.len();

    // Nothing to fix: only the all-clear and the baseline metrics.
    if total == 0 {
        insights
            .immediate_actions
            .push("✅ No vulnerability found, keep the current security practices".to_string());
        insights.metrics = InsightMetrics {
            security_maturity_level: maturity_level(0, 0).to_string(),
            improvement_priority: "Normal".to_string(),
            estimated_fix_time: format_fix_time(0.0),
        };
        return insights;
    }
    if high > 0 {
        insights.immediate_actions.extend([
            format!("🔴 Fix {} high severity vulnerabilities as a priority", high),
            "🔍 Audit the affected files manually".to_string(),
            "🚫 Consider blocking deployment until they are fixed".to_string(),
        ]);
    }
    if medium > 5 {
        insights.immediate_actions.push(format!(
            "🟡 Plan the remediation of {} medium severity vulnerabilities",
            medium
        ));
    }

    let mut by_type: BTreeMap<String, usize> = BTreeMap::new();
    for finding in findings {
        *by_type.entry(finding.vulnerability_type.clone()).or_default() += 1;
    }
    for (kind, n) in top_by_count(&by_type, 3) {
        if n > 1 {
            insights
                .short_term_goals
                .push(format!("Eliminate recurring {} ({} occurrences)", kind, n));
        }
    }

    if total > 20 {
        insights.long_term_strategy.extend([
            "Adopt a secure development lifecycle".to_string(),
            "Add automated security scanning to the CI pipeline".to_string(),
            "Schedule regular security code reviews".to_string(),
        ]);
    }

    if stats.analysis_coverage < 80.0 {
        insights.process_improvements.push(format!(
            "Increase analysis coverage (currently {:.1}%)",
            stats.analysis_coverage
        ));
    }
    if stats.files_with_errors > 0 {
        insights.process_improvements.push(format!(
            "Investigate the {} files that could not be analyzed",
            stats.files_with_errors
        ));
    }

    let lowered: Vec<String> = findings
        .iter()
        .map(|f| f.vulnerability_type.to_lowercase())
        .collect();
    if lowered.iter().any(|t| t.contains("injection")) {
        insights
            .training_needs
            .push("Injection prevention training".to_string());
    }
    if lowered.iter().any(|t| t.contains("auth")) {
        insights
            .training_needs
            .push("Secure authentication training".to_string());
    }
    if lowered
        .iter()
        .any(|t| t.contains("exposure") || t.contains("exposition"))
    {
        insights
            .training_needs
            .push("Sensitive data protection training".to_string());
    }

    let languages: BTreeSet<&str> = findings.iter().map(|f| f.language.as_str()).collect();
    insights.tool_recommendations = languages.into_iter().filter_map(tool_for).map(String::from).collect();

    let priority = if high > 0 {
        "Critical"
    } else if medium > 10 {
        "Elevated"
    } else {
        "Normal"
    };
    let hours = 4.0 * high as f64 + 2.0 * medium as f64 + 0.5 * low as f64;
    insights.metrics = InsightMetrics {
        security_maturity_level: maturity_level(high, total).to_string(),
        improvement_priority: priority.to_string(),
        estimated_fix_time: format_fix_time(hours),
    };

    insights
}
