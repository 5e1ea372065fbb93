//! Risk assessment over the complete finding set.

use crate::models::{round_to, VulnerabilityFinding};
use serde::Serialize;
use std::collections::BTreeSet;

/// Path fragments that mark a file as security-critical.
const CRITICAL_PATH_PATTERNS: [&str; 7] =
    ["config", "auth", "login", "password", "secret", "key", "admin"];

#[derive(Debug, Clone, Default, Serialize)]
pub struct RiskFactors {
    pub severity_impact: f64,
    pub volume_impact: f64,
    pub diversity_impact: f64,
    pub critical_files_impact: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RiskAssessment {
    pub overall_risk: String,
    pub risk_score: f64,
    pub risk_color: String,
    pub risk_factors: RiskFactors,
    pub recommendations: Vec<String>,
}

fn volume_impact(n: usize) -> f64 {
    let n = n as f64;
    if n <= 5.0 {
        2.0 * n
    } else if n <= 20.0 {
        10.0 + 0.5 * (n - 5.0)
    } else {
        (10.0 + 0.3 * (n - 5.0)).min(20.0)
    }
}

fn tier(score: f64) -> (&'static str, &'static str) {
    if score <= 5.0 {
        ("Very Low", "green")
    } else if score <= 10.0 {
        ("Low", "lightgreen")
    } else if score <= 15.0 {
        ("Medium", "orange")
    } else if score <= 20.0 {
        ("High", "red")
    } else {
        ("Critical", "darkred")
    }
}

/// Score the overall risk represented by `findings`.
pub fn assess_risk(findings: &[VulnerabilityFinding]) -> RiskAssessment {
    if findings.is_empty() {
        return RiskAssessment {
            overall_risk: "Very Low".to_string(),
            risk_score: 0.0,
            risk_color: "green".to_string(),
            risk_factors: RiskFactors::default(),
            recommendations: vec!["Keep following the current security practices".to_string()],
        };
    }

    let n = findings.len();
    let total_weight: f64 = findings.iter().map(|f| f.severity.weight()).sum();
    let distinct_types = findings
        .iter()
        .map(|f| f.vulnerability_type.as_str())
        .collect::<BTreeSet<_>>()
        .len();
    let critical_files = findings
        .iter()
        .filter(|f| {
            let path = f.file_path.to_lowercase();
            CRITICAL_PATH_PATTERNS.iter().any(|p| path.contains(p))
        })
        .count();

    let factors = RiskFactors {
        severity_impact: (total_weight / n as f64).min(10.0),
        volume_impact: volume_impact(n),
        diversity_impact: (2.0 * distinct_types as f64).min(10.0),
        critical_files_impact: (3.0 * critical_files as f64).min(15.0),
    };

    let total = factors.severity_impact
        + factors.volume_impact
        + factors.diversity_impact
        + factors.critical_files_impact;
    let score = (total / 4.0).min(25.0);
    let (label, color) = tier(score);

    let mut recommendations = Vec::new();
    if factors.severity_impact > 7.0 {
        recommendations.push("Fix high severity vulnerabilities immediately".to_string());
    }
    if factors.volume_impact > 10.0 {
        recommendations.push("Batch the remediation of similar vulnerabilities".to_string());
    }
    if factors.diversity_impact > 6.0 {
        recommendations.push("Set up security training for the team".to_string());
    }
    if factors.critical_files_impact > 5.0 {
        recommendations.push("Review the identified critical files right away".to_string());
    }
    if recommendations.is_empty() {
        recommendations.push("Maintain the current security best practices".to_string());
    }

    RiskAssessment {
        overall_risk: label.to_string(),
        risk_score: round_to(score, 1),
        risk_color: color.to_string(),
        risk_factors: RiskFactors {
            severity_impact: round_to(factors.severity_impact, 1),
            volume_impact: round_to(factors.volume_impact, 1),
            diversity_impact: round_to(factors.diversity_impact, 1),
            critical_files_impact: round_to(factors.critical_files_impact, 1),
        },
        recommendations,
    }
}
