//! Response quality scoring used to arbitrate between models.

use super::interpreter::{Interpretation, RawFinding};
use crate::models::Severity;
use std::collections::BTreeSet;

/// Words that suggest an unstructured answer still talks about security.
const SECURITY_KEYWORDS: [&str; 16] = [
    "vulnérabilité",
    "sécurité",
    "injection",
    "xss",
    "authentification",
    "autorisation",
    "exposition",
    "faille",
    "risque",
    "cve",
    "vulnerability",
    "security",
    "authentication",
    "authorization",
    "exposure",
    "risk",
];

fn structured_score(findings: &[RawFinding]) -> f64 {
    let mut score = 0.2;
    if findings.is_empty() {
        return score;
    }

    let well_formed = findings.iter().filter(|f| f.is_well_formed()).count();
    score += 0.5 * well_formed as f64 / findings.len() as f64;

    let types: BTreeSet<String> = findings
        .iter()
        .filter_map(RawFinding::vulnerability_type)
        .collect();
    score += 0.15 * (types.len() as f64 / 5.0).min(1.0);

    let severities: BTreeSet<Severity> = findings
        .iter()
        .filter(|f| f.severity_label().is_some())
        .map(RawFinding::severity)
        .collect();
    score += 0.15 * (severities.len() as f64 / 3.0).min(1.0);

    score
}

fn raw_text_score(text: &str) -> f64 {
    if text.trim().is_empty() {
        return 0.0;
    }
    let lower = text.to_lowercase();
    let hits = SECURITY_KEYWORDS
        .iter()
        .filter(|k| lower.contains(*k))
        .count();

    0.1 + 0.1 * (text.chars().count() as f64 / 1000.0).min(1.0)
        + 0.2 * (hits as f64 / SECURITY_KEYWORDS.len() as f64).min(1.0)
}

/// Rate a response in `[0, 1]`.
pub fn score(response: &Interpretation) -> f64 {
    let raw = match response {
        Interpretation::Unparsed => 0.0,
        Interpretation::Structured(findings) => structured_score(findings),
        Interpretation::RawText(text) => raw_text_score(text),
    };
    raw.clamp(0.0, 1.0)
}
