//! Recovering structured findings from free-form model output.
//!
//! Models are asked for strict JSON but routinely wrap it in prose, fence it,
//! cut it short or ignore the format entirely. [`interpret`] escalates through
//! four strategies and never fails: brace-balanced extraction, bracket repair,
//! a regex fallback and finally a line-oriented keyword heuristic.

use crate::models::{LineRef, Severity, VulnerabilityFinding};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// One finding as reported by a model, before validation.
///
/// Models use several spellings for the same concept; each concept has a
/// primary and a secondary field, merged by the accessor methods with the
/// primary spelling winning when it is non-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFinding {
    #[serde(default, alias = "type_vulnerabilite", skip_serializing_if = "Option::is_none")]
    pub vulnerability_type: Option<Value>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<Value>,
    #[serde(default, alias = "severite", skip_serializing_if = "Option::is_none")]
    pub severity: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity_level: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(default, alias = "recommandation", skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remediation: Option<Value>,
    #[serde(default, alias = "numeros_ligne", skip_serializing_if = "Option::is_none")]
    pub line_numbers: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<Value>,
}

fn value_text(value: &Option<Value>) -> Option<String> {
    match value.as_ref()? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn first_text(primary: &Option<Value>, secondary: &Option<Value>) -> Option<String> {
    value_text(primary).or_else(|| value_text(secondary))
}

/// File metadata attached to every finding of an analyzed file.
#[derive(Debug, Clone)]
pub struct FileMeta<'a> {
    pub path: &'a str,
    pub language: &'a str,
    pub size: usize,
    pub lines: usize,
}

impl RawFinding {
    pub fn vulnerability_type(&self) -> Option<String> {
        first_text(&self.vulnerability_type, &self.kind)
    }

    pub fn severity_label(&self) -> Option<String> {
        first_text(&self.severity, &self.severity_level)
    }

    pub fn description(&self) -> Option<String> {
        first_text(&self.description, &self.details)
    }

    pub fn recommendation(&self) -> Option<String> {
        first_text(&self.recommendation, &self.remediation)
    }

    pub fn severity(&self) -> Severity {
        self.severity_label()
            .map(|label| Severity::from_label(&label))
            .unwrap_or(Severity::Medium)
    }

    pub fn line_refs(&self) -> Vec<LineRef> {
        let primary = self
            .line_numbers
            .as_ref()
            .map(LineRef::from_value)
            .unwrap_or_default();
        if !primary.is_empty() {
            return primary;
        }
        self.lines
            .as_ref()
            .map(LineRef::from_value)
            .unwrap_or_default()
    }

    /// All four core concepts are present.
    pub fn is_well_formed(&self) -> bool {
        self.description().is_some()
            && self.vulnerability_type().is_some()
            && self.severity_label().is_some()
            && self.recommendation().is_some()
    }

    fn looks_like_finding(&self) -> bool {
        self.vulnerability_type().is_some()
            || self.description().is_some()
            || self.severity_label().is_some()
    }

    /// Validate into a report finding for the given file.
    pub fn to_finding(&self, file: &FileMeta<'_>) -> VulnerabilityFinding {
        VulnerabilityFinding {
            vulnerability_type: self
                .vulnerability_type()
                .unwrap_or_else(|| "Other".to_string()),
            severity: self.severity(),
            description: self.description().unwrap_or_default(),
            line_numbers: self.line_refs(),
            recommendation: self.recommendation().unwrap_or_default(),
            file_path: file.path.to_string(),
            language: file.language.to_string(),
            file_size: file.size,
            lines_in_file: file.lines,
        }
    }

    fn text(
        vulnerability_type: &str,
        severity: Severity,
        description: String,
        lines: Vec<LineRef>,
        recommendation: String,
    ) -> Self {
        Self {
            vulnerability_type: Some(Value::String(vulnerability_type.to_string())),
            severity: Some(Value::String(severity.to_string())),
            description: Some(Value::String(description)),
            line_numbers: (!lines.is_empty())
                .then(|| Value::Array(lines.iter().map(line_ref_value).collect())),
            recommendation: Some(Value::String(recommendation)),
            ..Self::default()
        }
    }
}

fn line_ref_value(line: &LineRef) -> Value {
    match line {
        LineRef::Single(n) => Value::from(*n),
        LineRef::Range(..) => Value::String(line.to_string()),
    }
}

/// What could be recovered from one model response.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Interpretation {
    /// A finding list, possibly empty.
    Structured(Vec<RawFinding>),
    /// Text that carried no recognizable findings.
    RawText(String),
    /// Nothing usable.
    Unparsed,
}

impl Interpretation {
    pub fn findings(&self) -> &[RawFinding] {
        match self {
            Interpretation::Structured(findings) => findings,
            _ => &[],
        }
    }
}

fn findings_from_array(items: Vec<Value>) -> Vec<RawFinding> {
    items
        .into_iter()
        .filter(Value::is_object)
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect()
}

fn from_value(value: Value) -> Option<Interpretation> {
    match value {
        Value::Object(mut map) => {
            for key in ["findings", "vulnerabilities"] {
                if let Some(Value::Array(items)) = map.remove(key) {
                    return Some(Interpretation::Structured(findings_from_array(items)));
                }
            }
            let single: RawFinding =
                serde_json::from_value(Value::Object(map)).unwrap_or_default();
            if single.looks_like_finding() {
                Some(Interpretation::Structured(vec![single]))
            } else {
                Some(Interpretation::Structured(Vec::new()))
            }
        }
        Value::Array(items) => Some(Interpretation::Structured(findings_from_array(items))),
        _ => None,
    }
}

fn parse(text: &str) -> Option<Interpretation> {
    serde_json::from_str::<Value>(text).ok().and_then(from_value)
}

/// Maximal balanced spans starting at an object (or at a list of objects),
/// string-aware once inside a span. A trailing unterminated span is returned
/// as well.
fn brace_candidates(text: &str) -> Vec<&str> {
    let mut candidates = Vec::new();
    let mut depth = 0usize;
    let mut start = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' if depth > 0 => in_string = true,
            '{' | '[' if depth > 0 => depth += 1,
            '{' => {
                start = i;
                depth = 1;
            }
            '[' if text[i + 1..].trim_start().starts_with('{') => {
                start = i;
                depth = 1;
            }
            '}' | ']' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    candidates.push(&text[start..=i]);
                }
            }
            _ => {}
        }
    }

    if depth > 0 {
        candidates.push(&text[start..]);
    }
    candidates
}

/// Close whatever a truncated JSON candidate left open.
///
/// Strips a dangling trailing comma, then appends one closer per unmatched
/// `{` or `[`, innermost first. Returns `None` when nothing is open.
pub fn repair_json(candidate: &str) -> Option<String> {
    let mut fixed = candidate.trim_end().to_string();
    while fixed.ends_with(',') {
        fixed.pop();
        fixed.truncate(fixed.trim_end().len());
    }

    let mut open = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for c in fixed.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => open.push('}'),
            '[' => open.push(']'),
            '}' | ']' => {
                open.pop();
            }
            _ => {}
        }
    }

    if open.is_empty() {
        return None;
    }
    if in_string {
        fixed.push('"');
    }
    debug!("Repairing JSON candidate with {} closers", open.len());
    fixed.extend(open.iter().rev());
    Some(fixed)
}

static OBJECT_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{[^{}]*(?:\{[^{}]*\}[^{}]*)*\}").expect("valid regex"));
static LIST_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\[[^\[\]]*(?:\[[^\[\]]*\][^\[\]]*)*\]").expect("valid regex"));
static TRAILING_COMMA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r",\s*([}\]])").expect("valid regex"));

fn parse_with_cleanup(text: &str) -> Option<Value> {
    serde_json::from_str::<Value>(text).ok().or_else(|| {
        let cleaned = TRAILING_COMMA.replace_all(text, "$1");
        serde_json::from_str::<Value>(&cleaned).ok()
    })
}

fn regex_fallback(text: &str) -> Option<Interpretation> {
    if let Some(m) = OBJECT_PATTERN.find(text) {
        if let Some(interpretation) = parse_with_cleanup(m.as_str()).and_then(from_value) {
            debug!("Recovered JSON object with the regex fallback");
            return Some(interpretation);
        }
    }
    if let Some(m) = LIST_PATTERN.find(text) {
        if let Some(Value::Array(items)) = parse_with_cleanup(m.as_str()) {
            debug!("Recovered JSON list with the regex fallback");
            return Some(Interpretation::Structured(findings_from_array(items)));
        }
    }
    None
}

static VULNERABILITY_KEYWORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)sql\s*injection|injection\s*sql",
        r"|cross[- ]site\s*scripting|\bxss\b|\bcsrf\b",
        r"|authentication|authentification|authorization|autorisation",
        r"|data\s*exposure|exposition\s*de\s*donn[ée]es|sensitive\s*data",
        r"|hard[- ]?coded\s*(?:password|secret|credential|key)|mot\s*de\s*passe\s*en\s*dur",
        r"|buffer\s*overflow|path\s*traversal|directory\s*traversal",
        r"|command\s*injection|code\s*injection|injection\s*de\s*commande",
        r"|insecure\s*deserializ|d[ée]s[ée]rialisation",
        r"|vulnerability|vulnérabilité|faille\s*de\s*s[ée]curit[ée]",
    ))
    .expect("valid regex")
});
static HIGH_WORDS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:critical|critique|high|élevée?|elev[ée]e?|grave|severe)\b")
        .expect("valid regex")
});
static MEDIUM_WORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:medium|moyenne?|moderate)\b").expect("valid regex"));
static LOW_WORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:low|faible|minor)\b").expect("valid regex"));
static LINE_MENTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(?:lines?|lignes?)\s*:?\s*(\d+)(?:\s*-\s*(\d+))?").expect("valid regex")
});

const REMEDIATION_WORDS: [&str; 7] = [
    "recommend", "suggest", "fix", "solution", "mitigat", "remediat", "corrig",
];

const DEFAULT_RECOMMENDATION: &str = "Review and fix this potential vulnerability";

/// Keyword classification of a free-text line.
fn classify(lower: &str) -> &'static str {
    let has = |words: &[&str]| words.iter().any(|w| lower.contains(w));
    if has(&["sql"]) {
        "SQL Injection"
    } else if has(&["csrf", "cross-site request", "cross site request"]) {
        "Cross-Site Request Forgery (CSRF)"
    } else if has(&["xss", "cross-site", "cross site", "scripting"]) {
        "Cross-Site Scripting (XSS)"
    } else if has(&["command", "commande", "code injection"]) {
        "Command Injection"
    } else if has(&["traversal", "directory"]) {
        "Path Traversal"
    } else if has(&["password", "mot de passe", "hardcoded", "hard-coded", "secret"]) {
        "Hardcoded Credentials"
    } else if has(&["deserializ", "désérialisation", "deserialisation"]) {
        "Insecure Deserialization"
    } else if has(&["buffer overflow"]) {
        "Buffer Overflow"
    } else if has(&["exposure", "exposition", "leak", "sensitive data"]) {
        "Data Exposure"
    } else if has(&["auth"]) {
        "Authentication Issue"
    } else {
        "Security Vulnerability"
    }
}

fn line_severity(line: &str, vulnerability_type: &str) -> Severity {
    if HIGH_WORDS.is_match(line) {
        Severity::High
    } else if MEDIUM_WORDS.is_match(line) {
        Severity::Medium
    } else if LOW_WORDS.is_match(line) {
        Severity::Low
    } else {
        match vulnerability_type {
            "SQL Injection" | "Cross-Site Scripting (XSS)" | "Command Injection" => Severity::High,
            _ => Severity::Medium,
        }
    }
}

fn mentioned_lines(line: &str) -> Vec<LineRef> {
    LINE_MENTION
        .captures_iter(line)
        .filter_map(|caps| {
            let start: u32 = caps.get(1)?.as_str().parse().ok()?;
            match caps.get(2).and_then(|m| m.as_str().parse::<u32>().ok()) {
                Some(end) if end != start => Some(LineRef::Range(start, end)),
                _ => Some(LineRef::Single(start)),
            }
        })
        .collect()
}

fn is_remediation(lower: &str) -> bool {
    REMEDIATION_WORDS.iter().any(|w| lower.contains(w))
}

fn starts_with_remediation(lower: &str) -> bool {
    let head = lower.trim_start_matches(|c: char| c == '-' || c == '*' || c == '•' || c.is_whitespace());
    REMEDIATION_WORDS.iter().any(|w| head.starts_with(w))
}

struct Draft {
    vulnerability_type: &'static str,
    severity: Severity,
    description: String,
    lines: Vec<LineRef>,
    recommendation: Option<String>,
}

impl Draft {
    fn finish(self) -> RawFinding {
        RawFinding::text(
            self.vulnerability_type,
            self.severity,
            self.description,
            self.lines,
            self.recommendation
                .unwrap_or_else(|| DEFAULT_RECOMMENDATION.to_string()),
        )
    }
}

/// Line-by-line keyword extraction for responses with no JSON at all.
fn heuristic_findings(text: &str) -> Vec<RawFinding> {
    let mut findings = Vec::new();
    let mut current: Option<Draft> = None;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let lower = trimmed.to_lowercase();

        if current.is_some() && starts_with_remediation(&lower) {
            if let Some(draft) = current.as_mut() {
                draft.recommendation = Some(trimmed.to_string());
            }
            continue;
        }

        if VULNERABILITY_KEYWORDS.is_match(trimmed) {
            if let Some(draft) = current.take() {
                findings.push(draft.finish());
            }
            let vulnerability_type = classify(&lower);
            current = Some(Draft {
                vulnerability_type,
                severity: line_severity(trimmed, vulnerability_type),
                description: trimmed.to_string(),
                lines: mentioned_lines(trimmed),
                recommendation: None,
            });
            continue;
        }

        if let Some(draft) = current.as_mut() {
            if is_remediation(&lower) {
                draft.recommendation = Some(trimmed.to_string());
            } else if trimmed.chars().count() > 20 && !trimmed.starts_with("```") {
                draft.description.push(' ');
                draft.description.push_str(trimmed);
                if draft.lines.is_empty() {
                    draft.lines = mentioned_lines(trimmed);
                }
            }
        }
    }

    if let Some(draft) = current {
        findings.push(draft.finish());
    }
    findings
}

/// Turn one raw model response into an [`Interpretation`]. Never fails.
pub fn interpret(text: &str) -> Interpretation {
    if text.trim().is_empty() {
        return Interpretation::Unparsed;
    }

    for candidate in brace_candidates(text) {
        if let Some(interpretation) = parse(candidate) {
            return interpretation;
        }
        if let Some(interpretation) = repair_json(candidate).as_deref().and_then(parse) {
            debug!("Parsed response after repair");
            return interpretation;
        }
    }

    if let Some(interpretation) = regex_fallback(text) {
        return interpretation;
    }

    let findings = heuristic_findings(text);
    if findings.is_empty() {
        debug!("No structure recovered, keeping raw text");
        Interpretation::RawText(text.to_string())
    } else {
        debug!("Extracted {} findings from free text", findings.len());
        Interpretation::Structured(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CLEAN: &str = include_str!("../../fixtures/responses/clean_json.txt");
    const FENCED: &str = include_str!("../../fixtures/responses/fenced_with_prose.txt");
    const TRUNCATED: &str = include_str!("../../fixtures/responses/truncated.txt");
    const FRENCH: &str = include_str!("../../fixtures/responses/french_fields.txt");
    const FREE_TEXT: &str = include_str!("../../fixtures/responses/free_text.txt");
    const NO_FINDINGS: &str = include_str!("../../fixtures/responses/no_findings_prose.txt");

    fn meta() -> FileMeta<'static> {
        FileMeta {
            path: "app/db.py",
            language: "Python",
            size: 120,
            lines: 12,
        }
    }

    #[test]
    fn test_blank_text_is_unparsed() {
        assert_eq!(interpret(""), Interpretation::Unparsed);
        assert_eq!(interpret("  \n\t "), Interpretation::Unparsed);
    }

    #[test]
    fn test_clean_json_is_returned_as_is() {
        let expected: Value = serde_json::from_str(CLEAN).unwrap();
        let items = expected["findings"].as_array().unwrap().clone();

        let interpretation = interpret(CLEAN);
        let findings = interpretation.findings();

        assert_eq!(findings.len(), items.len());
        assert_eq!(findings, findings_from_array(items).as_slice());
        assert!(findings.iter().all(RawFinding::is_well_formed));
    }

    #[test]
    fn test_json_inside_prose_and_fences() {
        let interpretation = interpret(FENCED);
        let findings = interpretation.findings();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].vulnerability_type().as_deref(), Some("Path Traversal"));
        assert_eq!(
            findings[0].line_refs(),
            vec![LineRef::Range(14, 18)]
        );
    }

    #[test]
    fn test_stray_braces_in_prose_are_skipped() {
        let text = r#"Note: {this is not json}. Result: {"findings": [{"type": "XSS", "severity": "high"}]}"#;
        let findings = interpret(text).findings().to_vec();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity(), Severity::High);
    }

    #[test]
    fn test_braces_inside_strings_do_not_split_candidates() {
        let text = r#"{"findings": [{"description": "uses f\"{user}\" in query }", "type": "SQL Injection"}]}"#;
        let findings = interpret(text).findings().to_vec();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].vulnerability_type().as_deref(), Some("SQL Injection"));
    }

    #[test]
    fn test_truncated_response_is_repaired() {
        let interpretation = interpret(TRUNCATED);
        let findings = interpretation.findings();
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[1].severity(), Severity::Medium);
    }

    #[test]
    fn test_repair_appends_one_closer_per_open_bracket() {
        let cases = [
            (r#"{"findings": [{"type": "XSS""#, "}]}"),
            (r#"{"findings": [{"type": "XSS"},"#, "]}"),
            (r#"{"a": {"b": [1, 2, {"c": 3"#, "}]}}"),
        ];
        for (input, closers) in cases {
            let repaired = repair_json(input).unwrap();
            assert!(repaired.ends_with(closers), "{input} -> {repaired}");
            assert_eq!(
                repaired.len(),
                input.trim_end_matches(',').len() + closers.len()
            );
            assert!(serde_json::from_str::<Value>(&repaired).is_ok());
        }
        assert_eq!(repair_json(r#"{"done": true}"#), None);
    }

    #[test]
    fn test_french_and_alternate_spellings() {
        let interpretation = interpret(FRENCH);
        let findings = interpretation.findings();
        assert_eq!(findings.len(), 2);

        assert_eq!(findings[0].vulnerability_type().as_deref(), Some("Injection SQL"));
        assert_eq!(findings[0].severity(), Severity::High);
        assert_eq!(
            findings[0].recommendation().as_deref(),
            Some("Utiliser des requêtes paramétrées")
        );
        assert_eq!(findings[0].line_refs(), vec![LineRef::Single(12)]);

        assert_eq!(findings[1].description().as_deref(), Some("Token written to logs"));
        assert_eq!(findings[1].severity(), Severity::Low);
        assert_eq!(findings[1].line_refs(), vec![LineRef::Range(3, 5)]);
    }

    #[test]
    fn test_primary_spelling_wins_unless_empty() {
        let finding: RawFinding = serde_json::from_value(json!({
            "vulnerability_type": "",
            "type": "XSS",
            "description": "primary",
            "details": "secondary",
            "line_numbers": [],
            "lines": [7]
        }))
        .unwrap();

        assert_eq!(finding.vulnerability_type().as_deref(), Some("XSS"));
        assert_eq!(finding.description().as_deref(), Some("primary"));
        assert_eq!(finding.line_refs(), vec![LineRef::Single(7)]);
        assert!(!finding.is_well_formed());
    }

    #[test]
    fn test_single_finding_object_and_unrelated_object() {
        let single = interpret(r#"{"type": "CSRF", "description": "No token", "severity": "Low"}"#);
        assert_eq!(single.findings().len(), 1);

        let unrelated = interpret(r#"{"status": "ok"}"#);
        assert_eq!(unrelated, Interpretation::Structured(Vec::new()));
    }

    #[test]
    fn test_trailing_commas_are_cleaned_by_regex_fallback() {
        let text = r#"Answer: {"findings": [{"type": "XSS", "severity": "Low",},],}"#;
        let findings = interpret(text).findings().to_vec();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].severity(), Severity::Low);
    }

    #[test]
    fn test_bare_list_is_wrapped() {
        let text = r#"Here you go: [{"type": "SQL Injection", "severity": "High"}, {"type": "XSS"}]"#;
        let findings = interpret(text).findings().to_vec();
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[1].severity(), Severity::Medium);
    }

    #[test]
    fn test_free_text_heuristic() {
        let interpretation = interpret(FREE_TEXT);
        let findings = interpretation.findings();
        assert_eq!(findings.len(), 3);

        assert_eq!(findings[0].vulnerability_type().as_deref(), Some("SQL Injection"));
        assert_eq!(findings[0].severity(), Severity::High);
        assert_eq!(findings[0].line_refs(), vec![LineRef::Single(42)]);
        assert!(findings[0]
            .recommendation()
            .unwrap()
            .contains("parameterized"));
        assert!(findings[0].description().unwrap().contains("concatenated"));

        assert_eq!(findings[1].vulnerability_type().as_deref(), Some("Hardcoded Credentials"));
        assert_eq!(findings[1].severity(), Severity::Medium);

        assert_eq!(findings[2].vulnerability_type().as_deref(), Some("Path Traversal"));
        assert_eq!(findings[2].severity(), Severity::Low);
        assert_eq!(
            findings[2].recommendation().as_deref(),
            Some(DEFAULT_RECOMMENDATION)
        );
    }

    #[test]
    fn test_text_without_findings_stays_raw() {
        let interpretation = interpret(NO_FINDINGS);
        assert_eq!(interpretation, Interpretation::RawText(NO_FINDINGS.to_string()));
    }

    #[test]
    fn test_to_finding_attaches_file_metadata() {
        let raw: RawFinding = serde_json::from_value(json!({
            "severity_level": "critical",
            "details": "eval on user input",
            "lines": "8-9"
        }))
        .unwrap();

        let finding = raw.to_finding(&meta());
        assert_eq!(finding.vulnerability_type, "Other");
        assert_eq!(finding.severity, Severity::High);
        assert_eq!(finding.description, "eval on user input");
        assert_eq!(finding.line_numbers, vec![LineRef::Range(8, 9)]);
        assert_eq!(finding.file_path, "app/db.py");
        assert_eq!(finding.lines_in_file, 12);
    }

    #[test]
    fn test_line_severity_uses_word_boundaries() {
        assert_eq!(line_severity("buffer overflow in parser", "Buffer Overflow"), Severity::Medium);
        assert_eq!(line_severity("Low risk XSS", "Cross-Site Scripting (XSS)"), Severity::Low);
        assert_eq!(line_severity("reflected XSS", "Cross-Site Scripting (XSS)"), Severity::High);
    }
}
