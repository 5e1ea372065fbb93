//! Data models for the vulnerability analyzer.
//!
//! This module contains the core data structures shared by the scanner,
//! the analysis pipeline, the aggregation engine and the report writers.

use crate::aggregation::{
    ActionableInsights, AnalysisStats, BenchmarkComparison, DetailedStatistics,
    ModelPerformanceMetrics, RiskAssessment, SecurityPatterns, TemporalAnalysis, TrendPredictions,
};
use crate::analysis::Interpretation;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Severity level of a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Low severity - hardening suggestions, minor exposure
    Low,
    /// Medium severity - exploitable under specific conditions
    Medium,
    /// High severity - directly exploitable vulnerabilities
    High,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Low => write!(f, "Low"),
            Severity::Medium => write!(f, "Medium"),
            Severity::High => write!(f, "High"),
        }
    }
}

impl Severity {
    /// All labels, most severe first.
    pub const ALL: [Severity; 3] = [Severity::High, Severity::Medium, Severity::Low];

    /// Returns an emoji representation of the severity.
    pub fn emoji(&self) -> &'static str {
        match self {
            Severity::Low => "🟢",
            Severity::Medium => "🟡",
            Severity::High => "🔴",
        }
    }

    /// Risk weight used by the risk assessment and the security score.
    pub fn weight(&self) -> f64 {
        match self {
            Severity::High => 10.0,
            Severity::Medium => 5.0,
            Severity::Low => 1.0,
        }
    }

    /// Recognize a severity label. Models answer in English or French.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "high" | "critical" | "critique" | "severe" | "élevé" | "élevée" | "eleve"
            | "elevé" | "grave" => Some(Severity::High),
            "medium" | "moderate" | "moyen" | "moyenne" => Some(Severity::Medium),
            "low" | "minor" | "faible" | "info" | "informational" => Some(Severity::Low),
            _ => None,
        }
    }

    /// Total conversion: anything unrecognized is treated as Medium.
    pub fn from_label(label: &str) -> Self {
        Self::parse(label).unwrap_or(Severity::Medium)
    }
}

/// A line reference reported by a model: a single line or an inclusive range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRef {
    Single(u32),
    Range(u32, u32),
}

impl fmt::Display for LineRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineRef::Single(line) => write!(f, "{}", line),
            LineRef::Range(start, end) => write!(f, "{}-{}", start, end),
        }
    }
}

impl Serialize for LineRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            LineRef::Single(line) => serializer.serialize_u32(*line),
            LineRef::Range(..) => serializer.collect_str(self),
        }
    }
}

impl LineRef {
    /// Parse `"42"` or `"15-20"`.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim().trim_start_matches(['L', 'l']);
        if let Some((start, end)) = text.split_once('-') {
            let start = start.trim().parse().ok()?;
            let end = end.trim().trim_start_matches(['L', 'l']).parse().ok()?;
            return Some(if start == end {
                LineRef::Single(start)
            } else {
                LineRef::Range(start, end)
            });
        }
        text.parse().ok().map(LineRef::Single)
    }

    /// Collect every line reference found in a loosely typed JSON value.
    pub fn from_value(value: &Value) -> Vec<LineRef> {
        match value {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .and_then(|n| u32::try_from(n).ok())
                .map(LineRef::Single)
                .into_iter()
                .collect(),
            Value::String(s) => s.split(',').filter_map(LineRef::parse).collect(),
            Value::Array(items) => items.iter().flat_map(LineRef::from_value).collect(),
            _ => Vec::new(),
        }
    }
}

/// Analysis status of a file. A file leaves `Pending` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Pending,
    Analyzed,
    Ignored,
    Error,
}

/// Score a single model obtained on one file.
#[derive(Debug, Clone, Serialize)]
pub struct ModelScore {
    pub model: String,
    pub score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Per-file analysis record.
#[derive(Debug, Clone, Serialize)]
pub struct FileRecord {
    /// Path relative to the repository root.
    pub path: String,
    /// Detected programming language.
    pub language: String,
    /// Size of the analyzed content in bytes.
    pub size_bytes: usize,
    /// Number of lines of the analyzed content.
    pub line_count: usize,
    pub status: FileStatus,
    /// Why the file was ignored.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Why the analysis failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_model: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub model_scores: Vec<ModelScore>,
    pub finding_count: usize,
}

impl FileRecord {
    /// Creates a record that has not been analyzed yet.
    pub fn pending(path: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            language: language.into(),
            size_bytes: 0,
            line_count: 0,
            status: FileStatus::Pending,
            reason: None,
            error: None,
            best_model: None,
            model_scores: Vec::new(),
            finding_count: 0,
        }
    }

    /// Move the record out of `Pending`.
    pub fn settle(&mut self, status: FileStatus) {
        debug_assert_eq!(self.status, FileStatus::Pending, "{} settled twice", self.path);
        debug_assert_ne!(status, FileStatus::Pending);
        self.status = status;
    }

    pub fn ignore(&mut self, reason: impl Into<String>) {
        self.settle(FileStatus::Ignored);
        self.reason = Some(reason.into());
    }

    pub fn fail(&mut self, error: impl Into<String>) {
        self.settle(FileStatus::Error);
        self.error = Some(error.into());
    }
}

/// A vulnerability reported for an analyzed file.
#[derive(Debug, Clone, Serialize)]
pub struct VulnerabilityFinding {
    pub vulnerability_type: String,
    pub severity: Severity,
    pub description: String,
    pub line_numbers: Vec<LineRef>,
    pub recommendation: String,
    /// Path of the owning file (relative to repo root).
    pub file_path: String,
    pub language: String,
    /// Size of the analyzed content when the finding was produced.
    pub file_size: usize,
    /// Line count of the analyzed content when the finding was produced.
    pub lines_in_file: usize,
}

impl VulnerabilityFinding {
    /// Returns the line references as a formatted string.
    pub fn line_range(&self) -> String {
        if self.line_numbers.is_empty() {
            return "n/a".to_string();
        }
        self.line_numbers
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Outcome of querying one model about one file.
#[derive(Debug, Clone, Serialize)]
pub struct ModelResult {
    pub model: String,
    pub response: Interpretation,
    /// Quality score in [0, 1].
    pub quality_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Running tally for one model across the whole run.
#[derive(Debug, Clone, Serialize)]
pub struct ModelPerformance {
    pub model: String,
    pub analyses: usize,
    pub total_score: f64,
    pub errors: usize,
}

impl ModelPerformance {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            analyses: 0,
            total_score: 0.0,
            errors: 0,
        }
    }

    pub fn record_success(&mut self, score: f64) {
        self.analyses += 1;
        self.total_score += score;
    }

    pub fn record_error(&mut self) {
        self.errors += 1;
    }

    pub fn average_score(&self) -> f64 {
        if self.analyses == 0 {
            0.0
        } else {
            self.total_score / self.analyses as f64
        }
    }

    /// Share of successful attempts, in percent.
    pub fn reliability(&self) -> f64 {
        let attempts = self.analyses + self.errors;
        if attempts == 0 {
            0.0
        } else {
            self.analyses as f64 / attempts as f64 * 100.0
        }
    }
}

/// Lines of code totals.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LinesOfCode {
    pub total: usize,
    pub by_language: BTreeMap<String, usize>,
    pub by_file_type: BTreeMap<String, usize>,
}

/// A configuration or manifest file found in the repository.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigFile {
    pub file: String,
    #[serde(rename = "type")]
    pub config_type: String,
    pub size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    Production,
    Development,
}

/// A dependency declared in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    pub name: String,
    pub version: String,
    #[serde(rename = "type")]
    pub kind: DependencyKind,
}

/// One top-level entry of the directory snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DirectoryEntry {
    Directory { files: usize },
    File { size: u64 },
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct HealthFactors {
    pub size: f64,
    pub complexity: f64,
    pub language_diversity: f64,
    pub configuration: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MaintenanceIndicators {
    pub has_readme: bool,
    pub has_dockerfile: bool,
    pub has_dependencies: bool,
    pub has_config_files: bool,
}

/// Composite repository health.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RepositoryHealth {
    pub score: f64,
    pub factors: HealthFactors,
    pub size_category: String,
    pub complexity_level: String,
    pub maintenance_indicators: MaintenanceIndicators,
}

/// Repository-wide statistics gathered before the analysis.
#[derive(Debug, Clone, Serialize)]
pub struct RepositoryContext {
    pub repository_name: String,
    pub analysis_timestamp: DateTime<Utc>,
    pub total_files: usize,
    pub total_size_bytes: u64,
    pub languages: BTreeMap<String, usize>,
    pub file_types: BTreeMap<String, usize>,
    pub lines_of_code: LinesOfCode,
    pub configuration_files: Vec<ConfigFile>,
    /// Parsed manifests keyed by their relative path.
    pub dependencies: BTreeMap<String, Vec<Dependency>>,
    pub directory_structure: BTreeMap<String, DirectoryEntry>,
    pub repository_health: RepositoryHealth,
}

impl RepositoryContext {
    /// Creates an empty context for the named repository.
    pub fn empty(repository_name: impl Into<String>) -> Self {
        Self {
            repository_name: repository_name.into(),
            analysis_timestamp: Utc::now(),
            total_files: 0,
            total_size_bytes: 0,
            languages: BTreeMap::new(),
            file_types: BTreeMap::new(),
            lines_of_code: LinesOfCode::default(),
            configuration_files: Vec::new(),
            dependencies: BTreeMap::new(),
            directory_structure: BTreeMap::new(),
            repository_health: RepositoryHealth::default(),
        }
    }
}

/// The complete result of one analysis run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub repository: String,
    pub repository_context: RepositoryContext,
    pub analysis_stats: AnalysisStats,
    pub files: Vec<FileRecord>,
    pub findings: Vec<VulnerabilityFinding>,
    pub best_model: Option<String>,
    /// Sum of per-file quality scores for each model.
    pub model_scores: BTreeMap<String, f64>,
    pub model_performance: Vec<ModelPerformance>,
    pub detailed_statistics: DetailedStatistics,
    pub risk_assessment: RiskAssessment,
    pub security_patterns: SecurityPatterns,
    pub model_performance_metrics: ModelPerformanceMetrics,
    pub actionable_insights: ActionableInsights,
    pub temporal_analysis: TemporalAnalysis,
    pub benchmark_comparison: BenchmarkComparison,
    pub trend_predictions: TrendPredictions,
}

impl AnalysisReport {
    /// Number of findings at or above the given severity.
    pub fn count_at_least(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity >= severity)
            .count()
    }
}

/// Round to the given number of decimals.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
