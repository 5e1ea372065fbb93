//! Run statistics: counts, timing, benchmarks and trends.

use super::top_by_count;
use crate::models::{round_to, FileRecord, FileStatus, Severity, VulnerabilityFinding};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// File-level counters for one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisStats {
    pub total_files_found: usize,
    pub files_analyzed: usize,
    pub files_ignored: usize,
    pub files_with_errors: usize,
    pub files_with_findings: usize,
    /// Analyzed files over processed files, in percent.
    pub analysis_coverage: f64,
    pub analysis_duration_seconds: f64,
    /// Processed files per second.
    pub analysis_speed: f64,
}

impl AnalysisStats {
    pub fn from_files(files: &[FileRecord], total_files_found: usize, duration_secs: f64) -> Self {
        let with_status = |status| files.iter().filter(|f| f.status == status).count();
        let analyzed = with_status(FileStatus::Analyzed);
        let processed = files.len();

        Self {
            total_files_found,
            files_analyzed: analyzed,
            files_ignored: with_status(FileStatus::Ignored),
            files_with_errors: with_status(FileStatus::Error),
            files_with_findings: files.iter().filter(|f| f.finding_count > 0).count(),
            analysis_coverage: if processed == 0 {
                0.0
            } else {
                round_to(analyzed as f64 / processed as f64 * 100.0, 1)
            },
            analysis_duration_seconds: round_to(duration_secs, 2),
            analysis_speed: round_to(processed as f64 / duration_secs.max(1.0), 2),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SeverityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub total: usize,
}

impl SeverityCounts {
    pub fn add(&mut self, severity: Severity) {
        match severity {
            Severity::High => self.high += 1,
            Severity::Medium => self.medium += 1,
            Severity::Low => self.low += 1,
        }
        self.total += 1;
    }

    pub fn of(findings: &[VulnerabilityFinding]) -> Self {
        let mut counts = Self::default();
        for finding in findings {
            counts.add(finding.severity);
        }
        counts
    }

    pub fn get(&self, severity: Severity) -> usize {
        match severity {
            Severity::High => self.high,
            Severity::Medium => self.medium,
            Severity::Low => self.low,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DetailedStatistics {
    pub by_severity: SeverityCounts,
    pub by_type: BTreeMap<String, usize>,
    pub by_language: BTreeMap<String, usize>,
    pub by_file: BTreeMap<String, SeverityCounts>,
}

impl DetailedStatistics {
    pub fn from_findings(findings: &[VulnerabilityFinding]) -> Self {
        let mut stats = Self::default();
        for finding in findings {
            stats.by_severity.add(finding.severity);
            *stats
                .by_type
                .entry(finding.vulnerability_type.clone())
                .or_default() += 1;
            *stats
                .by_language
                .entry(finding.language.clone())
                .or_default() += 1;
            stats
                .by_file
                .entry(finding.file_path.clone())
                .or_default()
                .add(finding.severity);
        }
        stats
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Throughput {
    pub files_per_minute: f64,
    pub vulnerabilities_per_minute: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemporalAnalysis {
    pub analysis_start: DateTime<Utc>,
    pub analysis_end: DateTime<Utc>,
    /// Human readable duration, `"Xm Ys"`.
    pub total_duration: String,
    pub average_time_per_file: f64,
    pub throughput: Throughput,
}

impl TemporalAnalysis {
    pub fn new(
        started: DateTime<Utc>,
        finished: DateTime<Utc>,
        files_processed: usize,
        findings: usize,
    ) -> Self {
        let seconds = duration_seconds(started, finished);
        let minutes = (seconds / 60.0).max(1.0);
        let whole = seconds as u64;

        Self {
            analysis_start: started,
            analysis_end: finished,
            total_duration: format!("{}m {}s", whole / 60, whole % 60),
            average_time_per_file: round_to(seconds / files_processed.max(1) as f64, 2),
            throughput: Throughput {
                files_per_minute: round_to(files_processed as f64 / minutes, 1),
                vulnerabilities_per_minute: round_to(findings as f64 / minutes, 1),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkMetric {
    pub current: f64,
    pub reference: f64,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkComparison {
    /// Findings per analyzed file.
    pub vulnerability_density: BenchmarkMetric,
    pub security_coverage: BenchmarkMetric,
    /// Share of High findings, in percent.
    pub critical_issues_ratio: BenchmarkMetric,
}

impl BenchmarkComparison {
    pub fn new(stats: &AnalysisStats, severities: &SeverityCounts) -> Self {
        let density = severities.total as f64 / stats.files_analyzed.max(1) as f64;
        let critical = severities.high as f64 / severities.total.max(1) as f64 * 100.0;

        Self {
            vulnerability_density: BenchmarkMetric {
                current: round_to(density, 2),
                reference: 0.5,
                status: if density < 0.5 { "low" } else { "high" }.to_string(),
            },
            security_coverage: BenchmarkMetric {
                current: stats.analysis_coverage,
                reference: 80.0,
                status: if stats.analysis_coverage >= 80.0 {
                    "good"
                } else {
                    "needs_improvement"
                }
                .to_string(),
            },
            critical_issues_ratio: BenchmarkMetric {
                current: round_to(critical, 1),
                reference: 10.0,
                status: if critical <= 10.0 {
                    "acceptable"
                } else {
                    "concerning"
                }
                .to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LanguageCount {
    pub language: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct TrendPredictions {
    pub security_trend: String,
    pub maintenance_effort: String,
    /// `YYYY-MM-DD`.
    pub next_review_recommended: String,
    pub priority_areas: Vec<LanguageCount>,
}

impl TrendPredictions {
    pub fn new(
        detailed: &DetailedStatistics,
        maintenance_effort: &str,
        started: DateTime<Utc>,
        finished: DateTime<Utc>,
    ) -> Self {
        let total = detailed.by_severity.total;
        let trend = if total < 10 {
            "improving"
        } else if total < 30 {
            "stable"
        } else {
            "needs_attention"
        };
        let multiplier = if total < 5 {
            5
        } else if total < 15 {
            3
        } else {
            1
        };
        let next_review = finished + (finished - started) * multiplier;

        Self {
            security_trend: trend.to_string(),
            maintenance_effort: maintenance_effort.to_string(),
            next_review_recommended: next_review.format("%Y-%m-%d").to_string(),
            priority_areas: top_by_count(&detailed.by_language, 3)
                .into_iter()
                .map(|(language, count)| LanguageCount { language, count })
                .collect(),
        }
    }
}

/// Seconds between two instants, never negative.
pub fn duration_seconds(started: DateTime<Utc>, finished: DateTime<Utc>) -> f64 {
    let elapsed = (finished - started).max(Duration::zero());
    elapsed.num_milliseconds() as f64 / 1000.0
}
