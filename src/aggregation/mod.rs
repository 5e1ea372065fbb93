//! Summaries derived from a complete finding set.
//!
//! Each summarizer is a pure function of the findings (plus run statistics
//! where needed) and is defined for an empty finding list. Map-shaped output
//! uses ordered maps and rankings break count ties by name, so the report does
//! not depend on the order in which files completed.

mod insights;
mod patterns;
mod performance;
mod risk;
mod stats;

pub use insights::{generate_insights, ActionableInsights};
pub use patterns::{analyze_patterns, SecurityPatterns};
pub use performance::{rank_models, ModelPerformanceMetrics};
pub use risk::{assess_risk, RiskAssessment};
pub use stats::{
    duration_seconds, AnalysisStats, BenchmarkComparison, DetailedStatistics, SeverityCounts,
    TemporalAnalysis, TrendPredictions,
};

use crate::models::{
    AnalysisReport, FileRecord, ModelPerformance, RepositoryContext, VulnerabilityFinding,
};
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tracing::debug;

/// Everything the scheduler collected during one run.
#[derive(Debug, Clone)]
pub struct CompletedRun {
    pub context: RepositoryContext,
    /// Requested models, in requested order.
    pub models: Vec<String>,
    pub files: Vec<FileRecord>,
    pub findings: Vec<VulnerabilityFinding>,
    pub model_performance: Vec<ModelPerformance>,
    pub total_files_found: usize,
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
}

/// The `n` entries with the highest counts. Equal counts keep key order.
pub(crate) fn top_by_count(counts: &BTreeMap<String, usize>, n: usize) -> Vec<(String, usize)> {
    let mut entries: Vec<(String, usize)> =
        counts.iter().map(|(k, v)| (k.clone(), *v)).collect();
    entries.sort_by_key(|(_, count)| Reverse(*count));
    entries.truncate(n);
    entries
}

/// Sum of per-file quality scores for each model.
pub fn model_score_totals(files: &[FileRecord]) -> BTreeMap<String, f64> {
    let mut totals = BTreeMap::new();
    for file in files {
        for score in &file.model_scores {
            *totals.entry(score.model.clone()).or_insert(0.0) += score.score;
        }
    }
    totals
}

/// Model with the highest summed score. Ties go to the model requested first.
pub fn overall_best_model(models: &[String], totals: &BTreeMap<String, f64>) -> Option<String> {
    let mut best: Option<(&String, f64)> = None;
    for model in models {
        let Some(total) = totals.get(model) else {
            continue;
        };
        if best.map_or(true, |(_, score)| *total > score) {
            best = Some((model, *total));
        }
    }
    best.map(|(model, _)| model.clone())
}

/// Assemble the final report from a completed run.
pub fn build_report(run: CompletedRun) -> AnalysisReport {
    let duration = duration_seconds(run.started, run.finished);
    let analysis_stats = AnalysisStats::from_files(&run.files, run.total_files_found, duration);
    let detailed_statistics = DetailedStatistics::from_findings(&run.findings);

    let risk_assessment = assess_risk(&run.findings);
    let security_patterns = analyze_patterns(&run.findings);
    let model_performance_metrics = rank_models(&run.model_performance);
    let actionable_insights = generate_insights(&run.findings, &analysis_stats);

    let temporal_analysis =
        TemporalAnalysis::new(run.started, run.finished, run.files.len(), run.findings.len());
    let benchmark_comparison =
        BenchmarkComparison::new(&analysis_stats, &detailed_statistics.by_severity);
    let trend_predictions = TrendPredictions::new(
        &detailed_statistics,
        &actionable_insights.metrics.estimated_fix_time,
        run.started,
        run.finished,
    );

    let model_scores = model_score_totals(&run.files);
    let best_model = overall_best_model(&run.models, &model_scores);
    debug!(
        "Report built: {} findings, risk {}",
        run.findings.len(),
        risk_assessment.overall_risk
    );

    AnalysisReport {
        repository: run.context.repository_name.clone(),
        repository_context: run.context,
        analysis_stats,
        files: run.files,
        findings: run.findings,
        best_model,
        model_scores,
        model_performance: run.model_performance,
        detailed_statistics,
        risk_assessment,
        security_patterns,
        model_performance_metrics,
        actionable_insights,
        temporal_analysis,
        benchmark_comparison,
        trend_predictions,
    }
}
