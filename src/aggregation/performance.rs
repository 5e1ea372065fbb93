//! Cross-model performance comparison.

use crate::models::{round_to, ModelPerformance};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize)]
pub struct ReliabilityScore {
    pub reliability_percentage: f64,
    pub average_quality_score: f64,
    pub total_analyses: usize,
    pub error_count: usize,
    pub combined_performance: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelRanking {
    pub model: String,
    pub performance_score: f64,
    pub quality_score: f64,
    pub reliability: f64,
    pub analyses_completed: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PerformanceSummary {
    pub total_models_tested: usize,
    pub best_performer: String,
    pub best_performance_score: f64,
    pub most_reliable_model: String,
    pub highest_reliability: f64,
    pub average_performance: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ModelRecommendation {
    pub best_overall: Option<String>,
    pub most_reliable: Option<String>,
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ModelPerformanceMetrics {
    /// Models ordered by combined performance, best first.
    pub model_rankings: Vec<ModelRanking>,
    pub reliability_scores: BTreeMap<String, ReliabilityScore>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub performance_summary: Option<PerformanceSummary>,
    pub recommendation: ModelRecommendation,
}

/// Weighted blend of quality and reliability, in percent.
fn combined_performance(perf: &ModelPerformance) -> f64 {
    (0.7 * perf.average_score() + 0.3 * perf.reliability() / 100.0) * 100.0
}

/// Rank models by quality and reliability.
///
/// `performance` is expected in requested order: equal combined scores keep
/// that order, and the most reliable model is the first one reaching the
/// maximum reliability.
pub fn rank_models(performance: &[ModelPerformance]) -> ModelPerformanceMetrics {
    let mut metrics = ModelPerformanceMetrics::default();
    if performance.is_empty() {
        return metrics;
    }

    for perf in performance {
        let combined = combined_performance(perf);
        metrics.reliability_scores.insert(
            perf.model.clone(),
            ReliabilityScore {
                reliability_percentage: round_to(perf.reliability(), 1),
                average_quality_score: round_to(perf.average_score(), 3),
                total_analyses: perf.analyses,
                error_count: perf.errors,
                combined_performance: round_to(combined, 1),
            },
        );
        metrics.model_rankings.push(ModelRanking {
            model: perf.model.clone(),
            performance_score: round_to(combined, 1),
            quality_score: round_to(perf.average_score(), 3),
            reliability: round_to(perf.reliability(), 1),
            analyses_completed: perf.analyses,
        });
    }
    metrics.model_rankings.sort_by(|a, b| {
        b.performance_score
            .partial_cmp(&a.performance_score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let best = &metrics.model_rankings[0];
    let mut most_reliable = &performance[0];
    for perf in &performance[1..] {
        if perf.reliability() > most_reliable.reliability() {
            most_reliable = perf;
        }
    }
    let highest_reliability = round_to(most_reliable.reliability(), 1);

    let average = metrics
        .model_rankings
        .iter()
        .map(|r| r.performance_score)
        .sum::<f64>()
        / metrics.model_rankings.len() as f64;

    let mut reasons = Vec::new();
    if best.performance_score > 80.0 {
        reasons.push(format!(
            "{} delivers the best overall performance ({:.1}%)",
            best.model, best.performance_score
        ));
    }
    if highest_reliability > 90.0 {
        reasons.push(format!(
            "{} is highly reliable ({:.1}% successful analyses)",
            most_reliable.model, highest_reliability
        ));
    }
    if best.model == most_reliable.model {
        reasons.push("The best performing model is also the most reliable".to_string());
    }
    if reasons.is_empty() {
        reasons.push("Models show comparable results, compare them on more files".to_string());
    }

    metrics.performance_summary = Some(PerformanceSummary {
        total_models_tested: performance.len(),
        best_performer: best.model.clone(),
        best_performance_score: best.performance_score,
        most_reliable_model: most_reliable.model.clone(),
        highest_reliability,
        average_performance: round_to(average, 1),
    });
    metrics.recommendation = ModelRecommendation {
        best_overall: Some(best.model.clone()),
        most_reliable: Some(most_reliable.model.clone()),
        reasons,
    };

    metrics
}
