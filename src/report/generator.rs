//! Markdown and JSON report generation.

use super::formatted::security_score;
use crate::models::{AnalysisReport, FileStatus, Severity, VulnerabilityFinding};
use anyhow::{Context, Result};
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::path::Path;

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &AnalysisReport) -> String {
    let mut output = String::new();

    output.push_str("# VulnScope Security Report\n\n");
    output.push_str(&generate_metadata_section(report));
    output.push_str(&generate_table_of_contents(report));
    output.push_str(&generate_summary_section(report));
    output.push_str(&generate_model_section(report));
    output.push_str(&generate_findings_section(report));
    output.push_str(&generate_insights_section(report));
    output.push_str(&generate_repository_section(report));
    output.push_str(&generate_footer());

    output
}

fn anchor(path: &str) -> String {
    path.replace(['/', '.', ' '], "-").to_lowercase()
}

fn generate_metadata_section(report: &AnalysisReport) -> String {
    let stats = &report.analysis_stats;
    let mut section = String::new();

    section.push_str("## Metadata\n\n");
    section.push_str(&format!("- **Repository:** {}\n", report.repository));
    section.push_str(&format!(
        "- **Analysis Date:** {}\n",
        report
            .repository_context
            .analysis_timestamp
            .format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if let Some(ref model) = report.best_model {
        section.push_str(&format!("- **Best Model:** `{}`\n", model));
    }
    section.push_str(&format!(
        "- **Files Analyzed:** {} of {} found\n",
        stats.files_analyzed, stats.total_files_found
    ));
    if stats.files_with_errors > 0 {
        section.push_str(&format!("- **Files Failed:** {}\n", stats.files_with_errors));
    }
    section.push_str(&format!("- **Total Findings:** {}\n", report.findings.len()));
    section.push_str(&format!(
        "- **Analysis Duration:** {}\n\n",
        report.temporal_analysis.total_duration
    ));

    section
}

fn generate_table_of_contents(report: &AnalysisReport) -> String {
    let mut toc = String::new();

    toc.push_str("## Table of Contents\n\n");
    toc.push_str("- [Metadata](#metadata)\n");
    toc.push_str("- [Summary](#summary)\n");
    toc.push_str("- [Model Comparison](#model-comparison)\n");
    toc.push_str("- [Findings by File](#findings-by-file)\n");
    for path in report.detailed_statistics.by_file.keys() {
        toc.push_str(&format!("  - [{}](#{})\n", path, anchor(path)));
    }
    toc.push_str("- [Recommendations](#recommendations)\n");
    toc.push_str("- [Repository Overview](#repository-overview)\n\n");

    toc
}

fn generate_summary_section(report: &AnalysisReport) -> String {
    let counts = &report.detailed_statistics.by_severity;
    let risk = &report.risk_assessment;
    let mut section = String::new();

    section.push_str("## Summary\n\n");
    section.push_str(&format!(
        "**Overall risk:** {} ({:.1}/25) | **Security score:** {:.1}/100\n\n",
        risk.overall_risk,
        risk.risk_score,
        security_score(&report.findings)
    ));

    section.push_str("### Severity Breakdown\n\n");
    section.push_str(&format!(
        "| {} High | {} Medium | {} Low | **Total** |\n",
        Severity::High.emoji(),
        Severity::Medium.emoji(),
        Severity::Low.emoji(),
    ));
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | **{}** |\n\n",
        counts.high, counts.medium, counts.low, counts.total
    ));

    push_count_table(
        &mut section,
        "Findings by Type",
        "Type",
        &report.detailed_statistics.by_type,
    );
    push_count_table(
        &mut section,
        "Findings by Language",
        "Language",
        &report.detailed_statistics.by_language,
    );

    let priorities = &report.security_patterns.security_debt.maintenance_priority;
    if !priorities.is_empty() {
        section.push_str("### Most Vulnerable Files\n\n");
        section.push_str("| File | Findings | Priority |\n");
        section.push_str("|:---|:---:|:---:|\n");
        for entry in priorities {
            section.push_str(&format!(
                "| `{}` | {} | {} |\n",
                entry.file, entry.vulnerability_count, entry.priority
            ));
        }
        section.push('\n');
    }

    if !risk.recommendations.is_empty() {
        section.push_str("### Risk Recommendations\n\n");
        for rec in &risk.recommendations {
            section.push_str(&format!("- {}\n", rec));
        }
        section.push('\n');
    }

    section
}

fn push_count_table(section: &mut String, title: &str, label: &str, counts: &BTreeMap<String, usize>) {
    if counts.is_empty() {
        return;
    }
    section.push_str(&format!("### {}\n\n", title));
    section.push_str(&format!("| {} | Count |\n", label));
    section.push_str("|:---|:---:|\n");

    let mut rows: Vec<_> = counts.iter().collect();
    rows.sort_by_key(|(_, count)| Reverse(**count));
    for (name, count) in rows {
        section.push_str(&format!("| {} | {} |\n", name, count));
    }
    section.push('\n');
}

fn generate_model_section(report: &AnalysisReport) -> String {
    let metrics = &report.model_performance_metrics;
    let mut section = String::new();

    section.push_str("## Model Comparison\n\n");
    if metrics.model_rankings.is_empty() {
        section.push_str("No model results were recorded.\n\n");
        return section;
    }

    section.push_str("| Rank | Model | Performance | Avg. Quality | Reliability | Analyses |\n");
    section.push_str("|:---:|:---|:---:|:---:|:---:|:---:|\n");
    for (i, ranking) in metrics.model_rankings.iter().enumerate() {
        section.push_str(&format!(
            "| {} | `{}` | {:.1} | {:.3} | {:.1}% | {} |\n",
            i + 1,
            ranking.model,
            ranking.performance_score,
            ranking.quality_score,
            ranking.reliability,
            ranking.analyses_completed
        ));
    }
    section.push('\n');

    for reason in &metrics.recommendation.reasons {
        section.push_str(&format!("- {}\n", reason));
    }
    section.push('\n');

    section
}

fn generate_findings_section(report: &AnalysisReport) -> String {
    let mut section = String::new();
    section.push_str("## Findings by File\n\n");

    let mut by_file: BTreeMap<&str, Vec<&VulnerabilityFinding>> = BTreeMap::new();
    for finding in &report.findings {
        by_file.entry(finding.file_path.as_str()).or_default().push(finding);
    }

    if by_file.is_empty() {
        section.push_str("No vulnerabilities were found in the analyzed files. 🎉\n\n");
    }

    for (path, mut findings) in by_file {
        findings.sort_by_key(|f| Reverse(f.severity));
        let first = findings[0];

        section.push_str(&format!("### {} {{#{}}}\n\n", path, anchor(path)));
        section.push_str(&format!(
            "*Language: {} | Lines: {} | Findings: {}*\n\n",
            first.language,
            first.lines_in_file,
            findings.len()
        ));
        for finding in findings {
            section.push_str(&generate_finding_block(finding));
        }
    }

    let failed: Vec<_> = report
        .files
        .iter()
        .filter(|f| f.status == FileStatus::Error)
        .collect();
    if !failed.is_empty() {
        section.push_str("### Files That Could Not Be Analyzed\n\n");
        for file in failed {
            section.push_str(&format!(
                "- `{}`: {}\n",
                file.path,
                file.error.as_deref().unwrap_or("unknown error")
            ));
        }
        section.push('\n');
    }

    section
}

fn generate_finding_block(finding: &VulnerabilityFinding) -> String {
    let mut block = String::new();

    block.push_str(&format!(
        "#### {} **{}** - {}\n\n",
        finding.severity.emoji(),
        finding.severity.to_string().to_uppercase(),
        finding.vulnerability_type
    ));
    block.push_str(&format!("**Lines:** {}\n\n", finding.line_range()));
    if !finding.description.is_empty() {
        block.push_str(&format!("**Description:** {}\n\n", finding.description));
    }
    if !finding.recommendation.is_empty() {
        block.push_str(&format!(
            "> 💡 **Recommendation:** {}\n\n",
            finding.recommendation
        ));
    }
    block.push_str("---\n\n");

    block
}

fn push_list(section: &mut String, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    section.push_str(&format!("### {}\n\n", title));
    for item in items {
        section.push_str(&format!("- {}\n", item));
    }
    section.push('\n');
}

fn generate_insights_section(report: &AnalysisReport) -> String {
    let insights = &report.actionable_insights;
    let mut section = String::new();

    section.push_str("## Recommendations\n\n");
    section.push_str(&format!(
        "- **Security maturity:** {}\n- **Improvement priority:** {}\n- **Estimated fix time:** {}\n- **Next review:** {}\n\n",
        insights.metrics.security_maturity_level,
        insights.metrics.improvement_priority,
        insights.metrics.estimated_fix_time,
        report.trend_predictions.next_review_recommended
    ));

    push_list(&mut section, "Immediate Actions", &insights.immediate_actions);
    push_list(&mut section, "Short-Term Goals", &insights.short_term_goals);
    push_list(&mut section, "Long-Term Strategy", &insights.long_term_strategy);
    push_list(&mut section, "Process Improvements", &insights.process_improvements);
    push_list(&mut section, "Training Needs", &insights.training_needs);
    push_list(&mut section, "Recommended Tools", &insights.tool_recommendations);

    section
}

fn generate_repository_section(report: &AnalysisReport) -> String {
    let context = &report.repository_context;
    let health = &context.repository_health;
    let mut section = String::new();

    section.push_str("## Repository Overview\n\n");
    section.push_str(&format!(
        "- **Files:** {} ({} bytes)\n- **Lines of code:** {}\n- **Health score:** {:.1}/100 ({}, {} complexity)\n\n",
        context.total_files,
        context.total_size_bytes,
        context.lines_of_code.total,
        health.score,
        health.size_category,
        health.complexity_level
    ));
    push_count_table(&mut section, "Files by Language", "Language", &context.languages);

    if !context.dependencies.is_empty() {
        section.push_str("### Dependency Manifests\n\n");
        for (manifest, deps) in &context.dependencies {
            section.push_str(&format!("- `{}`: {} dependencies\n", manifest, deps.len()));
        }
        section.push('\n');
    }

    section
}

fn generate_footer() -> String {
    format!(
        "---\n\n*Report generated by VulnScope v{}*\n",
        env!("CARGO_PKG_VERSION")
    )
}

/// Generate a JSON report.
pub fn generate_json_report(report: &AnalysisReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("Failed to serialize report")
}

/// Write rendered report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))
}
