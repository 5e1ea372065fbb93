//! Report output: Markdown, JSON and the renderer-facing formatted report.

mod formatted;
mod generator;

pub use formatted::FormattedReport;
pub use generator::{generate_json_report, generate_markdown_report, write_report};

#[cfg(test)]
pub(crate) mod tests {
    use crate::aggregation::tests::finding;
    use crate::aggregation::{build_report, CompletedRun};
    use crate::models::{
        AnalysisReport, FileRecord, FileStatus, ModelPerformance, ModelScore, RepositoryContext,
        Severity,
    };
    use chrono::Utc;

    /// A small finished run: two analyzed files, one ignored.
    pub(crate) fn sample_report() -> AnalysisReport {
        let mut db = FileRecord::pending("src/db.py", "Python");
        db.model_scores = vec![ModelScore {
            model: "llama3".to_string(),
            score: 0.8,
            error: None,
        }];
        db.best_model = Some("llama3".to_string());
        db.finding_count = 2;
        db.settle(FileStatus::Analyzed);

        let mut view = FileRecord::pending("web/view.js", "JavaScript");
        view.model_scores = vec![ModelScore {
            model: "llama3".to_string(),
            score: 0.6,
            error: None,
        }];
        view.finding_count = 1;
        view.settle(FileStatus::Analyzed);

        let mut notes = FileRecord::pending("notes.xyz", "Unknown");
        notes.ignore("Unsupported language");

        let mut perf = ModelPerformance::new("llama3");
        perf.record_success(0.8);
        perf.record_success(0.6);

        let now = Utc::now();
        build_report(CompletedRun {
            context: RepositoryContext::empty("demo"),
            models: vec!["llama3".to_string()],
            files: vec![db, notes, view],
            findings: vec![
                finding("src/db.py", "Path Traversal", Severity::Low),
                finding("src/db.py", "SQL Injection", Severity::High),
                finding("web/view.js", "XSS", Severity::Medium),
            ],
            model_performance: vec![perf],
            total_files_found: 3,
            started: now,
            finished: now,
        })
    }
}
