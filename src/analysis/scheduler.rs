//! Repository-level analysis driver.
//!
//! Files pass through a single-slot admission gate since the inference
//! backend serves one request at a time. Results are folded in completion
//! order by the consumer loop, which owns every tally.

use super::arbitrator::compare;
use super::interpreter::FileMeta;
use super::prompt::{truncate_chars, vulnerability_prompt};
use crate::aggregation::{build_report, CompletedRun};
use crate::backend::CompletionBackend;
use crate::models::{
    AnalysisReport, FileRecord, FileStatus, ModelPerformance, ModelScore, VulnerabilityFinding,
};
use crate::scanner::{detect_language, language, RepositoryScanner, UNKNOWN};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Content longer than this is cut before building the prompt.
pub const MAX_CONTENT_CHARS: usize = 50_000;

const TRUNCATION_MARKER: &str = "\n[File truncated...]";

/// Scheduler settings.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Maximum number of files analyzed per run.
    pub max_files: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { max_files: 100 }
    }
}

/// Result of analyzing a single file.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub record: FileRecord,
    pub findings: Vec<VulnerabilityFinding>,
}

/// Drives per-file analysis over a repository checkout.
pub struct AnalysisScheduler {
    backend: Arc<dyn CompletionBackend>,
    scanner: RepositoryScanner,
    config: SchedulerConfig,
    /// Files admitted at once.
    capacity: usize,
}

/// Cap the list at `max_files`, then move priority extensions to the front.
pub fn select_files(mut files: Vec<String>, max_files: usize) -> Vec<String> {
    if files.len() > max_files {
        warn!(
            "Too many files ({}), limiting the analysis to {}",
            files.len(),
            max_files
        );
        files.truncate(max_files);
    }
    files.sort_by_key(|f| !language::is_priority(Path::new(f)));
    files
}

/// Fold one file's outcome into the per-model tallies.
fn tally(performance: &mut [ModelPerformance], record: &FileRecord) {
    if record.status == FileStatus::Ignored {
        return;
    }
    if record.model_scores.is_empty() {
        if record.status == FileStatus::Error {
            for perf in performance.iter_mut() {
                perf.record_error();
            }
        }
        return;
    }
    for score in &record.model_scores {
        let Some(perf) = performance.iter_mut().find(|p| p.model == score.model) else {
            continue;
        };
        if score.error.is_some() {
            perf.record_error();
        } else {
            perf.record_success(score.score);
        }
    }
}

impl AnalysisScheduler {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        scanner: RepositoryScanner,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            backend,
            scanner,
            config,
            capacity: 1,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Analyze one file with every requested model.
    ///
    /// Never fails: problems are reported through the record's status.
    pub async fn analyze_file(&self, path: &str, models: &[String]) -> FileOutcome {
        let language = detect_language(Path::new(path));
        let mut record = FileRecord::pending(path, language);
        let mut findings = Vec::new();

        if language == UNKNOWN {
            debug!("Skipping {}: unsupported language", path);
            record.ignore("Unsupported language");
            return FileOutcome { record, findings };
        }

        let mut content = match self.scanner.read_file(path) {
            Ok(content) => content,
            Err(e) => {
                warn!("Cannot read {}: {}", path, e);
                record.fail(format!("Cannot read file: {}", e));
                return FileOutcome { record, findings };
            }
        };
        if content.trim().is_empty() {
            record.ignore("Empty file");
            return FileOutcome { record, findings };
        }
        if content.chars().count() > MAX_CONTENT_CHARS {
            debug!("Truncating {} to {} characters", path, MAX_CONTENT_CHARS);
            content = format!("{}{}", truncate_chars(&content, MAX_CONTENT_CHARS), TRUNCATION_MARKER);
        }

        record.size_bytes = content.len();
        record.line_count = content.split('\n').count();

        let instructions = vulnerability_prompt(language);
        let arbitration = match compare(self.backend.as_ref(), models, &content, &instructions).await
        {
            Ok(arbitration) => arbitration,
            Err(e) => {
                record.fail(e.to_string());
                return FileOutcome { record, findings };
            }
        };

        record.model_scores = arbitration
            .results
            .iter()
            .map(|r| ModelScore {
                model: r.model.clone(),
                score: r.quality_score,
                error: r.error.clone(),
            })
            .collect();
        record.best_model = Some(arbitration.best_model.clone());

        let winner = arbitration.winner();
        if arbitration.all_failed() {
            let error = winner
                .and_then(|w| w.error.clone())
                .unwrap_or_else(|| "every model failed".to_string());
            record.fail(error);
            return FileOutcome { record, findings };
        }

        if let Some(winner) = winner {
            let meta = FileMeta {
                path,
                language,
                size: record.size_bytes,
                lines: record.line_count,
            };
            findings = winner
                .response
                .findings()
                .iter()
                .map(|raw| raw.to_finding(&meta))
                .collect();
        }
        record.finding_count = findings.len();
        record.settle(FileStatus::Analyzed);
        info!(
            "{}: {} findings (best model {})",
            path,
            findings.len(),
            arbitration.best_model
        );

        FileOutcome { record, findings }
    }

    /// Analyze `files` and build the full report.
    ///
    /// `on_progress` receives the completed fraction after every file.
    pub async fn analyze_repository<F>(
        &self,
        files: Vec<String>,
        models: &[String],
        mut on_progress: F,
    ) -> AnalysisReport
    where
        F: FnMut(f64) + Send,
    {
        let started = Utc::now();
        let context = self.scanner.scan();
        let total_files_found = files.len();
        let files = select_files(files, self.config.max_files);
        let total = files.len();
        info!("Analyzing {} files with {} models", total, models.len());

        let mut model_performance: Vec<ModelPerformance> =
            models.iter().map(ModelPerformance::new).collect();
        let mut records = Vec::with_capacity(total);
        let mut findings = Vec::new();

        let mut outcomes = stream::iter(files.iter().cloned())
            .map(|path| async move { self.analyze_file(&path, models).await })
            .buffer_unordered(self.capacity);

        let mut completed = 0usize;
        while let Some(outcome) = outcomes.next().await {
            tally(&mut model_performance, &outcome.record);
            completed += 1;
            on_progress(completed as f64 / total as f64);
            records.push(outcome.record);
            findings.extend(outcome.findings);
        }

        records.sort_by(|a, b| a.path.cmp(&b.path));
        findings.sort_by(|a, b| a.file_path.cmp(&b.file_path));

        build_report(CompletedRun {
            context,
            models: models.to_vec(),
            files: records,
            findings,
            model_performance,
            total_files_found,
            started,
            finished: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::testing::{Reply, ScriptedBackend};
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    const ONE_HIGH: &str = r#"{"findings": [{"vulnerability_type": "SQL Injection", "severity": "High", "description": "query built from input", "line_numbers": [3], "recommendation": "use parameters"}]}"#;
    const NONE: &str = r#"{"findings": []}"#;

    fn repo(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        dir
    }

    fn scheduler(dir: &TempDir, backend: ScriptedBackend) -> AnalysisScheduler {
        AnalysisScheduler::new(
            Arc::new(backend),
            RepositoryScanner::new(dir.path()),
            SchedulerConfig::default(),
        )
    }

    fn models(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_select_files_caps_then_reorders() {
        let files = models(&["README.md", "a.txt", "main.py", "z.js"]);
        assert_eq!(
            select_files(files, 3),
            vec!["main.py", "README.md", "a.txt"]
        );
    }

    #[tokio::test]
    async fn test_analyze_file_attaches_metadata() {
        let dir = repo(&[("app.py", "import os\n\nquery = 'SELECT ' + user\n")]);
        let backend = ScriptedBackend::new().model("m", Reply::Text(ONE_HIGH.to_string()));
        let outcome = scheduler(&dir, backend)
            .analyze_file("app.py", &models(&["m"]))
            .await;

        assert_eq!(outcome.record.status, FileStatus::Analyzed);
        assert_eq!(outcome.record.best_model.as_deref(), Some("m"));
        assert_eq!(outcome.record.finding_count, 1);
        let finding = &outcome.findings[0];
        assert_eq!(finding.file_path, "app.py");
        assert_eq!(finding.language, "Python");
        assert_eq!(finding.lines_in_file, 4);
        assert_eq!(finding.file_size, outcome.record.size_bytes);
    }

    #[tokio::test]
    async fn test_analyze_file_ignores_unknown_and_empty() {
        let dir = repo(&[("notes.xyz", "data"), ("empty.py", "  \n")]);
        let backend = ScriptedBackend::new().model("m", Reply::Text(NONE.to_string()));
        let scheduler = scheduler(&dir, backend);

        let unknown = scheduler.analyze_file("notes.xyz", &models(&["m"])).await;
        assert_eq!(unknown.record.status, FileStatus::Ignored);
        assert_eq!(unknown.record.reason.as_deref(), Some("Unsupported language"));

        let empty = scheduler.analyze_file("empty.py", &models(&["m"])).await;
        assert_eq!(empty.record.status, FileStatus::Ignored);
        assert_eq!(empty.record.reason.as_deref(), Some("Empty file"));
    }

    #[tokio::test]
    async fn test_analyze_file_truncates_long_content() {
        let dir = repo(&[("big.js", &"x".repeat(60_000))]);
        let backend = ScriptedBackend::new().model("m", Reply::Text(NONE.to_string()));
        let outcome = scheduler(&dir, backend)
            .analyze_file("big.js", &models(&["m"]))
            .await;

        assert_eq!(outcome.record.status, FileStatus::Analyzed);
        assert_eq!(
            outcome.record.size_bytes,
            MAX_CONTENT_CHARS + TRUNCATION_MARKER.len()
        );
        assert_eq!(outcome.record.line_count, 2);
    }

    #[tokio::test]
    async fn test_analyze_file_all_models_failing() {
        let dir = repo(&[("app.py", "print(1)")]);
        let backend = ScriptedBackend::new()
            .model("a", Reply::Fail)
            .model("b", Reply::Fail);
        let outcome = scheduler(&dir, backend)
            .analyze_file("app.py", &models(&["a", "b"]))
            .await;

        assert_eq!(outcome.record.status, FileStatus::Error);
        assert!(outcome.record.error.as_deref().unwrap().contains("model a failed"));
        assert_eq!(outcome.record.model_scores.len(), 2);
        assert!(outcome.findings.is_empty());
    }

    #[tokio::test]
    async fn test_analyze_file_unreadable() {
        let dir = repo(&[]);
        let backend = ScriptedBackend::new().model("m", Reply::Text(NONE.to_string()));
        let outcome = scheduler(&dir, backend)
            .analyze_file("ghost.py", &models(&["m"]))
            .await;

        assert_eq!(outcome.record.status, FileStatus::Error);
        assert!(outcome.record.error.as_deref().unwrap().starts_with("Cannot read file"));
    }

    #[tokio::test]
    async fn test_progress_is_monotonic_with_out_of_order_completion() {
        let dir = repo(&[
            ("a.py", "# SLOW\nprint(1)"),
            ("b.py", "print(2)"),
            ("c.py", "print(3)"),
        ]);
        let backend = ScriptedBackend::new()
            .model("m", Reply::Text(NONE.to_string()))
            .delay_when_prompt_contains("SLOW", Duration::from_millis(50));
        let scheduler = scheduler(&dir, backend).with_capacity(3);

        let mut progress = Vec::new();
        let report = scheduler
            .analyze_repository(
                models(&["a.py", "b.py", "c.py"]),
                &models(&["m"]),
                |p| progress.push(p),
            )
            .await;

        assert_eq!(progress.len(), 3);
        assert!(progress.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*progress.last().unwrap(), 1.0);
        let paths: Vec<_> = report.files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(paths, vec!["a.py", "b.py", "c.py"]);
    }

    #[tokio::test]
    async fn test_empty_file_list_reports_no_progress() {
        let dir = repo(&[]);
        let backend = ScriptedBackend::new().model("m", Reply::Text(NONE.to_string()));
        let mut calls = 0;
        let report = scheduler(&dir, backend)
            .analyze_repository(Vec::new(), &models(&["m"]), |_| calls += 1)
            .await;

        assert_eq!(calls, 0);
        assert!(report.files.is_empty());
        assert_eq!(report.best_model, None);
    }

    #[tokio::test]
    async fn test_per_model_tallies() {
        let dir = repo(&[
            ("app.py", "query = 'SELECT ' + user"),
            ("flaky.py", "# FLAKY\nprint(1)"),
            ("notes.xyz", "ignored"),
        ]);
        let backend = ScriptedBackend::new()
            .model("a", Reply::Text(ONE_HIGH.to_string()))
            .model("b", Reply::Text(NONE.to_string()))
            .when_prompt_contains("b", "FLAKY", Reply::Fail);

        let files = models(&["app.py", "flaky.py", "ghost.py", "notes.xyz"]);
        let report = scheduler(&dir, backend)
            .analyze_repository(files, &models(&["a", "b"]), |_| {})
            .await;

        let a = &report.model_performance[0];
        let b = &report.model_performance[1];
        // ghost.py fails before arbitration, notes.xyz counts nothing
        assert_eq!((a.analyses, a.errors), (2, 1));
        assert_eq!((b.analyses, b.errors), (1, 2));

        assert_eq!(report.analysis_stats.total_files_found, 4);
        assert_eq!(report.analysis_stats.files_analyzed, 2);
        assert_eq!(report.analysis_stats.files_ignored, 1);
        assert_eq!(report.analysis_stats.files_with_errors, 1);
        assert_eq!(report.findings.len(), 2);
        assert_eq!(report.best_model.as_deref(), Some("a"));
    }
}
