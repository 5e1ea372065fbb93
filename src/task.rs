//! Analysis tasks and their status store.
//!
//! A task wraps one full run (fetch, model check, analysis, report) and
//! publishes its progress to a [`TaskStore`], which the CLI polls.

use crate::analysis::{AnalysisScheduler, SchedulerConfig};
use crate::backend::CompletionBackend;
use crate::models::AnalysisReport;
use crate::repo::{clone_repository, CloneOptions, ClonedRepository};
use crate::scanner::RepositoryScanner;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Initialized,
    Running,
    Completed,
    Failed,
}

/// Current state of one task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskRecord {
    pub task_id: String,
    pub repository: String,
    pub status: TaskStatus,
    /// In [0, 1].
    pub progress: f64,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<AnalysisReport>,
}

impl TaskRecord {
    pub fn new(task_id: impl Into<String>, repository: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            task_id: task_id.into(),
            repository: repository.into(),
            status: TaskStatus::Initialized,
            progress: 0.0,
            message: "Task created".to_string(),
            created_at: now,
            updated_at: now,
            error: None,
            report: None,
        }
    }
}

/// Partial update applied to a stored task. `None` leaves a field unchanged.
#[derive(Debug, Default)]
pub struct TaskUpdate {
    pub status: Option<TaskStatus>,
    pub progress: Option<f64>,
    pub message: Option<String>,
    pub error: Option<String>,
    pub report: Option<AnalysisReport>,
}

impl TaskUpdate {
    pub fn progress(progress: f64, message: impl Into<String>) -> Self {
        Self {
            status: Some(TaskStatus::Running),
            progress: Some(progress),
            message: Some(message.into()),
            ..Self::default()
        }
    }
}

/// Storage for task status records.
pub trait TaskStore: Send + Sync {
    fn create(&self, record: TaskRecord);

    fn get(&self, task_id: &str) -> Option<TaskRecord>;

    /// Apply `update` to a task. Returns false when the task is unknown.
    fn update(&self, task_id: &str, update: TaskUpdate) -> bool;
}

/// Process-local task store.
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    tasks: Mutex<HashMap<String, TaskRecord>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TaskStore for InMemoryTaskStore {
    fn create(&self, record: TaskRecord) {
        self.tasks.lock().insert(record.task_id.clone(), record);
    }

    fn get(&self, task_id: &str) -> Option<TaskRecord> {
        self.tasks.lock().get(task_id).cloned()
    }

    fn update(&self, task_id: &str, update: TaskUpdate) -> bool {
        let mut tasks = self.tasks.lock();
        let Some(record) = tasks.get_mut(task_id) else {
            return false;
        };
        if let Some(status) = update.status {
            record.status = status;
        }
        if let Some(progress) = update.progress {
            record.progress = progress.clamp(0.0, 1.0);
        }
        if let Some(message) = update.message {
            record.message = message;
        }
        if update.error.is_some() {
            record.error = update.error;
        }
        if update.report.is_some() {
            record.report = update.report;
        }
        record.updated_at = Utc::now();
        true
    }
}

/// `task_{timestamp}_{repository}` with path separators replaced.
pub fn task_id(repository: &str, at: DateTime<Utc>) -> String {
    format!(
        "task_{}_{}",
        at.format("%Y%m%d%H%M%S"),
        repository.replace(['/', '\\', ':'], "_")
    )
}

/// Where the code to analyze comes from.
#[derive(Debug, Clone)]
pub enum RepositorySource {
    Remote {
        identifier: String,
        options: CloneOptions,
    },
    Local(PathBuf),
}

/// Everything needed to run one analysis task.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub source: RepositorySource,
    /// Models to compare; empty means every installed model.
    pub models: Vec<String>,
    pub scheduler: SchedulerConfig,
}

/// Keep the requested models the backend actually serves.
fn select_models(requested: &[String], available: Vec<String>) -> Result<Vec<String>> {
    if available.is_empty() {
        bail!("No models are installed on the backend");
    }
    if requested.is_empty() {
        return Ok(available);
    }

    let selected: Vec<String> = requested
        .iter()
        .filter(|model| {
            let found = available.iter().any(|a| a == *model);
            if !found {
                warn!("Model {} is not available, skipping it", model);
            }
            found
        })
        .cloned()
        .collect();
    if selected.is_empty() {
        bail!(
            "None of the requested models are available (installed: {})",
            available.join(", ")
        );
    }
    Ok(selected)
}

/// Materialize the source as a scannable directory.
///
/// A remote checkout lives as long as the returned [`ClonedRepository`].
pub async fn fetch(source: RepositorySource) -> Result<(RepositoryScanner, Option<ClonedRepository>)> {
    match source {
        RepositorySource::Local(path) => {
            if !path.is_dir() {
                bail!("Local path is not a directory: {}", path.display());
            }
            Ok((RepositoryScanner::new(path), None))
        }
        RepositorySource::Remote {
            identifier,
            options,
        } => {
            let cloned = clone_repository(&identifier, &options).await?;
            let scanner =
                RepositoryScanner::new(cloned.path()).with_name(cloned.metadata.name.clone());
            Ok((scanner, Some(cloned)))
        }
    }
}

async fn execute(
    store: &Arc<dyn TaskStore>,
    task_id: &str,
    backend: Arc<dyn CompletionBackend>,
    request: AnalysisRequest,
) -> Result<AnalysisReport> {
    store.update(task_id, TaskUpdate::progress(0.1, "Fetching repository"));
    // The checkout is removed when `_checkout` drops, on every exit path.
    let (scanner, _checkout) = fetch(request.source).await?;

    store.update(task_id, TaskUpdate::progress(0.2, "Checking available models"));
    let available = backend
        .list_models()
        .await
        .context("Failed to list backend models")?;
    let models = select_models(&request.models, available)?;
    info!("Using models: {}", models.join(", "));

    store.update(task_id, TaskUpdate::progress(0.3, "Analyzing files"));
    let files = scanner.list_files();
    let scheduler = AnalysisScheduler::new(backend, scanner, request.scheduler);

    let progress_store = Arc::clone(store);
    let progress_id = task_id.to_string();
    let report = scheduler
        .analyze_repository(files, &models, move |fraction| {
            progress_store.update(
                &progress_id,
                TaskUpdate::progress(0.3 + 0.5 * fraction, "Analyzing files"),
            );
        })
        .await;

    store.update(task_id, TaskUpdate::progress(0.9, "Generating report"));
    Ok(report)
}

/// Run a full analysis task, publishing progress to `store`.
///
/// The task must already exist in the store. On failure the task is marked
/// `Failed` and keeps whatever it stored before.
pub async fn run_analysis_task(
    store: Arc<dyn TaskStore>,
    task_id: String,
    backend: Arc<dyn CompletionBackend>,
    request: AnalysisRequest,
) -> Result<AnalysisReport> {
    match execute(&store, &task_id, backend, request).await {
        Ok(report) => {
            store.update(
                &task_id,
                TaskUpdate {
                    status: Some(TaskStatus::Completed),
                    progress: Some(1.0),
                    message: Some("Analysis complete".to_string()),
                    report: Some(report.clone()),
                    ..TaskUpdate::default()
                },
            );
            Ok(report)
        }
        Err(e) => {
            error!("Task {} failed: {:#}", task_id, e);
            store.update(
                &task_id,
                TaskUpdate {
                    status: Some(TaskStatus::Failed),
                    message: Some("Analysis failed".to_string()),
                    error: Some(format!("{:#}", e)),
                    ..TaskUpdate::default()
                },
            );
            Err(e)
        }
    }
}
