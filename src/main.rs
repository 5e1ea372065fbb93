//! VulnScope - multi-model LLM vulnerability scanner
//!
//! A CLI tool that asks local Ollama models to review every source file of a
//! repository, arbitrates between their answers and writes a security report.
//!
//! Exit codes:
//!   0 - Success (no findings above threshold, or no --fail-on set)
//!   1 - Runtime error (backend unavailable, config, clone failure, etc.)
//!   2 - Findings at or above the --fail-on threshold

mod aggregation;
mod analysis;
mod backend;
mod cli;
mod config;
mod models;
mod repo;
mod report;
mod scanner;
mod task;

use anyhow::{bail, Context, Result};
use backend::{CompletionBackend, OllamaBackend, OllamaOptions};
use chrono::Utc;
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE_NAME};
use indicatif::{ProgressBar, ProgressStyle};
use models::{AnalysisReport, Severity};
use std::sync::Arc;
use std::time::Duration;
use task::{AnalysisRequest, InMemoryTaskStore, RepositorySource, TaskRecord, TaskStore};
use tracing::{debug, error, info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args)?;

    info!("VulnScope v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Analysis failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .vulnscope.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE_NAME
        );
        std::process::exit(1);
    }

    let content = Config::default_toml()?;
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to choose models, the backend URL and report options.");
    Ok(())
}

/// Initialize logging. `RUST_LOG` overrides the verbosity flags.
fn init_logging(args: &Args) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(args.log_level()).into())
        .from_env_lossy();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Run the selected workflow. Returns the exit code (0 or 2).
async fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let ollama = OllamaBackend::new(
        &config.backend.ollama_url,
        OllamaOptions {
            temperature: config.backend.temperature,
            num_predict: config.backend.num_predict,
        },
    )?;
    debug!("Using Ollama at {}", ollama.base_url());
    let backend: Arc<dyn CompletionBackend> = Arc::new(ollama);

    if args.list_models {
        return list_models(backend.as_ref(), &config).await;
    }

    let source = repository_source(&args);

    if args.dry_run {
        return handle_dry_run(source, &config).await;
    }

    println!("🔬 Analyzing {}", args.target());
    println!("   Ollama: {}", config.backend.ollama_url);
    if config.backend.models.is_empty() {
        println!("   Models: every installed model");
    } else {
        println!("   Models: {}", config.backend.models.join(", "));
    }
    println!("   Max files: {}\n", config.scanner.max_files);

    let request = AnalysisRequest {
        source,
        models: config.backend.models.clone(),
        scheduler: analysis::SchedulerConfig {
            max_files: config.scanner.max_files,
        },
    };
    let report = run_with_progress(&args, backend, request).await?;

    println!("\n📝 Generating report...");
    let output = match config.report.format {
        OutputFormat::Markdown => report::generate_markdown_report(&report),
        OutputFormat::Json => report::generate_json_report(&report)?,
        OutputFormat::Formatted => {
            serde_json::to_string_pretty(&report::FormattedReport::from_report(&report))
                .context("Failed to serialize formatted report")?
        }
    };
    report::write_report(&output, &config.general.output)?;

    print_summary(&report);
    println!(
        "\n✅ Analysis complete! Report saved to: {}",
        config.general.output.display()
    );

    if let Some(level) = config.report.fail_on {
        let threshold = Severity::from(level);
        if report.count_at_least(threshold) > 0 {
            eprintln!(
                "\n⛔ Findings at or above {} severity. Failing (exit code 2).",
                threshold
            );
            return Ok(2);
        }
    }

    Ok(0)
}

fn repository_source(args: &Args) -> RepositorySource {
    match (&args.local, &args.repo) {
        (Some(local), _) => RepositorySource::Local(local.clone()),
        (None, repo) => RepositorySource::Remote {
            identifier: repo.clone().unwrap_or_default(),
            options: repo::CloneOptions {
                branch: args.branch.clone(),
                token: args.token.clone(),
                ..repo::CloneOptions::shallow()
            },
        },
    }
}

/// Spawn the analysis task and drive a progress bar from its status record.
async fn run_with_progress(
    args: &Args,
    backend: Arc<dyn CompletionBackend>,
    request: AnalysisRequest,
) -> Result<AnalysisReport> {
    let store: Arc<dyn TaskStore> = Arc::new(InMemoryTaskStore::new());
    let target = args.target();
    let task_id = task::task_id(&target, Utc::now());
    store.create(TaskRecord::new(task_id.clone(), target));
    debug!("Created task {}", task_id);

    let mut handle = tokio::spawn(task::run_analysis_task(
        Arc::clone(&store),
        task_id.clone(),
        backend,
        request,
    ));

    let bar = if args.quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new(100)
    };
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")
            .context("Invalid progress template")?
            .progress_chars("#>-"),
    );

    loop {
        tokio::select! {
            result = &mut handle => {
                let report = result.context("Analysis task panicked")?;
                match report {
                    Ok(report) => {
                        bar.finish_with_message("done");
                        return Ok(report);
                    }
                    Err(e) => {
                        bar.abandon_with_message("failed");
                        return Err(e);
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                handle.abort();
                // Wait for the cancelled task to drop its checkout.
                let _ = (&mut handle).await;
                bar.abandon_with_message("interrupted");
                warn!("Interrupted, cleaning up");
                bail!("Analysis interrupted");
            }
            _ = tokio::time::sleep(Duration::from_millis(200)) => {
                if let Some(record) = store.get(&task_id) {
                    bar.set_position((record.progress * 100.0).round() as u64);
                    bar.set_message(record.message);
                }
            }
        }
    }
}

/// Handle --list-models: print the installed models, marking requested ones.
async fn list_models(backend: &dyn CompletionBackend, config: &Config) -> Result<i32> {
    let models = backend
        .list_models()
        .await
        .context("Failed to list backend models")?;

    if models.is_empty() {
        println!("No models installed on {}", config.backend.ollama_url);
        return Ok(0);
    }

    println!("Models available on {}:\n", config.backend.ollama_url);
    for model in &models {
        let marker = if config.backend.models.contains(model) {
            "✓"
        } else {
            " "
        };
        println!("  {} {}", marker, model);
    }
    Ok(0)
}

/// Handle --dry-run: fetch and scan, print what would be analyzed, exit.
async fn handle_dry_run(source: RepositorySource, config: &Config) -> Result<i32> {
    println!("\n🔍 Dry run: scanning files (no model call)...\n");

    let (scanner, _checkout) = task::fetch(source).await?;

    let context = scanner.scan();
    let found = scanner.list_files();
    let total = found.len();
    let files = analysis::select_files(found, config.scanner.max_files);

    println!(
        "   Repository: {} ({} files, {} lines of code)",
        context.repository_name, context.total_files, context.lines_of_code.total
    );
    println!(
        "   Health: {:.1}/100 ({}, {} complexity)\n",
        context.repository_health.score,
        context.repository_health.size_category,
        context.repository_health.complexity_level
    );

    if files.is_empty() {
        println!("   No candidate files found.");
    } else {
        println!("   {} of {} files would be analyzed:\n", files.len(), total);
        for file in &files {
            let language = scanner::detect_language(std::path::Path::new(file));
            println!("     📄 {} ({})", file, language);
        }
    }

    println!("\n✅ Dry run complete. No model calls were made.");
    Ok(0)
}

fn print_summary(report: &AnalysisReport) {
    let stats = &report.analysis_stats;
    let counts = &report.detailed_statistics.by_severity;

    println!("\n📊 Analysis Summary:");
    println!(
        "   Files analyzed: {} | ignored: {} | errors: {}",
        stats.files_analyzed, stats.files_ignored, stats.files_with_errors
    );
    println!("   Total findings: {}", counts.total);
    println!(
        "   - {} High: {} | {} Medium: {} | {} Low: {}",
        Severity::High.emoji(),
        counts.high,
        Severity::Medium.emoji(),
        counts.medium,
        Severity::Low.emoji(),
        counts.low
    );
    println!(
        "   Risk: {} ({:.1}/25)",
        report.risk_assessment.overall_risk, report.risk_assessment.risk_score
    );
    if let Some(ref model) = report.best_model {
        println!("   Best model: {}", model);
    }
    println!("   Duration: {}", report.temporal_analysis.total_duration);
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {:#}", e);
            Ok(Config::default())
        }
    }
}
