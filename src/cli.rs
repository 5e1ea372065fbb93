//! Command-line interface argument parsing.
//!
//! Options left unset fall back to the configuration file, then to the
//! built-in defaults.

use crate::models::Severity;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// VulnScope - multi-model LLM vulnerability scanner
///
/// Asks one or more local Ollama models to review every source file of a
/// repository, keeps the best answer per file and writes a security report.
///
/// Examples:
///   vulnscope --repo owner/project
///   vulnscope --repo https://github.com/owner/project.git --models llama3,codellama
///   vulnscope --local ./my-project --format json --fail-on high
///   vulnscope --list-models
///   vulnscope --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Repository to analyze: `owner/name` or a clone URL
    #[arg(
        short,
        long,
        value_name = "REPO",
        required_unless_present_any = ["local", "init_config", "list_models"]
    )]
    pub repo: Option<String>,

    /// Local directory to analyze instead of cloning
    #[arg(long, value_name = "DIR", conflicts_with = "repo")]
    pub local: Option<PathBuf>,

    /// Models to compare (comma-separated, default: every installed model)
    #[arg(short, long, value_name = "MODELS", value_delimiter = ',', env = "VULNSCOPE_MODELS")]
    pub models: Option<Vec<String>>,

    /// Output file path for the report
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Branch to analyze (default branch when omitted)
    #[arg(short, long, value_name = "BRANCH")]
    pub branch: Option<String>,

    /// Access token forwarded to the git host
    #[arg(long, value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Maximum number of files to analyze
    ///
    /// Source files with common web/backend extensions are analyzed first.
    #[arg(long, value_name = "COUNT")]
    pub max_files: Option<usize>,

    /// Ollama API endpoint URL
    #[arg(long, value_name = "URL", env = "OLLAMA_URL")]
    pub ollama_url: Option<String>,

    /// Temperature for model responses (0.0 - 1.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .vulnscope.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Exit with code 2 when findings at or above this severity exist
    #[arg(long, value_name = "LEVEL")]
    pub fail_on: Option<FailOnLevel>,

    /// List the models installed on the backend and exit
    #[arg(long)]
    pub list_models: bool,

    /// Fetch and scan the repository without calling any model
    #[arg(long)]
    pub dry_run: bool,

    /// Generate a default .vulnscope.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Output format for the report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// Full JSON report
    Json,
    /// Flattened JSON for document renderers
    Formatted,
}

/// Severity threshold for --fail-on.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FailOnLevel {
    Low,
    Medium,
    High,
}

impl From<FailOnLevel> for Severity {
    fn from(level: FailOnLevel) -> Self {
        match level {
            FailOnLevel::Low => Severity::Low,
            FailOnLevel::Medium => Severity::Medium,
            FailOnLevel::High => Severity::High,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Human readable name of what is analyzed.
    pub fn target(&self) -> String {
        match (&self.repo, &self.local) {
            (Some(repo), _) => repo.clone(),
            (None, Some(local)) => local.display().to_string(),
            (None, None) => String::new(),
        }
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if let Some(ref repo) = self.repo {
            crate::repo::resolve_url(repo).map_err(|e| e.to_string())?;
        }

        if let Some(ref url) = self.ollama_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err("Ollama URL must start with 'http://' or 'https://'".to_string());
            }
        }

        if let Some(temperature) = self.temperature {
            if !(0.0..=1.0).contains(&temperature) {
                return Err("Temperature must be between 0.0 and 1.0".to_string());
            }
        }

        if self.max_files == Some(0) {
            return Err("Max files must be at least 1".to_string());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref local_path) = self.local {
            if !local_path.is_dir() {
                return Err(format!(
                    "Local path is not a directory: {}",
                    local_path.display()
                ));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn make_args() -> Args {
        Args {
            repo: Some("owner/project".to_string()),
            local: None,
            models: None,
            output: None,
            format: None,
            branch: None,
            token: None,
            max_files: None,
            ollama_url: None,
            temperature: None,
            config: None,
            fail_on: None,
            list_models: false,
            dry_run: false,
            init_config: false,
            verbose: false,
            quiet: false,
        }
    }

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_model_list() {
        let args = Args::try_parse_from([
            "vulnscope",
            "--repo",
            "owner/project",
            "--models",
            "llama3,codellama",
            "--fail-on",
            "medium",
        ])
        .unwrap();
        assert_eq!(
            args.models,
            Some(vec!["llama3".to_string(), "codellama".to_string()])
        );
        assert_eq!(args.fail_on, Some(FailOnLevel::Medium));
    }

    #[test]
    fn test_validation_invalid_repo() {
        let mut args = make_args();
        args.repo = Some("not a repo".to_string());
        assert!(args.validate().is_err());

        args.repo = Some("https://github.com/owner/project.git".to_string());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_validation_ranges() {
        let mut args = make_args();
        args.temperature = Some(1.5);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.max_files = Some(0);
        assert!(args.validate().is_err());

        let mut args = make_args();
        args.ollama_url = Some("localhost:11434".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_fail_on_maps_to_severity() {
        assert_eq!(Severity::from(FailOnLevel::High), Severity::High);
        assert_eq!(Severity::from(FailOnLevel::Low), Severity::Low);
    }
}
