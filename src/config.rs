//! Configuration file handling.
//!
//! Settings come from `.vulnscope.toml`; command-line flags override them.

use crate::cli::{Args, FailOnLevel, OutputFormat};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".vulnscope.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    /// Inference backend settings.
    #[serde(default)]
    pub backend: BackendConfig,

    #[serde(default)]
    pub scanner: ScannerConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> PathBuf {
    PathBuf::from("vulnscope_report.md")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Ollama API URL.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Models to compare. Empty means every installed model.
    #[serde(default)]
    pub models: Vec<String>,

    /// Temperature for generation.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens generated per answer.
    #[serde(default = "default_num_predict")]
    pub num_predict: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            ollama_url: default_ollama_url(),
            models: Vec::new(),
            temperature: default_temperature(),
            num_predict: default_num_predict(),
        }
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_num_predict() -> u32 {
    2048
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Maximum files to analyze per run.
    #[serde(default = "default_max_files")]
    pub max_files: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
        }
    }
}

fn default_max_files() -> usize {
    100
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub format: OutputFormat,

    /// Exit with code 2 when findings at or above this severity exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fail_on: Option<FailOnLevel>,
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load `.vulnscope.toml` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.exists() {
            Ok(Some(Self::load(&path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// Only options given on the command line (or through their environment
    /// variables) override file settings.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref url) = args.ollama_url {
            self.backend.ollama_url = url.clone();
        }
        if let Some(ref models) = args.models {
            self.backend.models = models
                .iter()
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect();
        }
        if let Some(temperature) = args.temperature {
            self.backend.temperature = temperature;
        }
        if let Some(max_files) = args.max_files {
            self.scanner.max_files = max_files;
        }
        if let Some(ref output) = args.output {
            self.general.output = output.clone();
        }
        if let Some(format) = args.format {
            self.report.format = format;
        }
        if args.fail_on.is_some() {
            self.report.fail_on = args.fail_on;
        }
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> Result<String> {
        toml::to_string_pretty(&Config::default()).context("Failed to serialize default config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.backend.ollama_url, "http://localhost:11434");
        assert_eq!(config.backend.num_predict, 2048);
        assert!(config.backend.models.is_empty());
        assert_eq!(config.scanner.max_files, 100);
        assert_eq!(config.report.format, OutputFormat::Markdown);
    }

    #[test]
    fn test_parse_config() {
        let toml_content = r#"
[general]
output = "security.md"
verbose = true

[backend]
models = ["llama3", "codellama"]
temperature = 0.2

[scanner]
max_files = 50

[report]
format = "json"
fail_on = "high"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(config.general.output, PathBuf::from("security.md"));
        assert!(config.general.verbose);
        assert_eq!(config.backend.models, vec!["llama3", "codellama"]);
        assert_eq!(config.backend.temperature, 0.2);
        assert_eq!(config.backend.ollama_url, "http://localhost:11434");
        assert_eq!(config.scanner.max_files, 50);
        assert_eq!(config.report.format, OutputFormat::Json);
        assert_eq!(config.report.fail_on, Some(FailOnLevel::High));
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut config: Config = toml::from_str("[scanner]\nmax_files = 50\n").unwrap();
        let args = Args::try_parse_from([
            "vulnscope",
            "--repo",
            "owner/project",
            "--max-files",
            "10",
            "--models",
            "a, b",
        ])
        .unwrap();
        config.merge_with_args(&args);

        assert_eq!(config.scanner.max_files, 10);
        assert_eq!(config.backend.models, vec!["a", "b"]);
        assert_eq!(config.report.format, OutputFormat::Markdown);
    }

    #[test]
    fn test_load_from_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(Config::load_from_dir(dir.path()).unwrap().is_none());

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[scanner]\nmax_files = 7\n").unwrap();
        let config = Config::load_from_dir(dir.path()).unwrap().unwrap();
        assert_eq!(config.scanner.max_files, 7);

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "[scanner\n").unwrap();
        assert!(Config::load_from_dir(dir.path()).is_err());
    }

    #[test]
    fn test_default_toml_generation() {
        let toml_str = Config::default_toml().unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[backend]"));
        assert!(toml_str.contains("[scanner]"));

        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.scanner.max_files, 100);
    }
}
