//! Configuration file detection and dependency manifest parsing.

use crate::models::{Dependency, DependencyKind};
use anyhow::{Context, Result};
use serde_json::Value;

/// Known configuration files and their human-readable type.
const CONFIG_FILES: &[(&str, &str)] = &[
    ("package.json", "Node.js Package"),
    ("requirements.txt", "Python Dependencies"),
    ("gemfile", "Ruby Gems"),
    ("pom.xml", "Maven Project"),
    ("build.gradle", "Gradle Build"),
    ("dockerfile", "Docker Container"),
    ("docker-compose.yml", "Docker Compose"),
    ("docker-compose.yaml", "Docker Compose"),
    ("config.json", "Configuration File"),
    ("config.yml", "Configuration File"),
    ("config.yaml", "Configuration File"),
    ("webpack.config.js", "Webpack Configuration"),
    ("babel.config.js", "Configuration File"),
    ("tsconfig.json", "TypeScript Configuration"),
    ("setup.py", "Python Setup"),
    ("pipfile", "Python Pipenv"),
    ("composer.json", "PHP Composer"),
    ("cargo.toml", "Rust Crate"),
];

const DEPENDENCY_FILES: &[&str] = &[
    "package.json",
    "requirements.txt",
    "composer.json",
    "cargo.toml",
];

/// Returns the config type when `file_name` is a known configuration file.
pub fn config_type(file_name: &str) -> Option<&'static str> {
    let lower = file_name.to_lowercase();
    CONFIG_FILES
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, kind)| *kind)
}

pub fn is_dependency_file(file_name: &str) -> bool {
    DEPENDENCY_FILES.contains(&file_name.to_lowercase().as_str())
}

/// Parse the dependencies declared in a manifest.
pub fn parse_dependencies(file_name: &str, content: &str) -> Result<Vec<Dependency>> {
    match file_name.to_lowercase().as_str() {
        "package.json" => parse_json_manifest(content, "dependencies", "devDependencies"),
        "composer.json" => parse_json_manifest(content, "require", "require-dev"),
        "requirements.txt" => Ok(parse_requirements(content)),
        "cargo.toml" => parse_cargo_manifest(content),
        _ => Ok(Vec::new()),
    }
}

fn parse_json_manifest(content: &str, prod_key: &str, dev_key: &str) -> Result<Vec<Dependency>> {
    let data: Value = serde_json::from_str(content).context("invalid JSON manifest")?;
    let mut deps = Vec::new();

    for (key, kind) in [
        (prod_key, DependencyKind::Production),
        (dev_key, DependencyKind::Development),
    ] {
        if let Some(table) = data.get(key).and_then(Value::as_object) {
            for (name, version) in table {
                deps.push(Dependency {
                    name: name.clone(),
                    version: version.as_str().unwrap_or("*").to_string(),
                    kind,
                });
            }
        }
    }

    Ok(deps)
}

fn parse_requirements(content: &str) -> Vec<Dependency> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            let (name, version) = match line.split_once("==") {
                Some((name, version)) => (name.trim(), version.trim()),
                None => (line, "*"),
            };
            Dependency {
                name: name.to_string(),
                version: version.to_string(),
                kind: DependencyKind::Production,
            }
        })
        .collect()
}

fn parse_cargo_manifest(content: &str) -> Result<Vec<Dependency>> {
    let data: toml::Table = toml::from_str(content).context("invalid Cargo manifest")?;
    let mut deps = Vec::new();

    for (key, kind) in [
        ("dependencies", DependencyKind::Production),
        ("dev-dependencies", DependencyKind::Development),
    ] {
        if let Some(table) = data.get(key).and_then(toml::Value::as_table) {
            for (name, spec) in table {
                let version = match spec {
                    toml::Value::String(v) => v.as_str(),
                    toml::Value::Table(t) => t
                        .get("version")
                        .and_then(toml::Value::as_str)
                        .unwrap_or("*"),
                    _ => "*",
                };
                deps.push(Dependency {
                    name: name.clone(),
                    version: version.to_string(),
                    kind,
                });
            }
        }
    }

    Ok(deps)
}
