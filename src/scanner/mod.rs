//! Repository scanner.
//!
//! Walks a checked-out repository, classifies its files and gathers the
//! statistics that make up a [`RepositoryContext`]. Single-file failures are
//! logged and skipped; a scan never aborts.

mod health;
pub mod language;
pub mod manifest;

pub use language::{detect_language, UNKNOWN};

use crate::models::{ConfigFile, DirectoryEntry, RepositoryContext};
use chrono::Utc;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Files at or above this size are neither counted nor analyzed.
pub const MAX_FILE_SIZE: u64 = 1024 * 1024;

/// Scanner over one repository checkout.
#[derive(Debug, Clone)]
pub struct RepositoryScanner {
    root: PathBuf,
    name: String,
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

fn has_git_segment(path: &Path) -> bool {
    path.components().any(|c| c.as_os_str() == ".git")
}

impl RepositoryScanner {
    /// Create a scanner named after the root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| root.display().to_string());
        Self { root, name }
    }

    /// Override the repository name (clones live in anonymous temp dirs).
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Path relative to the root, always with `/` separators.
    fn relative_path(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Every regular, non-hidden file below the root.
    fn walk_files(&self) -> impl Iterator<Item = DirEntry> + '_ {
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
    }

    /// Gather repository-wide statistics.
    pub fn scan(&self) -> RepositoryContext {
        let mut context = RepositoryContext::empty(&self.name);
        context.analysis_timestamp = Utc::now();
        let mut has_readme = false;

        for entry in self.walk_files() {
            let path = entry.path();
            let size = match entry.metadata() {
                Ok(metadata) => metadata.len(),
                Err(e) => {
                    warn!("Cannot stat {}: {}", path.display(), e);
                    continue;
                }
            };
            let relative = self.relative_path(path);
            let file_name = entry.file_name().to_string_lossy().to_string();

            context.total_files += 1;
            context.total_size_bytes += size;

            let ext_key = language::extension_key(path);
            if let Some(ref ext) = ext_key {
                *context.file_types.entry(ext.clone()).or_default() += 1;
            }

            let lang = detect_language(path);
            if lang != UNKNOWN {
                *context.languages.entry(lang.to_string()).or_default() += 1;
            }

            if file_name.to_lowercase().starts_with("readme") {
                has_readme = true;
            }

            if language::is_text_file(path) && size < MAX_FILE_SIZE {
                match fs::read(path) {
                    Ok(bytes) => {
                        let lines = language::count_code_lines(&String::from_utf8_lossy(&bytes));
                        if lines > 0 {
                            let loc = &mut context.lines_of_code;
                            loc.total += lines;
                            *loc.by_language.entry(lang.to_string()).or_default() += lines;
                            let ext = ext_key.clone().unwrap_or_else(|| "no_extension".to_string());
                            *loc.by_file_type.entry(ext).or_default() += lines;
                        }
                    }
                    Err(e) => warn!("Cannot read {}: {}", relative, e),
                }
            }

            if let Some(config_type) = manifest::config_type(&file_name) {
                context.configuration_files.push(ConfigFile {
                    file: relative.clone(),
                    config_type: config_type.to_string(),
                    size,
                });
            }

            if manifest::is_dependency_file(&file_name) {
                let parsed = fs::read_to_string(path)
                    .map_err(anyhow::Error::from)
                    .and_then(|content| manifest::parse_dependencies(&file_name, &content));
                match parsed {
                    Ok(deps) if !deps.is_empty() => {
                        context.dependencies.insert(relative.clone(), deps);
                    }
                    Ok(_) => {}
                    Err(e) => warn!("Failed to parse dependencies in {}: {:#}", relative, e),
                }
            }
        }

        context.directory_structure = self.directory_structure();
        context.repository_health = health::assess(&context, has_readme);

        debug!(
            "Scanned {}: {} files, {} lines of code",
            self.name, context.total_files, context.lines_of_code.total
        );
        context
    }

    /// Top-level entries of the root with a per-directory file count.
    fn directory_structure(&self) -> std::collections::BTreeMap<String, DirectoryEntry> {
        let mut structure = std::collections::BTreeMap::new();

        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot list {}: {}", self.root.display(), e);
                return structure;
            }
        };

        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().to_string();
            if name.starts_with('.') {
                continue;
            }
            let path = entry.path();
            if path.is_dir() {
                let files = fs::read_dir(&path)
                    .map(|inner| {
                        inner
                            .flatten()
                            .filter(|e| !e.file_name().to_string_lossy().starts_with('.'))
                            .count()
                    })
                    .unwrap_or(0);
                structure.insert(name, DirectoryEntry::Directory { files });
            } else if let Ok(metadata) = entry.metadata() {
                structure.insert(name, DirectoryEntry::File { size: metadata.len() });
            }
        }

        structure
    }

    /// Candidate files for analysis, sorted by relative path.
    pub fn list_files(&self) -> Vec<String> {
        let mut files: Vec<String> = self
            .walk_files()
            .filter(|entry| !has_git_segment(entry.path()))
            .filter(|entry| !language::is_binary(entry.path()))
            .filter(|entry| match entry.metadata() {
                Ok(metadata) => metadata.len() < MAX_FILE_SIZE,
                Err(e) => {
                    warn!("Cannot stat {}: {}", entry.path().display(), e);
                    false
                }
            })
            .map(|entry| self.relative_path(entry.path()))
            .collect();

        files.sort();
        files
    }

    /// Read a file as text, replacing invalid UTF-8.
    pub fn read_file(&self, relative: &str) -> std::io::Result<String> {
        let bytes = fs::read(self.root.join(relative))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn sample_repo() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        write(root, "README.md", "# Demo\nSome text\n");
        write(root, "app/main.py", "# entry\nimport os\n\nprint(os.name)\n");
        write(root, "app/db.js", "// db\nconst q = 'SELECT 1';\n");
        write(root, "requirements.txt", "flask==2.3.2\n");
        write(root, "Dockerfile", "FROM python:3.12\nRUN pip install flask\n");
        write(root, "assets/logo.png", "not really a png");
        write(root, ".env", "SECRET=1");
        write(root, ".git/config", "[core]");
        dir
    }

    #[test]
    fn test_scan_collects_statistics() {
        let dir = sample_repo();
        let context = RepositoryScanner::new(dir.path()).with_name("demo").scan();

        assert_eq!(context.repository_name, "demo");
        assert_eq!(context.total_files, 6);
        assert_eq!(context.languages.get("Python"), Some(&1));
        assert_eq!(context.languages.get("Dockerfile"), Some(&1));
        assert_eq!(context.file_types.get(".py"), Some(&1));
        assert!(!context.file_types.contains_key(".env"));
        assert_eq!(context.lines_of_code.by_language.get("Python"), Some(&2));
        assert_eq!(context.lines_of_code.by_file_type.get("no_extension"), Some(&2));
        assert!(context.dependencies.contains_key("requirements.txt"));

        let indicators = &context.repository_health.maintenance_indicators;
        assert!(indicators.has_readme);
        assert!(indicators.has_dockerfile);
        assert!(indicators.has_dependencies);

        assert_eq!(
            context.directory_structure.get("app"),
            Some(&DirectoryEntry::Directory { files: 2 })
        );
        assert!(!context.directory_structure.contains_key(".git"));
    }

    #[test]
    fn test_list_files_filters_and_sorts() {
        let dir = sample_repo();
        let files = RepositoryScanner::new(dir.path()).list_files();

        assert_eq!(
            files,
            vec![
                "Dockerfile",
                "README.md",
                "app/db.js",
                "app/main.py",
                "requirements.txt"
            ]
        );
    }

    #[test]
    fn test_list_files_skips_large_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "big.py", &"x = 1\n".repeat(200_000));
        write(dir.path(), "small.py", "x = 1\n");

        let files = RepositoryScanner::new(dir.path()).list_files();
        assert_eq!(files, vec!["small.py"]);
    }

    #[test]
    fn test_broken_manifest_does_not_abort_scan() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "package.json", "{ broken");
        write(dir.path(), "index.js", "console.log(1);\n");

        let context = RepositoryScanner::new(dir.path()).scan();
        assert_eq!(context.total_files, 2);
        assert!(context.dependencies.is_empty());
        assert_eq!(context.configuration_files.len(), 1);
    }
}
