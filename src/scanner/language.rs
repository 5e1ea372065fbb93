//! Extension-based file classification.

use std::path::Path;

/// Language reported for files with no known extension.
pub const UNKNOWN: &str = "Unknown";

const LANGUAGES: &[(&str, &str)] = &[
    ("py", "Python"),
    ("js", "JavaScript"),
    ("ts", "TypeScript"),
    ("java", "Java"),
    ("c", "C"),
    ("cpp", "C++"),
    ("cs", "C#"),
    ("go", "Go"),
    ("rb", "Ruby"),
    ("php", "PHP"),
    ("swift", "Swift"),
    ("kt", "Kotlin"),
    ("rs", "Rust"),
    ("sh", "Shell"),
    ("html", "HTML"),
    ("css", "CSS"),
    ("sql", "SQL"),
    ("md", "Markdown"),
    ("json", "JSON"),
    ("yml", "YAML"),
    ("yaml", "YAML"),
    ("xml", "XML"),
    ("toml", "TOML"),
];

/// Extensions whose lines are counted as code.
const TEXT_EXTENSIONS: &[&str] = &[
    "py", "js", "ts", "java", "c", "cpp", "cs", "go", "rb", "php", "swift", "kt", "rs", "sh",
    "html", "css", "sql", "md", "json", "yml", "yaml", "xml", "toml", "txt", "cfg", "ini", "conf",
];

/// Extensions never handed to a model.
pub const BINARY_EXTENSIONS: &[&str] = &[
    "exe", "dll", "so", "bin", "dat", "zip", "tar", "gz", "xz", "pdf", "jpg", "png", "gif",
];

/// Extensions analyzed first when the file list is capped.
pub const PRIORITY_EXTENSIONS: &[&str] = &["py", "js", "php", "java", "rb", "go", "cs", "ts"];

fn lowercase_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Detect the programming language of a file from its name.
pub fn detect_language(path: &Path) -> &'static str {
    if is_dockerfile(path) {
        return "Dockerfile";
    }
    let Some(ext) = lowercase_extension(path) else {
        return UNKNOWN;
    };
    LANGUAGES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, lang)| *lang)
        .unwrap_or(UNKNOWN)
}

fn is_dockerfile(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with("Dockerfile"))
}

/// Whether the file's lines should be counted.
pub fn is_text_file(path: &Path) -> bool {
    is_dockerfile(path)
        || lowercase_extension(path).is_some_and(|ext| TEXT_EXTENSIONS.contains(&ext.as_str()))
}

pub fn is_binary(path: &Path) -> bool {
    lowercase_extension(path).is_some_and(|ext| BINARY_EXTENSIONS.contains(&ext.as_str()))
}

pub fn is_priority(path: &Path) -> bool {
    lowercase_extension(path).is_some_and(|ext| PRIORITY_EXTENSIONS.contains(&ext.as_str()))
}

/// Extension key used in statistics, with its leading dot.
pub fn extension_key(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e))
}

/// Count non-blank lines that do not start with a comment marker.
pub fn count_code_lines(content: &str) -> usize {
    const COMMENT_PREFIXES: [&str; 6] = ["#", "//", "/*", "*", "--", "<!--"];
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !COMMENT_PREFIXES.iter().any(|p| line.starts_with(p)))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_language() {
        assert_eq!(detect_language(Path::new("app/main.py")), "Python");
        assert_eq!(detect_language(Path::new("Main.JAVA")), "Java");
        assert_eq!(detect_language(Path::new("config.yaml")), "YAML");
        assert_eq!(detect_language(Path::new("docker/Dockerfile")), "Dockerfile");
        assert_eq!(detect_language(Path::new("api.Dockerfile")), "Dockerfile");
        assert_eq!(detect_language(Path::new("README")), UNKNOWN);
        assert_eq!(detect_language(Path::new("image.png")), UNKNOWN);
    }

    #[test]
    fn test_file_classes() {
        assert!(is_text_file(Path::new("notes.txt")));
        assert!(is_text_file(Path::new("Dockerfile")));
        assert!(!is_text_file(Path::new("logo.svg")));
        assert!(is_binary(Path::new("dist/app.ZIP")));
        assert!(is_priority(Path::new("src/index.ts")));
        assert!(!is_priority(Path::new("src/lib.rs")));
        assert_eq!(extension_key(Path::new("a/b.py")).as_deref(), Some(".py"));
        assert_eq!(extension_key(Path::new("Makefile")), None);
    }

    #[test]
    fn test_count_code_lines() {
        let content = "# header\nimport os\n\n   // note\nx = 1\n/* block\n * more\n */\n-- sql\n<!-- html -->\nprint(x)\n";
        assert_eq!(count_code_lines(content), 3);
    }
}
