//! Formatting fixes for the project-ops content files.
//!
//! JSON files are rewritten with 2-space indentation and a trailing newline,
//! CSV files get LF line endings, a trailing newline and no trailing
//! whitespace. Files are only written when their content changes.

use anyhow::Context;
use std::path::{Path, PathBuf};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct FixSummary {
    pub checked: usize,
    pub fixed: usize,
}

/// Key order is kept as in the source file.
pub fn normalize_json(content: &str) -> anyhow::Result<String> {
    let data: serde_json::Value = serde_json::from_str(content)?;

    Ok(format!("{}\n", serde_json::to_string_pretty(&data)?))
}

pub fn normalize_csv(content: &str) -> String {
    let mut normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    if !normalized.ends_with('\n') {
        normalized.push('\n');
    }

    normalized
        .split('\n')
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Rewrites `path` with its normalized content; returns whether it changed.
fn fix_file(
    path: &Path,
    normalize: impl Fn(&str) -> anyhow::Result<String>,
) -> anyhow::Result<bool> {
    let original = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file {}", path.display()))?;
    let normalized =
        normalize(&original).with_context(|| format!("Failed to fix {}", path.display()))?;

    if normalized == original {
        log::info!("No changes needed: {}", path.display());
        return Ok(false);
    }

    std::fs::write(path, normalized)
        .with_context(|| format!("Failed to write file {}", path.display()))?;
    log::info!("Fixed: {}", path.display());

    Ok(true)
}

fn files_with_extension(dir: &Path, extension: &str) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            files.push(path);
        }
    }
    files.sort();

    Ok(files)
}

/// Normalizes every `.json` and `.csv` file directly under `dir`.
///
/// A JSON file that does not parse stops the run with an error.
pub fn fix_dir(dir: &Path) -> anyhow::Result<FixSummary> {
    let mut summary = FixSummary::default();

    for path in files_with_extension(dir, "json")? {
        summary.checked += 1;
        if fix_file(&path, normalize_json)? {
            summary.fixed += 1;
        }
    }

    for path in files_with_extension(dir, "csv")? {
        summary.checked += 1;
        if fix_file(&path, |content| Ok(normalize_csv(content)))? {
            summary.fixed += 1;
        }
    }

    log::info!("Files checked: {}", summary.checked);
    log::info!("Files fixed: {}", summary.fixed);

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_json_keeps_key_order() {
        let normalized = normalize_json("{\"title\":\"YONI\",\"pillars\":[1,2],\"created\":\"2025\"}")
            .unwrap();

        assert_eq!(
            normalized,
            "{\n  \"title\": \"YONI\",\n  \"pillars\": [\n    1,\n    2\n  ],\n  \"created\": \"2025\"\n}\n"
        );
    }

    #[test]
    fn test_normalize_json_rejects_invalid_json() {
        assert!(normalize_json("{\"title\": ").is_err());
    }

    #[test]
    fn test_normalize_csv() {
        assert_eq!(
            normalize_csv("Pillar,Task ID  \r\nBUILD,BUILD-001\t\rPAYMENT,PAYMENT-001"),
            "Pillar,Task ID\nBUILD,BUILD-001\nPAYMENT,PAYMENT-001\n"
        );
        assert_eq!(normalize_csv("a,b\n"), "a,b\n");
    }

    #[test]
    fn test_fix_dir_rewrites_only_changed_files() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("notion-template.json");
        let tasks = dir.path().join("tasks.csv");
        let clean = dir.path().join("clean.csv");
        std::fs::write(&template, "{\"title\":\"YONI\"}").unwrap();
        std::fs::write(&tasks, "Pillar,Title \r\nBUILD,Webhooks").unwrap();
        std::fs::write(&clean, "Pillar,Title\n").unwrap();
        std::fs::write(dir.path().join("README.md"), "not touched  ").unwrap();

        let summary = fix_dir(dir.path()).unwrap();

        assert_eq!(summary, FixSummary { checked: 3, fixed: 2 });
        assert_eq!(
            std::fs::read_to_string(&template).unwrap(),
            "{\n  \"title\": \"YONI\"\n}\n"
        );
        assert_eq!(
            std::fs::read_to_string(&tasks).unwrap(),
            "Pillar,Title\nBUILD,Webhooks\n"
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("README.md")).unwrap(),
            "not touched  "
        );

        assert_eq!(fix_dir(dir.path()).unwrap(), FixSummary { checked: 3, fixed: 0 });
    }

    #[test]
    fn test_fix_dir_fails_on_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();

        let error = fix_dir(dir.path()).unwrap_err();

        assert!(error.to_string().starts_with("Failed to fix"));
    }
}
