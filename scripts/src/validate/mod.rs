//! Structure checks for the project-ops content files.
//!
//! Problems are split in two: errors make the command fail, warnings are only
//! reported.

pub mod notion;
pub mod tasks_csv;

use std::path::Path;

pub const VALID_PILLARS: [&str; 3] = ["BUILD", "PAYMENT", "YOUTUBE"];

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    /// Printed when validation passes, e.g. "Validated 12 task(s) across 3 pillars"
    pub summary: String,
}

impl ValidationReport {
    pub fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn log(&self, path: &Path) {
        log::info!("Validating: {}", path.display());

        for warning in &self.warnings {
            log::warn!("{}", warning);
        }
        for error in &self.errors {
            log::error!("{}", error);
        }

        if self.is_valid() {
            log::info!("Validation successful! {}", self.summary);
        }
    }

    /// Fails when at least one error was found.
    pub fn into_result(self) -> anyhow::Result<()> {
        if !self.is_valid() {
            anyhow::bail!("Validation failed with {} error(s)", self.errors.len());
        }

        Ok(())
    }
}

/// Reads `path` for a validator, failing early when the file cannot be read.
pub fn read_input(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warnings_do_not_fail() {
        let mut report = ValidationReport::default();
        report.warning("Row 2: Missing Description");

        assert!(report.is_valid());
        assert!(report.into_result().is_ok());
    }

    #[test]
    fn test_errors_fail() {
        let mut report = ValidationReport::default();
        report.error("Row 2: Missing Title");
        report.error("Row 3: Missing Title");

        let error = report.into_result().unwrap_err();

        assert_eq!(error.to_string(), "Validation failed with 2 error(s)");
    }

    #[test]
    fn test_read_input_missing_file() {
        let dir = tempfile::tempdir().unwrap();

        assert!(read_input(&dir.path().join("missing.csv")).is_err());
    }
}
