//! Append-only progress log.
//!
//! The log records what each run attempted. It is created with a header on
//! first use, appended to during the loop, and truncated with a fresh
//! header only by the archive manager on a branch transition.

use chrono::Local;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Handle to the on-disk progress log.
#[derive(Debug, Clone)]
pub struct ProgressLog {
    path: PathBuf,
}

impl ProgressLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the log with a start header if it does not exist yet.
    pub fn ensure(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        self.write_header()
    }

    /// Truncate the log and write a fresh start header.
    ///
    /// Only the archive manager calls this, on a branch transition.
    pub fn reset(&self) -> Result<()> {
        self.write_header()
    }

    /// Append one timestamped line.
    pub fn append(&self, line: &str) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "[{}] {}", Local::now().format("%Y-%m-%d %H:%M:%S"), line)?;
        Ok(())
    }

    fn write_header(&self) -> Result<()> {
        let header = format!(
            "# Workloop Progress Log\nStarted: {}\n---\n",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        );
        std::fs::write(&self.path, header)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_ensure_creates_header() {
        let temp = TempDir::new().unwrap();
        let log = ProgressLog::new(temp.path().join("progress.txt"));

        log.ensure().unwrap();
        let content = std::fs::read_to_string(log.path()).unwrap();
        assert!(content.starts_with("# Workloop Progress Log"));
        assert!(content.contains("Started:"));
    }

    #[test]
    fn test_ensure_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let log = ProgressLog::new(temp.path().join("progress.txt"));

        log.ensure().unwrap();
        log.append("iteration 1 started").unwrap();
        log.ensure().unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert!(content.contains("iteration 1 started"));
    }

    #[test]
    fn test_append_keeps_prior_lines() {
        let temp = TempDir::new().unwrap();
        let log = ProgressLog::new(temp.path().join("progress.txt"));

        log.ensure().unwrap();
        log.append("first").unwrap();
        log.append("second").unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        let first = content.find("first").unwrap();
        let second = content.find("second").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_reset_truncates() {
        let temp = TempDir::new().unwrap();
        let log = ProgressLog::new(temp.path().join("progress.txt"));

        log.ensure().unwrap();
        log.append("old run line").unwrap();
        log.reset().unwrap();

        let content = std::fs::read_to_string(log.path()).unwrap();
        assert!(!content.contains("old run line"));
        assert!(content.starts_with("# Workloop Progress Log"));
    }
}
