//! Archive manager for branch-based run rotation.
//!
//! Each run is identified by the document's branch identity. When that
//! identity changes, the previous run's document and progress log are
//! snapshotted into a dated archive folder and the progress log is reset.
//! This is the only place prior run state is discarded. Archiving is
//! best-effort: any failure is reported and skipped, never propagated into
//! the iteration loop.

use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::document;
use crate::error::{Result, WorkloopError};
use crate::progress::ProgressLog;

/// Outcome of a branch reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveAction {
    /// No branch was on record; the current one was recorded, no snapshot.
    FirstRun { branch: String },
    /// Branch identity is unchanged; nothing to do.
    Unchanged,
    /// The previous run was snapshotted and the progress log reset.
    Archived { destination: PathBuf },
    /// Archiving could not proceed; the loop continues regardless.
    Skipped { reason: String },
}

/// Manager for run archives.
#[derive(Debug)]
pub struct ArchiveManager {
    work_dir: PathBuf,
    document_path: PathBuf,
    progress: ProgressLog,
}

impl ArchiveManager {
    pub fn new(work_dir: PathBuf, document_path: PathBuf, progress: ProgressLog) -> Self {
        Self {
            work_dir,
            document_path,
            progress,
        }
    }

    /// Get archive directory
    fn archive_dir(&self) -> PathBuf {
        self.work_dir.join("archive")
    }

    /// Get the last-known-branch state file
    fn state_path(&self) -> PathBuf {
        self.work_dir.join(".last-branch")
    }

    /// Reconcile the recorded branch identity with the document's.
    ///
    /// Never fails: an unreadable document or a snapshot error yields
    /// [`ArchiveAction::Skipped`] so the caller can proceed.
    pub fn reconcile(&self) -> ArchiveAction {
        let Some(current) = document::read_branch_name(&self.document_path) else {
            debug!(
                "No branch identity readable from {}; skipping archive check",
                self.document_path.display()
            );
            return ArchiveAction::Skipped {
                reason: "document missing or unreadable".to_string(),
            };
        };

        let last = self.last_branch();

        match last {
            None => match self.record_branch(&current) {
                Ok(()) => ArchiveAction::FirstRun { branch: current },
                Err(e) => skipped(format!("failed to record branch: {}", e)),
            },
            Some(last) if last == current => ArchiveAction::Unchanged,
            Some(last) => match self.rotate(&last, &current) {
                Ok(destination) => ArchiveAction::Archived { destination },
                Err(e) => skipped(format!("failed to archive previous run: {}", e)),
            },
        }
    }

    /// Snapshot the previous run, reset the progress log, record the new
    /// branch. Ordered so a failure leaves the old record in place and the
    /// next reconciliation retries.
    fn rotate(&self, last_branch: &str, current_branch: &str) -> Result<PathBuf> {
        let destination = self.snapshot(last_branch)?;
        self.progress.reset()?;
        self.record_branch(current_branch)?;
        Ok(destination)
    }

    /// Copy the document and progress log into a dated, branch-named folder.
    fn snapshot(&self, last_branch: &str) -> Result<PathBuf> {
        let date = Local::now().format("%Y-%m-%d").to_string();
        let base = self
            .archive_dir()
            .join(format!("{}-{}", date, folder_name(last_branch)));

        // already-existing folders get a counter suffix, never overwritten
        let mut destination = base.clone();
        let mut counter = 1;
        while destination.exists() {
            destination = PathBuf::from(format!("{}-{}", base.display(), counter));
            counter += 1;
        }

        std::fs::create_dir_all(&destination).map_err(|e| WorkloopError::Archive {
            message: format!("failed to create {}: {}", destination.display(), e),
        })?;

        copy_if_present(&self.document_path, &destination)?;
        copy_if_present(self.progress.path(), &destination)?;

        Ok(destination)
    }

    /// Read the last branch from the state file.
    fn last_branch(&self) -> Option<String> {
        let content = std::fs::read_to_string(self.state_path()).ok()?;
        let branch = content.trim();
        if branch.is_empty() {
            None
        } else {
            Some(branch.to_string())
        }
    }

    /// Record a branch as the last known one.
    fn record_branch(&self, branch: &str) -> Result<()> {
        std::fs::write(self.state_path(), branch)?;
        Ok(())
    }
}

fn skipped(reason: String) -> ArchiveAction {
    warn!("Archiving skipped: {}", reason);
    ArchiveAction::Skipped { reason }
}

/// Archive folder name for a branch: the namespace prefix (first path
/// segment) is dropped and remaining separators become dashes.
fn folder_name(branch: &str) -> String {
    let trimmed = match branch.split_once('/') {
        Some((_, rest)) if !rest.is_empty() => rest,
        _ => branch,
    };
    trimmed.replace('/', "-")
}

fn copy_if_present(source: &Path, destination_dir: &Path) -> Result<()> {
    if !source.exists() {
        return Ok(());
    }
    let name = source
        .file_name()
        .ok_or_else(|| WorkloopError::archive(format!("bad path: {}", source.display())))?;
    std::fs::copy(source, destination_dir.join(name)).map_err(|e| WorkloopError::Archive {
        message: format!("failed to copy {}: {}", source.display(), e),
    })?;
    Ok(())
}
