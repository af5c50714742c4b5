//! The iteration loop controller.
//!
//! Drives the repeated agent iteration: reconcile the archive, re-read the
//! work-item document, hand a prompt to the worker, scan the captured
//! output for the completion marker, and repeat until completion or the
//! iteration budget runs out. Strictly sequential: one worker invocation
//! in flight at a time, and the controller blocks until it finishes or its
//! timeout fires.

use anyhow::Context;
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::archive::{ArchiveAction, ArchiveManager};
use crate::document::WorkDocument;
use crate::error::{Result, WorkloopError};
use crate::progress::ProgressLog;
use crate::worker::WorkerProcess;

/// Default work-item document file name.
pub const DEFAULT_DOCUMENT_FILE: &str = "workplan.json";

/// Default prompt file name.
pub const DEFAULT_PROMPT_FILE: &str = "prompt.md";

/// Default iteration budget.
pub const DEFAULT_MAX_ITERATIONS: u32 = 10;

/// Fixed delay between iterations. Not a backoff schedule; it only keeps
/// rapid repeated failures from hammering the worker process.
const ITERATION_DELAY: Duration = Duration::from_secs(2);

/// Configuration for the loop controller.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub work_dir: PathBuf,
    pub document_path: PathBuf,
    pub prompt_path: PathBuf,
    pub max_iterations: u32,
    pub delay: Duration,
    /// Human-readable worker description for the banner.
    pub worker_label: String,
}

impl LoopConfig {
    pub fn new(work_dir: PathBuf) -> Self {
        let document_path = work_dir.join(DEFAULT_DOCUMENT_FILE);
        let prompt_path = work_dir.join(DEFAULT_PROMPT_FILE);
        Self {
            work_dir,
            document_path,
            prompt_path,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            delay: ITERATION_DELAY,
            worker_label: String::new(),
        }
    }

    #[must_use]
    pub fn with_document_path(mut self, path: PathBuf) -> Self {
        self.document_path = path;
        self
    }

    #[must_use]
    pub fn with_prompt_path(mut self, path: PathBuf) -> Self {
        self.prompt_path = path;
        self
    }

    #[must_use]
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn with_worker_label(mut self, label: impl Into<String>) -> Self {
        self.worker_label = label.into();
        self
    }
}

/// Terminal state of a loop run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopOutcome {
    /// The completion marker appeared; remaining budget is irrelevant.
    Completed { iteration: u32 },
    /// The budget ran out without a completion signal.
    Exhausted { iterations: u32 },
}

impl LoopOutcome {
    /// Exit status for the process: success only on completion.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            LoopOutcome::Completed { .. } => 0,
            LoopOutcome::Exhausted { .. } => 1,
        }
    }
}

/// The main loop controller.
pub struct LoopManager {
    config: LoopConfig,
    worker: Box<dyn WorkerProcess>,
    progress: ProgressLog,
}

impl std::fmt::Debug for LoopManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopManager")
            .field("config", &self.config)
            .field("worker", &"<dyn WorkerProcess>")
            .field("progress", &self.progress)
            .finish()
    }
}

impl LoopManager {
    /// Create a new loop manager.
    ///
    /// Configuration is validated here, before any iteration runs: a zero
    /// budget or a missing document/prompt file is fatal.
    pub fn new(config: LoopConfig, worker: Box<dyn WorkerProcess>) -> Result<Self> {
        if config.max_iterations == 0 {
            return Err(WorkloopError::InvalidConfig {
                field: "max_iterations".to_string(),
                reason: "must be a positive integer".to_string(),
            });
        }
        if !config.document_path.exists() {
            return Err(WorkloopError::MissingFile {
                path: config.document_path.clone(),
            });
        }
        if !config.prompt_path.exists() {
            return Err(WorkloopError::MissingFile {
                path: config.prompt_path.clone(),
            });
        }

        let progress = ProgressLog::new(config.work_dir.join("progress.txt"));

        Ok(Self {
            config,
            worker,
            progress,
        })
    }

    /// Run the loop to a terminal state.
    ///
    /// Returns `Completed` as soon as the marker is seen, `Exhausted` when
    /// the budget is used up. Archive failures and worker timeouts are
    /// warnings, never fatal.
    pub async fn run(&mut self) -> Result<LoopOutcome> {
        self.print_banner();
        self.reconcile_archive();
        self.progress.ensure()?;

        for i in 1..=self.config.max_iterations {
            self.print_iteration_header(i);
            self.progress
                .append(&format!("iteration {} started", i))
                .context("failed to append to progress log")?;

            let prompt = self.build_prompt();

            match self.worker.invoke(&prompt).await {
                Ok(outcome) => {
                    // The marker wins even over a timeout: a worker that
                    // signalled completion before being killed is done.
                    if outcome.is_complete() {
                        self.progress
                            .append(&format!("iteration {}: completion signal received", i))?;
                        println!(
                            "\n{} All work complete at iteration {} of {}",
                            "Success:".green().bold(),
                            i,
                            self.config.max_iterations
                        );
                        return Ok(LoopOutcome::Completed { iteration: i });
                    }

                    if outcome.timed_out {
                        warn!("Iteration {} timed out; budget consumed, continuing", i);
                        println!(
                            "   {} Worker timed out; iteration {} is consumed",
                            "Warning:".yellow().bold(),
                            i
                        );
                        self.progress
                            .append(&format!("iteration {}: worker timed out", i))?;
                    } else {
                        debug!(
                            "Iteration {} finished (exit code {:?}) without completion signal",
                            i, outcome.exit_code
                        );
                        self.progress
                            .append(&format!("iteration {}: no completion signal", i))?;
                    }
                }
                Err(e) => {
                    // Spawn/read failures consume the iteration like any
                    // other non-completing run; the loop keeps moving.
                    warn!("Iteration {} failed: {}", i, e);
                    eprintln!("   {} {}", "Error:".red().bold(), e);
                    self.progress
                        .append(&format!("iteration {}: worker error: {}", i, e))?;
                }
            }

            if i < self.config.max_iterations {
                println!("Iteration {} complete. Continuing...", i);
                tokio::time::sleep(self.config.delay).await;
            }
        }

        self.progress.append(&format!(
            "budget exhausted after {} iterations",
            self.config.max_iterations
        ))?;
        println!(
            "\n{}",
            format!(
                "Reached max iterations ({}) without completing all work.",
                self.config.max_iterations
            )
            .yellow()
        );
        println!("Check {} for status.", self.progress.path().display());

        Ok(LoopOutcome::Exhausted {
            iterations: self.config.max_iterations,
        })
    }

    /// One archive reconciliation at entry; failures are logged and skipped.
    fn reconcile_archive(&self) {
        let manager = ArchiveManager::new(
            self.config.work_dir.clone(),
            self.config.document_path.clone(),
            self.progress.clone(),
        );

        match manager.reconcile() {
            ArchiveAction::Archived { destination } => {
                info!("Archived previous run to {}", destination.display());
                println!(
                    "   {} Previous run archived to {}",
                    "Archive:".cyan(),
                    destination.display()
                );
            }
            ArchiveAction::FirstRun { branch } => {
                debug!("First run on branch {}", branch);
            }
            ArchiveAction::Unchanged => {}
            ArchiveAction::Skipped { reason } => {
                warn!("Archiving skipped: {}", reason);
            }
        }
    }

    /// Assemble the iteration prompt: the prompt file plus a status section
    /// naming the next pending story. The document is re-read fresh every
    /// time because the worker mutates it between invocations.
    fn build_prompt(&self) -> String {
        let base = match std::fs::read_to_string(&self.config.prompt_path) {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    "Prompt file {} unreadable ({}); sending status only",
                    self.config.prompt_path.display(),
                    e
                );
                String::new()
            }
        };

        match WorkDocument::load(&self.config.document_path) {
            Ok(doc) => {
                let mut prompt = base;
                prompt.push_str("\n\n## Current Status\n");
                prompt.push_str(&format!(
                    "Project: {}\nStories passing: {} of {}\n",
                    doc.project,
                    doc.completed(),
                    doc.user_stories.len()
                ));
                match doc.next_story() {
                    Some(story) => {
                        prompt.push_str(&format!(
                            "Next story (highest priority, not passing): {} - {}\n",
                            story.id, story.title
                        ));
                    }
                    None => {
                        prompt.push_str("All stories are passing.\n");
                    }
                }
                prompt
            }
            Err(e) => {
                warn!("Document unreadable this iteration: {}", e);
                base
            }
        }
    }

    /// Print the startup banner
    fn print_banner(&self) {
        println!("{}", "═".repeat(60).bright_blue());
        println!(
            "{}",
            "     WORKLOOP - Autonomous Agent Iteration Loop"
                .bright_blue()
                .bold()
        );
        println!("{}", "═".repeat(60).bright_blue());
        println!();
        println!("   Directory: {}", self.config.work_dir.display());
        println!("   Document: {}", self.config.document_path.display());
        println!("   Max iterations: {}", self.config.max_iterations);
        if !self.config.worker_label.is_empty() {
            println!("   Worker: {}", self.config.worker_label);
        }
        println!();
    }

    /// Print iteration header
    fn print_iteration_header(&self, iteration: u32) {
        println!(
            "\n{} Iteration {}/{}",
            "===".bright_blue(),
            iteration,
            self.config.max_iterations
        );
    }
}
