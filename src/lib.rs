//! Workloop - Autonomous Agent Iteration Loop
//!
//! A driver for repeated agent iterations: it picks the next unit of work
//! from a persisted work-item document, hands it to an external autonomous
//! worker process, watches the captured output for a completion signal,
//! and repeats until all work is done or the iteration budget runs out.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`document`] - Work-item document model (stories, criteria, priority)
//! - [`validate`] - Structural validation with complete issue reporting
//! - [`taskgraph`] - Conversion to a dependency-ordered task graph
//! - [`archive`] - Branch-based archive/rotation of previous runs
//! - [`progress`] - Append-only progress log
//! - [`worker`] - The external worker capability (interactive/headless)
//! - [`loop_manager`] - The iteration loop controller
//! - [`error`] - Custom error types and handling
//! - [`testing`] - Testing infrastructure (mocks, fixtures)
//!
//! # Example
//!
//! ```rust,ignore
//! use workloop::loop_manager::{LoopConfig, LoopManager};
//! use workloop::worker::{CommandWorker, WorkerConfig, WorkerKind};
//!
//! let worker_config = WorkerConfig::new(WorkerKind::Headless, 1800);
//! let worker = CommandWorker::new(worker_config);
//! worker.validate()?;
//!
//! let config = LoopConfig::new(".".into()).with_max_iterations(10);
//! let mut manager = LoopManager::new(config, Box::new(worker))?;
//! let outcome = manager.run().await?;
//! std::process::exit(outcome.exit_code());
//! ```

pub mod archive;
pub mod document;
pub mod error;
pub mod loop_manager;
pub mod progress;
pub mod taskgraph;
pub mod testing;
pub mod validate;
pub mod worker;

// Re-export commonly used types
pub use error::{Result, WorkloopError};

pub use archive::{ArchiveAction, ArchiveManager};
pub use document::{read_branch_name, Story, StoryRef, WorkDocument};
pub use loop_manager::{LoopConfig, LoopManager, LoopOutcome};
pub use progress::ProgressLog;
pub use taskgraph::{ConversionReport, TaskGraph, TaskKind, TaskNode};
pub use validate::{validate, validate_str, ValidationIssue, ValidationReport};
pub use worker::{
    CommandWorker, WorkerConfig, WorkerKind, WorkerOutcome, WorkerProcess, COMPLETION_MARKER,
};
