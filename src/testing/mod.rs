//! Testing infrastructure for workloop.
//!
//! This module provides test doubles and fixtures for testing the
//! iteration loop and its components without real worker processes.
//!
//! - **Mocks**: a scripted [`MockWorker`] implementing the worker seam
//! - **Fixtures**: pre-built work-item documents (test-only)

#[cfg(test)]
pub mod fixtures;
pub mod mocks;

pub use mocks::MockWorker;
