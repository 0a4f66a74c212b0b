//! Error and warning accounting for a setup run.
//!
//! Recoverable failures are logged and counted here rather than aborting.
//! The caller decides what the totals mean for the exit status.

use serde::Serialize;

/// Outcome counters for one run
#[derive(Debug, Default, Clone, Serialize)]
pub struct Report {
    errors: Vec<String>,
    warnings: Vec<String>,
    successes: usize,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failed node operation
    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::error!("{}", message);
        self.errors.push(message);
    }

    /// Record a problem the run worked around
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}", message);
        self.warnings.push(message);
    }

    /// Record a successful node operation
    pub fn success(&mut self) {
        self.successes += 1;
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.len()
    }

    pub fn success_count(&self) -> usize {
        self.successes
    }

    /// Something was attempted and none of it worked
    pub fn nothing_succeeded(&self) -> bool {
        self.successes == 0 && !self.errors.is_empty()
    }

    /// Process exit status for this report
    pub fn exit_code(&self) -> i32 {
        if self.nothing_succeeded() {
            1
        } else {
            0
        }
    }

    /// Log the end-of-run summary
    pub fn summarize(&self) {
        let line = format!(
            "Setup finished: {} operations succeeded, {} errors, {} warnings",
            self.successes,
            self.errors.len(),
            self.warnings.len()
        );
        if self.errors.is_empty() {
            log::info!("{}", line);
        } else {
            log::warn!("{}", line);
        }
    }
}
