//! Step tracing for debugging setup runs.
//!
//! Keeps a ring buffer of the steps the engine performed so a run can be
//! inspected afterwards (`flem sway --trace`).

use std::collections::VecDeque;
use std::time::Instant;

use serde::Serialize;

use crate::state::SetupStep;

/// Maximum number of steps to keep in the trace buffer
const DEFAULT_MAX_ENTRIES: usize = 1000;

/// One traced step
#[derive(Debug, Clone, Serialize)]
pub struct TraceEntry {
    pub sequence: u64,
    pub timestamp_ms: u64,
    pub workspace: String,
    #[serde(flatten)]
    pub step: SetupStep,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Step tracer with ring buffer storage
#[derive(Debug)]
pub struct SetupTrace {
    entries: VecDeque<TraceEntry>,
    max_entries: usize,
    sequence: u64,
    start_time: Instant,
}

impl SetupTrace {
    /// Create a new tracer with default capacity
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_ENTRIES)
    }

    /// Create a new tracer with specified capacity
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_entries.min(DEFAULT_MAX_ENTRIES)),
            max_entries,
            sequence: 0,
            start_time: Instant::now(),
        }
    }

    /// Milliseconds since the tracer was created
    fn timestamp(&self) -> u64 {
        self.start_time.elapsed().as_millis() as u64
    }

    /// Record a step and whether it worked
    pub fn record(&mut self, workspace: &str, step: SetupStep, error: Option<String>) {
        if self.max_entries == 0 {
            return;
        }
        // Remove oldest entry if at capacity
        if self.entries.len() >= self.max_entries {
            self.entries.pop_front();
        }

        self.sequence += 1;
        self.entries.push_back(TraceEntry {
            sequence: self.sequence,
            timestamp_ms: self.timestamp(),
            workspace: workspace.to_string(),
            ok: error.is_none(),
            step,
            error,
        });
    }

    /// Get all entries
    pub fn get_all(&self) -> Vec<TraceEntry> {
        self.entries.iter().cloned().collect()
    }

    /// Steps only, oldest first
    pub fn steps(&self) -> Vec<SetupStep> {
        self.entries.iter().map(|e| e.step.clone()).collect()
    }

    /// Clear the trace buffer
    pub fn clear(&mut self) {
        self.entries.clear();
        self.sequence = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SetupTrace {
    fn default() -> Self {
        Self::new()
    }
}
