//! Shared context for one setup run.
//!
//! Bundles the control channel, the launcher, timing, the report and the
//! trace so every engine pass takes a single `&mut Session`.

use std::time::Duration;

use crate::command::SwayCommand;
use crate::config::Timing;
use crate::ipc::{ChannelError, ControlChannel};
use crate::launch::Launcher;
use crate::report::Report;
use crate::state::SetupStep;
use crate::tracing::SetupTrace;
use crate::window_query::TreeNode;

pub struct Session<'a> {
    pub channel: &'a dyn ControlChannel,
    pub launcher: &'a dyn Launcher,
    pub timing: Timing,
    pub report: Report,
    pub trace: SetupTrace,
    /// Workspace currently being set up, for trace entries
    workspace: String,
}

impl<'a> Session<'a> {
    pub fn new(channel: &'a dyn ControlChannel, launcher: &'a dyn Launcher, timing: Timing) -> Self {
        Self {
            channel,
            launcher,
            timing,
            report: Report::new(),
            trace: SetupTrace::new(),
            workspace: String::new(),
        }
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    pub fn set_workspace(&mut self, workspace: &str) {
        self.workspace = workspace.to_string();
    }

    /// Send the commands for one step in order, stopping at the first failure.
    ///
    /// The step is traced either way; reporting is left to the caller.
    pub fn run_step(&mut self, step: SetupStep, commands: &[SwayCommand]) -> Result<(), ChannelError> {
        self.run_paced(step, commands, Duration::ZERO)
    }

    /// Like [`Session::run_step`], pausing `delay` after every command
    pub fn run_paced(
        &mut self,
        step: SetupStep,
        commands: &[SwayCommand],
        delay: Duration,
    ) -> Result<(), ChannelError> {
        let mut result = Ok(());
        for command in commands {
            let line = command.to_string();
            log::debug!("[{}] {}: {}", self.workspace, step.name(), line);
            if let Err(e) = self.channel.execute(&line) {
                result = Err(e);
                break;
            }
            self.pause(delay);
        }
        self.record(step, result.as_ref().err().map(|e| e.to_string()));
        result
    }

    /// Trace a step that did not go through the control channel
    pub fn record(&mut self, step: SetupStep, error: Option<String>) {
        self.trace.record(&self.workspace, step, error);
    }

    /// Fetch the live tree, warning on failure
    pub fn live_tree(&mut self) -> Option<TreeNode> {
        match self.channel.get_tree() {
            Ok(tree) => Some(tree),
            Err(e) => {
                self.report.warn(format!("Failed to query window tree: {}", e));
                None
            }
        }
    }

    /// Give the window manager time to apply earlier commands
    pub fn pause(&self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}
