//! Setup step vocabulary.
//!
//! Each step is one observable thing the engine did to the window manager.
//! Per container, the orchestrator moves through:
//!
//! ```text
//!  Launch / Reuse (representative)
//!         │
//!         ▼
//!   ClaimContainer ──► SetLayout ──► Launch / Reuse (siblings)
//!                                          │
//!                                          ▼
//!                              Refocus ──► (nested containers)
//!                                          │
//!                                          ▼
//!                                     PostCommand
//! ```
//!
//! Resize and Position steps follow in a second pass once the tree exists.

use serde::{Deserialize, Serialize};

use crate::types::{Dimension, Layout, Size};

/// One recorded engine step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum SetupStep {
    SwitchWorkspace { workspace: String },
    MoveToOutput { output: String },
    WorkspaceLayout { layout: Layout },
    /// An unmatched live window was closed
    Close { window: i64, name: String },
    /// An app process was started
    Launch { mark: String, command: String },
    /// An already running window was adopted
    Reuse { mark: String, window: i64 },
    /// A mark was applied to a window
    ApplyMark { mark: String, window: Option<i64> },
    ClaimContainer { mark: String },
    SetLayout { mark: String, layout: Layout },
    /// Focus returned to a container before a nested sibling
    Refocus { mark: String },
    Floating { mark: String },
    PostCommand { mark: String, command: String },
    Resize {
        mark: String,
        dimension: Dimension,
        size: Size,
    },
    Position { mark: String, position: String },
    FocusWorkspace { workspace: String },
}

impl SetupStep {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            SetupStep::SwitchWorkspace { .. } => "switch_workspace",
            SetupStep::MoveToOutput { .. } => "move_to_output",
            SetupStep::WorkspaceLayout { .. } => "workspace_layout",
            SetupStep::Close { .. } => "close",
            SetupStep::Launch { .. } => "launch",
            SetupStep::Reuse { .. } => "reuse",
            SetupStep::ApplyMark { .. } => "apply_mark",
            SetupStep::ClaimContainer { .. } => "claim_container",
            SetupStep::SetLayout { .. } => "set_layout",
            SetupStep::Refocus { .. } => "refocus",
            SetupStep::Floating { .. } => "floating",
            SetupStep::PostCommand { .. } => "post_command",
            SetupStep::Resize { .. } => "resize",
            SetupStep::Position { .. } => "position",
            SetupStep::FocusWorkspace { .. } => "focus_workspace",
        }
    }

    /// Mark of the node this step acted on, if any
    pub fn mark(&self) -> Option<&str> {
        match self {
            SetupStep::Launch { mark, .. }
            | SetupStep::Reuse { mark, .. }
            | SetupStep::ApplyMark { mark, .. }
            | SetupStep::ClaimContainer { mark }
            | SetupStep::SetLayout { mark, .. }
            | SetupStep::Refocus { mark }
            | SetupStep::Floating { mark }
            | SetupStep::PostCommand { mark, .. }
            | SetupStep::Resize { mark, .. }
            | SetupStep::Position { mark, .. } => Some(mark),
            _ => None,
        }
    }
}
