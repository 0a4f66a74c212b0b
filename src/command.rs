//! Commands sent to the window manager.
//!
//! Every command the engine issues is built from this enum so the exact
//! strings are in one place and can be asserted on in tests.

use std::fmt;

use crate::mark::Mark;
use crate::types::{Dimension, Layout, Position, Size, SplitOrientation};

/// Criteria selecting the node a command applies to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Node carrying exactly this mark
    Mark(Mark),
    /// Node with this tree id
    ConId(i64),
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // con_mark is a regex, anchor it so c1 does not match c10
            Target::Mark(mark) => write!(f, "[con_mark=\"^{}$\"]", mark),
            Target::ConId(id) => write!(f, "[con_id={}]", id),
        }
    }
}

/// A single window manager command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwayCommand {
    /// Switch to a workspace, creating it if needed
    Workspace(String),
    /// Move the focused workspace to an output
    MoveWorkspaceToOutput(String),
    /// Add a mark, to the target or to the focused node
    MarkAdd { target: Option<Target>, mark: Mark },
    Focus(Target),
    FocusParent,
    Split(SplitOrientation),
    Layout(Layout),
    /// Resize the focused node
    ResizeSet { dimension: Dimension, size: Size },
    /// Enable floating on the focused node
    FloatingEnable,
    /// Move the focused floating node
    MovePosition(Position),
    Kill(Target),
}

impl SwayCommand {
    /// Commands that turn the focused node into a container with `layout`.
    ///
    /// Tabbed and stacking containers are created by a split followed by a
    /// layout change.
    pub fn set_layout(layout: Layout) -> Vec<SwayCommand> {
        let mut commands = vec![SwayCommand::Split(layout.split_orientation())];
        if layout.needs_layout_command() {
            commands.push(SwayCommand::Layout(layout));
        }
        commands
    }

    pub fn focus_mark(mark: &Mark) -> Self {
        SwayCommand::Focus(Target::Mark(mark.clone()))
    }

    pub fn mark_focused(mark: &Mark) -> Self {
        SwayCommand::MarkAdd {
            target: None,
            mark: mark.clone(),
        }
    }

    pub fn mark_window(id: i64, mark: &Mark) -> Self {
        SwayCommand::MarkAdd {
            target: Some(Target::ConId(id)),
            mark: mark.clone(),
        }
    }
}

impl fmt::Display for SwayCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SwayCommand::Workspace(name) => write!(f, "workspace {}", quote(name)),
            SwayCommand::MoveWorkspaceToOutput(output) => {
                write!(f, "move workspace to output {}", quote(output))
            }
            SwayCommand::MarkAdd { target: Some(t), mark } => write!(f, "{} mark --add {}", t, mark),
            SwayCommand::MarkAdd { target: None, mark } => write!(f, "mark --add {}", mark),
            SwayCommand::Focus(target) => write!(f, "{} focus", target),
            SwayCommand::FocusParent => f.write_str("focus parent"),
            SwayCommand::Split(orientation) => write!(f, "split {}", orientation),
            SwayCommand::Layout(layout) => write!(f, "layout {}", layout),
            SwayCommand::ResizeSet {
                dimension: Dimension::Both,
                size,
            } => write!(f, "resize set width {} height {}", size, size),
            SwayCommand::ResizeSet { dimension, size } => {
                write!(f, "resize set {} {}", dimension, size)
            }
            SwayCommand::FloatingEnable => f.write_str("floating enable"),
            SwayCommand::MovePosition(position) => {
                write!(f, "move position {}", position.command_args())
            }
            SwayCommand::Kill(target) => write!(f, "{} kill", target),
        }
    }
}

/// Quote a string argument for the command parser
fn quote(s: &str) -> String {
    let escaped = s.replace('\\', "\\\\").replace('"', "\\\"");
    format!("\"{}\"", escaped)
}
