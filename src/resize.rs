//! Resize and position pass.
//!
//! Runs once a workspace's tree exists, because a node can only be resized
//! after all of its siblings are in place and its mark can be focused.
//! Nodes are visited parent first, siblings in configuration order.

use crate::command::SwayCommand;
use crate::layout::{LayoutTree, Node};
use crate::mark::Mark;
use crate::session::Session;
use crate::setup::SetupOutcome;
use crate::state::SetupStep;
use crate::types::{Dimension, Layout, Position, Size};

/// Resize and position every node that declares a size or position.
///
/// Nodes the structural pass could not place are skipped.
pub fn apply(session: &mut Session, tree: &LayoutTree, outcome: &SetupOutcome) {
    for id in tree.pre_order() {
        match tree.get(id) {
            Some(Node::Container(container)) => {
                let Some(size) = container.size else { continue };
                if !outcome.claimed.contains(&id) {
                    log::debug!("Skipping resize of unclaimed container {}", container.mark);
                    continue;
                }
                resize(session, &container.mark, size, container.parent_layout);
            }
            Some(Node::App(app)) => {
                if !outcome.placed.contains_key(&id) {
                    log::debug!("Skipping resize of unplaced app {}", app.mark);
                    continue;
                }
                if app.floating {
                    if let Some(size) = app.size {
                        resize_by(session, &app.mark, Dimension::Both, size);
                    }
                    if let Some(position) = &app.position {
                        place(session, &app.mark, position);
                    }
                } else if let Some(size) = app.size {
                    resize(session, &app.mark, size, Some(app.parent_layout));
                }
            }
            None => {}
        }
    }
}

/// Resize the node carrying `mark` along its parent's axis.
///
/// Without a known parent layout the width is used and a warning recorded.
pub fn resize(session: &mut Session, mark: &Mark, size: Size, parent_layout: Option<Layout>) -> bool {
    let (dimension, known) = Dimension::for_parent(parent_layout);
    if !known {
        session
            .report
            .warn(format!("No parent layout for {}, resizing width", mark));
    }
    resize_by(session, mark, dimension, size)
}

/// Focus `mark` and resize it, settling after each command
pub fn resize_by(session: &mut Session, mark: &Mark, dimension: Dimension, size: Size) -> bool {
    log::info!("Resizing {} to {} {}", mark, dimension, size);
    let step = SetupStep::Resize {
        mark: mark.to_string(),
        dimension,
        size,
    };
    let commands = [
        SwayCommand::focus_mark(mark),
        SwayCommand::ResizeSet { dimension, size },
    ];
    let delay = session.timing.command_delay;
    match session.run_paced(step, &commands, delay) {
        Ok(()) => true,
        Err(e) => {
            session
                .report
                .warn(format!("Failed to resize {} to {} {}: {}", mark, dimension, size, e));
            false
        }
    }
}

/// Move a floating node
pub fn place(session: &mut Session, mark: &Mark, position: &Position) -> bool {
    let step = SetupStep::Position {
        mark: mark.to_string(),
        position: position.command_args(),
    };
    let commands = [
        SwayCommand::focus_mark(mark),
        SwayCommand::MovePosition(position.clone()),
    ];
    let delay = session.timing.command_delay;
    match session.run_paced(step, &commands, delay) {
        Ok(()) => true,
        Err(e) => {
            session
                .report
                .warn(format!("Failed to position {}: {}", mark, e));
            false
        }
    }
}
