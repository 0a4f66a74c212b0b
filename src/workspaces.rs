//! Per-workspace setup driver.
//!
//! Switches to a workspace and runs the engine passes over it in order:
//! build the desired tree, reconcile it with what is running, close
//! strays, build the structure, then resize.

use crate::command::SwayCommand;
use crate::config::WorkspaceSpec;
use crate::layout::LayoutTree;
use crate::reconcile::{close_unmatched, reconcile};
use crate::resize;
use crate::session::Session;
use crate::setup::{build_tree, SetupOutcome};
use crate::state::SetupStep;
use crate::types::Layout;
use crate::window_query::workspace_windows;

/// Set up one workspace.
///
/// Returns `None` when the workspace could not be switched to or its tree
/// could not be built at all. Everything else is recorded in the session's
/// report and setup continues.
pub fn setup_workspace(
    session: &mut Session,
    name: &str,
    spec: &WorkspaceSpec,
) -> Option<SetupOutcome> {
    session.set_workspace(name);
    log::info!("Setting up workspace '{}'", name);

    if !switch_to(session, name) {
        return None;
    }

    if let Some(output) = &spec.output {
        let step = SetupStep::MoveToOutput {
            output: output.clone(),
        };
        match session.run_step(step, &[SwayCommand::MoveWorkspaceToOutput(output.clone())]) {
            // Moving can leave focus on the old output
            Ok(()) => {
                switch_to(session, name);
            }
            Err(e) => session
                .report
                .warn(format!("Failed to move workspace '{}' to output '{}': {}", name, output, e)),
        }
    }

    let built = LayoutTree::build(name, spec);
    for error in &built.errors {
        session
            .report
            .error(format!("workspace '{}': {}", name, error));
    }
    for warning in &built.warnings {
        session.report.warn(warning.clone());
    }
    let tree = built.tree;
    if tree.apps().is_empty() {
        session
            .report
            .error(format!("workspace '{}' has nothing to set up", name));
        return None;
    }

    let live = session
        .live_tree()
        .map(|root| workspace_windows(&root, name))
        .unwrap_or_default();
    let plan = reconcile(&tree, &live);
    log::info!(
        "Workspace '{}': {} to launch, {} to reuse, {} unmatched",
        name,
        plan.launch_count(),
        plan.update_count(),
        plan.unclaimed.len()
    );

    if spec.close_unmatched {
        close_unmatched(session, &plan);
    } else if !plan.unclaimed.is_empty() {
        log::debug!(
            "Leaving {} unmatched window(s) on workspace '{}'",
            plan.unclaimed.len(),
            name
        );
    }

    // Changing the layout of a populated workspace would rearrange the
    // windows being reused
    if live.is_empty() {
        set_workspace_layout(session, tree.layout());
    }

    let outcome = build_tree(session, &tree, &plan);
    resize::apply(session, &tree, &outcome);
    Some(outcome)
}

fn switch_to(session: &mut Session, name: &str) -> bool {
    let step = SetupStep::SwitchWorkspace {
        workspace: name.to_string(),
    };
    match session.run_step(step, &[SwayCommand::Workspace(name.to_string())]) {
        Ok(()) => true,
        Err(e) => {
            session
                .report
                .error(format!("Failed to switch to workspace '{}': {}", name, e));
            false
        }
    }
}

fn set_workspace_layout(session: &mut Session, layout: Layout) {
    let step = SetupStep::WorkspaceLayout { layout };
    if let Err(e) = session.run_step(step, &[SwayCommand::Layout(layout)]) {
        session.report.warn(format!(
            "Failed to set layout {} on workspace '{}': {}",
            layout,
            session.workspace(),
            e
        ));
    }
}
