//! Reconciliation of desired apps against live windows.
//!
//! Decides, per app node, whether to launch it or adopt a window that is
//! already running, and which live windows no configured app accounts for.

use std::collections::{HashMap, HashSet};

use crate::command::{SwayCommand, Target};
use crate::layout::{LayoutTree, NodeId};
use crate::session::Session;
use crate::state::SetupStep;
use crate::window_query::LiveWindow;

/// What to do with one app node
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Start the app
    Launch,
    /// Adopt this running window in place
    Update(LiveWindow),
}

/// Result of reconciling one workspace
#[derive(Debug, Clone, Default)]
pub struct Plan {
    actions: HashMap<NodeId, Action>,
    /// Live windows no app node claimed, in tree order
    pub unclaimed: Vec<LiveWindow>,
}

impl Plan {
    pub fn action(&self, id: NodeId) -> Option<&Action> {
        self.actions.get(&id)
    }

    pub fn launch_count(&self) -> usize {
        self.actions.values().filter(|a| matches!(a, Action::Launch)).count()
    }

    pub fn update_count(&self) -> usize {
        self.actions.values().filter(|a| matches!(a, Action::Update(_))).count()
    }
}

/// Classify every app node of `tree` against the live windows.
///
/// A window already carrying the node's mark wins. Otherwise the first
/// window in tree order whose name matches case-insensitively is taken,
/// skipping windows that another node owns by mark. Two nodes with the same
/// name can both match one window when nothing distinguishes them.
pub fn reconcile(tree: &LayoutTree, live: &[LiveWindow]) -> Plan {
    let apps = tree.apps();
    let mut actions = HashMap::new();
    let mut claimed: HashSet<i64> = HashSet::new();

    for &id in &apps {
        let Some(app) = tree.app(id) else { continue };
        if let Some(window) = live.iter().find(|w| w.has_mark(app.mark.as_str())) {
            claimed.insert(window.id);
            actions.insert(id, Action::Update(window.clone()));
        }
    }
    let owned_by_mark = claimed.clone();

    for &id in &apps {
        if actions.contains_key(&id) {
            continue;
        }
        let Some(app) = tree.app(id) else { continue };
        let found = live
            .iter()
            .find(|w| !owned_by_mark.contains(&w.id) && w.matches_name(&app.name));

        let action = match found {
            Some(window) => {
                log::debug!("'{}' matches running window {}", app.name, window.id);
                claimed.insert(window.id);
                Action::Update(window.clone())
            }
            None => Action::Launch,
        };
        actions.insert(id, action);
    }

    let unclaimed = live
        .iter()
        .filter(|w| !claimed.contains(&w.id))
        .cloned()
        .collect();

    Plan { actions, unclaimed }
}

/// Close every unclaimed window in the plan. Failures are warnings.
pub fn close_unmatched(session: &mut Session, plan: &Plan) {
    for window in &plan.unclaimed {
        log::info!(
            "Closing '{}' (id {}) because it is not in the workspace config",
            window.name,
            window.id
        );
        let step = SetupStep::Close {
            window: window.id,
            name: window.name.clone(),
        };
        if let Err(e) = session.run_step(step, &[SwayCommand::Kill(Target::ConId(window.id))]) {
            session
                .report
                .warn(format!("Failed to close '{}' (id {}): {}", window.name, window.id, e));
        }
        session.pause(session.timing.close_delay);
    }
}
