//! Structural setup of a workspace's container tree.
//!
//! Containers are processed depth-first, parent before children. For each
//! container:
//!
//! 1. Place the representative: the first app child that can be placed,
//!    or failing that, the first nested container's representative.
//!    Placing means launching (or adopting) and marking.
//! 2. Claim the container by adding its mark to the focused window.
//! 3. Set the container layout on that window. This has to happen before
//!    any sibling is launched or the siblings land in the wrong container.
//! 4. Place the remaining app children.
//! 5. Recurse into nested containers in order.
//! 6. Run post commands of the app children.
//!
//! Every step logs and continues on failure. Sizes and positions are
//! applied afterwards by [`crate::resize`].

use std::collections::{HashMap, HashSet};

use crate::command::SwayCommand;
use crate::launch::wait_for_window;
use crate::layout::{AppNode, LayoutTree, NodeId};
use crate::reconcile::{Action, Plan};
use crate::session::Session;
use crate::state::SetupStep;
use crate::types::Layout;
use crate::window_query::LiveWindow;

/// How an app node came to be in the live tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Started by this run, with the window id when it was observed
    Launched(Option<i64>),
    /// Already running and adopted in place
    Reused(i64),
}

/// What the structural pass achieved
#[derive(Debug, Default)]
pub struct SetupOutcome {
    pub placed: HashMap<NodeId, Placement>,
    /// Containers whose mark was applied
    pub claimed: HashSet<NodeId>,
}

/// Create the container tree in the window manager
pub fn build_tree(session: &mut Session, tree: &LayoutTree, plan: &Plan) -> SetupOutcome {
    let mut orchestrator = Orchestrator {
        session,
        tree,
        plan,
        outcome: SetupOutcome::default(),
    };
    orchestrator.container(tree.root());
    orchestrator.outcome
}

struct Orchestrator<'s, 'a, 't> {
    session: &'s mut Session<'a>,
    tree: &'t LayoutTree,
    plan: &'t Plan,
    outcome: SetupOutcome,
}

impl Orchestrator<'_, '_, '_> {
    fn container(&mut self, id: NodeId) {
        let Some(container) = self.tree.container(id) else {
            return;
        };
        log::info!(
            "Setting up container {} ({})",
            container.mark,
            container.layout
        );

        let apps = self.tree.app_children(id);
        let nested = self.tree.container_children(id);
        let mut claimed = false;

        for &app in &apps {
            if self.place_app(app).is_some() && !claimed {
                self.claim(id, app);
                claimed = true;
            }
        }

        // No app child to stand in: borrow the first nested container's window
        if !claimed {
            if let Some(rep) = nested.first().and_then(|&c| self.tree.representative(c)) {
                if self.place_app(rep).is_some() {
                    self.claim(id, rep);
                    claimed = true;
                }
            }
        }

        if !claimed {
            self.session.report.warn(format!(
                "Container {} has no window to address it by, layout not applied",
                container.mark
            ));
        }

        let mut previous: Option<NodeId> = None;
        for &child in &nested {
            if let Some(prev) = previous {
                self.refocus_beside(prev);
            }
            self.container(child);
            previous = Some(child);
        }

        for &app in &apps {
            self.post_commands(app);
        }
    }

    /// Launch or adopt an app and mark it. Placing an app twice only
    /// focuses it again.
    fn place_app(&mut self, id: NodeId) -> Option<Placement> {
        let app = self.tree.app(id)?;

        if let Some(&placement) = self.outcome.placed.get(&id) {
            let step = SetupStep::Refocus {
                mark: app.mark.to_string(),
            };
            if let Err(e) = self.session.run_step(step, &[SwayCommand::focus_mark(&app.mark)]) {
                self.session
                    .report
                    .warn(format!("Failed to focus {} again: {}", app.mark, e));
            }
            return Some(placement);
        }

        let (placement, floating) = match self.plan.action(id) {
            Some(Action::Update(window)) => (self.reuse(app, window)?, window.floating),
            _ => (self.launch(app)?, false),
        };

        if app.floating && !floating {
            let step = SetupStep::Floating {
                mark: app.mark.to_string(),
            };
            if let Err(e) = self.session.run_step(step, &[SwayCommand::FloatingEnable]) {
                self.session
                    .report
                    .warn(format!("Failed to make '{}' floating: {}", app.name, e));
            }
        }

        self.session.report.success();
        self.outcome.placed.insert(id, placement);
        Some(placement)
    }

    fn reuse(&mut self, app: &AppNode, window: &LiveWindow) -> Option<Placement> {
        log::info!(
            "Reusing running '{}' (id {}) as {}",
            app.name,
            window.id,
            app.mark
        );
        let step = SetupStep::Reuse {
            mark: app.mark.to_string(),
            window: window.id,
        };
        let commands = [
            SwayCommand::mark_window(window.id, &app.mark),
            SwayCommand::focus_mark(&app.mark),
        ];
        match self.session.run_step(step, &commands) {
            Ok(()) => Some(Placement::Reused(window.id)),
            Err(e) => {
                self.session.report.error(format!(
                    "Failed to adopt running '{}' (id {}): {}",
                    app.name, window.id, e
                ));
                None
            }
        }
    }

    fn launch(&mut self, app: &AppNode) -> Option<Placement> {
        let known = self
            .session
            .channel
            .get_tree()
            .map(|t| t.window_ids())
            .unwrap_or_default();

        let step = SetupStep::Launch {
            mark: app.mark.to_string(),
            command: app.command.clone(),
        };
        if let Err(e) = self.session.launcher.spawn(&app.command) {
            self.session.record(step, Some(e.to_string()));
            self.session
                .report
                .error(format!("Failed to launch '{}': {}", app.name, e));
            return None;
        }
        self.session.record(step, None);

        let timing = self.session.timing.clone();
        self.session.pause(app.delay.unwrap_or(timing.settle));

        let window = wait_for_window(
            self.session.channel,
            &app.name,
            &known,
            timing.launch_timeout,
            timing.poll_interval,
        );

        let commands = match &window {
            Some(w) => {
                log::debug!("'{}' appeared as window {}", app.name, w.id);
                vec![
                    SwayCommand::mark_window(w.id, &app.mark),
                    SwayCommand::focus_mark(&app.mark),
                ]
            }
            None => {
                self.session.report.warn(format!(
                    "No window for '{}' appeared within {:?}, marking the focused window",
                    app.name, timing.launch_timeout
                ));
                vec![SwayCommand::mark_focused(&app.mark)]
            }
        };

        let id = window.map(|w| w.id);
        let step = SetupStep::ApplyMark {
            mark: app.mark.to_string(),
            window: id,
        };
        if let Err(e) = self.session.run_step(step, &commands) {
            self.session
                .report
                .error(format!("Failed to mark '{}' as {}: {}", app.name, app.mark, e));
        }

        Some(Placement::Launched(id))
    }

    /// Add the container mark to the focused window and apply the layout.
    ///
    /// `via` is the app that was just placed. When it was adopted and its
    /// live parent already has the right layout, the layout is left alone.
    fn claim(&mut self, id: NodeId, via: NodeId) {
        let Some(container) = self.tree.container(id) else {
            return;
        };

        let step = SetupStep::ClaimContainer {
            mark: container.mark.to_string(),
        };
        if let Err(e) = self
            .session
            .run_step(step, &[SwayCommand::mark_focused(&container.mark)])
        {
            self.session
                .report
                .warn(format!("Failed to claim container {}: {}", container.mark, e));
        }
        self.outcome.claimed.insert(id);

        if self.layout_already_applied(via, container.layout) {
            log::info!(
                "Container {} already has layout {}, leaving it",
                container.mark,
                container.layout
            );
            return;
        }

        let step = SetupStep::SetLayout {
            mark: container.mark.to_string(),
            layout: container.layout,
        };
        match self
            .session
            .run_step(step, &SwayCommand::set_layout(container.layout))
        {
            Ok(()) => self.session.report.success(),
            Err(e) => self.session.report.error(format!(
                "Failed to set layout {} on {}: {}",
                container.layout, container.mark, e
            )),
        }
    }

    fn layout_already_applied(&mut self, via: NodeId, layout: Layout) -> bool {
        let reused = matches!(self.outcome.placed.get(&via), Some(Placement::Reused(_)));
        let Some(app) = self.tree.app(via) else {
            return false;
        };
        if !reused {
            return false;
        }
        self.session.live_tree().is_some_and(|tree| {
            tree.parent_of_mark(app.mark.as_str())
                .and_then(|parent| parent.parsed_layout())
                == Some(layout)
        })
    }

    /// Focus the container `prev` as a whole, so the next launch lands
    /// beside it instead of inside it.
    fn refocus_beside(&mut self, prev: NodeId) {
        let Some(container) = self.tree.container(prev) else {
            return;
        };
        if !self.outcome.claimed.contains(&prev) {
            return;
        }

        // The container mark sits on its representative window; climb back
        // up to the container itself.
        let mut depth = 0;
        let mut cursor = self.tree.representative(prev);
        while let Some(node) = cursor {
            if node == prev {
                break;
            }
            depth += 1;
            cursor = self.tree.parent(node);
        }

        let mut commands = vec![SwayCommand::focus_mark(&container.mark)];
        commands.extend(std::iter::repeat(SwayCommand::FocusParent).take(depth));

        let step = SetupStep::Refocus {
            mark: container.mark.to_string(),
        };
        if let Err(e) = self.session.run_step(step, &commands) {
            self.session
                .report
                .warn(format!("Failed to refocus container {}: {}", container.mark, e));
        }
    }

    fn post_commands(&mut self, id: NodeId) {
        let Some(app) = self.tree.app(id) else {
            return;
        };
        let Some(placement) = self.outcome.placed.get(&id) else {
            return;
        };
        if app.post.is_empty() {
            return;
        }
        if matches!(placement, Placement::Reused(_)) && !app.rerun_post {
            log::debug!("'{}' was already running, skipping post commands", app.name);
            return;
        }

        for command in &app.post {
            log::info!("Running post command for '{}': {}", app.name, command);
            let step = SetupStep::PostCommand {
                mark: app.mark.to_string(),
                command: command.clone(),
            };
            match self.session.launcher.spawn(command) {
                Ok(()) => self.session.record(step, None),
                Err(e) => {
                    self.session.record(step, Some(e.to_string()));
                    self.session
                        .report
                        .warn(format!("Post command for '{}' failed: {}", app.name, e));
                }
            }
            self.session.pause(self.session.timing.post_delay);
        }
    }
}
