//! Whole-configuration setup run.
//!
//! Checks that the control channel utility is available, sets up every
//! configured workspace in name order, then walks the focus list.

use std::path::PathBuf;

use serde::Serialize;

use crate::command::SwayCommand;
use crate::config::Config;
use crate::ipc::SwayMsg;
use crate::layout::{LayoutTree, PlanEntry};
use crate::session::Session;
use crate::state::SetupStep;
use crate::workspaces::setup_workspace;

/// Errors that stop a run before anything is sent
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("required program '{program}' was not found on PATH")]
    MissingDependency { program: String },
}

/// Make sure `swaymsg` can be run
pub fn check_dependencies(channel: &SwayMsg) -> Result<PathBuf, StartupError> {
    match channel.locate() {
        Some(path) => {
            log::debug!("Using {:?}", path);
            Ok(path)
        }
        None => Err(StartupError::MissingDependency {
            program: crate::ipc::SWAYMSG.to_string(),
        }),
    }
}

/// Set up every workspace, then focus the listed ones.
///
/// Results accumulate in the session's report and trace.
pub fn run(session: &mut Session, config: &Config) {
    for (name, spec) in &config.workspaces {
        if setup_workspace(session, name, spec).is_none() {
            log::warn!("Workspace '{}' was not set up", name);
        }
    }
    focus_workspaces(session, &config.focus);
    session.report.summarize();
}

/// Switch to each workspace in turn, pausing between them
pub fn focus_workspaces(session: &mut Session, names: &[String]) {
    for name in names {
        session.set_workspace(name);
        log::info!("Focusing workspace '{}'", name);
        let step = SetupStep::FocusWorkspace {
            workspace: name.clone(),
        };
        if let Err(e) = session.run_step(step, &[SwayCommand::Workspace(name.clone())]) {
            session
                .report
                .warn(format!("Failed to focus workspace '{}': {}", name, e));
        }
        session.pause(session.timing.focus_delay);
    }
}

/// The nodes and marks a workspace would get, without contacting sway
#[derive(Debug, Clone, Serialize)]
pub struct WorkspacePlan {
    pub workspace: String,
    pub nodes: Vec<PlanEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Build every workspace's tree offline
pub fn plan(config: &Config) -> Vec<WorkspacePlan> {
    config
        .workspaces
        .iter()
        .map(|(name, spec)| {
            let built = LayoutTree::build(name, spec);
            WorkspacePlan {
                workspace: name.clone(),
                nodes: built.tree.plan(),
                errors: built.errors.iter().map(|e| e.to_string()).collect(),
                warnings: built.warnings,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ContainerSpec, Timing, WorkspaceSpec};
    use crate::testing::FakeSway;
    use crate::types::Layout;

    fn config() -> Config {
        let mut config = Config::default();
        for (name, apps) in [("2", vec!["mail"]), ("1", vec!["foot", "firefox"])] {
            config.workspaces.insert(
                name.to_string(),
                WorkspaceSpec {
                    layout: Some(Layout::Tabbed),
                    containers: apps.into_iter().map(ContainerSpec::app).collect(),
                    ..Default::default()
                },
            );
        }
        config.focus = vec!["2".to_string(), "1".to_string()];
        config
    }

    #[test]
    fn test_workspaces_processed_in_name_order_then_focused() {
        let fake = FakeSway::new();
        let mut session = Session::new(&fake, &fake, Timing::immediate());
        run(&mut session, &config());

        assert_eq!(fake.spawned(), vec!["foot", "firefox", "mail"]);
        let switches: Vec<String> = fake
            .commands()
            .into_iter()
            .filter(|c| c.starts_with("workspace "))
            .collect();
        assert_eq!(
            switches,
            vec![
                "workspace \"1\"",
                "workspace \"2\"",
                "workspace \"2\"",
                "workspace \"1\"",
            ]
        );
        assert_eq!(fake.current_workspace(), "1");
        assert_eq!(session.report.exit_code(), 0);

        let steps = session.trace.steps();
        assert!(matches!(steps.last(), Some(SetupStep::FocusWorkspace { workspace }) if workspace == "1"));
    }

    #[test]
    fn test_focus_failure_is_a_warning() {
        let fake = FakeSway::new();
        fake.fail_on("workspace \"9\"");
        let mut session = Session::new(&fake, &fake, Timing::immediate());
        focus_workspaces(&mut session, &["9".to_string(), "1".to_string()]);

        assert_eq!(session.report.warning_count(), 1);
        assert_eq!(session.report.error_count(), 0);
        assert_eq!(fake.current_workspace(), "1");
    }

    #[test]
    fn test_everything_failing_gives_nonzero_exit() {
        let fake = FakeSway::new();
        for app in ["foot", "firefox", "mail"] {
            fake.fail_spawn(app);
        }
        let mut session = Session::new(&fake, &fake, Timing::immediate());
        run(&mut session, &config());

        assert_eq!(session.report.success_count(), 0);
        assert_eq!(session.report.exit_code(), 1);
    }

    #[test]
    fn test_plan_lists_marks_without_commands() {
        let plans = plan(&config());
        assert_eq!(plans.len(), 2);
        assert_eq!(plans[0].workspace, "1");
        let marks: Vec<&str> = plans[0].nodes.iter().map(|n| n.mark.as_str()).collect();
        assert_eq!(marks, vec!["flem_w1_c0", "flem_w1_c0_a1", "flem_w1_c0_a2"]);
        assert!(plans[0].errors.is_empty());
    }

    #[test]
    fn test_missing_swaymsg_is_reported() {
        let err = StartupError::MissingDependency {
            program: "swaymsg".to_string(),
        };
        assert_eq!(err.to_string(), "required program 'swaymsg' was not found on PATH");
    }
}
