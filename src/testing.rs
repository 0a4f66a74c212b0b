//! In-memory window manager for tests.
//!
//! `FakeSway` implements both [`ControlChannel`] and [`Launcher`]. It records
//! every command and spawn, keeps a flat list of windows per workspace, and
//! understands the handful of commands whose effects the engine reads back:
//! marking, focusing by mark, killing and switching workspace.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ipc::{ChannelError, CommandAck, ControlChannel};
use crate::launch::{LaunchError, Launcher};
use crate::types::Rect;
use crate::window_query::{NodeType, TreeNode};

static CON_ID_MARK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\[con_id=(\d+)\] mark --add (\S+)$").unwrap());
static MARK_FOCUS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^\[con_mark="\^(\S+)\$"\] focus$"#).unwrap());
static CON_ID_KILL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\[con_id=(\d+)\] kill$").unwrap());
static WORKSPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"^workspace "(.*)"$"#).unwrap());

#[derive(Debug, Clone)]
pub struct FakeWindow {
    pub id: i64,
    pub name: String,
    pub workspace: String,
    pub marks: Vec<String>,
    pub floating: bool,
}

#[derive(Debug)]
struct Inner {
    commands: Vec<String>,
    spawned: Vec<String>,
    windows: Vec<FakeWindow>,
    next_id: i64,
    focused: Option<i64>,
    current_workspace: String,
    workspace_layout: String,
    fail_patterns: Vec<String>,
    spawn_failures: Vec<String>,
    windowless: Vec<String>,
    app_names: HashMap<String, String>,
}

/// Shared handle to a fake window manager
#[derive(Debug, Clone)]
pub struct FakeSway {
    inner: Rc<RefCell<Inner>>,
}

impl FakeSway {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                commands: Vec::new(),
                spawned: Vec::new(),
                windows: Vec::new(),
                next_id: 100,
                focused: None,
                current_workspace: "1".to_string(),
                workspace_layout: "splith".to_string(),
                fail_patterns: Vec::new(),
                spawn_failures: Vec::new(),
                windowless: Vec::new(),
                app_names: HashMap::new(),
            })),
        }
    }

    /// Add an existing window and return its id
    pub fn add_window(&self, workspace: &str, name: &str) -> i64 {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.windows.push(FakeWindow {
            id,
            name: name.to_string(),
            workspace: workspace.to_string(),
            marks: Vec::new(),
            floating: false,
        });
        id
    }

    /// Add an existing window that already carries marks
    pub fn add_marked_window(&self, workspace: &str, name: &str, marks: &[&str]) -> i64 {
        let id = self.add_window(workspace, name);
        for mark in marks {
            self.inner.borrow_mut().apply_mark(id, mark);
        }
        id
    }

    /// Layout reported for every workspace
    pub fn set_workspace_layout(&self, layout: &str) {
        self.inner.borrow_mut().workspace_layout = layout.to_string();
    }

    /// Reject every command containing `pattern`
    pub fn fail_on(&self, pattern: &str) {
        self.inner.borrow_mut().fail_patterns.push(pattern.to_string());
    }

    /// Make spawning `command` fail
    pub fn fail_spawn(&self, command: &str) {
        self.inner.borrow_mut().spawn_failures.push(command.to_string());
    }

    /// Spawning `command` succeeds but no window ever appears
    pub fn no_window_for(&self, command: &str) {
        self.inner.borrow_mut().windowless.push(command.to_string());
    }

    /// Window name produced by spawning `command`, instead of its first word
    pub fn set_app_name(&self, command: &str, name: &str) {
        self.inner
            .borrow_mut()
            .app_names
            .insert(command.to_string(), name.to_string());
    }

    pub fn commands(&self) -> Vec<String> {
        self.inner.borrow().commands.clone()
    }

    pub fn spawned(&self) -> Vec<String> {
        self.inner.borrow().spawned.clone()
    }

    pub fn windows(&self) -> Vec<FakeWindow> {
        self.inner.borrow().windows.clone()
    }

    pub fn window(&self, id: i64) -> Option<FakeWindow> {
        self.inner.borrow().windows.iter().find(|w| w.id == id).cloned()
    }

    pub fn focused(&self) -> Option<i64> {
        self.inner.borrow().focused
    }

    pub fn current_workspace(&self) -> String {
        self.inner.borrow().current_workspace.clone()
    }

    /// Forget recorded commands and spawns, keeping windows
    pub fn clear_log(&self) {
        let mut inner = self.inner.borrow_mut();
        inner.commands.clear();
        inner.spawned.clear();
    }
}

impl Default for FakeSway {
    fn default() -> Self {
        Self::new()
    }
}

impl Inner {
    /// Marks are unique: applying one moves it off any other window
    fn apply_mark(&mut self, id: i64, mark: &str) -> bool {
        if !self.windows.iter().any(|w| w.id == id) {
            return false;
        }
        for window in &mut self.windows {
            if window.id == id {
                if !window.marks.iter().any(|m| m == mark) {
                    window.marks.push(mark.to_string());
                }
            } else {
                window.marks.retain(|m| m != mark);
            }
        }
        true
    }

    fn handle(&mut self, command: &str) -> CommandAck {
        if let Some(caps) = CON_ID_MARK.captures(command) {
            let id: i64 = caps[1].parse().unwrap_or_default();
            return if self.apply_mark(id, &caps[2]) {
                CommandAck::ok()
            } else {
                CommandAck::failed("No matching node")
            };
        }

        if let Some(mark) = command.strip_prefix("mark --add ") {
            if let Some(id) = self.focused {
                self.apply_mark(id, mark);
            }
            return CommandAck::ok();
        }

        if let Some(caps) = MARK_FOCUS.captures(command) {
            let target = self
                .windows
                .iter()
                .find(|w| w.marks.iter().any(|m| m == &caps[1]))
                .map(|w| w.id);
            return match target {
                Some(id) => {
                    self.focused = Some(id);
                    CommandAck::ok()
                }
                None => CommandAck::failed("No matching node"),
            };
        }

        if let Some(caps) = CON_ID_KILL.captures(command) {
            let id: i64 = caps[1].parse().unwrap_or_default();
            let before = self.windows.len();
            self.windows.retain(|w| w.id != id);
            if self.focused == Some(id) {
                self.focused = None;
            }
            return if self.windows.len() < before {
                CommandAck::ok()
            } else {
                CommandAck::failed("No matching node")
            };
        }

        if let Some(caps) = WORKSPACE.captures(command) {
            self.current_workspace = caps[1].to_string();
            return CommandAck::ok();
        }

        if command == "floating enable" {
            if let Some(id) = self.focused {
                if let Some(window) = self.windows.iter_mut().find(|w| w.id == id) {
                    window.floating = true;
                }
            }
        }

        CommandAck::ok()
    }

    fn tree(&self) -> TreeNode {
        let mut names: Vec<String> = self.windows.iter().map(|w| w.workspace.clone()).collect();
        names.push(self.current_workspace.clone());
        names.sort();
        names.dedup();

        let workspaces = names
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let window_node = |w: &FakeWindow| TreeNode {
                    id: w.id,
                    name: Some(w.name.clone()),
                    node_type: if w.floating {
                        NodeType::FloatingCon
                    } else {
                        NodeType::Con
                    },
                    app_id: Some(w.name.clone()),
                    marks: w.marks.clone(),
                    focused: self.focused == Some(w.id),
                    rect: Rect::new(0, 0, 800, 600),
                    ..Default::default()
                };
                let on_ws = |floating: bool| {
                    self.windows
                        .iter()
                        .filter(|w| &w.workspace == name && w.floating == floating)
                        .map(window_node)
                        .collect::<Vec<_>>()
                };
                TreeNode {
                    id: 10 + i as i64,
                    name: Some(name.clone()),
                    node_type: NodeType::Workspace,
                    layout: Some(self.workspace_layout.clone()),
                    nodes: on_ws(false),
                    floating_nodes: on_ws(true),
                    ..Default::default()
                }
            })
            .collect();

        TreeNode {
            id: 1,
            name: Some("root".to_string()),
            node_type: NodeType::Root,
            nodes: vec![TreeNode {
                id: 2,
                name: Some("FAKE-1".to_string()),
                node_type: NodeType::Output,
                nodes: workspaces,
                ..Default::default()
            }],
            ..Default::default()
        }
    }
}

impl ControlChannel for FakeSway {
    fn run(&self, command: &str) -> Result<Vec<CommandAck>, ChannelError> {
        let mut inner = self.inner.borrow_mut();
        inner.commands.push(command.to_string());
        if inner.fail_patterns.iter().any(|p| command.contains(p.as_str())) {
            return Ok(vec![CommandAck::failed("scripted failure")]);
        }
        Ok(vec![inner.handle(command)])
    }

    fn get_tree(&self) -> Result<TreeNode, ChannelError> {
        Ok(self.inner.borrow().tree())
    }
}

impl Launcher for FakeSway {
    fn spawn(&self, command: &str) -> Result<(), LaunchError> {
        let mut inner = self.inner.borrow_mut();
        inner.spawned.push(command.to_string());

        if inner.spawn_failures.iter().any(|c| c == command) {
            return Err(LaunchError::NotFound {
                program: command.to_string(),
            });
        }
        if inner.windowless.iter().any(|c| c == command) {
            return Ok(());
        }

        let name = inner.app_names.get(command).cloned().unwrap_or_else(|| {
            command
                .split_whitespace()
                .next()
                .unwrap_or(command)
                .to_string()
        });
        let id = inner.next_id;
        inner.next_id += 1;
        let workspace = inner.current_workspace.clone();
        inner.windows.push(FakeWindow {
            id,
            name,
            workspace,
            marks: Vec::new(),
            floating: false,
        });
        inner.focused = Some(id);
        Ok(())
    }
}
