//! Live window tree queries.
//!
//! Stateless functions over the tree returned by `get_tree`. Every query
//! works on a snapshot; callers re-fetch when they need fresh state.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::types::{Layout, Rect};

/// Kind of a node in the live tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Root,
    Output,
    Workspace,
    #[default]
    Con,
    FloatingCon,
    #[serde(other)]
    Other,
}

/// X11 properties of an XWayland window
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowProperties {
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub instance: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// One node of the live tree, as returned by `get_tree`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub node_type: NodeType,
    #[serde(default)]
    pub app_id: Option<String>,
    #[serde(default)]
    pub window_properties: Option<WindowProperties>,
    #[serde(default)]
    pub layout: Option<String>,
    #[serde(default)]
    pub rect: Rect,
    #[serde(default)]
    pub marks: Vec<String>,
    #[serde(default)]
    pub focused: bool,
    #[serde(default)]
    pub nodes: Vec<TreeNode>,
    #[serde(default)]
    pub floating_nodes: Vec<TreeNode>,
}

/// A point-in-time view of one application window
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveWindow {
    pub id: i64,
    /// app_id, or X11 class for XWayland windows
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub floating: bool,
    pub rect: Rect,
    pub marks: Vec<String>,
    /// Layout of the container the window sits in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_layout: Option<Layout>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace: Option<String>,
}

impl LiveWindow {
    /// Case-insensitive name comparison
    pub fn matches_name(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    pub fn has_mark(&self, mark: &str) -> bool {
        self.marks.iter().any(|m| m == mark)
    }
}

impl TreeNode {
    /// Application identifier: app_id, falling back to the X11 class
    pub fn app_name(&self) -> Option<&str> {
        self.app_id
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| {
                self.window_properties
                    .as_ref()
                    .and_then(|p| p.class.as_deref())
                    .filter(|s| !s.is_empty())
            })
    }

    /// Whether this node is an application window
    pub fn is_window(&self) -> bool {
        matches!(self.node_type, NodeType::Con | NodeType::FloatingCon)
            && self.nodes.is_empty()
            && self.app_name().is_some()
    }

    fn children(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.iter().chain(self.floating_nodes.iter())
    }

    /// Find a workspace by name
    pub fn find_workspace(&self, name: &str) -> Option<&TreeNode> {
        if self.node_type == NodeType::Workspace && self.name.as_deref() == Some(name) {
            return Some(self);
        }
        self.children().find_map(|c| c.find_workspace(name))
    }

    /// The parent of the node carrying a mark
    pub fn parent_of_mark(&self, mark: &str) -> Option<&TreeNode> {
        for child in self.children() {
            if child.marks.iter().any(|m| m == mark) {
                return Some(self);
            }
            if let Some(found) = child.parent_of_mark(mark) {
                return Some(found);
            }
        }
        None
    }

    /// Parsed layout of this node, if it is one the engine knows
    pub fn parsed_layout(&self) -> Option<Layout> {
        self.layout.as_deref().and_then(|l| l.parse().ok())
    }

    /// All windows below this node, in tree order (tiled before floating)
    pub fn windows(&self) -> Vec<LiveWindow> {
        let mut windows = Vec::new();
        self.collect_windows(None, false, None, &mut windows);
        windows
    }

    fn collect_windows(
        &self,
        workspace: Option<&str>,
        floating: bool,
        parent_layout: Option<Layout>,
        out: &mut Vec<LiveWindow>,
    ) {
        let workspace = if self.node_type == NodeType::Workspace {
            self.name.as_deref()
        } else {
            workspace
        };
        let floating = floating || self.node_type == NodeType::FloatingCon;

        if self.is_window() {
            out.push(LiveWindow {
                id: self.id,
                name: self.app_name().unwrap_or_default().to_string(),
                title: self.name.clone(),
                floating,
                rect: self.rect,
                marks: self.marks.clone(),
                parent_layout,
                workspace: workspace.map(str::to_string),
            });
            return;
        }

        let layout = self.parsed_layout();
        for child in &self.nodes {
            child.collect_windows(workspace, floating, layout, out);
        }
        for child in &self.floating_nodes {
            child.collect_windows(workspace, true, None, out);
        }
    }

    /// Ids of every window in the tree
    pub fn window_ids(&self) -> HashSet<i64> {
        self.windows().into_iter().map(|w| w.id).collect()
    }

    /// Every mark in the tree, in tree order
    pub fn all_marks(&self) -> Vec<String> {
        let mut marks = Vec::new();
        self.collect_marks(&mut marks);
        marks
    }

    fn collect_marks(&self, out: &mut Vec<String>) {
        out.extend(self.marks.iter().cloned());
        for child in self.children() {
            child.collect_marks(out);
        }
    }
}

/// Windows on a workspace, or an empty list if the workspace does not exist
pub fn workspace_windows(root: &TreeNode, workspace: &str) -> Vec<LiveWindow> {
    root.find_workspace(workspace)
        .map(|ws| {
            let mut windows = ws.windows();
            for w in &mut windows {
                w.workspace = Some(workspace.to_string());
            }
            windows
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TREE: &str = r#"{
        "id": 1, "name": "root", "type": "root", "rect": {"x":0,"y":0,"width":1920,"height":1080},
        "nodes": [{
            "id": 2, "name": "eDP-1", "type": "output",
            "nodes": [{
                "id": 3, "name": "1", "type": "workspace", "layout": "splith",
                "nodes": [
                    {"id": 10, "name": "~", "type": "con", "app_id": "Alacritty",
                     "marks": ["flem_w1_c0_a1", "flem_w1_c0"], "nodes": []},
                    {"id": 11, "name": null, "type": "con", "layout": "stacked", "marks": ["flem_w1_c1"],
                     "nodes": [
                        {"id": 12, "name": "Mozilla", "type": "con", "app_id": null,
                         "window_properties": {"class": "firefox"}, "nodes": []}
                     ]}
                ],
                "floating_nodes": [
                    {"id": 13, "name": "calc", "type": "floating_con", "app_id": "qalculate", "nodes": []}
                ]
            }, {
                "id": 4, "name": "2", "type": "workspace", "layout": "tabbed",
                "nodes": [{"id": 20, "type": "con", "app_id": "slack", "nodes": []}]
            }]
        }]
    }"#;

    fn tree() -> TreeNode {
        serde_json::from_str(TREE).unwrap()
    }

    #[test]
    fn test_parse_tree() {
        let root = tree();
        assert_eq!(root.node_type, NodeType::Root);
        assert_eq!(root.rect.width, 1920);
        assert!(root.find_workspace("1").is_some());
        assert!(root.find_workspace("3").is_none());
    }

    #[test]
    fn test_workspace_windows() {
        let windows = workspace_windows(&tree(), "1");
        let names: Vec<&str> = windows.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["Alacritty", "firefox", "qalculate"]);

        assert_eq!(windows[0].parent_layout, Some(Layout::SplitH));
        assert_eq!(windows[1].parent_layout, Some(Layout::Stacking));
        assert!(!windows[1].floating);
        assert!(windows[2].floating);
        assert!(windows.iter().all(|w| w.workspace.as_deref() == Some("1")));
    }

    #[test]
    fn test_windows_across_workspaces() {
        let windows = tree().windows();
        assert_eq!(windows.len(), 4);
        assert_eq!(windows[3].workspace.as_deref(), Some("2"));
        assert!(workspace_windows(&tree(), "9").is_empty());
    }

    #[test]
    fn test_parent_of_mark() {
        let root = tree();
        assert!(root.parent_of_mark("flem_w1_c").is_none());

        let parent = root.parent_of_mark("flem_w1_c0_a1").unwrap();
        assert_eq!(parent.parsed_layout(), Some(Layout::SplitH));
    }

    #[test]
    fn test_matches_name_case_insensitive() {
        let windows = workspace_windows(&tree(), "1");
        assert!(windows[0].matches_name("alacritty"));
        assert!(windows[1].matches_name("Firefox"));
        assert!(!windows[1].matches_name("fire"));
        assert!(windows[0].has_mark("flem_w1_c0"));
    }

    #[test]
    fn test_window_ids_and_marks() {
        let root = tree();
        let ids = root.window_ids();
        assert_eq!(ids.len(), 4);
        assert!(ids.contains(&13));
        assert_eq!(root.all_marks(), vec!["flem_w1_c0_a1", "flem_w1_c0", "flem_w1_c1"]);
    }
}
