//! Container tree for a single workspace.
//!
//! The tree is stored in an arena where:
//! - The root is the workspace container (index 0, workspace layout)
//! - Internal nodes are Containers (split/tabbed/stacking)
//! - Leaf nodes are Apps
//!
//! Children keep configuration order. Container indices come from one
//! counter shared across the whole tree, assigned depth-first, so every
//! node gets a mark no other node in the workspace has.

use std::time::Duration;

use serde::Serialize;
use slotmap::{new_key_type, SecondaryMap, SlotMap};

use crate::config::{ContainerSpec, SpecKind, StructureError, WorkspaceSpec};
use crate::mark::Mark;
use crate::types::{Layout, Position, Size};

// Generate unique key types for our arena
new_key_type! {
    /// Unique identifier for a node in the container tree
    pub struct NodeId;
}

/// A container that imposes a layout on its children
#[derive(Debug, Clone)]
pub struct ContainerNode {
    pub mark: Mark,
    /// Depth-first container index, 0 for the workspace root
    pub index: usize,
    /// Resolved layout of this container
    pub layout: Layout,
    /// Layout of the enclosing container, `None` for the root
    pub parent_layout: Option<Layout>,
    pub size: Option<Size>,
    /// Children in configuration order
    pub children: Vec<NodeId>,
}

/// An application leaf
#[derive(Debug, Clone)]
pub struct AppNode {
    pub mark: Mark,
    /// Application identifier matched against app_id/class
    pub name: String,
    /// Command used to launch it
    pub command: String,
    pub size: Option<Size>,
    /// Explicit wait after launch, overrides the settle time
    pub delay: Option<Duration>,
    pub post: Vec<String>,
    pub rerun_post: bool,
    pub floating: bool,
    pub position: Option<Position>,
    /// Layout of the enclosing container, decides resize direction
    pub parent_layout: Layout,
}

/// A node in the container tree
#[derive(Debug, Clone)]
pub enum Node {
    Container(ContainerNode),
    App(AppNode),
}

impl Node {
    pub fn mark(&self) -> &Mark {
        match self {
            Node::Container(c) => &c.mark,
            Node::App(a) => &a.mark,
        }
    }

    pub fn size(&self) -> Option<Size> {
        match self {
            Node::Container(c) => c.size,
            Node::App(a) => a.size,
        }
    }

    pub fn as_container(&self) -> Option<&ContainerNode> {
        match self {
            Node::Container(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_app(&self) -> Option<&AppNode> {
        match self {
            Node::App(a) => Some(a),
            _ => None,
        }
    }
}

/// Errors found while building the tree
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BuildError {
    #[error("{context}: split container has no children")]
    EmptyContainer { context: String },
    #[error("{context}: {source}")]
    InvalidStructure {
        context: String,
        source: StructureError,
    },
}

/// Output of [`LayoutTree::build`]
#[derive(Debug)]
pub struct BuildResult {
    pub tree: LayoutTree,
    pub errors: Vec<BuildError>,
    pub warnings: Vec<String>,
}

/// One line of a printable plan
#[derive(Debug, Clone, Serialize)]
pub struct PlanEntry {
    pub depth: usize,
    pub mark: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<Layout>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
}

/// The container tree of one workspace
#[derive(Debug)]
pub struct LayoutTree {
    workspace: String,
    /// Arena storage for all nodes
    nodes: SlotMap<NodeId, Node>,
    /// Parent pointers for navigation
    parents: SecondaryMap<NodeId, NodeId>,
    /// Workspace root container
    root: NodeId,
}

impl LayoutTree {
    /// Create a tree holding only the workspace root container
    pub fn new(workspace: &str, layout: Layout) -> Self {
        let mut nodes = SlotMap::with_key();
        let root = nodes.insert(Node::Container(ContainerNode {
            mark: Mark::container(workspace, 0),
            index: 0,
            layout,
            parent_layout: None,
            size: None,
            children: Vec::new(),
        }));

        Self {
            workspace: workspace.to_string(),
            nodes,
            parents: SecondaryMap::new(),
            root,
        }
    }

    /// Build the tree for a workspace.
    ///
    /// Invalid children are recorded in `errors` and skipped; the rest of
    /// the tree is still built.
    pub fn build(workspace: &str, spec: &WorkspaceSpec) -> BuildResult {
        let mut warnings = Vec::new();
        let layout = spec.layout.unwrap_or_else(|| {
            warnings.push(format!(
                "workspace '{}' has no layout, using {}",
                workspace,
                Layout::SplitH
            ));
            Layout::SplitH
        });

        let mut builder = Builder {
            tree: LayoutTree::new(workspace, layout),
            next_index: 0,
            errors: Vec::new(),
            warnings,
        };
        let root = builder.tree.root;
        builder.add_children(root, 0, layout, &spec.containers, "");

        log::debug!(
            "Built tree for workspace '{}': {} nodes, {} errors, {} warnings",
            workspace,
            builder.tree.len(),
            builder.errors.len(),
            builder.warnings.len()
        );

        BuildResult {
            tree: builder.tree,
            errors: builder.errors,
            warnings: builder.warnings,
        }
    }

    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Layout of the workspace root
    pub fn layout(&self) -> Layout {
        self.container(self.root)
            .map(|c| c.layout)
            .unwrap_or(Layout::SplitH)
    }

    /// Number of nodes, root included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn container(&self, id: NodeId) -> Option<&ContainerNode> {
        self.get(id).and_then(|n| n.as_container())
    }

    pub fn app(&self, id: NodeId) -> Option<&AppNode> {
        self.get(id).and_then(|n| n.as_app())
    }

    /// Get parent of a node
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(id).copied()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.container(id).map(|c| c.children.as_slice()).unwrap_or(&[])
    }

    /// App children of a container, in order
    pub fn app_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.app(c).is_some())
            .collect()
    }

    /// Nested container children of a container, in order
    pub fn container_children(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .filter(|&c| self.container(c).is_some())
            .collect()
    }

    /// The window that stands in for a container before it has a mark.
    ///
    /// This is the first app child, or for a container with only nested
    /// containers, the representative of the first of them.
    pub fn representative(&self, id: NodeId) -> Option<NodeId> {
        match self.get(id)? {
            Node::App(_) => Some(id),
            Node::Container(container) => {
                if let Some(&app) = container.children.iter().find(|&&c| self.app(c).is_some()) {
                    return Some(app);
                }
                container
                    .children
                    .first()
                    .and_then(|&first| self.representative(first))
            }
        }
    }

    /// All nodes, each before its children, siblings in configuration order
    pub fn pre_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        self.collect_pre_order(self.root, &mut order);
        order
    }

    fn collect_pre_order(&self, id: NodeId, order: &mut Vec<NodeId>) {
        order.push(id);
        for &child in self.children(id) {
            self.collect_pre_order(child, order);
        }
    }

    /// All app nodes in tree order
    pub fn apps(&self) -> Vec<NodeId> {
        self.pre_order()
            .into_iter()
            .filter(|&id| self.app(id).is_some())
            .collect()
    }

    /// Printable description of the tree
    pub fn plan(&self) -> Vec<PlanEntry> {
        let mut entries = Vec::new();
        self.collect_plan(self.root, 0, &mut entries);
        entries
    }

    fn collect_plan(&self, id: NodeId, depth: usize, entries: &mut Vec<PlanEntry>) {
        let Some(node) = self.get(id) else {
            return;
        };
        entries.push(PlanEntry {
            depth,
            mark: node.mark().to_string(),
            layout: node.as_container().map(|c| c.layout),
            app: node.as_app().map(|a| a.name.clone()),
            size: node.size(),
        });
        for &child in self.children(id) {
            self.collect_plan(child, depth + 1, entries);
        }
    }

    fn insert(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = self.nodes.insert(node);
        self.parents.insert(id, parent);
        if let Some(Node::Container(container)) = self.nodes.get_mut(parent) {
            container.children.push(id);
        }
        id
    }
}

struct Builder {
    tree: LayoutTree,
    next_index: usize,
    errors: Vec<BuildError>,
    warnings: Vec<String>,
}

impl Builder {
    fn add_children(
        &mut self,
        parent: NodeId,
        parent_index: usize,
        parent_layout: Layout,
        specs: &[ContainerSpec],
        context: &str,
    ) {
        let mut app_count = 0;

        for (i, spec) in specs.iter().enumerate() {
            let context = format!("{}containers[{}]", context, i);

            match spec.kind() {
                Err(source) => {
                    self.errors.push(BuildError::InvalidStructure { context, source });
                }
                Ok(SpecKind::App(name)) => {
                    app_count += 1;
                    let node = AppNode {
                        mark: Mark::app(&self.tree.workspace, parent_index, app_count),
                        name: name.to_string(),
                        command: spec.launch_command().unwrap_or(name).to_string(),
                        size: spec.size,
                        delay: spec
                            .delay
                            .and_then(|d| Duration::try_from_secs_f64(d).ok()),
                        post: spec.post.clone(),
                        rerun_post: spec.rerun_post,
                        floating: spec.floating,
                        position: spec.position.clone(),
                        parent_layout,
                    };
                    self.tree.insert(parent, Node::App(node));
                }
                Ok(SpecKind::Split { split, children }) => {
                    if children.is_empty() {
                        self.errors.push(BuildError::EmptyContainer { context });
                        continue;
                    }

                    let layout = match split {
                        Some(layout) => layout,
                        None => {
                            self.warnings.push(format!(
                                "{}: no split type, inheriting {} from parent",
                                context, parent_layout
                            ));
                            parent_layout
                        }
                    };

                    if children[0].kind().is_ok_and(|k| matches!(k, SpecKind::Split { .. })) {
                        self.warnings.push(format!(
                            "{}: first child is a nested container, the container will be \
                             addressed through that container's first app",
                            context
                        ));
                    }

                    self.next_index += 1;
                    let index = self.next_index;
                    let node = ContainerNode {
                        mark: Mark::container(&self.tree.workspace, index),
                        index,
                        layout,
                        parent_layout: Some(parent_layout),
                        size: spec.size,
                        children: Vec::new(),
                    };
                    let id = self.tree.insert(parent, Node::Container(node));
                    self.add_children(id, index, layout, children, &format!("{}.", context));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn example_workspace() -> WorkspaceSpec {
        WorkspaceSpec {
            layout: Some(Layout::SplitH),
            containers: vec![
                ContainerSpec::app("terminal").with_size(Size::ppt(40)),
                ContainerSpec::split(
                    Some(Layout::SplitV),
                    vec![
                        ContainerSpec::app("editor").with_size(Size::ppt(50)),
                        ContainerSpec::app("browser").with_size(Size::ppt(50)),
                    ],
                )
                .with_size(Size::ppt(60)),
            ],
            ..Default::default()
        }
    }

    fn marks(tree: &LayoutTree) -> Vec<String> {
        tree.pre_order()
            .into_iter()
            .map(|id| tree.get(id).unwrap().mark().to_string())
            .collect()
    }

    #[test]
    fn test_build_example() {
        let result = LayoutTree::build("1", &example_workspace());
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());

        let tree = result.tree;
        assert_eq!(tree.len(), 5);
        assert_eq!(
            marks(&tree),
            vec!["flem_w1_c0", "flem_w1_c0_a1", "flem_w1_c1", "flem_w1_c1_a1", "flem_w1_c1_a2"]
        );

        let nested = tree.container_children(tree.root())[0];
        let nested_node = tree.container(nested).unwrap();
        assert_eq!(nested_node.layout, Layout::SplitV);
        assert_eq!(nested_node.parent_layout, Some(Layout::SplitH));
        assert_eq!(tree.parent(nested), Some(tree.root()));

        for app in tree.app_children(nested) {
            assert_eq!(tree.app(app).unwrap().parent_layout, Layout::SplitV);
        }
    }

    #[test]
    fn test_marks_unique_with_deep_nesting() {
        let leaf = |n: &str| ContainerSpec::app(n);
        let ws = WorkspaceSpec {
            layout: Some(Layout::Tabbed),
            containers: vec![
                ContainerSpec::split(
                    Some(Layout::SplitV),
                    vec![
                        leaf("a"),
                        ContainerSpec::split(Some(Layout::SplitH), vec![leaf("b"), leaf("c")]),
                    ],
                ),
                ContainerSpec::split(
                    Some(Layout::Stacking),
                    vec![
                        leaf("d"),
                        ContainerSpec::split(Some(Layout::SplitH), vec![leaf("e")]),
                    ],
                ),
                leaf("f"),
            ],
            ..Default::default()
        };
        let tree = LayoutTree::build("dev", &ws).tree;
        let all = marks(&tree);
        let unique: HashSet<_> = all.iter().collect();
        assert_eq!(all.len(), unique.len());

        // Counter is shared depth-first, not per level
        let indices: Vec<usize> = tree
            .pre_order()
            .into_iter()
            .filter_map(|id| tree.container(id).map(|c| c.index))
            .collect();
        assert_eq!(indices, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_build_is_deterministic() {
        let a = LayoutTree::build("1", &example_workspace()).tree;
        let b = LayoutTree::build("1", &example_workspace()).tree;
        assert_eq!(marks(&a), marks(&b));
    }

    #[test]
    fn test_empty_container_error() {
        let ws = WorkspaceSpec {
            layout: Some(Layout::SplitH),
            containers: vec![
                ContainerSpec::app("a"),
                ContainerSpec::split(Some(Layout::SplitV), vec![]),
                ContainerSpec::app("b"),
            ],
            ..Default::default()
        };
        let result = LayoutTree::build("1", &ws);
        assert_eq!(
            result.errors,
            vec![BuildError::EmptyContainer {
                context: "containers[1]".to_string()
            }]
        );
        // Siblings are still built
        assert_eq!(result.tree.app_children(result.tree.root()).len(), 2);
    }

    #[test]
    fn test_invalid_structure_error() {
        let mut both = ContainerSpec::app("a");
        both.containers = vec![ContainerSpec::app("b")];
        let ws = WorkspaceSpec {
            layout: Some(Layout::SplitH),
            containers: vec![ContainerSpec::split(
                Some(Layout::SplitV),
                vec![ContainerSpec::app("x"), both],
            )],
            ..Default::default()
        };
        let result = LayoutTree::build("1", &ws);
        assert_eq!(
            result.errors,
            vec![BuildError::InvalidStructure {
                context: "containers[0].containers[1]".to_string(),
                source: StructureError::Both,
            }]
        );
    }

    #[test]
    fn test_missing_split_inherits_parent_layout() {
        let ws = WorkspaceSpec {
            layout: Some(Layout::Stacking),
            containers: vec![ContainerSpec::split(None, vec![ContainerSpec::app("a")])],
            ..Default::default()
        };
        let result = LayoutTree::build("1", &ws);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("inheriting stacking"));
        let nested = result.tree.container_children(result.tree.root())[0];
        assert_eq!(result.tree.container(nested).unwrap().layout, Layout::Stacking);
    }

    #[test]
    fn test_first_child_split_warns_and_representative_descends() {
        let ws = WorkspaceSpec {
            layout: Some(Layout::SplitH),
            containers: vec![ContainerSpec::split(
                Some(Layout::SplitV),
                vec![
                    ContainerSpec::split(Some(Layout::SplitH), vec![ContainerSpec::app("inner")]),
                    ContainerSpec::app("outer"),
                ],
            )],
            ..Default::default()
        };
        let result = LayoutTree::build("1", &ws);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("first child"));

        let tree = result.tree;
        let outer = tree.container_children(tree.root())[0];
        // An app child takes precedence over a leading nested container
        let rep = tree.representative(outer).unwrap();
        assert_eq!(tree.app(rep).unwrap().name, "outer");

        let inner = tree.container_children(outer)[0];
        let rep = tree.representative(inner).unwrap();
        assert_eq!(tree.app(rep).unwrap().name, "inner");
    }

    #[test]
    fn test_representative_of_app_less_root() {
        let ws = WorkspaceSpec {
            layout: Some(Layout::SplitH),
            containers: vec![ContainerSpec::split(
                Some(Layout::SplitV),
                vec![ContainerSpec::app("deep")],
            )],
            ..Default::default()
        };
        let tree = LayoutTree::build("1", &ws).tree;
        let rep = tree.representative(tree.root()).unwrap();
        assert_eq!(tree.app(rep).unwrap().mark.as_str(), "flem_w1_c1_a1");
    }

    #[test]
    fn test_app_fields_resolved() {
        let mut spec = ContainerSpec::app("firefox");
        spec.cmd = Some("firefox --new-window".to_string());
        spec.delay = Some(1.5);
        spec.floating = true;
        spec.position = Some(Position::Center);
        let ws = WorkspaceSpec {
            layout: Some(Layout::SplitV),
            containers: vec![spec],
            ..Default::default()
        };
        let tree = LayoutTree::build("web", &ws).tree;
        let app = tree.app(tree.apps()[0]).unwrap();
        assert_eq!(app.command, "firefox --new-window");
        assert_eq!(app.delay, Some(Duration::from_millis(1500)));
        assert!(app.floating);
        assert_eq!(app.parent_layout, Layout::SplitV);
    }

    #[test]
    fn test_unrepresentable_delay_is_dropped() {
        let mut huge = ContainerSpec::app("a");
        huge.delay = Some(1e30);
        let mut negative = ContainerSpec::app("b");
        negative.delay = Some(-2.0);
        let ws = WorkspaceSpec {
            layout: Some(Layout::SplitH),
            containers: vec![huge, negative],
            ..Default::default()
        };
        let result = LayoutTree::build("1", &ws);
        let delays: Vec<Option<Duration>> = result
            .tree
            .apps()
            .into_iter()
            .map(|id| result.tree.app(id).unwrap().delay)
            .collect();
        assert_eq!(delays, vec![None, None]);
    }

    #[test]
    fn test_plan_depths() {
        let tree = LayoutTree::build("1", &example_workspace()).tree;
        let plan = tree.plan();
        let depths: Vec<usize> = plan.iter().map(|e| e.depth).collect();
        assert_eq!(depths, vec![0, 1, 1, 2, 2]);
        assert_eq!(plan[1].app.as_deref(), Some("terminal"));
        assert_eq!(plan[2].layout, Some(Layout::SplitV));
    }
}
