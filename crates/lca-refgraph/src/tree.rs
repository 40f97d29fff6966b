//! Reference tree
//!
//! One node per visited reference along the path that first reached it.
//! Each node owns its children, so the tree is acyclic by construction.
//!
//! During traversal nodes are appended concurrently into a [`TreeArena`]
//! addressed by index; once traversal completes the arena is folded into an
//! owned [`ReferenceTree`]. Later flag updates go through an identity
//! visitor (`find_mut`, `update`, `update_all`) matching on the full
//! `(kind, id, version)` triple.

use lca_dataset::RefPointer;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// One visited reference plus its classification flags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceTreeNode {
    /// Referenced identity
    pub pointer: RefPointer,
    /// Record passed rule verification (true for missing records)
    pub rule_verification: bool,
    /// No record exists for this identity
    pub non_existent: bool,
    /// Some version of this id is mid-review
    pub version_under_review: bool,
    /// Version currently under review for this id
    pub under_review_version: Option<String>,
    /// Referenced version predates the released version
    pub version_is_stale_vs_released: bool,
    /// References reached through this node
    pub children: Vec<ReferenceTreeNode>,
}

impl ReferenceTreeNode {
    /// Node for a fetched record
    #[must_use]
    pub fn new(pointer: RefPointer, rule_verification: bool) -> Self {
        Self {
            pointer,
            rule_verification,
            non_existent: false,
            version_under_review: false,
            under_review_version: None,
            version_is_stale_vs_released: false,
            children: Vec::new(),
        }
    }

    /// Node for an identity with no record
    #[must_use]
    pub fn missing(pointer: RefPointer) -> Self {
        Self {
            non_existent: true,
            ..Self::new(pointer, true)
        }
    }

    /// Append a child
    #[must_use]
    pub fn with_child(mut self, child: ReferenceTreeNode) -> Self {
        self.children.push(child);
        self
    }

    /// Whether this node is a leaf
    #[inline]
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Traversal result: tree of visited references
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceTree {
    root: Option<ReferenceTreeNode>,
}

impl ReferenceTree {
    /// Tree with the given root
    #[inline]
    #[must_use]
    pub fn new(root: ReferenceTreeNode) -> Self {
        Self { root: Some(root) }
    }

    /// Tree with no nodes
    #[inline]
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Root node
    #[inline]
    #[must_use]
    pub fn root(&self) -> Option<&ReferenceTreeNode> {
        self.root.as_ref()
    }

    /// Whether the tree has no nodes
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Total node count
    #[must_use]
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Depth-first pre-order iteration
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            stack: self.root.iter().collect(),
        }
    }

    /// First node matching `pointer`, depth-first
    #[must_use]
    pub fn find(&self, pointer: &RefPointer) -> Option<&ReferenceTreeNode> {
        self.iter().find(|node| node.pointer == *pointer)
    }

    /// Whether any node matches `pointer`
    #[inline]
    #[must_use]
    pub fn contains(&self, pointer: &RefPointer) -> bool {
        self.find(pointer).is_some()
    }

    /// Mutable access to the first node matching `pointer`, depth-first
    pub fn find_mut(&mut self, pointer: &RefPointer) -> Option<&mut ReferenceTreeNode> {
        self.root
            .as_mut()
            .and_then(|root| find_node_mut(root, pointer))
    }

    /// Apply `update` to the first node matching `pointer`
    ///
    /// Returns whether a node matched.
    pub fn update<F>(&mut self, pointer: &RefPointer, update: F) -> bool
    where
        F: FnOnce(&mut ReferenceTreeNode),
    {
        match self.find_mut(pointer) {
            Some(node) => {
                update(node);
                true
            }
            None => false,
        }
    }

    /// Apply `update` to every node matching `pointer`
    ///
    /// Returns the number of matching nodes.
    pub fn update_all<F>(&mut self, pointer: &RefPointer, mut update: F) -> usize
    where
        F: FnMut(&mut ReferenceTreeNode),
    {
        let mut matched = 0;
        if let Some(root) = self.root.as_mut() {
            update_matching(root, pointer, &mut update, &mut matched);
        }
        matched
    }

    /// Consume the tree, returning its root
    #[inline]
    #[must_use]
    pub fn into_root(self) -> Option<ReferenceTreeNode> {
        self.root
    }
}

fn find_node_mut<'a>(
    node: &'a mut ReferenceTreeNode,
    pointer: &RefPointer,
) -> Option<&'a mut ReferenceTreeNode> {
    if node.pointer == *pointer {
        return Some(node);
    }
    node.children
        .iter_mut()
        .find_map(|child| find_node_mut(child, pointer))
}

fn update_matching<F>(
    node: &mut ReferenceTreeNode,
    pointer: &RefPointer,
    update: &mut F,
    matched: &mut usize,
) where
    F: FnMut(&mut ReferenceTreeNode),
{
    if node.pointer == *pointer {
        update(node);
        *matched += 1;
    }
    for child in &mut node.children {
        update_matching(child, pointer, update, matched);
    }
}

/// Depth-first pre-order iterator over tree nodes
#[derive(Debug)]
pub struct Iter<'a> {
    stack: Vec<&'a ReferenceTreeNode>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a ReferenceTreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev());
        Some(node)
    }
}

/// Arena index of a node under construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

/// Concurrently appendable tree used during traversal
///
/// Children are appended in completion order, so sibling order is not
/// deterministic; content is.
#[derive(Debug, Default)]
pub(crate) struct TreeArena {
    slots: Mutex<ArenaSlots>,
}

#[derive(Debug, Default)]
struct ArenaSlots {
    nodes: Vec<ArenaNode>,
    root: Option<NodeId>,
}

#[derive(Debug)]
struct ArenaNode {
    node: ReferenceTreeNode,
    children: Vec<NodeId>,
}

impl TreeArena {
    /// Append `node` under `parent`; a parentless node becomes the root
    ///
    /// A second parentless node is attached under the existing root.
    pub(crate) fn attach(&self, parent: Option<NodeId>, node: ReferenceTreeNode) -> NodeId {
        let mut slots = self.slots.lock();
        let id = NodeId(slots.nodes.len());
        slots.nodes.push(ArenaNode {
            node,
            children: Vec::new(),
        });

        match parent.or(slots.root) {
            Some(NodeId(parent)) => slots.nodes[parent].children.push(id),
            None => slots.root = Some(id),
        }
        id
    }

    /// Fold the arena into an owned tree, leaving it empty
    pub(crate) fn take_tree(&self) -> ReferenceTree {
        let ArenaSlots { nodes, root } = std::mem::take(&mut *self.slots.lock());
        let mut nodes: Vec<Option<ArenaNode>> = nodes.into_iter().map(Some).collect();

        match root {
            Some(root) => build_owned(&mut nodes, root)
                .map_or_else(ReferenceTree::empty, ReferenceTree::new),
            None => ReferenceTree::empty(),
        }
    }
}

fn build_owned(nodes: &mut [Option<ArenaNode>], id: NodeId) -> Option<ReferenceTreeNode> {
    let ArenaNode { mut node, children } = nodes.get_mut(id.0)?.take()?;
    node.children = children
        .into_iter()
        .filter_map(|child| build_owned(nodes, child))
        .collect();
    Some(node)
}
