//! Decision tree nodes
//!
//! A tree is a strictly owned structure: every node lives inside exactly one
//! parent [`Edge`] or is the root held by the model.
//!
//! On the wire a tree is a flat node list (`{"nodes": [...]}`, node 0 is the
//! root) whose edges point at child indices, so persisted JSON stays shallow
//! however deep the tree grows. Children are always stored after their
//! parent.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::bins::Bin;

/// A decision tree node (internal or leaf)
#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    /// Terminal node carrying the predicted label
    Leaf { label: String },

    /// Split on `feature`, one edge per bin of that feature in bin order
    Internal { feature: String, edges: Vec<Edge> },
}

/// Parent-to-child link labelled by a bin
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub bin: Bin,
    pub child: TreeNode,
}

/// Serialized form of a tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FlatTree {
    nodes: Vec<FlatNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum FlatNode {
    Leaf { label: String },
    Internal { feature: String, edges: Vec<FlatEdge> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct FlatEdge {
    bin: Bin,
    /// Index of the child in `FlatTree::nodes`
    child: usize,
}

impl From<&TreeNode> for FlatTree {
    fn from(root: &TreeNode) -> Self {
        let mut nodes: Vec<Option<FlatNode>> = vec![None];
        let mut stack = vec![(root, 0usize)];

        while let Some((node, slot)) = stack.pop() {
            let flat = match node {
                TreeNode::Leaf { label } => FlatNode::Leaf {
                    label: label.clone(),
                },
                TreeNode::Internal { feature, edges } => {
                    let mut flat_edges = Vec::with_capacity(edges.len());
                    for edge in edges {
                        let child = nodes.len();
                        nodes.push(None);
                        stack.push((&edge.child, child));
                        flat_edges.push(FlatEdge {
                            bin: edge.bin.clone(),
                            child,
                        });
                    }
                    FlatNode::Internal {
                        feature: feature.clone(),
                        edges: flat_edges,
                    }
                }
            };
            nodes[slot] = Some(flat);
        }

        // Every slot is filled once its node is popped.
        FlatTree {
            nodes: nodes.into_iter().flatten().collect(),
        }
    }
}

impl TryFrom<FlatTree> for TreeNode {
    type Error = String;

    fn try_from(tree: FlatTree) -> Result<Self, Self::Error> {
        let count = tree.nodes.len();
        if count == 0 {
            return Err("tree has no nodes".to_string());
        }

        let mut claimed = vec![false; count];
        for (index, node) in tree.nodes.iter().enumerate() {
            if let FlatNode::Internal { edges, .. } = node {
                for edge in edges {
                    if edge.child <= index || edge.child >= count {
                        return Err(format!(
                            "node {index} points at invalid child {}",
                            edge.child
                        ));
                    }
                    if std::mem::replace(&mut claimed[edge.child], true) {
                        return Err(format!("node {} has more than one parent", edge.child));
                    }
                }
            }
        }
        if let Some(orphan) = claimed.iter().skip(1).position(|c| !c) {
            return Err(format!("node {} is unreachable", orphan + 1));
        }

        // Children sit after their parent, so a reverse pass sees them first.
        let mut built: Vec<Option<TreeNode>> = Vec::new();
        built.resize_with(count, || None);
        for (index, node) in tree.nodes.into_iter().enumerate().rev() {
            let node = match node {
                FlatNode::Leaf { label } => TreeNode::Leaf { label },
                FlatNode::Internal { feature, edges } => {
                    let mut owned = Vec::with_capacity(edges.len());
                    for FlatEdge { bin, child } in edges {
                        let child = built[child]
                            .take()
                            .ok_or_else(|| format!("node {index} lost child {child}"))?;
                        owned.push(Edge { bin, child });
                    }
                    TreeNode::Internal {
                        feature,
                        edges: owned,
                    }
                }
            };
            built[index] = Some(node);
        }

        built
            .into_iter()
            .next()
            .flatten()
            .ok_or_else(|| "tree has no root".to_string())
    }
}

impl Serialize for TreeNode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        FlatTree::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TreeNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let flat = FlatTree::deserialize(deserializer)?;
        TreeNode::try_from(flat).map_err(de::Error::custom)
    }
}

impl TreeNode {
    pub fn leaf(label: impl Into<String>) -> Self {
        TreeNode::Leaf {
            label: label.into(),
        }
    }

    pub fn internal(feature: impl Into<String>, edges: Vec<Edge>) -> Self {
        TreeNode::Internal {
            feature: feature.into(),
            edges,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, TreeNode::Leaf { .. })
    }

    /// Leaf label, `None` for internal nodes
    pub fn label(&self) -> Option<&str> {
        match self {
            TreeNode::Leaf { label } => Some(label.as_str()),
            TreeNode::Internal { .. } => None,
        }
    }

    /// Edges of an internal node, empty for leaves
    pub fn edges(&self) -> &[Edge] {
        match self {
            TreeNode::Leaf { .. } => &[],
            TreeNode::Internal { edges, .. } => edges,
        }
    }

    /// Number of edges on the longest root-to-leaf path
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(node.edges().iter().map(|e| (&e.child, depth + 1)));
        }
        deepest
    }

    /// Total node count, leaves included
    pub fn node_count(&self) -> usize {
        self.nodes().count()
    }

    pub fn leaf_count(&self) -> usize {
        self.nodes().filter(|n| n.is_leaf()).count()
    }

    /// Pre-order iterator over this node and all descendants
    pub fn nodes(&self) -> Nodes<'_> {
        Nodes { stack: vec![self] }
    }
}

/// Pre-order node iterator, see [`TreeNode::nodes`]
pub struct Nodes<'a> {
    stack: Vec<&'a TreeNode>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = &'a TreeNode;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack
            .extend(node.edges().iter().rev().map(|edge| &edge.child));
        Some(node)
    }
}
