//! Arena storage for syntax tree nodes.

use crate::node::Node;
use serde::{Deserialize, Serialize};

/// Index of a node within a [`NodeArena`].
///
/// Optional child slots use [`NodeIndex::NONE`]; all accessors treat it as
/// absent rather than panicking.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeIndex(pub u32);

impl NodeIndex {
    pub const NONE: Self = Self(u32::MAX);

    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    pub const fn is_some(self) -> bool {
        !self.is_none()
    }
}

/// Append-only node storage. Nodes reference each other by [`NodeIndex`];
/// the arena owns every node of one source file's tree.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeArena {
    nodes: Vec<Node>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, node: Node) -> NodeIndex {
        let index = NodeIndex(u32::try_from(self.nodes.len()).expect("node arena overflow"));
        self.nodes.push(node);
        index
    }

    pub fn get(&self, index: NodeIndex) -> Option<&Node> {
        if index.is_none() {
            return None;
        }
        self.nodes.get(index.0 as usize)
    }

    pub(crate) fn get_mut(&mut self, index: NodeIndex) -> Option<&mut Node> {
        if index.is_none() {
            return None;
        }
        self.nodes.get_mut(index.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeIndex, &Node)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (NodeIndex(i as u32), node))
    }
}

/// One parsed source file: its path and the node arena, rooted at `root`.
/// This is the JSON wire form supplied by the external parser.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceTree {
    pub file: String,
    pub root: NodeIndex,
    pub arena: NodeArena,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{NodeKind, NodeValue};

    #[test]
    fn none_index_reads_as_absent() {
        let arena = NodeArena::new();
        assert!(arena.get(NodeIndex::NONE).is_none());
        assert!(NodeIndex::NONE.is_none());
        assert!(NodeIndex(0).is_some());
    }

    #[test]
    fn source_tree_round_trips_through_json() {
        let mut arena = NodeArena::new();
        let root = arena.alloc(Node {
            kind: NodeKind::LiteralInt,
            flags: 0,
            lineno: 1,
            end_lineno: None,
            doc_comment: None,
            children: Vec::new(),
            value: Some(NodeValue::Int(42)),
        });
        let tree = SourceTree {
            file: "a.php".to_string(),
            root,
            arena,
        };
        let json = serde_json::to_string(&tree).expect("serialize");
        let back: SourceTree = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, tree);
    }
}
