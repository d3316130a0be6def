//! Typed accessor views over positional child layouts.
//!
//! Dispatch code reads nodes through these views instead of raw child
//! offsets, so a layout change is a single-file edit.

use crate::arena::{NodeArena, NodeIndex};
use crate::node::NodeKind;

/// View of a `Class` node.
pub struct ClassView<'a> {
    pub name: &'a str,
    pub flags: u32,
    pub extends: NodeIndex,
    /// `Name` nodes of the implemented interfaces.
    pub implements: Vec<NodeIndex>,
    /// `Name` nodes of the used traits.
    pub trait_uses: Vec<NodeIndex>,
    pub body: NodeIndex,
}

/// View of a `Function`, `Method` or `Closure` node.
pub struct FunctionLikeView<'a> {
    /// Absent for closures.
    pub name: Option<&'a str>,
    pub flags: u32,
    /// `Param` nodes, in declaration order.
    pub params: Vec<NodeIndex>,
    pub return_type: NodeIndex,
    pub body: NodeIndex,
}

/// View of a `Param` node.
pub struct ParamView<'a> {
    pub name: &'a str,
    pub type_node: NodeIndex,
    pub default: NodeIndex,
}

/// View of a `PropertyGroup` node.
pub struct PropertyGroupView {
    pub flags: u32,
    pub type_node: NodeIndex,
    /// `PropertyElem` nodes.
    pub elems: Vec<NodeIndex>,
}

impl NodeArena {
    /// Children of a `NameList` node, or empty when the slot is absent.
    fn name_list(&self, index: NodeIndex) -> Vec<NodeIndex> {
        match self.get(index) {
            Some(node) if node.kind == NodeKind::NameList => node.children.clone(),
            _ => Vec::new(),
        }
    }

    pub fn class_view(&self, index: NodeIndex) -> Option<ClassView<'_>> {
        let node = self.get(index)?;
        if node.kind != NodeKind::Class {
            return None;
        }
        Some(ClassView {
            name: node.string_value()?,
            flags: node.flags,
            extends: node.child(0),
            implements: self.name_list(node.child(1)),
            trait_uses: self.name_list(node.child(2)),
            body: node.child(3),
        })
    }

    pub fn function_like_view(&self, index: NodeIndex) -> Option<FunctionLikeView<'_>> {
        let node = self.get(index)?;
        if !matches!(
            node.kind,
            NodeKind::Function | NodeKind::Method | NodeKind::Closure
        ) {
            return None;
        }
        let params = match self.get(node.child(0)) {
            Some(list) if list.kind == NodeKind::ParamList => list.children.clone(),
            _ => Vec::new(),
        };
        Some(FunctionLikeView {
            name: node.string_value(),
            flags: node.flags,
            params,
            return_type: node.child(1),
            body: node.child(2),
        })
    }

    pub fn param_view(&self, index: NodeIndex) -> Option<ParamView<'_>> {
        let node = self.get(index)?;
        if node.kind != NodeKind::Param {
            return None;
        }
        Some(ParamView {
            name: node.string_value()?,
            type_node: node.child(0),
            default: node.child(1),
        })
    }

    pub fn property_group_view(&self, index: NodeIndex) -> Option<PropertyGroupView> {
        let node = self.get(index)?;
        if node.kind != NodeKind::PropertyGroup {
            return None;
        }
        Some(PropertyGroupView {
            flags: node.flags,
            type_node: node.child(0),
            elems: node.children_from(1).to_vec(),
        })
    }
}
