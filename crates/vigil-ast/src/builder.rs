//! Programmatic tree construction.
//!
//! Tests and tooling assemble arenas through this builder instead of
//! hand-writing JSON. Every method allocates one node at the builder's
//! current `line` and returns its index; `at()` advances the line cursor.

use crate::arena::{NodeArena, NodeIndex, SourceTree};
use crate::node::{Node, NodeKind, NodeValue};

pub struct AstBuilder {
    arena: NodeArena,
    line: u32,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self {
            arena: NodeArena::new(),
            line: 1,
        }
    }

    /// Set the line number stamped on subsequently allocated nodes.
    pub fn at(&mut self, line: u32) -> &mut Self {
        self.line = line;
        self
    }

    fn node(
        &mut self,
        kind: NodeKind,
        flags: u32,
        children: Vec<NodeIndex>,
        value: Option<NodeValue>,
    ) -> NodeIndex {
        self.arena.alloc(Node {
            kind,
            flags,
            lineno: self.line,
            end_lineno: None,
            doc_comment: None,
            children,
            value,
        })
    }

    /// Attach a doc comment to an already-built node.
    pub fn doc(&mut self, index: NodeIndex, text: &str) -> NodeIndex {
        if let Some(node) = self.arena.get_mut(index) {
            node.doc_comment = Some(text.to_string());
        }
        index
    }

    // Statements

    pub fn stmt_list(&mut self, stmts: &[NodeIndex]) -> NodeIndex {
        self.node(NodeKind::StatementList, 0, stmts.to_vec(), None)
    }

    pub fn namespace(&mut self, name: &str, body: NodeIndex) -> NodeIndex {
        self.node(
            NodeKind::Namespace,
            0,
            vec![body],
            Some(NodeValue::Str(name.to_string())),
        )
    }

    pub fn use_import(&mut self, kind: u32, target: &str, alias: Option<&str>) -> NodeIndex {
        let target = self.name(target);
        let alias = match alias {
            Some(alias) => self.name(alias),
            None => NodeIndex::NONE,
        };
        let elem = self.node(NodeKind::UseElem, 0, vec![target, alias], None);
        self.node(NodeKind::Use, kind, vec![elem], None)
    }

    pub fn class(
        &mut self,
        name: &str,
        flags: u32,
        extends: Option<&str>,
        implements: &[&str],
        trait_uses: &[&str],
        body: NodeIndex,
    ) -> NodeIndex {
        let extends = match extends {
            Some(parent) => self.name(parent),
            None => NodeIndex::NONE,
        };
        let implements = self.name_list(implements);
        let trait_uses = self.name_list(trait_uses);
        self.node(
            NodeKind::Class,
            flags,
            vec![extends, implements, trait_uses, body],
            Some(NodeValue::Str(name.to_string())),
        )
    }

    fn name_list(&mut self, names: &[&str]) -> NodeIndex {
        if names.is_empty() {
            return NodeIndex::NONE;
        }
        let children: Vec<NodeIndex> = names.iter().map(|n| self.name(n)).collect();
        self.node(NodeKind::NameList, 0, children, None)
    }

    pub fn function(
        &mut self,
        name: &str,
        params: &[NodeIndex],
        return_type: NodeIndex,
        body: NodeIndex,
    ) -> NodeIndex {
        let params = self.node(NodeKind::ParamList, 0, params.to_vec(), None);
        self.node(
            NodeKind::Function,
            0,
            vec![params, return_type, body],
            Some(NodeValue::Str(name.to_string())),
        )
    }

    pub fn method(
        &mut self,
        name: &str,
        flags: u32,
        params: &[NodeIndex],
        return_type: NodeIndex,
        body: NodeIndex,
    ) -> NodeIndex {
        let params = self.node(NodeKind::ParamList, 0, params.to_vec(), None);
        self.node(
            NodeKind::Method,
            flags,
            vec![params, return_type, body],
            Some(NodeValue::Str(name.to_string())),
        )
    }

    pub fn closure(
        &mut self,
        params: &[NodeIndex],
        return_type: NodeIndex,
        body: NodeIndex,
    ) -> NodeIndex {
        let params = self.node(NodeKind::ParamList, 0, params.to_vec(), None);
        self.node(NodeKind::Closure, 0, vec![params, return_type, body], None)
    }

    pub fn param(&mut self, name: &str, type_node: NodeIndex, default: NodeIndex) -> NodeIndex {
        self.node(
            NodeKind::Param,
            0,
            vec![type_node, default],
            Some(NodeValue::Str(name.to_string())),
        )
    }

    pub fn property_group(
        &mut self,
        flags: u32,
        type_node: NodeIndex,
        elems: &[NodeIndex],
    ) -> NodeIndex {
        let mut children = vec![type_node];
        children.extend_from_slice(elems);
        self.node(NodeKind::PropertyGroup, flags, children, None)
    }

    pub fn property_elem(&mut self, name: &str, default: NodeIndex) -> NodeIndex {
        self.node(
            NodeKind::PropertyElem,
            0,
            vec![default],
            Some(NodeValue::Str(name.to_string())),
        )
    }

    pub fn class_const_group(&mut self, flags: u32, elems: &[NodeIndex]) -> NodeIndex {
        self.node(NodeKind::ClassConstGroup, flags, elems.to_vec(), None)
    }

    pub fn class_const_elem(&mut self, name: &str, value: NodeIndex) -> NodeIndex {
        self.node(
            NodeKind::ClassConstElem,
            0,
            vec![value],
            Some(NodeValue::Str(name.to_string())),
        )
    }

    pub fn const_group(&mut self, elems: &[NodeIndex]) -> NodeIndex {
        self.node(NodeKind::ConstGroup, 0, elems.to_vec(), None)
    }

    pub fn const_elem(&mut self, name: &str, value: NodeIndex) -> NodeIndex {
        self.node(
            NodeKind::ConstElem,
            0,
            vec![value],
            Some(NodeValue::Str(name.to_string())),
        )
    }

    pub fn if_stmt(&mut self, branches: &[NodeIndex]) -> NodeIndex {
        self.node(NodeKind::If, 0, branches.to_vec(), None)
    }

    pub fn if_branch(&mut self, condition: NodeIndex, body: NodeIndex) -> NodeIndex {
        self.node(NodeKind::IfBranch, 0, vec![condition, body], None)
    }

    pub fn while_stmt(&mut self, condition: NodeIndex, body: NodeIndex) -> NodeIndex {
        self.node(NodeKind::While, 0, vec![condition, body], None)
    }

    pub fn ret(&mut self, expr: NodeIndex) -> NodeIndex {
        self.node(NodeKind::Return, 0, vec![expr], None)
    }

    pub fn echo(&mut self, exprs: &[NodeIndex]) -> NodeIndex {
        self.node(NodeKind::Echo, 0, exprs.to_vec(), None)
    }

    pub fn expr_stmt(&mut self, expr: NodeIndex) -> NodeIndex {
        self.node(NodeKind::ExprStatement, 0, vec![expr], None)
    }

    // Expressions

    pub fn assign(&mut self, target: NodeIndex, value: NodeIndex) -> NodeIndex {
        self.node(NodeKind::Assign, 0, vec![target, value], None)
    }

    pub fn variable(&mut self, name: &str) -> NodeIndex {
        self.node(
            NodeKind::Variable,
            0,
            Vec::new(),
            Some(NodeValue::Str(name.to_string())),
        )
    }

    pub fn name(&mut self, path: &str) -> NodeIndex {
        self.node(
            NodeKind::Name,
            0,
            Vec::new(),
            Some(NodeValue::Str(path.to_string())),
        )
    }

    fn arg_list(&mut self, args: &[NodeIndex]) -> NodeIndex {
        self.node(NodeKind::ArgList, 0, args.to_vec(), None)
    }

    pub fn call(&mut self, target: NodeIndex, args: &[NodeIndex]) -> NodeIndex {
        let args = self.arg_list(args);
        self.node(NodeKind::Call, 0, vec![target, args], None)
    }

    pub fn method_call(
        &mut self,
        object: NodeIndex,
        method: &str,
        args: &[NodeIndex],
    ) -> NodeIndex {
        let args = self.arg_list(args);
        self.node(
            NodeKind::MethodCall,
            0,
            vec![object, args],
            Some(NodeValue::Str(method.to_string())),
        )
    }

    pub fn static_call(&mut self, class: &str, method: &str, args: &[NodeIndex]) -> NodeIndex {
        let class = self.name(class);
        let args = self.arg_list(args);
        self.node(
            NodeKind::StaticCall,
            0,
            vec![class, args],
            Some(NodeValue::Str(method.to_string())),
        )
    }

    pub fn property_access(&mut self, object: NodeIndex, property: &str) -> NodeIndex {
        self.node(
            NodeKind::PropertyAccess,
            0,
            vec![object],
            Some(NodeValue::Str(property.to_string())),
        )
    }

    pub fn static_property_access(&mut self, class: &str, property: &str) -> NodeIndex {
        let class = self.name(class);
        self.node(
            NodeKind::StaticPropertyAccess,
            0,
            vec![class],
            Some(NodeValue::Str(property.to_string())),
        )
    }

    pub fn class_const(&mut self, class: &str, name: &str) -> NodeIndex {
        let class = self.name(class);
        self.node(
            NodeKind::ClassConst,
            0,
            vec![class],
            Some(NodeValue::Str(name.to_string())),
        )
    }

    pub fn new_object(&mut self, class: &str, args: &[NodeIndex]) -> NodeIndex {
        let class = self.name(class);
        let args = self.arg_list(args);
        self.node(NodeKind::New, 0, vec![class, args], None)
    }

    pub fn binary(&mut self, op: u32, left: NodeIndex, right: NodeIndex) -> NodeIndex {
        self.node(NodeKind::BinaryOp, op, vec![left, right], None)
    }

    pub fn unary(&mut self, op: u32, expr: NodeIndex) -> NodeIndex {
        self.node(NodeKind::UnaryOp, op, vec![expr], None)
    }

    pub fn cast(&mut self, target: u32, expr: NodeIndex) -> NodeIndex {
        self.node(NodeKind::Cast, target, vec![expr], None)
    }

    pub fn array(&mut self, elems: &[NodeIndex]) -> NodeIndex {
        self.node(NodeKind::ArrayLiteral, 0, elems.to_vec(), None)
    }

    pub fn array_elem(&mut self, value: NodeIndex, key: NodeIndex) -> NodeIndex {
        self.node(NodeKind::ArrayElem, 0, vec![value, key], None)
    }

    pub fn type_name(&mut self, name: &str) -> NodeIndex {
        self.node(
            NodeKind::TypeName,
            0,
            Vec::new(),
            Some(NodeValue::Str(name.to_string())),
        )
    }

    pub fn nullable_type(&mut self, inner: NodeIndex) -> NodeIndex {
        self.node(NodeKind::NullableType, 0, vec![inner], None)
    }

    pub fn union_type(&mut self, members: &[NodeIndex]) -> NodeIndex {
        self.node(NodeKind::UnionTypeNode, 0, members.to_vec(), None)
    }

    pub fn int(&mut self, value: i64) -> NodeIndex {
        self.node(NodeKind::LiteralInt, 0, Vec::new(), Some(NodeValue::Int(value)))
    }

    pub fn float(&mut self, value: f64) -> NodeIndex {
        self.node(
            NodeKind::LiteralFloat,
            0,
            Vec::new(),
            Some(NodeValue::Float(value)),
        )
    }

    pub fn string(&mut self, value: &str) -> NodeIndex {
        self.node(
            NodeKind::LiteralString,
            0,
            Vec::new(),
            Some(NodeValue::Str(value.to_string())),
        )
    }

    pub fn bool(&mut self, value: bool) -> NodeIndex {
        self.node(
            NodeKind::LiteralBool,
            0,
            Vec::new(),
            Some(NodeValue::Bool(value)),
        )
    }

    pub fn null(&mut self) -> NodeIndex {
        self.node(NodeKind::LiteralNull, 0, Vec::new(), None)
    }

    pub fn isset(&mut self, exprs: &[NodeIndex]) -> NodeIndex {
        self.node(NodeKind::Isset, 0, exprs.to_vec(), None)
    }

    pub fn empty_expr(&mut self, expr: NodeIndex) -> NodeIndex {
        self.node(NodeKind::Empty, 0, vec![expr], None)
    }

    pub fn ternary(&mut self, cond: NodeIndex, then: NodeIndex, otherwise: NodeIndex) -> NodeIndex {
        self.node(NodeKind::Ternary, 0, vec![cond, then, otherwise], None)
    }

    pub fn instance_of(&mut self, expr: NodeIndex, class: &str) -> NodeIndex {
        let class = self.name(class);
        self.node(NodeKind::InstanceOf, 0, vec![expr, class], None)
    }

    /// Finish building, rooting the tree at `root`.
    pub fn build(self, file: &str, root: NodeIndex) -> SourceTree {
        SourceTree {
            file: file.to_string(),
            root,
            arena: self.arena,
        }
    }
}

impl Default for AstBuilder {
    fn default() -> Self {
        Self::new()
    }
}
