//! Expression type computation.
//!
//! Postorder visitor computing a `UnionType` for every expression node,
//! with flag-keyed sub-dispatch for binary, unary and cast operators.
//! Diagnostic policy: semantic problems (undeclared names, invalid
//! operands) report through the sink and infer the bottom type; an empty
//! base union infers nothing and stays silent, since unknown is not the
//! same as wrong.

use crate::hints::resolve_class_name;
use crate::inference::InferencePass;
use crate::scope::Scope;
use tracing::trace;
use vigil_ast::flags::{binary_flags, cast_flags, unary_flags};
use vigil_ast::{Node, NodeArena, NodeIndex, NodeKind};
use vigil_binder::{Context, ElementKind, FqsenId};
use vigil_common::diagnostics::issue;
use vigil_common::limits::MAX_EXPR_DEPTH;
use vigil_solver::{ArrayKey, Type, UnionType};

/// Non-empty and every member is exactly `ty`.
fn is_only(union: &UnionType, ty: &Type) -> bool {
    !union.is_empty() && union.types().iter().all(|t| t == ty)
}

/// Non-empty and every member is int or float.
fn is_numeric_only(union: &UnionType) -> bool {
    !union.is_empty()
        && union
            .types()
            .iter()
            .all(|t| *t == Type::INT || *t == Type::FLOAT)
}

impl InferencePass<'_> {
    /// Compute the union type of one expression node.
    pub(crate) fn infer_expr(
        &mut self,
        arena: &NodeArena,
        index: NodeIndex,
        context: &Context,
        scope: &mut Scope,
        depth: u32,
    ) -> UnionType {
        if depth > MAX_EXPR_DEPTH {
            trace!(depth, "expression nesting limit reached, inferring nothing");
            return UnionType::empty();
        }
        let Some(node) = arena.get(index) else {
            return UnionType::empty();
        };
        let union = match node.kind {
            NodeKind::Variable => self.infer_variable(node, context, scope),
            NodeKind::Name => self.infer_constant_name(node, context),

            NodeKind::LiteralInt => UnionType::of(Type::INT),
            NodeKind::LiteralFloat => UnionType::of(Type::FLOAT),
            NodeKind::LiteralString => UnionType::of(Type::STRING),
            NodeKind::LiteralBool => UnionType::of(Type::BOOL),
            NodeKind::LiteralNull => UnionType::of(Type::NULL),

            NodeKind::Assign => {
                let value = self.infer_expr(arena, node.child(1), context, scope, depth + 1);
                if let Some(target) = arena.get(node.child(0))
                    && target.kind == NodeKind::Variable
                    && let Some(name) = target.string_value()
                    && name != "this"
                {
                    scope.set(name, value.clone());
                }
                value
            }

            NodeKind::BinaryOp => {
                let left = self.infer_expr(arena, node.child(0), context, scope, depth + 1);
                let right = self.infer_expr(arena, node.child(1), context, scope, depth + 1);
                self.infer_binary(node, &left, &right)
            }

            NodeKind::UnaryOp => {
                let operand = self.infer_expr(arena, node.child(0), context, scope, depth + 1);
                infer_unary(node, &operand)
            }

            NodeKind::Cast => {
                self.infer_expr(arena, node.child(0), context, scope, depth + 1);
                cast_union(node.flags)
            }

            NodeKind::ArrayLiteral => {
                self.infer_array_literal(arena, node, context, scope, depth)
            }

            NodeKind::ArrayElem => {
                let key = node.child(1);
                if key.is_some() {
                    self.infer_expr(arena, key, context, scope, depth + 1);
                }
                self.infer_expr(arena, node.child(0), context, scope, depth + 1)
            }

            NodeKind::Call => self.infer_call(arena, node, context, scope, depth),
            NodeKind::MethodCall => {
                let base = self.infer_expr(arena, node.child(0), context, scope, depth + 1);
                self.infer_args(arena, node.child(1), context, scope, depth);
                match node.string_value() {
                    Some(name) => self.infer_instance_member(node, &base, name, true),
                    None => UnionType::empty(),
                }
            }
            NodeKind::PropertyAccess => {
                let base = self.infer_expr(arena, node.child(0), context, scope, depth + 1);
                match node.string_value() {
                    Some(name) => self.infer_instance_member(node, &base, name, false),
                    None => UnionType::empty(),
                }
            }
            NodeKind::StaticCall => self.infer_static_call(arena, node, context, scope, depth),
            NodeKind::StaticPropertyAccess => {
                self.infer_static_property(arena, node, context)
            }
            NodeKind::ClassConst => self.infer_class_constant(arena, node, context),
            NodeKind::New => self.infer_new(arena, node, context, scope, depth),

            NodeKind::Closure => {
                self.analyze_closure_body(arena, index, context);
                UnionType::of(Type::CALLABLE)
            }

            NodeKind::Isset => {
                for &child in &node.children {
                    if child.is_some() {
                        self.infer_expr(arena, child, context, scope, depth + 1);
                    }
                }
                UnionType::of(Type::BOOL)
            }
            NodeKind::Empty => {
                self.infer_expr(arena, node.child(0), context, scope, depth + 1);
                UnionType::of(Type::BOOL)
            }
            NodeKind::InstanceOf => {
                self.infer_expr(arena, node.child(0), context, scope, depth + 1);
                self.check_instanceof_class(arena, node, context);
                UnionType::of(Type::BOOL)
            }

            NodeKind::Ternary => {
                let condition = self.infer_expr(arena, node.child(0), context, scope, depth + 1);
                let then_index = node.child(1);
                let then_union = if then_index.is_some() {
                    self.infer_expr(arena, then_index, context, scope, depth + 1)
                } else {
                    // Short form `?:`: a surviving left value is never null.
                    condition.without_null()
                };
                let otherwise = self.infer_expr(arena, node.child(2), context, scope, depth + 1);
                then_union.union(&otherwise)
            }

            // Statement and layout kinds never reach expression position
            // unless the caller broke the walk ordering contract.
            NodeKind::StatementList
            | NodeKind::Namespace
            | NodeKind::Use
            | NodeKind::UseElem
            | NodeKind::NameList
            | NodeKind::ArgList
            | NodeKind::Class
            | NodeKind::PropertyGroup
            | NodeKind::PropertyElem
            | NodeKind::ClassConstGroup
            | NodeKind::ClassConstElem
            | NodeKind::ConstGroup
            | NodeKind::ConstElem
            | NodeKind::Function
            | NodeKind::Method
            | NodeKind::ParamList
            | NodeKind::Param
            | NodeKind::If
            | NodeKind::IfBranch
            | NodeKind::While
            | NodeKind::Return
            | NodeKind::Echo
            | NodeKind::ExprStatement
            | NodeKind::TypeName
            | NodeKind::NullableType
            | NodeKind::UnionTypeNode => {
                unreachable!("{:?} node in expression position", node.kind)
            }
        };

        for plugin in self.plugins {
            plugin.expression_inferred(self.codebase, context, node, &union, &mut *self.sink);
        }
        union
    }

    fn infer_variable(&mut self, node: &Node, context: &Context, scope: &Scope) -> UnionType {
        let Some(name) = node.string_value() else {
            return UnionType::empty();
        };
        if name == "this" {
            return match context.class_fqsen() {
                Some(class) => UnionType::of(Type::class(class)),
                None => UnionType::empty(),
            };
        }
        scope.get(name).cloned().unwrap_or_default()
    }

    /// A bare name in expression position is a global-constant fetch.
    fn infer_constant_name(&mut self, node: &Node, context: &Context) -> UnionType {
        let Some(name) = node.string_value() else {
            return UnionType::empty();
        };
        let codebase = self.codebase;
        let fqsen = codebase
            .fqsens
            .resolve_name(ElementKind::GlobalConstant, name, context, |id| {
                codebase.has_constant(id)
            });
        match codebase.constant(fqsen) {
            Some(record) => record.union_type.clone(),
            None => {
                let display = codebase.fqsens.display(fqsen);
                self.report(&issue::UNDECLARED_CONSTANT, node.lineno, vec![display]);
                UnionType::empty()
            }
        }
    }

    // Operator dispatch

    fn infer_binary(&mut self, node: &Node, left: &UnionType, right: &UnionType) -> UnionType {
        use binary_flags::*;
        match node.flags {
            ADD => self.infer_addition(node, left, right),
            SUB | MUL | DIV | MOD | POW => self.infer_arithmetic(node, left, right),
            CONCAT => UnionType::of(Type::STRING),
            IS_EQUAL | IS_NOT_EQUAL | IS_IDENTICAL | IS_NOT_IDENTICAL | IS_SMALLER
            | IS_SMALLER_OR_EQUAL | IS_GREATER | IS_GREATER_OR_EQUAL => {
                self.check_array_comparison(node, left, right);
                UnionType::of(Type::BOOL)
            }
            SPACESHIP => UnionType::of(Type::INT),
            BOOL_AND | BOOL_OR => UnionType::of(Type::BOOL),
            COALESCE => left.without_null().union(right),
            BIT_AND | BIT_OR | BIT_XOR | SHIFT_LEFT | SHIFT_RIGHT => UnionType::of(Type::INT),
            other => unreachable!("unknown binary operator flag {other}"),
        }
    }

    /// `+` is the one operator where arrays are legal - against other
    /// arrays, as union. Arrays on exactly one side are a type error.
    fn infer_addition(&mut self, node: &Node, left: &UnionType, right: &UnionType) -> UnionType {
        let left_array = left.is_exclusively_array_like();
        let right_array = right.is_exclusively_array_like();
        if left_array && right_array {
            return UnionType::of(Type::ARRAY);
        }
        if (left_array && right.is_definitely_non_array())
            || (right_array && left.is_definitely_non_array())
        {
            self.report_array_operand(node, left, right);
            return UnionType::empty();
        }
        if is_only(left, &Type::INT) && is_only(right, &Type::INT) {
            return UnionType::of(Type::INT);
        }
        if is_numeric_only(left) && is_numeric_only(right) {
            return UnionType::of(Type::FLOAT);
        }
        UnionType::from_types([Type::INT, Type::FLOAT])
    }

    /// Arithmetic operators where arrays are never legal operands.
    fn infer_arithmetic(&mut self, node: &Node, left: &UnionType, right: &UnionType) -> UnionType {
        if left.is_exclusively_array_like() || right.is_exclusively_array_like() {
            self.report_array_operand(node, left, right);
            return UnionType::empty();
        }
        match node.flags {
            // `%` truncates to int regardless of operand types.
            binary_flags::MOD => UnionType::of(Type::INT),
            // `/` may produce a float even from two ints.
            binary_flags::DIV => {
                if is_numeric_only(left)
                    && is_numeric_only(right)
                    && !(is_only(left, &Type::INT) && is_only(right, &Type::INT))
                {
                    UnionType::of(Type::FLOAT)
                } else {
                    UnionType::from_types([Type::INT, Type::FLOAT])
                }
            }
            _ => {
                if is_only(left, &Type::INT) && is_only(right, &Type::INT) {
                    UnionType::of(Type::INT)
                } else if is_numeric_only(left) && is_numeric_only(right) {
                    UnionType::of(Type::FLOAT)
                } else {
                    UnionType::from_types([Type::INT, Type::FLOAT])
                }
            }
        }
    }

    fn report_array_operand(&mut self, node: &Node, left: &UnionType, right: &UnionType) {
        let registry = &self.codebase.fqsens;
        let args = vec![
            binary_flags::token(node.flags).to_string(),
            left.display(registry),
            right.display(registry),
        ];
        self.report(&issue::TYPE_ARRAY_OPERATOR, node.lineno, args);
    }

    /// Comparing a definite array against a definite non-array is a
    /// common truthiness bug worth flagging.
    fn check_array_comparison(&mut self, node: &Node, left: &UnionType, right: &UnionType) {
        let registry = &self.codebase.fqsens;
        let (array_side, other_side) = if left.is_exclusively_array_like()
            && right.is_definitely_non_array()
        {
            (left, right)
        } else if right.is_exclusively_array_like() && left.is_definitely_non_array() {
            (right, left)
        } else {
            return;
        };
        let args = vec![
            array_side.display(registry),
            other_side.display(registry),
            binary_flags::token(node.flags).to_string(),
        ];
        self.report(&issue::TYPE_COMPARISON_TO_ARRAY, node.lineno, args);
    }

    // Calls and member accesses

    fn infer_args(
        &mut self,
        arena: &NodeArena,
        index: NodeIndex,
        context: &Context,
        scope: &mut Scope,
        depth: u32,
    ) {
        let Some(args) = arena.get(index) else {
            return;
        };
        for &arg in &args.children {
            if arg.is_some() {
                self.infer_expr(arena, arg, context, scope, depth + 1);
            }
        }
    }

    fn infer_call(
        &mut self,
        arena: &NodeArena,
        node: &Node,
        context: &Context,
        scope: &mut Scope,
        depth: u32,
    ) -> UnionType {
        self.infer_args(arena, node.child(1), context, scope, depth);
        let target_index = node.child(0);
        let Some(target) = arena.get(target_index) else {
            return UnionType::empty();
        };
        if target.kind != NodeKind::Name {
            // Dynamic callee: type the expression, infer nothing for the
            // call itself.
            self.infer_expr(arena, target_index, context, scope, depth + 1);
            return UnionType::empty();
        }
        let Some(name) = target.string_value() else {
            return UnionType::empty();
        };
        let codebase = self.codebase;
        let fqsen = codebase
            .fqsens
            .resolve_name(ElementKind::Function, name, context, |id| {
                codebase.has_function(id)
            });
        match codebase.function(fqsen) {
            Some(record) => record.return_type.clone(),
            None => {
                let display = codebase.fqsens.display(fqsen);
                self.report(&issue::UNDECLARED_FUNCTION, node.lineno, vec![display]);
                UnionType::empty()
            }
        }
    }

    /// Resolve a `->member` access against the base expression's class
    /// types. An empty or classless base stays silent; a known class
    /// without the member reports exactly one diagnostic.
    fn infer_instance_member(
        &mut self,
        node: &Node,
        base: &UnionType,
        name: &str,
        is_method: bool,
    ) -> UnionType {
        let codebase = self.codebase;
        let candidates: Vec<(FqsenId, bool)> = base.class_types().collect();
        if candidates.is_empty() {
            return UnionType::empty();
        }

        let mut result = UnionType::empty();
        let mut first_known: Option<FqsenId> = None;
        let mut found = false;
        for (fqsen, _nullable) in candidates {
            if !codebase.has_class(fqsen) {
                let display = codebase.fqsens.display(fqsen);
                self.report(&issue::UNDECLARED_CLASS, node.lineno, vec![display]);
                continue;
            }
            first_known.get_or_insert(fqsen);
            if is_method {
                if let Some(method) = codebase.method_on(fqsen, name) {
                    found = true;
                    result = result.union(&method.return_type);
                }
            } else if let Some(property) = codebase.property_on(fqsen, name) {
                found = true;
                result = result.union(&property.union_type);
            }
        }

        if !found && let Some(class) = first_known {
            let display = codebase.fqsens.display(class);
            let template = if is_method {
                &issue::UNDECLARED_METHOD
            } else {
                &issue::UNDECLARED_PROPERTY
            };
            self.report(template, node.lineno, vec![display, name.to_string()]);
        }
        result
    }

    /// Resolve the class named by a `Name` child, reporting it when it
    /// cannot be resolved or is not declared.
    fn resolve_declared_class(
        &mut self,
        arena: &NodeArena,
        class_index: NodeIndex,
        lineno: u32,
        context: &Context,
    ) -> Option<FqsenId> {
        let name = arena.get(class_index).and_then(Node::string_value)?;
        let Some(fqsen) = resolve_class_name(self.codebase, name, context) else {
            self.report(&issue::UNDECLARED_CLASS, lineno, vec![name.to_string()]);
            return None;
        };
        if !self.codebase.has_class(fqsen) {
            let display = self.codebase.fqsens.display(fqsen);
            self.report(&issue::UNDECLARED_CLASS, lineno, vec![display]);
            return None;
        }
        Some(fqsen)
    }

    fn infer_static_call(
        &mut self,
        arena: &NodeArena,
        node: &Node,
        context: &Context,
        scope: &mut Scope,
        depth: u32,
    ) -> UnionType {
        self.infer_args(arena, node.child(1), context, scope, depth);
        let Some(name) = node.string_value() else {
            return UnionType::empty();
        };
        let Some(class) = self.resolve_declared_class(arena, node.child(0), node.lineno, context)
        else {
            return UnionType::empty();
        };
        let codebase = self.codebase;
        match codebase.method_on(class, name) {
            Some(method) => method.return_type.clone(),
            None => {
                let display = codebase.fqsens.display(class);
                self.report(&issue::UNDECLARED_METHOD, node.lineno, vec![
                    display,
                    name.to_string(),
                ]);
                UnionType::empty()
            }
        }
    }

    fn infer_static_property(
        &mut self,
        arena: &NodeArena,
        node: &Node,
        context: &Context,
    ) -> UnionType {
        let Some(name) = node.string_value() else {
            return UnionType::empty();
        };
        let Some(class) = self.resolve_declared_class(arena, node.child(0), node.lineno, context)
        else {
            return UnionType::empty();
        };
        let codebase = self.codebase;
        match codebase.property_on(class, name) {
            Some(property) => property.union_type.clone(),
            None => {
                let display = codebase.fqsens.display(class);
                self.report(&issue::UNDECLARED_STATIC_PROPERTY, node.lineno, vec![
                    display,
                    name.to_string(),
                ]);
                UnionType::empty()
            }
        }
    }

    /// `Class::CONST` walks the ancestor chain until the constant is
    /// found or the chain is exhausted.
    fn infer_class_constant(
        &mut self,
        arena: &NodeArena,
        node: &Node,
        context: &Context,
    ) -> UnionType {
        let Some(name) = node.string_value() else {
            return UnionType::empty();
        };
        if name == "class" {
            return UnionType::of(Type::STRING);
        }
        let Some(class) = self.resolve_declared_class(arena, node.child(0), node.lineno, context)
        else {
            return UnionType::empty();
        };
        let codebase = self.codebase;
        match codebase.class_constant_on(class, name) {
            Some(constant) => constant.union_type.clone(),
            None => {
                let display = codebase.fqsens.display(class);
                self.report(&issue::UNDECLARED_CLASS_CONSTANT, node.lineno, vec![
                    display,
                    name.to_string(),
                ]);
                UnionType::empty()
            }
        }
    }

    fn infer_new(
        &mut self,
        arena: &NodeArena,
        node: &Node,
        context: &Context,
        scope: &mut Scope,
        depth: u32,
    ) -> UnionType {
        self.infer_args(arena, node.child(1), context, scope, depth);
        let class_index = node.child(0);
        let is_name = arena
            .get(class_index)
            .is_some_and(|class_node| class_node.kind == NodeKind::Name);
        if !is_name {
            // `new $class()`: type the expression, infer nothing.
            self.infer_expr(arena, class_index, context, scope, depth + 1);
            return UnionType::empty();
        }
        let Some(fqsen) = self.resolve_declared_class(arena, class_index, node.lineno, context)
        else {
            return UnionType::empty();
        };
        let codebase = self.codebase;
        let record = codebase.class(fqsen).expect("existence checked above");
        let display = codebase.fqsens.display(fqsen);
        if record.is_interface() {
            self.report(&issue::TYPE_INSTANTIATE_INTERFACE, node.lineno, vec![display]);
        } else if record.is_abstract() {
            // Instantiating an abstract class is legal only from its own
            // defining scope (late static binding).
            let own_scope = context
                .class_fqsen()
                .map(|class| codebase.fqsens.canonical(class))
                == Some(codebase.fqsens.canonical(fqsen));
            if !own_scope {
                self.report(&issue::TYPE_INSTANTIATE_ABSTRACT, node.lineno, vec![display]);
            }
        }
        UnionType::of(Type::class(fqsen))
    }

    fn check_instanceof_class(&mut self, arena: &NodeArena, node: &Node, context: &Context) {
        // Resolution failures report; a declared class needs no further
        // checking here.
        let _ = self.resolve_declared_class(arena, node.child(1), node.lineno, context);
    }
}

/// Unary operators: numeric sign preservation, logical and bitwise
/// results.
fn infer_unary(node: &Node, operand: &UnionType) -> UnionType {
    use unary_flags::*;
    match node.flags {
        MINUS | PLUS => {
            if is_only(operand, &Type::INT) {
                UnionType::of(Type::INT)
            } else if is_only(operand, &Type::FLOAT) {
                UnionType::of(Type::FLOAT)
            } else {
                UnionType::from_types([Type::INT, Type::FLOAT])
            }
        }
        NOT => UnionType::of(Type::BOOL),
        BITWISE_NOT => UnionType::of(Type::INT),
        SILENCE => operand.clone(),
        other => unreachable!("unknown unary operator flag {other}"),
    }
}

/// Each cast keyword maps to exactly one native type.
fn cast_union(flags: u32) -> UnionType {
    use cast_flags::*;
    match flags {
        INT => UnionType::of(Type::INT),
        FLOAT => UnionType::of(Type::FLOAT),
        STRING => UnionType::of(Type::STRING),
        BOOL => UnionType::of(Type::BOOL),
        ARRAY => UnionType::of(Type::ARRAY),
        OBJECT => UnionType::of(Type::OBJECT),
        UNSET => UnionType::of(Type::NULL),
        other => unreachable!("unknown cast flag {other}"),
    }
}

impl InferencePass<'_> {
    /// Array literals sample a bounded number of leading elements: when
    /// every sampled element resolves to the same single type the literal
    /// is a generic array of that type, otherwise the plain `array` type.
    /// Elements past the sample window are still visited for their own
    /// diagnostics; they just do not influence the element type.
    fn infer_array_literal(
        &mut self,
        arena: &NodeArena,
        node: &Node,
        context: &Context,
        scope: &mut Scope,
        depth: u32,
    ) -> UnionType {
        let sample_size = self.options.array_literal_sample_size;
        let mut sampled: Vec<UnionType> = Vec::new();
        let mut any_keys = false;
        let mut keys_int = true;
        let mut keys_str = true;

        for (position, &elem_index) in node.children.iter().enumerate() {
            let Some(elem) = arena.get(elem_index) else {
                continue;
            };
            let key_index = elem.child(1);
            if key_index.is_some() {
                any_keys = true;
                let key_union = self.infer_expr(arena, key_index, context, scope, depth + 1);
                if !is_only(&key_union, &Type::INT) {
                    keys_int = false;
                }
                if !is_only(&key_union, &Type::STRING) {
                    keys_str = false;
                }
            } else {
                // Positional elements get int keys.
                keys_str = false;
            }
            let value_union = self.infer_expr(arena, elem.child(0), context, scope, depth + 1);
            if position < sample_size {
                sampled.push(value_union);
            }
        }

        let Some(first) = sampled.first() else {
            return UnionType::of(Type::ARRAY);
        };
        let homogeneous = first.len() == 1 && sampled.iter().all(|union| union == first);
        if !homogeneous {
            return UnionType::of(Type::ARRAY);
        }
        let key = if !any_keys || keys_int {
            ArrayKey::Int
        } else if keys_str {
            ArrayKey::Str
        } else {
            ArrayKey::Mixed
        };
        let element = first.types()[0].clone();
        UnionType::of(Type::generic_array(key, element))
    }
}
