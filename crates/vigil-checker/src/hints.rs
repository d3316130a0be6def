//! Declared-type extraction: source-level type nodes and doc-comment
//! type expressions, both resolved against the current context.

use vigil_ast::flags::use_flags;
use vigil_ast::{Node, NodeArena, NodeIndex, NodeKind};
use vigil_binder::{Context, ElementKind, FqsenId};
use vigil_solver::{CodeBase, NativeKind, Type, UnionType};

/// Resolve a class-name spelling within a context.
///
/// `self` and `static` name the enclosing class, `parent` its base
/// class; anything else goes through import/namespace resolution.
/// Returns `None` only for the relative spellings outside any class
/// scope.
pub(crate) fn resolve_class_name(
    codebase: &CodeBase,
    name: &str,
    context: &Context,
) -> Option<FqsenId> {
    match name.to_lowercase().as_str() {
        "self" | "static" => context
            .class_fqsen()
            .map(|class| codebase.fqsens.canonical(class)),
        "parent" => {
            let class = context.class_fqsen()?;
            codebase.class(class)?.parent
        }
        _ => Some(
            codebase
                .fqsens
                .resolve_name(ElementKind::Class, name, context, |_| true),
        ),
    }
}

/// Union type written in a source-level type declaration node
/// (`TypeName`, `NullableType`, `UnionTypeNode`). Absent or non-type
/// nodes yield the empty union.
pub(crate) fn union_from_type_node(
    codebase: &CodeBase,
    arena: &NodeArena,
    index: NodeIndex,
    context: &Context,
) -> UnionType {
    let Some(node) = arena.get(index) else {
        return UnionType::empty();
    };
    match node.kind {
        NodeKind::TypeName => {
            let Some(name) = node.string_value() else {
                return UnionType::empty();
            };
            if let Some(kind) = NativeKind::from_name(name) {
                UnionType::of(Type::Native(kind))
            } else {
                match resolve_class_name(codebase, name, context) {
                    Some(fqsen) => UnionType::of(Type::class(fqsen)),
                    None => UnionType::empty(),
                }
            }
        }
        NodeKind::NullableType => {
            let inner = union_from_type_node(codebase, arena, node.child(0), context);
            nullable_of(&inner)
        }
        NodeKind::UnionTypeNode => {
            let mut union = UnionType::empty();
            for &member in &node.children {
                union = union.union(&union_from_type_node(codebase, arena, member, context));
            }
            union
        }
        _ => UnionType::empty(),
    }
}

/// `?T`: class members gain the nullable flag, native members keep their
/// kind with the null type added alongside.
fn nullable_of(inner: &UnionType) -> UnionType {
    if inner.is_empty() {
        return UnionType::empty();
    }
    let mut has_native = false;
    let mut types: Vec<Type> = inner
        .types()
        .iter()
        .cloned()
        .map(|ty| match ty {
            Type::ClassInstance { fqsen, .. } => Type::nullable_class(fqsen),
            other => {
                has_native = true;
                other
            }
        })
        .collect();
    if has_native {
        types.push(Type::NULL);
    }
    UnionType::from_types(types)
}

/// Union type written in a doc-comment type expression.
pub(crate) fn union_from_doc_type(
    codebase: &CodeBase,
    text: &str,
    context: &Context,
) -> UnionType {
    UnionType::from_doc_string(text, |name| resolve_class_name(codebase, name, context))
}

/// Extend a context with the bindings of one `use` statement. Both
/// passes route import handling through here so their contexts stay in
/// lockstep.
pub(crate) fn apply_use_imports(
    codebase: &CodeBase,
    arena: &NodeArena,
    node: &Node,
    context: Context,
) -> Context {
    let kind = match node.flags {
        use_flags::FUNCTION => ElementKind::Function,
        use_flags::CONST => ElementKind::GlobalConstant,
        _ => ElementKind::Class,
    };
    let mut updated = context;
    for &elem in &node.children {
        let Some(elem_node) = arena.get(elem) else {
            continue;
        };
        let Some(target_path) = arena.get(elem_node.child(0)).and_then(Node::string_value) else {
            continue;
        };
        let alias = arena
            .get(elem_node.child(1))
            .and_then(Node::string_value)
            .unwrap_or_else(|| target_path.rsplit('\\').next().unwrap_or(target_path));

        let trimmed = target_path.trim_start_matches('\\');
        let (namespace, name) = match trimmed.rsplit_once('\\') {
            Some((namespace, name)) => (namespace, name),
            None => ("", trimmed),
        };
        let target = match kind {
            ElementKind::Function => codebase.fqsens.function(namespace, name),
            ElementKind::GlobalConstant => codebase.fqsens.global_constant(namespace, name),
            _ => codebase.fqsens.class(namespace, name),
        };
        updated = updated.with_import(kind, alias, target);
    }
    updated
}

/// Pick the declared type for an element: the doc-comment annotation
/// refines (wins over) the source-level declaration when present.
pub(crate) fn refine_declared(declared: UnionType, doc: UnionType) -> UnionType {
    if doc.is_empty() { declared } else { doc }
}

/// Shallow literal typing, used for property and constant defaults
/// during the declaration pass (no scope exists yet).
pub(crate) fn literal_union(arena: &NodeArena, index: NodeIndex) -> UnionType {
    let Some(node) = arena.get(index) else {
        return UnionType::empty();
    };
    match node.kind {
        NodeKind::LiteralInt => UnionType::of(Type::INT),
        NodeKind::LiteralFloat => UnionType::of(Type::FLOAT),
        NodeKind::LiteralString => UnionType::of(Type::STRING),
        NodeKind::LiteralBool => UnionType::of(Type::BOOL),
        NodeKind::LiteralNull => UnionType::of(Type::NULL),
        NodeKind::ArrayLiteral => UnionType::of(Type::ARRAY),
        NodeKind::UnaryOp => literal_union(arena, node.child(0)),
        _ => UnionType::empty(),
    }
}
