//! Declaration pass.
//!
//! Top-down walk registering every declared element into the `CodeBase`
//! under an FQSEN computed from the current `Context`. Each node kind has
//! one of three effects: pure pass-through, context mutation (namespace,
//! import, class or function entry), or terminal member registration.
//!
//! Name collisions are legal: the alternate-id search loops on
//! declare-or-exists until a free id is found, so the first declaration
//! in walk order owns the canonical id and re-walking an unchanged file
//! (after a flush) reproduces identical ids. A collision outside any
//! conditional branch additionally reports a redefinition diagnostic.

use crate::hints::{
    apply_use_imports, literal_union, refine_declared, resolve_class_name, union_from_doc_type,
    union_from_type_node,
};
use crate::plugin::Plugin;
use tracing::debug_span;
use vigil_ast::flags::{class_flags, member_flags};
use vigil_ast::{Node, NodeArena, NodeIndex, NodeKind, SourceTree};
use vigil_binder::{Context, DocAnnotations, FqsenId, parse_doc_comment};
use vigil_common::diagnostics::{Diagnostic, DiagnosticSink, IssueTemplate, issue};
use vigil_solver::{
    ClassConstantRecord, ClassRecord, CodeBase, ConstantRecord, FunctionRecord, MethodRecord,
    ParameterRecord, PropertyRecord, class_modifiers, function_modifiers, member_modifiers,
};

/// Run the declaration pass over one file's tree.
pub fn declare_file(
    codebase: &mut CodeBase,
    tree: &SourceTree,
    sink: &mut dyn DiagnosticSink,
    plugins: &[Box<dyn Plugin>],
) {
    let _span = debug_span!("declare_file", file = %tree.file).entered();
    let mut pass = DeclarationPass {
        codebase,
        file: &tree.file,
        sink,
        plugins,
    };
    pass.declare_node(&tree.arena, tree.root, Context::new(&tree.file));
}

struct DeclarationPass<'a> {
    codebase: &'a mut CodeBase,
    file: &'a str,
    sink: &'a mut dyn DiagnosticSink,
    plugins: &'a [Box<dyn Plugin>],
}

/// Map syntax-level class flags onto record modifiers.
fn class_record_flags(flags: u32) -> u32 {
    let mut out = 0;
    if flags & class_flags::ABSTRACT != 0 {
        out |= class_modifiers::ABSTRACT;
    }
    if flags & class_flags::FINAL != 0 {
        out |= class_modifiers::FINAL;
    }
    if flags & class_flags::INTERFACE != 0 {
        out |= class_modifiers::INTERFACE;
    }
    if flags & class_flags::TRAIT != 0 {
        out |= class_modifiers::TRAIT;
    }
    out
}

/// Map syntax-level member flags onto record modifiers.
fn member_record_flags(flags: u32) -> u32 {
    let mut out = 0;
    if flags & member_flags::PUBLIC != 0 {
        out |= member_modifiers::PUBLIC;
    }
    if flags & member_flags::PROTECTED != 0 {
        out |= member_modifiers::PROTECTED;
    }
    if flags & member_flags::PRIVATE != 0 {
        out |= member_modifiers::PRIVATE;
    }
    if flags & member_flags::STATIC != 0 {
        out |= member_modifiers::STATIC;
    }
    if flags & member_flags::ABSTRACT != 0 {
        out |= member_modifiers::ABSTRACT;
    }
    if flags & member_flags::FINAL != 0 {
        out |= member_modifiers::FINAL;
    }
    out
}

impl DeclarationPass<'_> {
    fn report(&mut self, template: &'static IssueTemplate, lineno: u32, args: Vec<String>) {
        self.sink
            .report(Diagnostic::new(template, self.file, lineno, args));
    }

    /// Visit children with the given context, discarding context updates
    /// (they stay local to the subtree).
    fn recurse_children(&mut self, arena: &NodeArena, node: &Node, context: &Context) {
        for &child in &node.children {
            if child.is_some() {
                self.declare_node(arena, child, context.clone());
            }
        }
    }

    /// Visit one node, returning the context its following siblings see.
    fn declare_node(&mut self, arena: &NodeArena, index: NodeIndex, context: Context) -> Context {
        let Some(node) = arena.get(index) else {
            return context;
        };
        match node.kind {
            NodeKind::StatementList => {
                let mut inner = context.clone();
                for &child in &node.children {
                    inner = self.declare_node(arena, child, inner);
                }
                context
            }

            NodeKind::Namespace => {
                let inner = context.with_namespace(node.string_value().unwrap_or(""));
                let body = node.child(0);
                if body.is_some() {
                    self.declare_node(arena, body, inner);
                    context
                } else {
                    // Braceless form: the namespace applies to the
                    // following siblings.
                    inner
                }
            }

            NodeKind::Use => apply_use_imports(self.codebase, arena, node, context),

            NodeKind::Class => {
                self.declare_class(arena, index, node, &context);
                context
            }

            NodeKind::Function => {
                self.declare_function(arena, index, node, &context);
                context
            }

            NodeKind::Closure => {
                self.declare_closure(arena, index, node, &context);
                context
            }

            NodeKind::ConstGroup => {
                for &elem in &node.children {
                    self.declare_global_constant(arena, elem, &context);
                }
                context
            }

            // Declarations guarded by a branch may legally collide with
            // declarations in sibling branches; the flag routes them to
            // alternate ids instead of redefinition diagnostics.
            NodeKind::If | NodeKind::IfBranch | NodeKind::While => {
                self.recurse_children(arena, node, &context.with_conditional(true));
                context
            }

            // Statements and expressions with no declaration effect of
            // their own: recurse to find nested closures.
            NodeKind::Return
            | NodeKind::Echo
            | NodeKind::ExprStatement
            | NodeKind::Assign
            | NodeKind::Call
            | NodeKind::MethodCall
            | NodeKind::StaticCall
            | NodeKind::PropertyAccess
            | NodeKind::StaticPropertyAccess
            | NodeKind::ClassConst
            | NodeKind::New
            | NodeKind::BinaryOp
            | NodeKind::UnaryOp
            | NodeKind::Cast
            | NodeKind::ArrayLiteral
            | NodeKind::ArrayElem
            | NodeKind::Isset
            | NodeKind::Empty
            | NodeKind::Ternary
            | NodeKind::InstanceOf
            | NodeKind::ArgList => {
                self.recurse_children(arena, node, &context);
                context
            }

            // Leaves and layout nodes reached only through their parents'
            // typed views: nothing to declare.
            NodeKind::UseElem
            | NodeKind::NameList
            | NodeKind::Method
            | NodeKind::PropertyGroup
            | NodeKind::PropertyElem
            | NodeKind::ClassConstGroup
            | NodeKind::ClassConstElem
            | NodeKind::ConstElem
            | NodeKind::ParamList
            | NodeKind::Param
            | NodeKind::TypeName
            | NodeKind::NullableType
            | NodeKind::UnionTypeNode
            | NodeKind::Variable
            | NodeKind::Name
            | NodeKind::LiteralInt
            | NodeKind::LiteralFloat
            | NodeKind::LiteralString
            | NodeKind::LiteralBool
            | NodeKind::LiteralNull => context,
        }
    }

    /// Find the first alternate id free for a class identity.
    fn free_class_fqsen(&self, base: FqsenId) -> (FqsenId, u32) {
        let mut fqsen = base;
        let mut alternate = 0;
        while self.codebase.has_class(fqsen) {
            alternate += 1;
            fqsen = self.codebase.fqsens.with_alternate(base, alternate);
        }
        (fqsen, alternate)
    }

    /// Find the first alternate id free for a function identity.
    fn free_function_fqsen(&self, base: FqsenId) -> (FqsenId, u32) {
        let mut fqsen = base;
        let mut alternate = 0;
        while self.codebase.has_function(fqsen) {
            alternate += 1;
            fqsen = self.codebase.fqsens.with_alternate(base, alternate);
        }
        (fqsen, alternate)
    }

    fn declare_class(
        &mut self,
        arena: &NodeArena,
        index: NodeIndex,
        node: &Node,
        context: &Context,
    ) {
        let Some(view) = arena.class_view(index) else {
            return;
        };
        let namespace = context.namespace();
        let base = self.codebase.fqsens.class(&namespace, view.name);
        let (fqsen, alternate) = self.free_class_fqsen(base);
        if alternate > 0 && !context.is_in_conditional() {
            let display = self.codebase.fqsens.display(base);
            self.report(&issue::REDEFINED_CLASS, node.lineno, vec![
                display,
                node.lineno.to_string(),
            ]);
        }

        let mut record = ClassRecord::new(
            fqsen,
            class_record_flags(view.flags),
            self.file,
            node.lineno,
        );
        if let Some(name) = arena.get(view.extends).and_then(Node::string_value) {
            record.parent = resolve_class_name(self.codebase, name, context);
        }
        for &interface in &view.implements {
            if let Some(name) = arena.get(interface).and_then(Node::string_value)
                && let Some(resolved) = resolve_class_name(self.codebase, name, context)
            {
                record.interfaces.push(resolved);
            }
        }
        for &trait_use in &view.trait_uses {
            if let Some(name) = arena.get(trait_use).and_then(Node::string_value)
                && let Some(resolved) = resolve_class_name(self.codebase, name, context)
            {
                record.traits.push(resolved);
            }
        }
        self.codebase.declare_class(record);

        let end = node.end_lineno.unwrap_or(node.lineno);
        let class_context = context.with_class(fqsen).with_lines(node.lineno, end);
        if let Some(body) = arena.get(view.body) {
            for &member in &body.children {
                let Some(member_node) = arena.get(member) else {
                    continue;
                };
                match member_node.kind {
                    NodeKind::Method => {
                        self.declare_method(arena, member, member_node, fqsen, &class_context);
                    }
                    NodeKind::PropertyGroup => {
                        self.declare_property_group(arena, member, fqsen, &class_context);
                    }
                    NodeKind::ClassConstGroup => {
                        self.declare_class_const_group(arena, member_node, fqsen);
                    }
                    _ => {
                        self.declare_node(arena, member, class_context.clone());
                    }
                }
            }
        }

        for plugin in self.plugins {
            plugin.class_declared(self.codebase, &class_context, fqsen, &mut *self.sink);
        }
    }

    fn declare_method(
        &mut self,
        arena: &NodeArena,
        index: NodeIndex,
        node: &Node,
        class_fqsen: FqsenId,
        class_context: &Context,
    ) {
        let Some(view) = arena.function_like_view(index) else {
            return;
        };
        let Some(name) = view.name else {
            return;
        };
        let fqsen = self.codebase.fqsens.method(class_fqsen, name);
        let doc = node
            .doc_comment
            .as_deref()
            .map(parse_doc_comment)
            .unwrap_or_default();
        let parameters = self.parameter_records(arena, &view.params, &doc, class_context);
        let declared = union_from_type_node(self.codebase, arena, view.return_type, class_context);
        let doc_return = doc
            .return_type
            .as_deref()
            .map(|text| union_from_doc_type(self.codebase, text, class_context))
            .unwrap_or_default();
        let record = MethodRecord {
            fqsen,
            name: name.to_string(),
            parameters,
            return_type: refine_declared(declared, doc_return),
            flags: member_record_flags(view.flags),
            lineno: node.lineno,
        };

        let key = name.to_lowercase();
        let class_display = self.codebase.fqsens.display(class_fqsen);
        let class_record = self
            .codebase
            .class_mut(class_fqsen)
            .expect("owning class was just declared");
        if class_record.methods.contains_key(&key) {
            self.report(&issue::REDEFINED_CLASS_MEMBER, node.lineno, vec![
                name.to_string(),
                class_display,
            ]);
        } else {
            class_record.methods.insert(key, record);
        }

        for plugin in self.plugins {
            plugin.function_declared(self.codebase, class_context, fqsen, &mut *self.sink);
        }

        let end = node.end_lineno.unwrap_or(node.lineno);
        let method_context = class_context.with_function(fqsen).with_lines(node.lineno, end);
        if view.body.is_some() {
            self.declare_node(arena, view.body, method_context);
        }
    }

    fn declare_property_group(
        &mut self,
        arena: &NodeArena,
        index: NodeIndex,
        class_fqsen: FqsenId,
        class_context: &Context,
    ) {
        let Some(view) = arena.property_group_view(index) else {
            return;
        };
        let group_node = arena.get(index).expect("view implies node");
        let declared = union_from_type_node(self.codebase, arena, view.type_node, class_context);
        let doc_var = group_node
            .doc_comment
            .as_deref()
            .map(parse_doc_comment)
            .and_then(|doc| doc.var_type)
            .map(|text| union_from_doc_type(self.codebase, &text, class_context))
            .unwrap_or_default();

        for &elem in &view.elems {
            let Some(elem_node) = arena.get(elem) else {
                continue;
            };
            let Some(name) = elem_node.string_value() else {
                continue;
            };
            let default = literal_union(arena, elem_node.child(0));
            let union_type = refine_declared(
                refine_declared(default, declared.clone()),
                doc_var.clone(),
            );
            let fqsen = self.codebase.fqsens.property(class_fqsen, name);
            let record = PropertyRecord {
                fqsen,
                name: name.to_string(),
                union_type,
                flags: member_record_flags(view.flags),
                lineno: elem_node.lineno,
            };

            let key = name.to_lowercase();
            let class_display = self.codebase.fqsens.display(class_fqsen);
            let class_record = self
                .codebase
                .class_mut(class_fqsen)
                .expect("owning class was just declared");
            if class_record.properties.contains_key(&key) {
                self.report(&issue::REDEFINED_CLASS_MEMBER, elem_node.lineno, vec![
                    format!("${name}"),
                    class_display,
                ]);
            } else {
                class_record.properties.insert(key, record);
            }

            for plugin in self.plugins {
                plugin.property_declared(
                    self.codebase,
                    class_context,
                    class_fqsen,
                    fqsen,
                    &mut *self.sink,
                );
            }
        }
    }

    fn declare_class_const_group(&mut self, arena: &NodeArena, node: &Node, class_fqsen: FqsenId) {
        for &elem in &node.children {
            let Some(elem_node) = arena.get(elem) else {
                continue;
            };
            let Some(name) = elem_node.string_value() else {
                continue;
            };
            let fqsen = self.codebase.fqsens.class_constant(class_fqsen, name);
            let record = ClassConstantRecord {
                fqsen,
                name: name.to_string(),
                union_type: literal_union(arena, elem_node.child(0)),
                lineno: elem_node.lineno,
            };
            let class_display = self.codebase.fqsens.display(class_fqsen);
            let class_record = self
                .codebase
                .class_mut(class_fqsen)
                .expect("owning class was just declared");
            if class_record.constants.contains_key(name) {
                self.report(&issue::REDEFINED_CLASS_MEMBER, elem_node.lineno, vec![
                    name.to_string(),
                    class_display,
                ]);
            } else {
                class_record.constants.insert(name.to_string(), record);
            }
        }
    }

    fn declare_function(
        &mut self,
        arena: &NodeArena,
        index: NodeIndex,
        node: &Node,
        context: &Context,
    ) {
        let Some(view) = arena.function_like_view(index) else {
            return;
        };
        let Some(name) = view.name else {
            return;
        };
        let namespace = context.namespace();
        let base = self.codebase.fqsens.function(&namespace, name);
        let (fqsen, alternate) = self.free_function_fqsen(base);
        if alternate > 0 && !context.is_in_conditional() {
            let display = self.codebase.fqsens.display(base);
            self.report(&issue::REDEFINED_FUNCTION, node.lineno, vec![
                display,
                node.lineno.to_string(),
            ]);
        }

        let doc = node
            .doc_comment
            .as_deref()
            .map(parse_doc_comment)
            .unwrap_or_default();
        let parameters = self.parameter_records(arena, &view.params, &doc, context);
        let declared = union_from_type_node(self.codebase, arena, view.return_type, context);
        let doc_return = doc
            .return_type
            .as_deref()
            .map(|text| union_from_doc_type(self.codebase, text, context))
            .unwrap_or_default();
        self.codebase.declare_function(FunctionRecord {
            fqsen,
            name: name.to_string(),
            parameters,
            return_type: refine_declared(declared, doc_return),
            flags: 0,
            file: self.file.to_string(),
            lineno: node.lineno,
        });

        for plugin in self.plugins {
            plugin.function_declared(self.codebase, context, fqsen, &mut *self.sink);
        }

        let end = node.end_lineno.unwrap_or(node.lineno);
        let function_context = context.with_function(fqsen).with_lines(node.lineno, end);
        if view.body.is_some() {
            self.declare_node(arena, view.body, function_context);
        }
    }

    /// Closures register like functions under the synthetic `{closure}`
    /// name; collisions are expected and always silent.
    fn declare_closure(
        &mut self,
        arena: &NodeArena,
        index: NodeIndex,
        node: &Node,
        context: &Context,
    ) {
        let Some(view) = arena.function_like_view(index) else {
            return;
        };
        let namespace = context.namespace();
        let base = self.codebase.fqsens.function(&namespace, "{closure}");
        let (fqsen, _alternate) = self.free_function_fqsen(base);

        let doc = node
            .doc_comment
            .as_deref()
            .map(parse_doc_comment)
            .unwrap_or_default();
        let parameters = self.parameter_records(arena, &view.params, &doc, context);
        let declared = union_from_type_node(self.codebase, arena, view.return_type, context);
        self.codebase.declare_function(FunctionRecord {
            fqsen,
            name: "{closure}".to_string(),
            parameters,
            return_type: declared,
            flags: function_modifiers::CLOSURE,
            file: self.file.to_string(),
            lineno: node.lineno,
        });

        for plugin in self.plugins {
            plugin.function_declared(self.codebase, context, fqsen, &mut *self.sink);
        }

        let end = node.end_lineno.unwrap_or(node.lineno);
        let closure_context = context.with_function(fqsen).with_lines(node.lineno, end);
        if view.body.is_some() {
            self.declare_node(arena, view.body, closure_context);
        }
    }

    fn declare_global_constant(&mut self, arena: &NodeArena, index: NodeIndex, context: &Context) {
        let Some(node) = arena.get(index) else {
            return;
        };
        let Some(name) = node.string_value() else {
            return;
        };
        let namespace = context.namespace();
        let fqsen = self.codebase.fqsens.global_constant(&namespace, name);
        self.codebase.declare_constant(ConstantRecord {
            fqsen,
            union_type: literal_union(arena, node.child(0)),
            file: self.file.to_string(),
            lineno: node.lineno,
        });
    }

    fn parameter_records(
        &mut self,
        arena: &NodeArena,
        params: &[NodeIndex],
        doc: &DocAnnotations,
        context: &Context,
    ) -> Vec<ParameterRecord> {
        let mut records = Vec::with_capacity(params.len());
        for &param in params {
            let Some(view) = arena.param_view(param) else {
                continue;
            };
            let declared = union_from_type_node(self.codebase, arena, view.type_node, context);
            let doc_type = doc
                .params
                .iter()
                .find(|(name, _)| name == view.name)
                .map(|(_, text)| union_from_doc_type(self.codebase, text, context))
                .unwrap_or_default();
            records.push(ParameterRecord {
                name: view.name.to_string(),
                union_type: refine_declared(declared, doc_type),
                optional: view.default.is_some(),
            });
        }
        records
    }
}
