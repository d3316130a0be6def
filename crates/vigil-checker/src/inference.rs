//! Inference pass: the statement-level walk.
//!
//! Re-walks completed trees after declaration, rebuilding the same
//! context transitions (namespace, imports, class and function scope) and
//! asking the expression visitor for a union type at every expression.
//! The symbol table is read-only here; running this pass over a tree that
//! was never declared is a caller error and fails fast.

use crate::hints::apply_use_imports;
use crate::plugin::Plugin;
use crate::scope::Scope;
use tracing::debug_span;
use vigil_ast::{NodeArena, NodeIndex, NodeKind, SourceTree};
use vigil_binder::{Context, FqsenId};
use vigil_common::diagnostics::{Diagnostic, DiagnosticSink, IssueTemplate, issue};
use vigil_common::AnalysisOptions;
use vigil_solver::{CodeBase, FunctionRecord, MethodRecord, Type, UnionType};

/// Run the inference pass over one file's (already declared) tree.
pub fn analyze_file(
    codebase: &CodeBase,
    tree: &SourceTree,
    options: &AnalysisOptions,
    sink: &mut dyn DiagnosticSink,
    plugins: &[Box<dyn Plugin>],
) {
    let _span = debug_span!("analyze_file", file = %tree.file).entered();
    let mut pass = InferencePass {
        codebase,
        file: &tree.file,
        options,
        sink,
        plugins,
    };
    let mut scope = Scope::new();
    pass.analyze_node(&tree.arena, tree.root, Context::new(&tree.file), &mut scope);
}

pub(crate) struct InferencePass<'a> {
    pub(crate) codebase: &'a CodeBase,
    pub(crate) file: &'a str,
    pub(crate) options: &'a AnalysisOptions,
    pub(crate) sink: &'a mut dyn DiagnosticSink,
    pub(crate) plugins: &'a [Box<dyn Plugin>],
}

impl InferencePass<'_> {
    pub(crate) fn report(
        &mut self,
        template: &'static IssueTemplate,
        lineno: u32,
        args: Vec<String>,
    ) {
        self.sink
            .report(Diagnostic::new(template, self.file, lineno, args));
    }

    /// Visit one statement, returning the context its siblings see.
    fn analyze_node(
        &mut self,
        arena: &NodeArena,
        index: NodeIndex,
        context: Context,
        scope: &mut Scope,
    ) -> Context {
        let Some(node) = arena.get(index) else {
            return context;
        };
        match node.kind {
            NodeKind::StatementList => {
                let mut inner = context.clone();
                for &child in &node.children {
                    inner = self.analyze_node(arena, child, inner, scope);
                }
                context
            }

            NodeKind::Namespace => {
                let inner = context.with_namespace(node.string_value().unwrap_or(""));
                let body = node.child(0);
                if body.is_some() {
                    self.analyze_node(arena, body, inner, scope);
                    context
                } else {
                    inner
                }
            }

            NodeKind::Use => apply_use_imports(self.codebase, arena, node, context),

            NodeKind::Class => {
                self.analyze_class(arena, index, &context);
                context
            }

            NodeKind::Function => {
                self.analyze_function(arena, index, &context);
                context
            }

            NodeKind::If => {
                let mut branch_scopes = Vec::new();
                for &branch in &node.children {
                    let Some(branch_node) = arena.get(branch) else {
                        continue;
                    };
                    let condition = branch_node.child(0);
                    if condition.is_some() {
                        self.infer_expr(arena, condition, &context, scope, 0);
                    }
                    let mut branch_scope = scope.clone();
                    self.analyze_node(
                        arena,
                        branch_node.child(1),
                        context.with_conditional(true),
                        &mut branch_scope,
                    );
                    branch_scopes.push(branch_scope);
                }
                scope.merge_branches(branch_scopes);
                context
            }

            NodeKind::IfBranch => {
                let condition = node.child(0);
                if condition.is_some() {
                    self.infer_expr(arena, condition, &context, scope, 0);
                }
                self.analyze_node(
                    arena,
                    node.child(1),
                    context.with_conditional(true),
                    scope,
                );
                context
            }

            NodeKind::While => {
                self.infer_expr(arena, node.child(0), &context, scope, 0);
                let mut body_scope = scope.clone();
                self.analyze_node(
                    arena,
                    node.child(1),
                    context.with_conditional(true),
                    &mut body_scope,
                );
                scope.merge_branches(vec![body_scope]);
                context
            }

            NodeKind::Return => {
                let expr = node.child(0);
                let returned = if expr.is_some() {
                    self.infer_expr(arena, expr, &context, scope, 0)
                } else {
                    UnionType::of(Type::NULL)
                };
                self.check_return(&context, node.lineno, &returned);
                context
            }

            NodeKind::Echo | NodeKind::ExprStatement => {
                for &child in &node.children {
                    if child.is_some() {
                        self.infer_expr(arena, child, &context, scope, 0);
                    }
                }
                context
            }

            NodeKind::ConstGroup => {
                for &elem in &node.children {
                    if let Some(elem_node) = arena.get(elem) {
                        let value = elem_node.child(0);
                        if value.is_some() {
                            self.infer_expr(arena, value, &context, scope, 0);
                        }
                    }
                }
                context
            }

            // Member declarations are visited through their class; their
            // defaults are constant expressions typed at declaration.
            NodeKind::PropertyGroup | NodeKind::ClassConstGroup => context,

            // Expressions in statement position (tolerated from lenient
            // parsers): infer and discard.
            NodeKind::Closure
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
            | NodeKind::Isset
            | NodeKind::Empty
            | NodeKind::Ternary
            | NodeKind::InstanceOf
            | NodeKind::Variable
            | NodeKind::Name
            | NodeKind::LiteralInt
            | NodeKind::LiteralFloat
            | NodeKind::LiteralString
            | NodeKind::LiteralBool
            | NodeKind::LiteralNull => {
                self.infer_expr(arena, index, &context, scope, 0);
                context
            }

            // Layout nodes reachable only through their parents' typed
            // views; seeing one here means the walk ordering contract was
            // broken by the caller.
            NodeKind::Method
            | NodeKind::PropertyElem
            | NodeKind::ClassConstElem
            | NodeKind::ConstElem
            | NodeKind::ParamList
            | NodeKind::Param
            | NodeKind::UseElem
            | NodeKind::NameList
            | NodeKind::ArgList
            | NodeKind::ArrayElem
            | NodeKind::TypeName
            | NodeKind::NullableType
            | NodeKind::UnionTypeNode => {
                unreachable!("layout node {:?} in statement position", node.kind)
            }
        }
    }

    fn analyze_class(&mut self, arena: &NodeArena, index: NodeIndex, context: &Context) {
        let Some(view) = arena.class_view(index) else {
            return;
        };
        let node = arena.get(index).expect("view implies node");
        let namespace = context.namespace();
        let base = self.codebase.fqsens.class(&namespace, view.name);
        let record = self
            .codebase
            .class_at_line(base, self.file, node.lineno)
            .unwrap_or_else(|| {
                panic!(
                    "class `{}` was not declared before inference",
                    self.codebase.fqsens.display(base)
                )
            });
        let fqsen = record.fqsen;

        let end = node.end_lineno.unwrap_or(node.lineno);
        let class_context = context.with_class(fqsen).with_lines(node.lineno, end);
        let Some(body) = arena.get(view.body) else {
            return;
        };
        for &member in &body.children {
            let Some(member_node) = arena.get(member) else {
                continue;
            };
            match member_node.kind {
                NodeKind::Method => self.analyze_method(arena, member, fqsen, &class_context),
                _ => {
                    let mut scope = Scope::new();
                    self.analyze_node(arena, member, class_context.clone(), &mut scope);
                }
            }
        }
    }

    fn analyze_method(
        &mut self,
        arena: &NodeArena,
        index: NodeIndex,
        class_fqsen: FqsenId,
        class_context: &Context,
    ) {
        let Some(view) = arena.function_like_view(index) else {
            return;
        };
        let Some(name) = view.name else {
            return;
        };
        let node = arena.get(index).expect("view implies node");
        let record: &MethodRecord = self
            .codebase
            .class(class_fqsen)
            .and_then(|class| class.method(name))
            .unwrap_or_else(|| {
                panic!("method `{name}` was not declared before inference")
            });
        let fqsen = record.fqsen;

        let mut scope = Scope::new();
        scope.set("this", UnionType::of(Type::class(class_fqsen)));
        for parameter in &record.parameters {
            scope.set(&parameter.name, parameter.union_type.clone());
        }

        let end = node.end_lineno.unwrap_or(node.lineno);
        let method_context = class_context
            .with_function(fqsen)
            .with_lines(node.lineno, end);
        if view.body.is_some() {
            self.analyze_node(arena, view.body, method_context, &mut scope);
        }
    }

    fn analyze_function(&mut self, arena: &NodeArena, index: NodeIndex, context: &Context) {
        let Some(view) = arena.function_like_view(index) else {
            return;
        };
        let Some(name) = view.name else {
            return;
        };
        let node = arena.get(index).expect("view implies node");
        let namespace = context.namespace();
        let base = self.codebase.fqsens.function(&namespace, name);
        let record: &FunctionRecord = self
            .codebase
            .function_at_line(base, self.file, node.lineno)
            .unwrap_or_else(|| {
                panic!(
                    "function `{}` was not declared before inference",
                    self.codebase.fqsens.display(base)
                )
            });
        let fqsen = record.fqsen;

        let mut scope = Scope::new();
        for parameter in &record.parameters {
            scope.set(&parameter.name, parameter.union_type.clone());
        }

        let end = node.end_lineno.unwrap_or(node.lineno);
        let function_context = context.with_function(fqsen).with_lines(node.lineno, end);
        if view.body.is_some() {
            self.analyze_node(arena, view.body, function_context, &mut scope);
        }
    }

    /// Closure bodies are analyzed where the closure appears; the record
    /// is recovered by declaration site.
    pub(crate) fn analyze_closure_body(
        &mut self,
        arena: &NodeArena,
        index: NodeIndex,
        context: &Context,
    ) {
        let Some(view) = arena.function_like_view(index) else {
            return;
        };
        let node = arena.get(index).expect("view implies node");
        let namespace = context.namespace();
        let base = self.codebase.fqsens.function(&namespace, "{closure}");
        let Some(record) = self
            .codebase
            .function_at_line(base, self.file, node.lineno)
        else {
            return;
        };

        let mut scope = Scope::new();
        if let Some(class) = context.class_fqsen() {
            scope.set("this", UnionType::of(Type::class(class)));
        }
        for parameter in &record.parameters {
            scope.set(&parameter.name, parameter.union_type.clone());
        }

        let end = node.end_lineno.unwrap_or(node.lineno);
        let closure_context = context
            .with_function(record.fqsen)
            .with_lines(node.lineno, end);
        if view.body.is_some() {
            self.analyze_node(arena, view.body, closure_context, &mut scope);
        }
    }

    /// Check a `return` expression against the enclosing declaration's
    /// return type.
    fn check_return(&mut self, context: &Context, lineno: u32, returned: &UnionType) {
        let Some(function) = context.function_fqsen() else {
            return;
        };
        let Some(declared) = self.declared_return(function) else {
            return;
        };
        if declared.is_empty() || returned.is_empty() {
            return;
        }
        // `return;` with an int-only annotation and similar mismatches.
        if !returned.can_cast_to(&declared, self.codebase, self.options) {
            let registry = &self.codebase.fqsens;
            self.report(&issue::TYPE_MISMATCH_RETURN, lineno, vec![
                returned.display(registry),
                registry.display(function),
                declared.display(registry),
            ]);
        }
    }

    fn declared_return(&self, function: FqsenId) -> Option<UnionType> {
        match self.codebase.fqsens.owner(function) {
            Some(class) => self
                .codebase
                .class(class)?
                .methods
                .values()
                .find(|method| method.fqsen == function)
                .map(|method| method.return_type.clone()),
            None => self
                .codebase
                .function(function)
                .map(|record| record.return_type.clone()),
        }
    }
}
