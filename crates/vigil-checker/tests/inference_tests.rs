//! Inference-pass behavior: the operator tables, array-literal sampling,
//! member resolution, and the diagnostic policy (recoverable problems
//! report and infer bottom; unknown stays silent).

use std::sync::{Arc, Mutex};
use vigil_ast::flags::{binary_flags, cast_flags, class_flags, member_flags, use_flags};
use vigil_ast::{AstBuilder, Node, NodeIndex, NodeKind, SourceTree};
use vigil_binder::Context;
use vigil_checker::{Plugin, analyze_file, declare_file};
use vigil_common::diagnostics::{DiagnosticCollector, DiagnosticSink};
use vigil_common::AnalysisOptions;
use vigil_solver::{ArrayKey, CodeBase, Type, UnionType};

/// Records every inferred expression type, keyed by node kind and line.
#[derive(Clone, Default)]
struct TypeRecorder {
    seen: Arc<Mutex<Vec<(NodeKind, u32, UnionType)>>>,
}

impl Plugin for TypeRecorder {
    fn expression_inferred(
        &self,
        _codebase: &CodeBase,
        _context: &Context,
        node: &Node,
        union: &UnionType,
        _sink: &mut dyn DiagnosticSink,
    ) {
        self.seen
            .lock()
            .expect("recorder poisoned")
            .push((node.kind, node.lineno, union.clone()));
    }
}

impl TypeRecorder {
    fn type_at(&self, kind: NodeKind, line: u32) -> UnionType {
        self.seen
            .lock()
            .expect("recorder poisoned")
            .iter()
            .rev()
            .find(|(k, l, _)| *k == kind && *l == line)
            .map(|(_, _, union)| union.clone())
            .unwrap_or_else(|| panic!("no {kind:?} expression recorded at line {line}"))
    }
}

fn run(trees: &[SourceTree]) -> (CodeBase, DiagnosticCollector, TypeRecorder) {
    run_with_options(trees, &AnalysisOptions::default())
}

fn run_with_options(
    trees: &[SourceTree],
    options: &AnalysisOptions,
) -> (CodeBase, DiagnosticCollector, TypeRecorder) {
    let mut codebase = CodeBase::new();
    let mut sink = DiagnosticCollector::new();
    let recorder = TypeRecorder::default();
    let plugins: Vec<Box<dyn Plugin>> = vec![Box::new(recorder.clone())];
    for tree in trees {
        declare_file(&mut codebase, tree, &mut sink, &plugins);
    }
    for tree in trees {
        analyze_file(&codebase, tree, options, &mut sink, &plugins);
    }
    (codebase, sink, recorder)
}

/// Wrap an expression built at `line` into a one-statement tree.
fn expr_tree(build: impl FnOnce(&mut AstBuilder) -> NodeIndex) -> SourceTree {
    let mut b = AstBuilder::new();
    let expr = build(&mut b);
    let stmt = b.expr_stmt(expr);
    let root = b.stmt_list(&[stmt]);
    b.build("t.php", root)
}

#[test]
fn numeric_addition_follows_the_table() {
    let mut b = AstBuilder::new();
    let one = b.at(1).int(1);
    let two = b.int(2);
    let int_sum = b.binary(binary_flags::ADD, one, two);
    let s1 = b.expr_stmt(int_sum);
    let three = b.at(2).int(3);
    let half = b.float(0.5);
    let float_sum = b.binary(binary_flags::ADD, three, half);
    let s2 = b.expr_stmt(float_sum);
    let root = b.stmt_list(&[s1, s2]);
    let tree = b.build("math.php", root);

    let (_, sink, recorder) = run(&[tree]);
    assert!(sink.is_empty());
    assert_eq!(
        recorder.type_at(NodeKind::BinaryOp, 1),
        UnionType::of(Type::INT)
    );
    assert_eq!(
        recorder.type_at(NodeKind::BinaryOp, 2),
        UnionType::of(Type::FLOAT)
    );
}

#[test]
fn adding_an_array_to_an_int_is_a_type_error() {
    let tree = expr_tree(|b| {
        let elem_value = b.at(1).int(1);
        let elem = b.array_elem(elem_value, NodeIndex::NONE);
        let array = b.array(&[elem]);
        let one = b.int(1);
        b.binary(binary_flags::ADD, array, one)
    });

    let (_, sink, recorder) = run(&[tree]);
    assert_eq!(sink.len(), 1);
    assert_eq!(sink.diagnostics()[0].name, "TypeArrayOperator");
    assert!(recorder.type_at(NodeKind::BinaryOp, 1).is_empty());
}

#[test]
fn adding_two_arrays_is_an_array() {
    let tree = expr_tree(|b| {
        let left_value = b.at(1).int(1);
        let left_elem = b.array_elem(left_value, NodeIndex::NONE);
        let left = b.array(&[left_elem]);
        let right_value = b.string("x");
        let right_elem = b.array_elem(right_value, NodeIndex::NONE);
        let right = b.array(&[right_elem]);
        b.binary(binary_flags::ADD, left, right)
    });

    let (_, sink, recorder) = run(&[tree]);
    assert!(sink.is_empty());
    assert_eq!(
        recorder.type_at(NodeKind::BinaryOp, 1),
        UnionType::of(Type::ARRAY)
    );
}

#[test]
fn concatenation_always_produces_string() {
    let tree = expr_tree(|b| {
        let left = b.at(1).int(5);
        let right = b.string("x");
        b.binary(binary_flags::CONCAT, left, right)
    });

    let (_, sink, recorder) = run(&[tree]);
    assert!(sink.is_empty());
    assert_eq!(
        recorder.type_at(NodeKind::BinaryOp, 1),
        UnionType::of(Type::STRING)
    );
}

#[test]
fn comparing_an_array_to_a_non_array_flags_and_stays_bool() {
    let tree = expr_tree(|b| {
        let value = b.at(1).int(1);
        let elem = b.array_elem(value, NodeIndex::NONE);
        let array = b.array(&[elem]);
        let one = b.int(1);
        b.binary(binary_flags::IS_EQUAL, array, one)
    });

    let (_, sink, recorder) = run(&[tree]);
    assert_eq!(sink.len(), 1);
    assert_eq!(sink.diagnostics()[0].name, "TypeComparisonToArray");
    assert_eq!(
        recorder.type_at(NodeKind::BinaryOp, 1),
        UnionType::of(Type::BOOL)
    );
}

#[test]
fn array_literal_sampling_sees_only_the_window() {
    // Five ints followed by a string: the disagreement is past the
    // sample window, so the literal stays a homogeneous int array.
    let mut b = AstBuilder::new();
    b.at(1);
    let mut elems: Vec<NodeIndex> = Vec::new();
    for i in 0..5 {
        let value = b.int(i);
        elems.push(b.array_elem(value, NodeIndex::NONE));
    }
    {
        let value = b.string("odd one out");
        elems.push(b.array_elem(value, NodeIndex::NONE));
    }
    let array = b.array(&elems);
    let stmt = b.expr_stmt(array);
    let root = b.stmt_list(&[stmt]);
    let tree = b.build("sample.php", root);

    let (_, sink, recorder) = run(&[tree]);
    assert!(sink.is_empty());
    assert_eq!(
        recorder.type_at(NodeKind::ArrayLiteral, 1),
        UnionType::of(Type::generic_array(ArrayKey::Int, Type::INT))
    );
}

#[test]
fn heterogeneous_sample_degrades_to_plain_array() {
    let tree = expr_tree(|b| {
        let first = b.at(1).int(1);
        let first_elem = b.array_elem(first, NodeIndex::NONE);
        let second = b.string("x");
        let second_elem = b.array_elem(second, NodeIndex::NONE);
        b.array(&[first_elem, second_elem])
    });

    let (_, _, recorder) = run(&[tree]);
    assert_eq!(
        recorder.type_at(NodeKind::ArrayLiteral, 1),
        UnionType::of(Type::ARRAY)
    );
}

#[test]
fn string_keyed_literals_infer_map_shapes() {
    let tree = expr_tree(|b| {
        let key_a = b.at(1).string("a");
        let value_a = b.int(1);
        let elem_a = b.array_elem(value_a, key_a);
        let key_b = b.string("b");
        let value_b = b.int(2);
        let elem_b = b.array_elem(value_b, key_b);
        b.array(&[elem_a, elem_b])
    });

    let (_, _, recorder) = run(&[tree]);
    assert_eq!(
        recorder.type_at(NodeKind::ArrayLiteral, 1),
        UnionType::of(Type::generic_array(ArrayKey::Str, Type::INT))
    );
}

#[test]
fn sample_size_is_configurable() {
    // With a sample of 1, the second (string) element is never seen.
    let tree = expr_tree(|b| {
        let first = b.at(1).int(1);
        let first_elem = b.array_elem(first, NodeIndex::NONE);
        let second = b.string("x");
        let second_elem = b.array_elem(second, NodeIndex::NONE);
        b.array(&[first_elem, second_elem])
    });

    let options = AnalysisOptions {
        array_literal_sample_size: 1,
        ..AnalysisOptions::default()
    };
    let (_, _, recorder) = run_with_options(&[tree], &options);
    assert_eq!(
        recorder.type_at(NodeKind::ArrayLiteral, 1),
        UnionType::of(Type::generic_array(ArrayKey::Int, Type::INT))
    );
}

/// `class A { /** @var int */ public $size; }` plus a main file running
/// `$obj = new A(); $obj-><member>;`.
fn class_with_size_and_access(member: &str, line: u32) -> Vec<SourceTree> {
    let mut b = AstBuilder::new();
    let size = b.at(2).property_elem("size", NodeIndex::NONE);
    let group = b.property_group(member_flags::PUBLIC, NodeIndex::NONE, &[size]);
    b.doc(group, "/** @var int */");
    let body = b.stmt_list(&[group]);
    let class = b.at(1).class("A", 0, None, &[], &[], body);
    let root = b.stmt_list(&[class]);
    let class_tree = b.build("a.php", root);

    let mut b = AstBuilder::new();
    let new = b.at(1).new_object("A", &[]);
    let target = b.variable("obj");
    let assign = b.assign(target, new);
    let assign_stmt = b.expr_stmt(assign);
    let object = b.at(line).variable("obj");
    let access = b.property_access(object, member);
    let access_stmt = b.expr_stmt(access);
    let root = b.stmt_list(&[assign_stmt, access_stmt]);
    let main_tree = b.build("main.php", root);

    vec![class_tree, main_tree]
}

#[test]
fn declared_property_access_infers_the_annotated_type() {
    let trees = class_with_size_and_access("size", 3);
    let (_, sink, recorder) = run(&trees);
    assert!(sink.is_empty());
    assert_eq!(
        recorder.type_at(NodeKind::PropertyAccess, 3),
        UnionType::of(Type::INT)
    );
}

#[test]
fn undeclared_property_reports_exactly_once_and_infers_nothing() {
    let trees = class_with_size_and_access("missingProp", 3);
    let (_, sink, recorder) = run(&trees);
    assert_eq!(sink.len(), 1);
    let diagnostic = &sink.diagnostics()[0];
    assert_eq!(diagnostic.name, "UndeclaredProperty");
    assert_eq!(diagnostic.args, vec!["\\A".to_string(), "missingProp".to_string()]);
    assert_eq!(diagnostic.line, 3);
    assert!(recorder.type_at(NodeKind::PropertyAccess, 3).is_empty());
}

#[test]
fn unknown_bases_stay_silent() {
    // `$mystery->anything` with no information about `$mystery`.
    let tree = expr_tree(|b| {
        let object = b.at(1).variable("mystery");
        b.property_access(object, "anything")
    });
    let (_, sink, recorder) = run(&[tree]);
    assert!(sink.is_empty(), "unknown is not the same as wrong");
    assert!(recorder.type_at(NodeKind::PropertyAccess, 1).is_empty());
}

#[test]
fn method_calls_resolve_through_the_ancestor_chain() {
    let mut b = AstBuilder::new();
    let string_type = b.at(2).type_name("string");
    let render_body = b.stmt_list(&[]);
    let render = b.method(
        "render",
        member_flags::PUBLIC,
        &[],
        string_type,
        render_body,
    );
    let base_body = b.stmt_list(&[render]);
    let base = b.at(1).class("Base", 0, None, &[], &[], base_body);
    let child_body = b.at(5).stmt_list(&[]);
    let child = b.at(5).class("Child", 0, Some("Base"), &[], &[], child_body);
    let root = b.stmt_list(&[base, child]);
    let classes = b.build("classes.php", root);

    let mut b = AstBuilder::new();
    let new = b.at(1).new_object("Child", &[]);
    let call = b.method_call(new, "render", &[]);
    let stmt = b.expr_stmt(call);
    let root = b.stmt_list(&[stmt]);
    let main = b.build("main.php", root);

    let (_, sink, recorder) = run(&[classes, main]);
    assert!(sink.is_empty());
    assert_eq!(
        recorder.type_at(NodeKind::MethodCall, 1),
        UnionType::of(Type::STRING)
    );
}

#[test]
fn namespace_imports_resolve_during_inference() {
    let mut b = AstBuilder::new();
    let body = b.at(3).stmt_list(&[]);
    let class = b.at(3).class("Bar", 0, None, &[], &[], body);
    let ns_body = b.stmt_list(&[class]);
    let ns = b.at(1).namespace("Foo", ns_body);
    let root = b.stmt_list(&[ns]);
    let lib = b.build("lib.php", root);

    let mut b = AstBuilder::new();
    let use_stmt = b.at(1).use_import(use_flags::CLASS, "Foo\\Bar", Some("Baz"));
    let new = b.at(2).new_object("Baz", &[]);
    let stmt = b.expr_stmt(new);
    let root = b.stmt_list(&[use_stmt, stmt]);
    let main = b.build("main.php", root);

    let (codebase, sink, recorder) = run(&[lib, main]);
    assert!(sink.is_empty());
    let bar = codebase.fqsens.class("Foo", "Bar");
    assert_eq!(
        recorder.type_at(NodeKind::New, 2),
        UnionType::of(Type::class(bar))
    );
}

#[test]
fn class_constants_walk_the_ancestor_chain() {
    let mut b = AstBuilder::new();
    let five = b.at(2).int(5);
    let max = b.class_const_elem("MAX", five);
    let consts = b.class_const_group(0, &[max]);
    let iface_body = b.stmt_list(&[consts]);
    let iface = b
        .at(1)
        .class("HasMax", class_flags::INTERFACE, None, &[], &[], iface_body);
    let widget_body = b.at(4).stmt_list(&[]);
    let widget = b.at(4).class("Widget", 0, None, &["HasMax"], &[], widget_body);
    let root = b.stmt_list(&[iface, widget]);
    let classes = b.build("classes.php", root);

    let mut b = AstBuilder::new();
    let found = b.at(1).class_const("Widget", "MAX");
    let s1 = b.expr_stmt(found);
    let missing = b.at(2).class_const("Widget", "MISSING");
    let s2 = b.expr_stmt(missing);
    let root = b.stmt_list(&[s1, s2]);
    let main = b.build("main.php", root);

    let (_, sink, recorder) = run(&[classes, main]);
    assert_eq!(
        recorder.type_at(NodeKind::ClassConst, 1),
        UnionType::of(Type::INT)
    );
    assert_eq!(sink.len(), 1);
    assert_eq!(sink.diagnostics()[0].name, "UndeclaredClassConstant");
    assert!(recorder.type_at(NodeKind::ClassConst, 2).is_empty());
}

#[test]
fn instantiating_abstract_or_interface_reports_but_recovers() {
    let mut b = AstBuilder::new();
    let abstract_body = b.at(1).stmt_list(&[]);
    let abstract_class = b
        .at(1)
        .class("Shape", class_flags::ABSTRACT, None, &[], &[], abstract_body);
    let iface_body = b.at(2).stmt_list(&[]);
    let iface = b
        .at(2)
        .class("Renderable", class_flags::INTERFACE, None, &[], &[], iface_body);
    let new_abstract = b.at(4).new_object("Shape", &[]);
    let s1 = b.expr_stmt(new_abstract);
    let new_iface = b.at(5).new_object("Renderable", &[]);
    let s2 = b.expr_stmt(new_iface);
    let root = b.stmt_list(&[abstract_class, iface, s1, s2]);
    let tree = b.build("abstract.php", root);

    let (codebase, sink, recorder) = run(&[tree]);
    let names: Vec<_> = sink.diagnostics().iter().map(|d| d.name).collect();
    assert_eq!(names, vec![
        "TypeInstantiateAbstract",
        "TypeInstantiateInterface"
    ]);
    // Recoverable: the instance type is still inferred.
    let shape = codebase.fqsens.class("", "Shape");
    assert_eq!(
        recorder.type_at(NodeKind::New, 4),
        UnionType::of(Type::class(shape))
    );
}

#[test]
fn coalesce_strips_null_from_the_left_side() {
    let tree = expr_tree(|b| {
        let null = b.at(1).null();
        let target = b.variable("a");
        let assign = b.assign(target, null);
        let read = b.variable("a");
        let fallback = b.int(1);
        let coalesce = b.binary(binary_flags::COALESCE, read, fallback);
        let pair = b.array_elem(coalesce, NodeIndex::NONE);
        // Evaluate the assignment first, then the coalesce, inside one
        // expression: [$a = null, $a ?? 1]
        let assign_elem = b.array_elem(assign, NodeIndex::NONE);
        b.array(&[assign_elem, pair])
    });

    let (_, _, recorder) = run(&[tree]);
    assert_eq!(
        recorder.type_at(NodeKind::BinaryOp, 1),
        UnionType::of(Type::INT)
    );
}

#[test]
fn casts_map_to_single_native_types() {
    let mut b = AstBuilder::new();
    let value = b.at(1).string("5");
    let to_int = b.cast(cast_flags::INT, value);
    let s1 = b.expr_stmt(to_int);
    let value2 = b.at(2).int(5);
    let to_array = b.cast(cast_flags::ARRAY, value2);
    let s2 = b.expr_stmt(to_array);
    let root = b.stmt_list(&[s1, s2]);
    let tree = b.build("casts.php", root);

    let (_, sink, recorder) = run(&[tree]);
    assert!(sink.is_empty());
    assert_eq!(recorder.type_at(NodeKind::Cast, 1), UnionType::of(Type::INT));
    assert_eq!(
        recorder.type_at(NodeKind::Cast, 2),
        UnionType::of(Type::ARRAY)
    );
}

#[test]
fn return_type_mismatches_are_reported() {
    let mut b = AstBuilder::new();
    let text = b.at(3).string("nope");
    let ret = b.ret(text);
    let body = b.stmt_list(&[ret]);
    let int_type = b.at(2).type_name("int");
    let function = b.at(2).function("count_things", &[], int_type, body);
    let root = b.stmt_list(&[function]);
    let tree = b.build("ret.php", root);

    let (_, sink, _) = run(&[tree]);
    assert_eq!(sink.len(), 1);
    let diagnostic = &sink.diagnostics()[0];
    assert_eq!(diagnostic.name, "TypeMismatchReturn");
    assert_eq!(diagnostic.line, 3);
}

#[test]
fn calls_resolve_namespace_first_then_global() {
    // \strlen declared globally; inside namespace App a bare strlen()
    // call falls back to it.
    let mut b = AstBuilder::new();
    let int_type = b.at(1).type_name("int");
    let strlen_body = b.stmt_list(&[]);
    let strlen = b.at(1).function("strlen", &[], int_type, strlen_body);
    let root = b.stmt_list(&[strlen]);
    let global = b.build("global.php", root);

    let mut b = AstBuilder::new();
    let target = b.at(3).name("strlen");
    let call = b.call(target, &[]);
    let stmt = b.expr_stmt(call);
    let ns_body = b.stmt_list(&[stmt]);
    let ns = b.at(1).namespace("App", ns_body);
    let root = b.stmt_list(&[ns]);
    let main = b.build("main.php", root);

    let (_, sink, recorder) = run(&[global, main]);
    assert!(sink.is_empty());
    assert_eq!(
        recorder.type_at(NodeKind::Call, 3),
        UnionType::of(Type::INT)
    );
}

#[test]
fn undeclared_function_calls_report_and_infer_nothing() {
    let tree = expr_tree(|b| {
        let target = b.at(1).name("missing_function");
        b.call(target, &[])
    });

    let (_, sink, recorder) = run(&[tree]);
    assert_eq!(sink.len(), 1);
    assert_eq!(sink.diagnostics()[0].name, "UndeclaredFunction");
    assert!(recorder.type_at(NodeKind::Call, 1).is_empty());
}

#[test]
fn branch_assignments_union_into_the_outer_scope() {
    // if (true) { $x = 1; } else { $x = "s"; } $x . "";
    let mut b = AstBuilder::new();
    let cond = b.at(1).bool(true);
    let one = b.at(2).int(1);
    let x1 = b.variable("x");
    let assign1 = b.assign(x1, one);
    let s1 = b.expr_stmt(assign1);
    let then_body = b.stmt_list(&[s1]);
    let then_branch = b.if_branch(cond, then_body);
    let text = b.at(4).string("s");
    let x2 = b.variable("x");
    let assign2 = b.assign(x2, text);
    let s2 = b.expr_stmt(assign2);
    let else_body = b.stmt_list(&[s2]);
    let else_branch = b.if_branch(NodeIndex::NONE, else_body);
    let if_stmt = b.at(1).if_stmt(&[then_branch, else_branch]);
    let x3 = b.at(6).variable("x");
    let read = b.expr_stmt(x3);
    let root = b.stmt_list(&[if_stmt, read]);
    let tree = b.build("branches.php", root);

    let (_, _, recorder) = run(&[tree]);
    assert_eq!(
        recorder.type_at(NodeKind::Variable, 6),
        UnionType::from_types([Type::INT, Type::STRING])
    );
}

#[test]
fn method_bodies_see_this_parameters_and_doc_types() {
    // class Counter { /** @param int $by */ public function bump($by) {
    //   $self = $this; return $by; } }
    let mut b = AstBuilder::new();
    let by = b.at(3).param("by", NodeIndex::NONE, NodeIndex::NONE);
    let this_read = b.at(4).variable("this");
    let self_var = b.variable("self");
    let capture = b.assign(self_var, this_read);
    let capture_stmt = b.expr_stmt(capture);
    let by_read = b.at(5).variable("by");
    let ret = b.ret(by_read);
    let body = b.stmt_list(&[capture_stmt, ret]);
    let bump = b.at(3).method("bump", member_flags::PUBLIC, &[by], NodeIndex::NONE, body);
    b.doc(bump, "/** @param int $by */");
    let class_body = b.stmt_list(&[bump]);
    let class = b.at(1).class("Counter", 0, None, &[], &[], class_body);
    let root = b.stmt_list(&[class]);
    let tree = b.build("counter.php", root);

    let (codebase, sink, recorder) = run(&[tree]);
    assert!(sink.is_empty());
    let counter = codebase.fqsens.class("", "Counter");
    assert_eq!(
        recorder.type_at(NodeKind::Variable, 4),
        UnionType::of(Type::class(counter))
    );
    assert_eq!(
        recorder.type_at(NodeKind::Variable, 5),
        UnionType::of(Type::INT)
    );
}
