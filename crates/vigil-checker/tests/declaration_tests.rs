//! Declaration-pass behavior: symbol registration, alternate ids,
//! namespace and import threading, doc-comment refinement.

use vigil_ast::flags::{member_flags, use_flags};
use vigil_ast::{AstBuilder, NodeIndex, SourceTree};
use vigil_checker::{Plugin, declare_file};
use vigil_common::diagnostics::DiagnosticCollector;
use vigil_solver::{ArrayKey, CodeBase, Type, UnionType};

fn declare(trees: &[SourceTree]) -> (CodeBase, DiagnosticCollector) {
    let mut codebase = CodeBase::new();
    let mut sink = DiagnosticCollector::new();
    let plugins: Vec<Box<dyn Plugin>> = Vec::new();
    for tree in trees {
        declare_file(&mut codebase, tree, &mut sink, &plugins);
    }
    (codebase, sink)
}

/// `if (true) { class A {} } else { class A {} }`
fn conditional_duplicate_tree() -> SourceTree {
    let mut b = AstBuilder::new();
    let cond = b.at(1).bool(true);
    let body_a = b.at(2).stmt_list(&[]);
    let class_a = b.at(2).class("A", 0, None, &[], &[], body_a);
    let then_body = b.stmt_list(&[class_a]);
    let then_branch = b.if_branch(cond, then_body);
    let body_b = b.at(5).stmt_list(&[]);
    let class_b = b.at(5).class("A", 0, None, &[], &[], body_b);
    let else_body = b.stmt_list(&[class_b]);
    let else_branch = b.if_branch(NodeIndex::NONE, else_body);
    let if_stmt = b.at(1).if_stmt(&[then_branch, else_branch]);
    let root = b.stmt_list(&[if_stmt]);
    b.build("cond.php", root)
}

#[test]
fn conditional_branches_declare_alternates_silently() {
    let (codebase, sink) = declare(&[conditional_duplicate_tree()]);

    let base = codebase.fqsens.class("", "A");
    let alt = codebase.fqsens.with_alternate(base, 1);
    assert!(codebase.has_class(base));
    assert!(codebase.has_class(alt));
    assert_eq!(codebase.fqsens.display(alt), "\\A,1");
    assert!(sink.is_empty(), "conditional redeclaration is legal");
}

#[test]
fn unconditional_redeclaration_still_declares_but_reports() {
    let mut b = AstBuilder::new();
    let body_a = b.at(1).stmt_list(&[]);
    let first = b.at(1).class("Widget", 0, None, &[], &[], body_a);
    let body_b = b.at(8).stmt_list(&[]);
    let second = b.at(8).class("Widget", 0, None, &[], &[], body_b);
    let root = b.stmt_list(&[first, second]);
    let tree = b.build("dup.php", root);

    let (codebase, sink) = declare(&[tree]);
    let base = codebase.fqsens.class("", "Widget");
    assert!(codebase.has_class(base));
    assert!(codebase.has_class(codebase.fqsens.with_alternate(base, 1)));
    assert_eq!(sink.len(), 1);
    assert_eq!(sink.diagnostics()[0].name, "RedefinedClass");
    assert_eq!(sink.diagnostics()[0].line, 8);
}

#[test]
fn redeclaring_a_flushed_file_reproduces_identical_ids() {
    let tree = conditional_duplicate_tree();
    let (mut codebase, _) = declare(&[tree.clone()]);

    let base = codebase.fqsens.class("", "A");
    let before: Vec<_> = [0, 1]
        .iter()
        .map(|&alt| {
            let id = codebase.fqsens.with_alternate(base, alt);
            codebase
                .class(id)
                .map(|record| (record.fqsen, record.lineno))
        })
        .collect();

    codebase.flush_file("cond.php");
    assert!(!codebase.has_class(base));

    let mut sink = DiagnosticCollector::new();
    declare_file(&mut codebase, &tree, &mut sink, &[]);
    let after: Vec<_> = [0, 1]
        .iter()
        .map(|&alt| {
            let id = codebase.fqsens.with_alternate(base, alt);
            codebase
                .class(id)
                .map(|record| (record.fqsen, record.lineno))
        })
        .collect();

    assert_eq!(before, after);
}

#[test]
fn braceless_namespace_applies_to_following_statements() {
    let mut b = AstBuilder::new();
    let ns = b.at(1).namespace("App\\Http", NodeIndex::NONE);
    let body = b.at(3).stmt_list(&[]);
    let class = b.at(3).class("Controller", 0, None, &[], &[], body);
    let root = b.stmt_list(&[ns, class]);
    let tree = b.build("ns.php", root);

    let (codebase, _) = declare(&[tree]);
    assert!(codebase.has_class(codebase.fqsens.class("App\\Http", "Controller")));
    assert!(!codebase.has_class(codebase.fqsens.class("", "Controller")));
}

#[test]
fn heritage_names_resolve_through_imports() {
    let mut b = AstBuilder::new();
    let use_stmt = b.at(1).use_import(use_flags::CLASS, "Vendor\\Widgets\\Base", Some("Base"));
    let body = b.at(3).stmt_list(&[]);
    let class = b.at(3).class("Widget", 0, Some("Base"), &[], &[], body);
    let root = b.stmt_list(&[use_stmt, class]);
    let tree = b.build("imports.php", root);

    let (codebase, _) = declare(&[tree]);
    let widget = codebase.fqsens.class("", "Widget");
    let record = codebase.class(widget).expect("widget declared");
    let parent = record.parent.expect("parent resolved");
    assert_eq!(codebase.fqsens.display(parent), "\\Vendor\\Widgets\\Base");
}

#[test]
fn members_register_with_types_from_hints_and_docs() {
    let mut b = AstBuilder::new();

    // /** @var int[] */ public $sizes;
    let sizes = b.at(2).property_elem("sizes", NodeIndex::NONE);
    let sizes_group = b.property_group(member_flags::PUBLIC, NodeIndex::NONE, &[sizes]);
    b.doc(sizes_group, "/** @var int[] */");

    // public ?string $label;
    let string_type = b.at(3).type_name("string");
    let label_type = b.nullable_type(string_type);
    let label = b.property_elem("label", NodeIndex::NONE);
    let label_group = b.property_group(member_flags::PUBLIC, label_type, &[label]);

    // const MAX = 10;
    let max_value = b.at(4).int(10);
    let max = b.class_const_elem("MAX", max_value);
    let consts = b.class_const_group(0, &[max]);

    // /** @param int|string $count  @return bool */
    // public function check($count) { }
    let count = b.at(6).param("count", NodeIndex::NONE, NodeIndex::NONE);
    let check_body = b.stmt_list(&[]);
    let check = b.method(
        "check",
        member_flags::PUBLIC,
        &[count],
        NodeIndex::NONE,
        check_body,
    );
    b.doc(check, "/**\n * @param int|string $count\n * @return bool\n */");

    let body = b.stmt_list(&[sizes_group, label_group, consts, check]);
    let class = b.at(1).class("Widget", 0, None, &[], &[], body);
    let root = b.stmt_list(&[class]);
    let tree = b.build("members.php", root);

    let (codebase, sink) = declare(&[tree]);
    assert!(sink.is_empty());

    let widget = codebase.fqsens.class("", "Widget");
    let record = codebase.class(widget).expect("widget declared");

    let sizes = record.property("sizes").expect("sizes property");
    assert_eq!(
        sizes.union_type,
        UnionType::of(Type::generic_array(ArrayKey::Mixed, Type::INT))
    );

    let label = record.property("label").expect("label property");
    assert_eq!(
        label.union_type,
        UnionType::from_types([Type::STRING, Type::NULL])
    );

    let max = record.constant("MAX").expect("MAX constant");
    assert_eq!(max.union_type, UnionType::of(Type::INT));
    assert!(record.constant("max").is_none(), "constants keep case");

    let check = record.method("check").expect("check method");
    assert_eq!(check.return_type, UnionType::of(Type::BOOL));
    assert_eq!(check.parameters.len(), 1);
    assert_eq!(
        check.parameters[0].union_type,
        UnionType::from_types([Type::INT, Type::STRING])
    );
}

#[test]
fn duplicate_members_keep_the_first_and_report() {
    let mut b = AstBuilder::new();
    let body_a = b.at(2).stmt_list(&[]);
    let first = b.at(2).method("render", member_flags::PUBLIC, &[], NodeIndex::NONE, body_a);
    let body_b = b.at(5).stmt_list(&[]);
    let int_type = b.type_name("int");
    let second = b.at(5).method("render", member_flags::PUBLIC, &[], int_type, body_b);
    let body = b.stmt_list(&[first, second]);
    let class = b.at(1).class("Widget", 0, None, &[], &[], body);
    let root = b.stmt_list(&[class]);
    let tree = b.build("dupmember.php", root);

    let (codebase, sink) = declare(&[tree]);
    let widget = codebase.fqsens.class("", "Widget");
    let record = codebase.class(widget).expect("widget declared");
    let render = record.method("render").expect("first render kept");
    assert!(render.return_type.is_empty(), "first declaration wins");
    assert_eq!(sink.len(), 1);
    assert_eq!(sink.diagnostics()[0].name, "RedefinedClassMember");
}

#[test]
fn closures_declare_under_the_synthetic_name() {
    let mut b = AstBuilder::new();
    let closure_body = b.at(3).stmt_list(&[]);
    let closure = b.at(3).closure(&[], NodeIndex::NONE, closure_body);
    let assign_target = b.variable("fn");
    let assign = b.assign(assign_target, closure);
    let stmt = b.expr_stmt(assign);
    let fn_body = b.stmt_list(&[stmt]);
    let function = b.at(2).function("makeCounter", &[], NodeIndex::NONE, fn_body);
    let root = b.stmt_list(&[function]);
    let tree = b.build("closures.php", root);

    let (codebase, sink) = declare(&[tree]);
    assert!(sink.is_empty());
    assert!(codebase.has_function(codebase.fqsens.function("", "makeCounter")));
    let closure_fqsen = codebase.fqsens.function("", "{closure}");
    let record = codebase.function(closure_fqsen).expect("closure declared");
    assert_ne!(record.flags & vigil_solver::function_modifiers::CLOSURE, 0);
}

#[test]
fn global_constants_are_case_sensitive() {
    let mut b = AstBuilder::new();
    let one = b.at(1).int(1);
    let upper = b.const_elem("LIMIT", one);
    let two = b.int(2);
    let lower = b.const_elem("limit", two);
    let group = b.const_group(&[upper, lower]);
    let root = b.stmt_list(&[group]);
    let tree = b.build("consts.php", root);

    let (codebase, _) = declare(&[tree]);
    let upper = codebase.fqsens.global_constant("", "LIMIT");
    let lower = codebase.fqsens.global_constant("", "limit");
    assert_ne!(upper, lower);
    assert!(codebase.has_constant(upper));
    assert!(codebase.has_constant(lower));
}
