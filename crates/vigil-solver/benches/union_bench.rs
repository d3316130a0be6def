//! Hot-path benchmarks: union construction and cast checks, the two
//! operations the inference pass performs at nearly every expression.

use criterion::{Criterion, black_box, criterion_group, criterion_main};
use vigil_common::AnalysisOptions;
use vigil_solver::{ClassRecord, CodeBase, Type, UnionType};

fn bench_union_ops(c: &mut Criterion) {
    let codebase = CodeBase::new();
    let classes: Vec<Type> = (0..16)
        .map(|i| Type::class(codebase.fqsens.class("Bench", &format!("C{i}"))))
        .collect();

    c.bench_function("union_from_types_16", |b| {
        b.iter(|| UnionType::from_types(black_box(classes.clone())))
    });

    let a = UnionType::from_types(classes[..8].to_vec());
    let b_union = UnionType::from_types(classes[4..12].to_vec());
    c.bench_function("union_merge_overlapping", |b| {
        b.iter(|| black_box(&a).union(black_box(&b_union)))
    });
}

fn bench_cast_checks(c: &mut Criterion) {
    let mut codebase = CodeBase::new();
    let options = AnalysisOptions::default();

    // A ten-deep inheritance chain to exercise hierarchy expansion.
    let mut parent = None;
    let mut leaf = None;
    for i in 0u32..10 {
        let fqsen = codebase.fqsens.class("Bench", &format!("Level{i}"));
        let mut record = ClassRecord::new(fqsen, 0, "bench.php", i + 1);
        record.parent = parent;
        codebase.declare_class(record);
        parent = Some(fqsen);
        leaf = Some(fqsen);
    }
    let root = codebase.fqsens.class("Bench", "Level0");
    let source = UnionType::of(Type::class(leaf.expect("leaf class")));
    let target = UnionType::of(Type::class(root));

    c.bench_function("cast_through_deep_hierarchy", |b| {
        b.iter(|| {
            black_box(&source).can_cast_to(black_box(&target), &codebase, &options)
        })
    });

    let scalars = UnionType::from_types([Type::INT, Type::FLOAT, Type::STRING]);
    let floats = UnionType::of(Type::FLOAT);
    c.bench_function("cast_scalar_table", |b| {
        b.iter(|| black_box(&scalars).can_cast_to(black_box(&floats), &codebase, &options))
    });
}

criterion_group!(benches, bench_union_ops, bench_cast_checks);
criterion_main!(benches);
