use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use kaizen_utils::regexp::{Direction, max_possible_paths, parse_literal};
use kaizen_utils::{
    NodeKind, ParsedFile, ReferenceTracker, ReferenceTrackerOptions, SideEffectOptions, TraceMap,
    VisitorKeys, get_static_value, has_side_effect, is_safe_regex,
};

fn generate_constants(count: usize) -> String {
    let mut code = String::with_capacity(count * 80);
    for i in 0..count {
        code.push_str(&format!(
            "const name{i} = 'item' + {i};\n\
             const parts{i} = [name{i}, 'x'].join('-').toUpperCase();\n"
        ));
    }
    code
}

fn generate_module_usage(count: usize) -> String {
    let mut code = String::from("const fs = require('fs');\nconst { exists } = fs;\n");
    for i in 0..count {
        code.push_str(&format!(
            "function read{i}(p) {{\n  \
             if (exists(p)) {{ return fs.readFileSync(p); }}\n  \
             return new Buffer({i});\n}}\n"
        ));
    }
    code
}

fn trace_map() -> TraceMap<()> {
    TraceMap::new()
        .child(
            "fs",
            TraceMap::new()
                .child("exists", TraceMap::new().call(()))
                .child("readFileSync", TraceMap::new().call(())),
        )
        .child("Buffer", TraceMap::new().construct(()))
}

fn bench_static_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("static_value");

    for size in [10, 100] {
        let code = generate_constants(size);
        let file = ParsedFile::from_source("bench.js", &code);
        let ctx = file.context();
        let inits: Vec<_> = file
            .ast()
            .iter()
            .filter_map(|node| match &node.kind {
                NodeKind::VariableDeclarator { init, .. } => *init,
                _ => None,
            })
            .collect();

        group.throughput(Throughput::Elements(inits.len() as u64));
        group.bench_with_input(BenchmarkId::new("declarators", size), &inits, |b, inits| {
            b.iter(|| {
                for &init in inits {
                    black_box(get_static_value(&ctx, init, Some(ctx.global_scope())));
                }
            })
        });
    }

    group.finish();
}

fn bench_reference_tracking(c: &mut Criterion) {
    let mut group = c.benchmark_group("reference_tracker");
    let code = generate_module_usage(100);
    let file = ParsedFile::from_source("bench.js", &code);
    let ctx = file.context();
    let map = trace_map();

    group.bench_function("cjs_100_functions", |b| {
        b.iter(|| {
            let tracker =
                ReferenceTracker::new(&ctx, ctx.global_scope(), ReferenceTrackerOptions::default());
            black_box(tracker.iterate_cjs_references(&map).count())
        })
    });

    group.bench_function("globals_100_functions", |b| {
        b.iter(|| {
            let tracker =
                ReferenceTracker::new(&ctx, ctx.global_scope(), ReferenceTrackerOptions::default());
            black_box(tracker.iterate_global_references(&map).count())
        })
    });

    group.finish();
}

fn bench_side_effects(c: &mut Criterion) {
    let mut group = c.benchmark_group("side_effect");
    let code = generate_constants(100);
    let file = ParsedFile::from_source("bench.js", &code);
    let ast = file.ast();
    let keys = VisitorKeys::default();

    group.bench_function("program_100_constants", |b| {
        b.iter(|| black_box(has_side_effect(ast, ast.root(), &keys, SideEffectOptions::default())))
    });

    group.finish();
}

fn bench_regex_paths(c: &mut Criterion) {
    let mut group = c.benchmark_group("regex_safety");
    let literals = [
        "/^[a-z0-9._%+-]+@[a-z0-9.-]+\\.[a-z]{2,}$/i",
        "/(a|b|c){2,4}d/",
        "/^(?:\\d{1,3}\\.){3}\\d{1,3}$/",
        "/(?<year>\\d{4})-(?<month>\\d{2})/u",
    ];

    group.bench_function("is_safe_regex", |b| {
        b.iter(|| {
            for literal in literals {
                black_box(is_safe_regex(literal));
            }
        })
    });

    let parsed: Vec<_> = literals
        .iter()
        .map(|l| parse_literal(l).expect("valid regex"))
        .collect();
    group.bench_function("max_possible_paths", |b| {
        b.iter(|| {
            for literal in &parsed {
                black_box(max_possible_paths(&literal.pattern, Direction::Ltr));
            }
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_static_evaluation,
    bench_reference_tracking,
    bench_side_effects,
    bench_regex_paths
);
criterion_main!(benches);
