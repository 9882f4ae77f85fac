use boristype_core::codegen::CodeGenerator;
use boristype_core::config::CompilerConfig;
use boristype_core::di::{Container, SourceFile};
use boristype_core::diagnostics::CollectingDiagnosticHandler;
use boristype_core::parser::parse_source;
use boristype_core::pipeline::Pipeline;
use boristype_core::typeinfo::DeclaredTypes;
use boristype_test_helpers::fixtures;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::Arc;

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_kitchen_sink", |b| {
        b.iter(|| parse_source(black_box(fixtures::KITCHEN_SINK)).ok())
    });
}

fn bench_lower_and_emit(c: &mut Criterion) {
    let pipeline = Pipeline::new();
    let mut group = c.benchmark_group("lower_and_emit");
    for count in [1usize, 10, 50] {
        let source = fixtures::repeated(fixtures::KITCHEN_SINK, count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &source, |b, source| {
            b.iter(|| {
                let program = parse_source(black_box(source)).ok()?;
                let oracle = DeclaredTypes::infer(&program);
                let output = pipeline.run(program, &oracle, "bench.ts").ok()?;
                Some(CodeGenerator::new().generate(&output.program))
            })
        });
    }
    group.finish();
}

fn bench_batch(c: &mut Criterion) {
    let files: Vec<SourceFile> = (0..64)
        .map(|i| SourceFile::new(format!("file{}.ts", i), fixtures::NESTED_LOOPS))
        .collect();
    let container = Container::with_dependencies(
        CompilerConfig::default(),
        Arc::new(CollectingDiagnosticHandler::new()),
    );

    c.bench_function("batch_64_files", |b| {
        b.iter(|| container.compile_batch(black_box(&files)))
    });
}

criterion_group!(benches, bench_parse, bench_lower_and_emit, bench_batch);
criterion_main!(benches);
