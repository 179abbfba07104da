//! 🏎️ How fast can a tuple put on a schema? Criterion knows.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use kvb::{FieldSchema, FieldType, ModeResolver, OutputMode, RecordSchema, SchemaResolver};

fn bench_assemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("assemble");

    let cases = [
        (OutputMode::KeyOnly, RecordSchema::default_for(OutputMode::KeyOnly)),
        (OutputMode::ValueOnly, RecordSchema::default_for(OutputMode::ValueOnly)),
        (OutputMode::KeyValue, RecordSchema::default_for(OutputMode::KeyValue)),
    ];
    for (mode, schema) in cases {
        let resolver = SchemaResolver::new(schema);
        group.bench_with_input(BenchmarkId::new("strings", mode), &mode, |b, &mode| {
            b.iter(|| resolver.assemble(mode, black_box("the-key"), black_box("the-value")))
        });
    }

    // -- 🔢 typed slots pay for parsing; this is the "word count" shape
    let typed = SchemaResolver::new(
        RecordSchema::new(
            "WordCount",
            vec![
                FieldSchema::new("word", FieldType::String),
                FieldSchema::new("count", FieldType::Long),
            ],
        )
        .expect("valid bench schema"),
    );
    group.bench_function("typed_kv", |b| {
        b.iter(|| typed.assemble(OutputMode::KeyValue, black_box("rust"), black_box("1234567")))
    });

    group.finish();
}

criterion_group!(benches, bench_assemble);
criterion_main!(benches);
