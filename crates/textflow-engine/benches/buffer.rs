use criterion::{Criterion, criterion_group, criterion_main};
use textflow_engine::{FlowSnapshot, IndentConfig, RichTextStyle, TextAlignment};
mod common;

fn bench_buffer_edits(c: &mut Criterion) {
    let mut group = c.benchmark_group("buffer");
    group.sample_size(10);

    let buffer = common::generate_styled_buffer(100);
    let middle = buffer.len() / 2;

    group.bench_function("insert_text", |b| {
        let mut buf = buffer.clone();
        b.iter(|| {
            let result = buf.insert_text(
                std::hint::black_box(middle),
                std::hint::black_box("typed"),
                RichTextStyle::default(),
            );
            std::hint::black_box(result)
        });
    });

    group.bench_function("delete_range", |b| {
        b.iter_batched(
            || buffer.clone(),
            |mut buf| {
                let result = buf.delete_range(std::hint::black_box(middle), 200);
                std::hint::black_box(result)
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.bench_function("apply_style", |b| {
        b.iter_batched(
            || buffer.clone(),
            |mut buf| {
                let len = buf.len();
                let result = buf.apply_style(0, std::hint::black_box(len), |style| {
                    style.clone().with_underline(true)
                });
                std::hint::black_box(result)
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_snapshot_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot");
    group.sample_size(10);

    let indent = IndentConfig::default();
    for (name, buffer) in [
        ("styled_100", common::generate_styled_buffer(100)),
        ("tables_20", common::generate_table_buffer(20)),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| {
                let snapshot =
                    FlowSnapshot::build(std::hint::black_box(&buffer), TextAlignment::Left, &indent);
                std::hint::black_box(snapshot)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_buffer_edits, bench_snapshot_build);
criterion_main!(benches);
