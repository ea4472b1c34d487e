use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use linequery::{Snapshot, Strategy};

/// Dataset shaped like the production file: short `;`-separated records.
fn build_snapshot(line_count: usize) -> Snapshot {
    Snapshot::from_lines((0..line_count).map(|i| format!("{};0;1;{};0;{};", i % 31, i, i * 3)))
}

/// Every strategy against a hit near the end and a miss.
fn bench_strategies(c: &mut Criterion) {
    let snapshot = build_snapshot(250_000);
    let hit = format!("{};0;1;{};0;{};", 249_990 % 31, 249_990, 249_990 * 3);
    let miss = "7;0;6;28;0;23;5;0;".to_string();

    let mut group = c.benchmark_group("strategies");
    group.throughput(Throughput::Bytes(snapshot.text().len() as u64));
    group.sample_size(20);

    for strategy in Strategy::ALL {
        group.bench_with_input(BenchmarkId::new("hit", strategy), &hit, |b, query| {
            b.iter(|| strategy.find(black_box(query), &snapshot));
        });
        group.bench_with_input(BenchmarkId::new("miss", strategy), &miss, |b, query| {
            b.iter(|| strategy.find(black_box(query), &snapshot));
        });
    }

    group.finish();
}

/// Default strategy across dataset sizes.
fn bench_scale(c: &mut Criterion) {
    let mut group = c.benchmark_group("linear_scale");

    for line_count in [10_000, 50_000, 250_000] {
        let snapshot = build_snapshot(line_count);
        group.throughput(Throughput::Elements(line_count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(line_count), &snapshot, |b, snapshot| {
            b.iter(|| Strategy::Linear.find(black_box("absent;line;"), snapshot));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_strategies, bench_scale);
criterion_main!(benches);
