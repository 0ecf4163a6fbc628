use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use sliderule::{Analytic, AnalyticConfig, GroupBy, RecordAccessor, Row, Value, row};

#[derive(Debug, Clone, Copy)]
enum DatasetSize {
    Small,
    Medium,
    Large,
}

impl DatasetSize {
    fn rows(&self) -> usize {
        match self {
            DatasetSize::Small => 1_000,
            DatasetSize::Medium => 10_000,
            DatasetSize::Large => 100_000,
        }
    }

    fn all() -> &'static [DatasetSize] {
        &[DatasetSize::Small, DatasetSize::Medium, DatasetSize::Large]
    }
}

fn sales(rows: usize) -> Vec<Row> {
    let regions = ["north", "south", "east", "west"];
    (0..rows)
        .map(|i| {
            row([
                ("id", Value::from(i)),
                ("region", Value::from(regions[i % regions.len()])),
                ("store", Value::from((i % 37) as i64)),
                ("amount", Value::float64(10.0 + (i * 7919 % 1000) as f64 / 10.0)),
            ])
        })
        .collect()
}

fn bench_window_functions(c: &mut Criterion) {
    let mut group = c.benchmark_group("window_functions");
    let analytic = Analytic::new();

    for &size in DatasetSize::all() {
        let rows = size.rows();
        let records = sales(rows);
        group.throughput(Throughput::Elements(rows as u64));

        let cases = [
            ("running_sum", "Sum(amount) partitionBy(region) orderBy(id)"),
            ("moving_avg", "Avg(amount) partitionBy(region) orderBy(id) rows(10, 0)"),
            ("moving_median", "Median(amount) partitionBy(region) orderBy(id) rows(50, 50)"),
            ("rank", "Rank() partitionBy(store) orderBy(amount desc)"),
            ("lag", "Lag(amount, 3) partitionBy(region) orderBy(id)"),
            ("value_range", "Count(*) orderBy(amount) range(5, 5)"),
        ];
        for (name, spec) in cases {
            group.bench_with_input(BenchmarkId::new(name, rows), &records, |b, records| {
                b.iter(|| {
                    black_box(analytic.analyze_specs(records, &RecordAccessor, &[spec])).unwrap();
                });
            });
        }
    }
    group.finish();
}

fn bench_sort_reuse(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort_reuse");
    let records = sales(DatasetSize::Medium.rows());
    let specs = [
        "Sum(amount) partitionBy(region)",
        "Rank() partitionBy(region) orderBy(amount)",
        "CumeDist() partitionBy(region) orderBy(amount, id)",
        "Avg(amount) partitionBy(region, store) orderBy(amount)",
    ];

    for reuse in [true, false] {
        let analytic =
            Analytic::with_config(AnalyticConfig::default().with_reuse_sorted_views(reuse));
        group.bench_function(BenchmarkId::new("mixed", reuse), |b| {
            b.iter(|| {
                black_box(analytic.analyze_specs(&records, &RecordAccessor, &specs)).unwrap();
            });
        });
    }
    group.finish();
}

fn bench_group_by(c: &mut Criterion) {
    let mut group = c.benchmark_group("group_by");
    let records = sales(DatasetSize::Medium.rows());

    for use_merge in [true, false] {
        let group_by = GroupBy::builder()
            .properties(["region", "store"])
            .aggregators(["Sum(amount)", "Avg(amount)", "Median(amount)"])
            .cube(["region", "store"])
            .config(sliderule::GroupByConfig::default().with_merge(use_merge))
            .build()
            .unwrap();
        group.bench_function(BenchmarkId::new("cube", use_merge), |b| {
            b.iter(|| {
                black_box(group_by.group_by(&records, &RecordAccessor)).unwrap();
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_window_functions, bench_sort_reuse, bench_group_by);
criterion_main!(benches);
