use sliderule_common::{RecordAccessor, Row, Value, row};
use sliderule_executor::{AggregateValue, GroupBy, GroupByConfig};
use sliderule_test_utils::{assert_error_contains, assert_values_close, int_values, lcg_sequence};

fn records() -> Vec<Row> {
    [("A", "x", 1i64), ("A", "y", 2), ("B", "x", 3), ("A", "x", 4), ("B", "y", 5)]
        .into_iter()
        .map(|(cat, sub, v)| {
            row([
                ("cat", Value::from(cat)),
                ("sub", Value::from(sub)),
                ("v", Value::from(v)),
            ])
        })
        .collect()
}

fn keys(rows: &[AggregateValue<'_, Row>]) -> Vec<(usize, Vec<Value>)> {
    rows.iter()
        .map(|r| (r.grouping_set(), r.properties().to_vec()))
        .collect()
}

fn first_values(rows: &[AggregateValue<'_, Row>]) -> Vec<Value> {
    rows.iter().map(|r| r.values()[0].clone()).collect()
}

fn key(values: [&str; 2]) -> Vec<Value> {
    values
        .iter()
        .map(|v| if v.is_empty() { Value::Null } else { Value::string(*v) })
        .collect()
}

#[test]
fn test_plain_group_by() {
    let records = records();
    let group_by = GroupBy::builder()
        .properties(["cat"])
        .aggregators(["Sum(v)", "Count(*)", "Avg(v)"])
        .build()
        .unwrap();
    let rows = group_by.group_by(&records, &RecordAccessor).unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].properties(), &[Value::string("A")]);
    assert_eq!(rows[0].values()[0], Value::int64(7));
    assert_eq!(rows[0].values()[1], Value::int64(3));
    assert_values_close(&rows[0].values()[2..], &[Value::float64(7.0 / 3.0)], 1e-12);
    assert_eq!(rows[1].values()[0], Value::int64(8));
    assert_eq!(rows[1].record().get("v"), Some(&Value::int64(3)));
    assert_eq!(rows[1].grouping_id(), 0);
}

#[test]
fn test_rollup() {
    let records = records();
    let group_by = GroupBy::builder()
        .properties(["cat", "sub"])
        .aggregators(["Sum(v)"])
        .rollup(["cat", "sub"])
        .build()
        .unwrap();
    assert_eq!(group_by.grouping_set_count(), 3);
    let rows = group_by.group_by(&records, &RecordAccessor).unwrap();

    assert_eq!(
        keys(&rows),
        vec![
            (0, key(["A", "x"])),
            (0, key(["A", "y"])),
            (0, key(["B", "x"])),
            (0, key(["B", "y"])),
            (1, key(["A", ""])),
            (1, key(["B", ""])),
            (2, key(["", ""])),
        ]
    );
    assert_eq!(first_values(&rows), int_values(&[5, 2, 3, 5, 7, 8, 15]));
    assert!(rows[4].is_grouped_out(1));
    assert!(!rows[4].is_grouped_out(0));
    assert_eq!(rows[4].grouping_id(), 0b01);
    assert_eq!(rows[6].grouping_id(), 0b11);
}

#[test]
fn test_cube() {
    let records = records();
    let rows = GroupBy::builder()
        .properties(["cat", "sub"])
        .aggregators(["Sum(v)"])
        .cube(["cat", "sub"])
        .build()
        .unwrap()
        .group_by(&records, &RecordAccessor)
        .unwrap();

    let sub_totals: Vec<(Vec<Value>, Value)> = rows
        .iter()
        .filter(|r| r.is_grouped_out(0) && !r.is_grouped_out(1))
        .map(|r| (r.properties().to_vec(), r.values()[0].clone()))
        .collect();
    assert_eq!(
        sub_totals,
        vec![
            (key(["", "x"]), Value::int64(8)),
            (key(["", "y"]), Value::int64(7)),
        ]
    );
    assert_eq!(rows.len(), 4 + 2 + 2 + 1);
    assert_eq!(rows.last().map(|r| r.values()[0].clone()), Some(Value::int64(15)));
}

#[test]
fn test_explicit_grouping_sets() {
    let records = records();
    let rows = GroupBy::builder()
        .properties(["cat", "sub"])
        .aggregators(["Count(v)"])
        .grouping_sets([vec!["sub"], vec![]])
        .build()
        .unwrap()
        .group_by(&records, &RecordAccessor)
        .unwrap();
    assert_eq!(
        keys(&rows),
        vec![(0, key(["", "x"])), (0, key(["", "y"])), (1, key(["", ""]))]
    );
    assert_eq!(first_values(&rows), int_values(&[3, 2, 5]));
}

#[test]
fn test_merge_and_reiterate_agree() {
    let values = lcg_sequence(99, 120, 50);
    let records: Vec<Row> = values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            row([
                ("a", Value::from((i % 3) as i64)),
                ("b", Value::from((i % 5) as i64)),
                ("v", Value::int64(*v)),
            ])
        })
        .collect();
    let specs = [
        "Sum(v)",
        "Avg(v)",
        "Variance(v)",
        "Median(v)",
        "Mode(v)",
        "First(v)",
        "Last(v)",
        "Collect(v)",
        "Min(v)",
        "Max(v)",
    ];

    let run = |use_merge: bool| {
        GroupBy::builder()
            .properties(["a", "b"])
            .aggregators(specs)
            .cube(["a", "b"])
            .config(GroupByConfig::default().with_merge(use_merge))
            .build()
            .unwrap()
            .group_by(&records, &RecordAccessor)
            .unwrap()
    };
    let merged = run(true);
    let iterated = run(false);

    assert_eq!(keys(&merged), keys(&iterated));
    for (m, i) in merged.iter().zip(&iterated) {
        assert_values_close(m.values(), i.values(), 1e-9);
    }
}

#[test]
fn test_empty_input() {
    let records: Vec<Row> = Vec::new();
    let rows = GroupBy::builder()
        .properties(["cat"])
        .aggregators(["Sum(v)"])
        .rollup(["cat"])
        .build()
        .unwrap()
        .group_by(&records, &RecordAccessor)
        .unwrap();
    assert!(rows.is_empty());
}

#[test]
fn test_type_error_propagates() {
    let records = records();
    let result = GroupBy::builder()
        .properties(["cat"])
        .aggregators(["Sum(sub)"])
        .build()
        .unwrap()
        .group_by(&records, &RecordAccessor);
    assert_error_contains(result, &["type mismatch"]);
}
