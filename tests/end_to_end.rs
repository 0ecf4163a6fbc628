use serde_json::json;
use sliderule::{
    Analytic, AnalyticValue, ErrorKind, GroupBy, RecordAccessor, Row, Value, analyze, group_by,
};
use sliderule_test_utils::{
    assert_error_contains, assert_values_close, float_values, int_values, nullable_ints,
    sample_records,
};

fn column<T>(out: &[AnalyticValue<'_, T>], slot: usize) -> Vec<Value> {
    out.iter()
        .map(|v| v.value(slot).cloned().unwrap_or(Value::Null))
        .collect()
}

#[test]
fn test_sum_over_whole_partition() {
    let records = sample_records();
    let out = analyze(&records, &RecordAccessor, &["sum(v) partitionBy(cat) range()"]).unwrap();
    assert_eq!(column(&out, 0), int_values(&[6, 6, 6, 10]));
}

#[test]
fn test_rank_within_partition() {
    let records = sample_records();
    let out = analyze(
        &records,
        &RecordAccessor,
        &["rank() partitionBy(cat) orderBy(v asc)"],
    )
    .unwrap();
    assert_eq!(column(&out, 0), int_values(&[1, 2, 3, 1]));
}

#[test]
fn test_moving_average() {
    let records = sample_records();
    let out = analyze(
        &records,
        &RecordAccessor,
        &["avg(v) partitionBy(cat) orderBy(v asc) rows(1,0)"],
    )
    .unwrap();
    assert_values_close(&column(&out, 0), &float_values(&[1.0, 1.5, 2.5, 10.0]), 1e-12);
}

#[test]
fn test_lag_by_one() {
    let records = sample_records();
    let out = analyze(
        &records,
        &RecordAccessor,
        &["lag(v,1) partitionBy(cat) orderBy(v asc)"],
    )
    .unwrap();
    assert_eq!(column(&out, 0), nullable_ints(&[None, Some(1), Some(2), None]));
}

#[test]
fn test_json_records_with_nested_fields() {
    let records = vec![
        json!({"region": {"name": "north"}, "sales": 10}),
        json!({"region": {"name": "south"}, "sales": 4}),
        json!({"region": {"name": "north"}, "sales": 5.5}),
    ];
    let out = Analytic::new()
        .analyze_specs(
            &records,
            &RecordAccessor,
            &["Sum(sales) partitionBy(region.name)", "RowNumber() orderBy(sales desc)"],
        )
        .unwrap();
    assert_values_close(&column(&out, 0), &float_values(&[15.5, 4.0, 15.5]), 1e-12);
    assert_eq!(column(&out, 1), int_values(&[1, 3, 2]));
    assert_eq!(out[1].record()["sales"], json!(4));
}

#[test]
fn test_group_by_convenience() {
    let records = sample_records();
    let rows = group_by(&records, &RecordAccessor, &["cat"], &["Sum(v)", "Max(v)"]).unwrap();
    let summary: Vec<(Value, Value, Value)> = rows
        .iter()
        .map(|r| (r.properties()[0].clone(), r.values()[0].clone(), r.values()[1].clone()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (Value::string("A"), Value::int64(6), Value::int64(3)),
            (Value::string("B"), Value::int64(10), Value::int64(10)),
        ]
    );
}

#[test]
fn test_group_by_rollup_total() {
    let records: Vec<Row> = sample_records();
    let rows = GroupBy::builder()
        .properties(["cat"])
        .aggregators(["Count(*)"])
        .rollup(["cat"])
        .build()
        .unwrap()
        .group_by(&records, &RecordAccessor)
        .unwrap();
    let total = rows.iter().find(|r| r.is_grouped_out(0)).unwrap();
    assert_eq!(total.values()[0], Value::int64(4));
    assert_eq!(total.properties()[0], Value::Null);
}

#[test]
fn test_errors_surface_from_facade() {
    let records = sample_records();
    let result = analyze(&records, &RecordAccessor, &["Sum(v) range(1, 0)"]);
    assert_eq!(result.as_ref().map_err(|e| e.kind()).err(), Some(ErrorKind::Specification));
    assert_error_contains(result, &["orderBy"]);

    let result = group_by(&records, &RecordAccessor, &["cat"], &["Ntile(2)"]);
    assert_error_contains(result, &["analytic"]);
}
