//! Testing utilities for sliderule.

#![allow(dead_code)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::broken_intra_doc_links)]

use sliderule_common::{Result, Row, Value, row};

pub fn assert_float_eq(actual: f64, expected: f64, epsilon: f64) {
    let diff = (actual - expected).abs();
    assert!(
        diff < epsilon,
        "Float values not equal within epsilon: actual={}, expected={}, diff={}, epsilon={}",
        actual,
        expected,
        diff,
        epsilon
    );
}

pub fn assert_value_float_eq(actual: &Value, expected: f64, epsilon: f64) {
    match actual.as_f64() {
        Some(actual) => assert_float_eq(actual, expected, epsilon),
        None => panic!("Expected a numeric value near {} but got {:?}", expected, actual),
    }
}

/// Compares two columns of numeric values element-wise; nulls must line up.
pub fn assert_values_close(actual: &[Value], expected: &[Value], epsilon: f64) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "column lengths differ: {:?} vs {:?}",
        actual,
        expected
    );
    for (index, (a, e)) in actual.iter().zip(expected).enumerate() {
        match (a.as_f64(), e.as_f64()) {
            (Some(a), Some(e)) => assert!(
                (a - e).abs() < epsilon,
                "row {}: {} differs from {} by more than {}",
                index,
                a,
                e,
                epsilon
            ),
            _ => assert_eq!(a, e, "row {}", index),
        }
    }
}

pub fn assert_error_contains<T>(result: Result<T>, keywords: &[&str]) {
    match result {
        Ok(_) => panic!("Expected error but got Ok result"),
        Err(e) => {
            let error_msg = e.to_string().to_lowercase();
            let found = keywords
                .iter()
                .any(|keyword| error_msg.contains(&keyword.to_lowercase()));
            assert!(
                found,
                "Error message '{}' does not contain any of the expected keywords: {:?}",
                e, keywords
            );
        }
    }
}

pub fn cat_row(cat: &str, v: impl Into<Value>) -> Row {
    row([("cat", Value::string(cat)), ("v", v.into())])
}

/// `[(A,1), (A,2), (A,3), (B,10)]`
pub fn sample_records() -> Vec<Row> {
    vec![
        cat_row("A", 1i64),
        cat_row("A", 2i64),
        cat_row("A", 3i64),
        cat_row("B", 10i64),
    ]
}

/// Rows with a single `v` field, one per value.
pub fn value_rows<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Vec<Row> {
    values.into_iter().map(|v| row([("v", v.into())])).collect()
}

pub fn int_values(values: &[i64]) -> Vec<Value> {
    values.iter().copied().map(Value::int64).collect()
}

pub fn float_values(values: &[f64]) -> Vec<Value> {
    values.iter().copied().map(Value::float64).collect()
}

pub fn nullable_ints(values: &[Option<i64>]) -> Vec<Value> {
    values
        .iter()
        .map(|v| v.map_or(Value::Null, Value::int64))
        .collect()
}

/// A deterministic pseudo-random sequence for property-style tests.
pub fn lcg_sequence(seed: u64, len: usize, modulus: i64) -> Vec<i64> {
    let mut state = seed;
    (0..len)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((state >> 33) % modulus as u64) as i64
        })
        .collect()
}
