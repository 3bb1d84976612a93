mod common;

use common::init_logger;
use malla::{CalcValues, FieldValue, evaluate_expression};

fn values(pairs: &[(&str, FieldValue)]) -> CalcValues {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

#[test]
fn precedence_with_substituted_tokens() {
    init_logger();
    let vals = values(&[
        ("r0c0", 2.0.into()),
        ("r0c1", 3.0.into()),
        ("r0c2", 4.0.into()),
        ("r0c3", 1.0.into()),
    ]);
    assert_eq!(evaluate_expression("r0c0 + r0c1 * (r0c2 - r0c3)", &vals), 11.0);

    let vals = values(&[("r0c0", 4.0.into())]);
    assert_eq!(evaluate_expression("r0c0 / 2 + 3.5", &vals), 5.5);
}

#[test]
fn words_fail_the_allow_list() {
    let vals = values(&[("r0c0", 2.0.into())]);
    assert!(evaluate_expression("r0c0 + unknown", &vals).is_nan());
    assert!(evaluate_expression("Math.max(1, 2)", &vals).is_nan());
    assert!(evaluate_expression("1, 2", &vals).is_nan());
}

#[test]
fn numeric_text_is_read_as_a_number() {
    let vals = values(&[("r1c2", "2.5".into())]);
    assert_eq!(evaluate_expression("r1c2 * 2 + 0.5", &vals), 5.5);

    let vals = values(&[("r0c0", " 12kg".into())]);
    assert_eq!(evaluate_expression("r0c0 / 4", &vals), 3.0);
}

#[test]
fn missing_or_non_numeric_values_count_as_zero() {
    let vals = values(&[("r0c1", "n/a".into()), ("r0c2", true.into())]);
    assert_eq!(evaluate_expression("r0c0 + 7", &vals), 7.0);
    assert_eq!(evaluate_expression("r0c1 + 1", &vals), 1.0);
    assert_eq!(evaluate_expression("r0c2 + 1", &vals), 1.0);
}

#[test]
fn negative_values_substitute_cleanly() {
    let vals = values(&[("r0c0", (-4.0).into()), ("r0c1", (-2.0).into())]);
    assert_eq!(evaluate_expression("r0c0 - r0c1", &vals), -2.0);
    assert_eq!(evaluate_expression("r0c0 * r0c1", &vals), 8.0);
}

#[test]
fn empty_and_malformed_expressions_are_nan() {
    let vals = CalcValues::new();
    assert!(evaluate_expression("", &vals).is_nan());
    assert!(evaluate_expression("   ", &vals).is_nan());
    assert!(evaluate_expression("1 +", &vals).is_nan());
    assert!(evaluate_expression("(1 + 2", &vals).is_nan());
    assert!(evaluate_expression("1..2", &vals).is_nan());
}

#[test]
fn division_by_zero_is_nan() {
    let vals = CalcValues::new();
    assert!(evaluate_expression("1 / 0", &vals).is_nan());
    assert!(evaluate_expression("0 / 0", &vals).is_nan());
    assert_eq!(evaluate_expression("0 / 5", &vals), 0.0);
}

#[test]
fn plain_arithmetic_without_tokens() {
    let vals = CalcValues::new();
    assert_eq!(evaluate_expression("2 * (3 + 4) - 10 / 4", &vals), 11.5);
    assert_eq!(evaluate_expression("-(2 + 3)", &vals), -5.0);
    assert_eq!(evaluate_expression("007 + .5", &vals), 7.5);
}

#[test]
fn field_value_readings() {
    assert_eq!(FieldValue::from(3.0).as_number(), Some(3.0));
    assert_eq!(FieldValue::from("1e2").as_number(), Some(100.0));
    assert_eq!(FieldValue::from(true).as_number(), None);
    assert_eq!(FieldValue::Number(f64::INFINITY).as_number(), None);
    assert!(FieldValue::from(true).as_bool());
    assert!(!FieldValue::from("true").as_bool());
    assert_eq!(FieldValue::from("x").as_text(), Some("x"));
}

#[test]
fn runaway_nesting_is_nan_not_a_crash() {
    let vals = CalcValues::new();
    let parens = format!("{}1{}", "(".repeat(20_000), ")".repeat(20_000));
    assert!(evaluate_expression(&parens, &vals).is_nan());

    let signs = format!("{}1", "-".repeat(20_000));
    assert!(evaluate_expression(&signs, &vals).is_nan());

    let vals = values(&[("r0c0", 3.0.into())]);
    assert_eq!(evaluate_expression("((((r0c0))))", &vals), 3.0);
    assert_eq!(evaluate_expression("--r0c0", &vals), 3.0);
}
