//! Integration tests for combination extraction

use pipegrid::combination::{extract_combinations, Pipe, Step};
use pipegrid::model::{DecisionTreeRegressor, LinearRegression, Stage, StandardScaler};
use pipegrid::Error;
use pipegrid::params::{ParamKey, ParamValue};
use std::sync::Arc;

fn scaler_step() -> Step {
    Step::new("scale", Stage::transformer(StandardScaler::new()))
        .param("with_mean", vec![true, false])
}

#[test]
fn test_scale_with_mean_gives_two_combinations() {
    let pipe = Pipe::new(vec![scaler_step()]).unwrap();
    let combos = extract_combinations(&[pipe]).unwrap();

    assert_eq!(combos.len(), 2);
    let key = ParamKey::new("scale", "with_mean");
    assert_eq!(combos[0].parameters().get(&key), Some(&ParamValue::Bool(true)));
    assert_eq!(combos[1].parameters().get(&key), Some(&ParamValue::Bool(false)));
    assert_eq!(combos[0].parameters().keys().next().unwrap().to_string(), "scale__with_mean");
}

#[test]
fn test_count_is_product_and_last_key_fastest() {
    let pipe = Pipe::new(vec![
        scaler_step(),
        Step::new("tree", Stage::regressor(DecisionTreeRegressor::new()))
            .param("max_depth", vec![1, 3, 5])
            .param("min_samples_leaf", 2),
    ])
    .unwrap();
    let combos = extract_combinations(&[pipe]).unwrap();
    assert_eq!(combos.len(), 6);

    let n = |i: usize| {
        combos[i]
            .parameters()
            .get_flat("tree__max_depth")
            .and_then(ParamValue::as_usize)
            .unwrap()
    };
    assert_eq!((n(0), n(1), n(2), n(3)), (1, 3, 5, 1));
    assert!(combos.iter().all(|c| c.tag() == "scale + tree"));
}

#[test]
fn test_pipe_without_parameters_gives_one_combination() {
    let pipe = Pipe::new(vec![Step::new("lr", Stage::regressor(LinearRegression::new()))]).unwrap();
    let combos = extract_combinations(&[pipe]).unwrap();
    assert_eq!(combos.len(), 1);
    assert!(combos[0].parameters().is_empty());
}

#[test]
fn test_same_local_name_in_two_steps_stays_distinct() {
    let pipe = Pipe::new(vec![
        Step::new("first", Stage::transformer(StandardScaler::new())).param("with_std", true),
        Step::new("second", Stage::transformer(StandardScaler::new())).param("with_std", false),
        Step::new("lr", Stage::regressor(LinearRegression::new())),
    ])
    .unwrap();
    let combos = extract_combinations(&[pipe]).unwrap();
    assert_eq!(combos.len(), 1);
    let params = combos[0].parameters();
    assert_eq!(params.len(), 2);
    assert_eq!(params.get_flat("first__with_std"), Some(&ParamValue::Bool(true)));
    assert_eq!(params.get_flat("second__with_std"), Some(&ParamValue::Bool(false)));
}

#[test]
fn test_multiple_pipes_in_order_share_per_pipe_pipeline() {
    let a = Pipe::new(vec![scaler_step()]).unwrap();
    let b = Pipe::new(vec![Step::new("lr", Stage::regressor(LinearRegression::new()))
        .param("alpha", vec![0.0, 0.5, 1.0])])
    .unwrap();
    let combos = extract_combinations(&[a, b]).unwrap();

    assert_eq!(combos.len(), 5);
    assert_eq!(combos[1].tag(), "scale");
    assert_eq!(combos[2].tag(), "lr");
    assert!(Arc::ptr_eq(combos[2].pipeline(), combos[4].pipeline()));
    assert!(!Arc::ptr_eq(combos[0].pipeline(), combos[2].pipeline()));
}

#[test]
fn test_separator_in_tag_or_parameter_name_rejected() {
    // stage "a" parameter "b__c" and stage "a__b" parameter "c" would share a column
    let nested_param = Pipe::new(vec![
        Step::new("a", Stage::transformer(StandardScaler::new())).param("b__c", true),
    ]);
    assert!(matches!(nested_param, Err(Error::InvalidInput(_))));

    let nested_tag = Pipe::new(vec![
        Step::new("a__b", Stage::transformer(StandardScaler::new())).param("c", true),
    ]);
    assert!(matches!(nested_tag, Err(Error::InvalidInput(_))));

    let single_underscore = Pipe::new(vec![
        Step::new("a_b", Stage::transformer(StandardScaler::new())).param("with_std", true),
    ]);
    assert!(single_underscore.is_ok());
}

#[test]
fn test_unstorable_string_candidates_rejected() {
    let empty = Pipe::new(vec![Step::new("lr", Stage::regressor(LinearRegression::new()))
        .param("note", vec!["baseline", ""])]);
    assert!(matches!(empty, Err(Error::InvalidInput(_))));

    let sentinel = Pipe::new(vec![Step::new("lr", Stage::regressor(LinearRegression::new()))
        .param("note", "'None'")]);
    assert!(matches!(sentinel, Err(Error::InvalidInput(_))));
}
