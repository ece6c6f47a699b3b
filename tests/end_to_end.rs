// SPDX-License-Identifier: MIT OR Apache-2.0

use propgrad::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

fn identity() -> PropertyFn {
    Arc::new(|args: &[Node]| args[0].clone())
}

fn sum_pair() -> PropertyFn {
    Arc::new(|args: &[Node]| &args[0] + &args[1])
}

fn product_of_sums() -> PropertyFn {
    Arc::new(|args: &[Node]| {
        let ab = &args[0] + &args[1];
        let cd = &args[2] + &args[3];
        &ab * &cd
    })
}

fn build_store() -> Store {
    let mut store = Store::new();
    store.add_prop("a", vec!["g".into()], identity()).unwrap();
    store.add_prop("b", vec!["g".into()], identity()).unwrap();
    store.add_prop("c", vec!["h".into()], identity()).unwrap();
    store.add_prop("d", vec!["h".into()], identity()).unwrap();
    store
        .add_prop(
            "f",
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            product_of_sums(),
        )
        .unwrap();
    store.initialize(false).unwrap();
    store
}

fn scalar_params(g: f64, h: f64) -> HashMap<String, PropertyValue> {
    let mut params = HashMap::new();
    params.insert("g".to_string(), PropertyValue::Scalar(g));
    params.insert("h".to_string(), PropertyValue::Scalar(h));
    params
}

#[test]
fn scenario_1_scalar_query_and_memoization() {
    let mut store = build_store();
    let params = scalar_params(1.0, 2.0);

    let first = store.get_prop("f", &params).unwrap();
    assert_eq!(first.as_scalar(), 8.0);

    let second = store.get_prop("f", &params).unwrap();
    assert_eq!(second.as_scalar(), 8.0);

    // Re-querying with the same physical inputs must hit the cache: a
    // property that incremented a counter on each evaluation would show
    // no further increments here. We approximate that by using a
    // cache-size-1 store, and a function capturing a call counter.
    let calls = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let calls_clone = calls.clone();
    let mut counted_store = Store::new();
    counted_store
        .add_prop(
            "counted",
            vec!["x".into()],
            Arc::new(move |args: &[Node]| {
                calls_clone.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                args[0].clone()
            }),
        )
        .unwrap();
    counted_store.initialize(false).unwrap();
    let mut p = HashMap::new();
    p.insert("x".to_string(), PropertyValue::Scalar(5.0));
    counted_store.get_prop("counted", &p).unwrap();
    counted_store.get_prop("counted", &p).unwrap();
    counted_store.get_prop("counted", &p).unwrap();
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[test]
fn scenario_2_gradient_query() {
    let mut store = build_store();
    let mut params = HashMap::new();
    params.insert(
        "g".to_string(),
        PropertyValue::Grad(Dual::tracked("g", 1.0, vec!["g".into()], vec![1.0])),
    );
    params.insert(
        "h".to_string(),
        PropertyValue::Grad(Dual::tracked("h", 2.0, vec!["h".into()], vec![1.0])),
    );

    let result = store.get_prop("f", &params).unwrap();
    match result {
        PropertyValue::Grad(dual) => {
            assert_eq!(dual.value(), 8.0);
            assert_eq!(dual.grad_names().unwrap(), &["g".to_string(), "h".to_string()]);
            assert_eq!(dual.grad_values().unwrap(), &[4.0, 2.0]);
        }
        PropertyValue::Scalar(_) => panic!("expected gradient-tracking result"),
    }
}

#[test]
fn scenario_3_shared_gradient_name() {
    let mut store = Store::new();
    store.add_prop("a", vec!["g".into()], identity()).unwrap();
    store.add_prop("b", vec!["g".into()], identity()).unwrap();
    store.add_prop("c", vec!["g".into()], identity()).unwrap();
    store.add_prop("d", vec!["g".into()], identity()).unwrap();
    store
        .add_prop(
            "f",
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            Arc::new(|args: &[Node]| {
                let ab = &args[0] + &args[1];
                let cd = &args[2] + &args[3];
                &ab.pow(&Node::constant(2.0)) * &cd
            }),
        )
        .unwrap();
    store.initialize(false).unwrap();

    let mut params = HashMap::new();
    params.insert(
        "g".to_string(),
        PropertyValue::Grad(Dual::tracked("g", 1.0, vec!["g".into()], vec![1.0])),
    );

    let result = store.get_prop("f", &params).unwrap();
    match result {
        PropertyValue::Grad(dual) => {
            assert_eq!(dual.grad_names().unwrap(), &["g".to_string()]);
            assert!((dual.grad_values().unwrap()[0] - 12.0).abs() < 1e-9);
        }
        PropertyValue::Scalar(_) => panic!("expected gradient-tracking result"),
    }
}

#[test]
fn scenario_4_mixed_raw_and_tracked_arguments() {
    let mut store = Store::new();
    store.add_prop("a", vec!["g".into()], identity()).unwrap();
    store.add_prop("c", vec!["h".into()], identity()).unwrap();
    store.add_prop("d", vec!["h".into()], identity()).unwrap();
    store
        .add_prop(
            "f",
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            product_of_sums(),
        )
        .unwrap();
    store.initialize(false).unwrap();

    let mut params = HashMap::new();
    params.insert(
        "g".to_string(),
        PropertyValue::Grad(Dual::tracked("g", 1.0, vec!["g".into()], vec![1.0])),
    );
    params.insert("b".to_string(), PropertyValue::Scalar(1.0));
    params.insert("h".to_string(), PropertyValue::Scalar(2.0));

    let result = store.get_prop("f", &params).unwrap();
    match result {
        PropertyValue::Grad(dual) => {
            assert_eq!(dual.value(), 8.0);
            assert_eq!(dual.grad_names().unwrap(), &["g".to_string()]);
        }
        PropertyValue::Scalar(_) => panic!("expected gradient-tracking result"),
    }
}

#[test]
fn scenario_5_reinitialize_with_keep_cache_preserves_entries() {
    let calls = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
    let calls_clone = calls.clone();
    let mut store = Store::new();
    store
        .add_prop(
            "counted",
            vec!["x".into()],
            Arc::new(move |args: &[Node]| {
                calls_clone.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                args[0].clone()
            }),
        )
        .unwrap();
    store.initialize(false).unwrap();

    let mut p = HashMap::new();
    p.insert("x".to_string(), PropertyValue::Scalar(5.0));
    store.get_prop("counted", &p).unwrap();
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);

    store.add_prop("unrelated", vec!["y".into()], identity()).unwrap();
    store.initialize(true).unwrap();

    store.get_prop("counted", &p).unwrap();
    assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 1);
}

#[test]
fn scenario_6_cycle_is_a_fatal_initialization_error() {
    let mut store = Store::new();
    store.add_prop("p", vec!["q".into()], identity()).unwrap();
    store.add_prop("q", vec!["p".into()], identity()).unwrap();
    let err = store.initialize(false).unwrap_err();
    assert!(matches!(err, Error::DependencyCycle { .. }));
}

#[test]
fn unknown_property_is_a_query_error() {
    let mut store = build_store();
    let params = scalar_params(1.0, 2.0);
    let err = store.get_prop("nonexistent", &params).unwrap_err();
    assert!(matches!(err, Error::UnknownProperty { .. }));
}

#[test]
fn missing_physical_parameter_is_a_query_error() {
    let mut store = build_store();
    let mut params = HashMap::new();
    params.insert("g".to_string(), PropertyValue::Scalar(1.0));
    let err = store.get_prop("f", &params).unwrap_err();
    assert!(matches!(err, Error::MissingParameter { .. }));
}

#[test]
fn duplicate_property_is_a_registration_error() {
    let mut store = Store::new();
    store.add_prop("a", vec!["g".into()], identity()).unwrap();
    let err = store.add_prop("a", vec!["g".into()], identity()).unwrap_err();
    assert!(matches!(err, Error::DuplicateProperty { .. }));
}

#[test]
fn malformed_gradient_parameter_is_a_query_error() {
    let mut store = build_store();
    let mismatched = Dual::from_parts(
        Some("g".into()),
        1.0,
        Some(vec!["g".into(), "extra".into()]),
        Some(vec![1.0]),
    );
    let mut params = HashMap::new();
    params.insert("g".to_string(), PropertyValue::Grad(mismatched));
    params.insert("h".to_string(), PropertyValue::Scalar(2.0));
    let err = store.get_prop("f", &params).unwrap_err();
    assert!(matches!(err, Error::GradientShapeMismatch { .. }));
}

#[test]
fn querying_before_initialize_is_an_error() {
    let mut store = Store::new();
    store.add_prop("a", vec!["g".into()], identity()).unwrap();
    let params = scalar_params(1.0, 2.0);
    let err = store.get_prop("a", &params).unwrap_err();
    assert!(matches!(err, Error::StoreNotInitialized { .. }));
}

#[test]
fn sum_primitive_reduces_an_nary_list() {
    let mut store = Store::new();
    store.add_prop("a", vec!["g".into()], identity()).unwrap();
    store.add_prop("b", vec!["h".into()], identity()).unwrap();
    store.add_prop("c", vec!["k".into()], identity()).unwrap();
    store
        .add_prop(
            "total",
            vec!["a".into(), "b".into(), "c".into()],
            Arc::new(|args: &[Node]| Node::sum(args)),
        )
        .unwrap();
    store.initialize(false).unwrap();

    let mut params = HashMap::new();
    params.insert("g".to_string(), PropertyValue::Scalar(1.0));
    params.insert("h".to_string(), PropertyValue::Scalar(2.0));
    params.insert("k".to_string(), PropertyValue::Scalar(3.0));
    let result = store.get_prop("total", &params).unwrap();
    assert_eq!(result.as_scalar(), 6.0);
}
