// SPDX-License-Identifier: MIT OR Apache-2.0

//! Registers a small property graph, initializes the store, and queries
//! it once on the scalar path and once on the gradient-tracking path.

use propgrad::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let mut store = Store::new();
    store.add_prop("a", vec!["g".into()], Arc::new(|args: &[Node]| args[0].clone()))?;
    store.add_prop("b", vec!["g".into()], Arc::new(|args: &[Node]| args[0].clone()))?;
    store.add_prop("c", vec!["h".into()], Arc::new(|args: &[Node]| args[0].clone()))?;
    store.add_prop("d", vec!["h".into()], Arc::new(|args: &[Node]| args[0].clone()))?;
    store.add_prop(
        "f",
        vec!["a".into(), "b".into(), "c".into(), "d".into()],
        Arc::new(|args: &[Node]| {
            let ab = &args[0] + &args[1];
            let cd = &args[2] + &args[3];
            &ab * &cd
        }),
    )?;
    store.initialize(false)?;

    let mut scalar_params = HashMap::new();
    scalar_params.insert("g".to_string(), PropertyValue::Scalar(1.0));
    scalar_params.insert("h".to_string(), PropertyValue::Scalar(2.0));
    let scalar_result = store.get_prop("f", &scalar_params)?;
    println!("f(g=1, h=2) = {}", scalar_result.as_scalar());

    let mut grad_params = HashMap::new();
    grad_params.insert(
        "g".to_string(),
        PropertyValue::Grad(Dual::tracked("g", 1.0, vec!["g".into()], vec![1.0])),
    );
    grad_params.insert(
        "h".to_string(),
        PropertyValue::Grad(Dual::tracked("h", 2.0, vec!["h".into()], vec![1.0])),
    );
    let grad_result = store.get_prop("f", &grad_params)?;
    if let PropertyValue::Grad(dual) = grad_result {
        println!(
            "f(g=1, h=2) = {}, grad = {:?}",
            dual.value(),
            dual.grad_values()
        );
    }

    Ok(())
}
