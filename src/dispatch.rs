// SPDX-License-Identifier: MIT OR Apache-2.0

//! The AD dispatcher: selects which arity of a primitive operator's rule
//! set to invoke, based on which operands carry gradients, and aligns
//! gradient axes across operands via [`sift`](crate::dual::sift).

use crate::dual::{sift, Dual};
use crate::primitive::{binary_rule, scatter_single_axis, unary_rule};

/// Evaluate a binary primitive `tag(a, b)`, routing through base/`f_10`/
/// `f_01`/`f_grad` depending on which operands carry gradients.
///
/// Panics if `tag` does not name a registered binary operator; the crate's
/// public `Node` API only ever calls this with its own fixed set of tags,
/// so this is an internal invariant, not a user-facing failure mode.
pub fn dispatch_binary(tag: &str, a: &Dual, b: &Dual) -> Dual {
    let rule = binary_rule(tag).unwrap_or_else(|| panic!("unknown binary operator `{}`", tag));
    let selector = ((a.has_grad() as u8) << 1) | (b.has_grad() as u8);
    match selector {
        0b00 => Dual::constant((rule.base)(a.value(), b.value())),
        0b10 => {
            let (value, grad) = (rule.f10)(a.value(), a.grad_values().unwrap(), b.value());
            Dual::from_parts(
                None,
                value,
                Some(a.grad_names().unwrap().to_vec()),
                Some(grad),
            )
        }
        0b01 => {
            let (value, grad) = (rule.f01)(a.value(), b.value(), b.grad_values().unwrap());
            Dual::from_parts(
                None,
                value,
                Some(b.grad_names().unwrap().to_vec()),
                Some(grad),
            )
        }
        0b11 => {
            let merged = sift(&[a, b]);
            let (value, grad) = (rule.fgrad)(
                a.value(),
                a.grad_values().unwrap(),
                b.value(),
                b.grad_values().unwrap(),
                &merged.idx_per_input[0],
                &merged.idx_per_input[1],
                merged.n,
            );
            Dual::from_parts(None, value, Some(merged.names), Some(grad))
        }
        _ => unreachable!(),
    }
}

/// Evaluate a unary primitive `tag(a)`.
pub fn dispatch_unary(tag: &str, a: &Dual) -> Dual {
    let rule = unary_rule(tag).unwrap_or_else(|| panic!("unknown unary operator `{}`", tag));
    if !a.has_grad() {
        Dual::constant((rule.base)(a.value()))
    } else {
        let (value, grad) = (rule.fgrad)(a.value(), a.grad_values().unwrap());
        Dual::from_parts(None, value, Some(a.grad_names().unwrap().to_vec()), Some(grad))
    }
}

/// Evaluate the n-ary `sum` primitive, the scalar specialization of an
/// axis-reduction: the value is the sum of all operand values, and the
/// gradient sifts every operand's tracked columns onto one shared axis,
/// adding each operand's contribution.
pub fn dispatch_sum(operands: &[Dual]) -> Dual {
    let value = operands.iter().map(Dual::value).sum();
    if operands.iter().all(|d| !d.has_grad()) {
        return Dual::constant(value);
    }
    let refs: Vec<&Dual> = operands.iter().collect();
    let merged = sift(&refs);
    let mut grad = vec![0.0; merged.n];
    for (operand, idx) in operands.iter().zip(merged.idx_per_input.iter()) {
        if let Some(g) = operand.grad_values() {
            let scattered = scatter_single_axis(g, idx, merged.n, 1.0);
            for (out, contribution) in grad.iter_mut().zip(scattered.iter()) {
                *out += contribution;
            }
        }
    }
    Dual::from_parts(None, value, Some(merged.names), Some(grad))
}
