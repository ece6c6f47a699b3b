// SPDX-License-Identifier: MIT OR Apache-2.0

//! The primitive operator table: one record per operator tag, each
//! carrying a value-only base rule plus the gradient rules needed when one
//! or both operands carry forward-mode derivatives.
//!
//! Binary operators expose four arities: `base` (neither operand tracked),
//! `f_10` (only the first operand tracked), `f_01` (only the second), and
//! `f_grad` (both, merged onto a shared gradient axis via `sift`). Unary
//! operators expose `base` and a single `f_grad`. `sum` is n-ary and lives
//! outside this table; see [`crate::dispatch::dispatch_sum`].

use once_cell::sync::Lazy;
use statrs::function::gamma::digamma;
use std::collections::HashMap;

/// A binary operator's rule set.
pub struct BinaryRule {
    pub base: fn(f64, f64) -> f64,
    /// `(v0, g0, v1) -> (value, gradient)`, gradient flows through the
    /// first operand only.
    pub f10: fn(f64, &[f64], f64) -> (f64, Vec<f64>),
    /// `(v0, v1, g1) -> (value, gradient)`, gradient flows through the
    /// second operand only.
    pub f01: fn(f64, f64, &[f64]) -> (f64, Vec<f64>),
    /// `(v0, g0, v1, g1, idx0, idx1, n) -> (value, gradient)` scattering
    /// both operands' contributions onto a merged axis of width `n`.
    #[allow(clippy::type_complexity)]
    pub fgrad: fn(f64, &[f64], f64, &[f64], &[usize], &[usize], usize) -> (f64, Vec<f64>),
}

/// A unary operator's rule set.
pub struct UnaryRule {
    pub base: fn(f64) -> f64,
    pub fgrad: fn(f64, &[f64]) -> (f64, Vec<f64>),
}

fn scatter_single(g: &[f64], idx: &[usize], n: usize, scale: f64) -> Vec<f64> {
    let mut out = vec![0.0; n];
    for (&col, &v) in idx.iter().zip(g.iter()) {
        out[col] += scale * v;
    }
    out
}

fn scatter_two(
    g0: &[f64],
    idx0: &[usize],
    scale0: f64,
    g1: &[f64],
    idx1: &[usize],
    scale1: f64,
    n: usize,
) -> Vec<f64> {
    let mut out = vec![0.0; n];
    for (&col, &v) in idx0.iter().zip(g0.iter()) {
        out[col] += scale0 * v;
    }
    for (&col, &v) in idx1.iter().zip(g1.iter()) {
        out[col] += scale1 * v;
    }
    out
}

macro_rules! binary_rule {
    ($base:expr, $f10:expr, $f01:expr, $fgrad:expr) => {
        BinaryRule {
            base: $base,
            f10: $f10,
            f01: $f01,
            fgrad: $fgrad,
        }
    };
}

static PLUS: BinaryRule = binary_rule!(
    |v0, v1| v0 + v1,
    |v0, g0: &[f64], v1| (v0 + v1, g0.to_vec()),
    |v0, v1, g1: &[f64]| (v0 + v1, g1.to_vec()),
    |v0, g0, v1, g1, idx0, idx1, n| (v0 + v1, scatter_two(g0, idx0, 1.0, g1, idx1, 1.0, n))
);

static MINUS: BinaryRule = binary_rule!(
    |v0, v1| v0 - v1,
    |v0, g0: &[f64], v1| (v0 - v1, g0.to_vec()),
    |v0, v1, g1: &[f64]| (v0 - v1, g1.iter().map(|g| -g).collect()),
    |v0, g0, v1, g1, idx0, idx1, n| (v0 - v1, scatter_two(g0, idx0, 1.0, g1, idx1, -1.0, n))
);

static MUL: BinaryRule = binary_rule!(
    |v0, v1| v0 * v1,
    |v0, g0: &[f64], v1| (v0 * v1, g0.iter().map(|g| g * v1).collect()),
    |v0, v1, g1: &[f64]| (v0 * v1, g1.iter().map(|g| v0 * g).collect()),
    |v0, g0, v1, g1, idx0, idx1, n| (v0 * v1, scatter_two(g0, idx0, v1, g1, idx1, v0, n))
);

static DIV: BinaryRule = binary_rule!(
    |v0, v1| v0 / v1,
    |v0, g0: &[f64], v1| (v0 / v1, g0.iter().map(|g| g / v1).collect()),
    |v0, v1, g1: &[f64]| (
        v0 / v1,
        g1.iter().map(|g| -(v0 / (v1 * v1)) * g).collect()
    ),
    |v0, g0, v1, g1, idx0, idx1, n| (
        v0 / v1,
        scatter_two(g0, idx0, 1.0 / v1, g1, idx1, -(v0 / (v1 * v1)), n)
    )
);

static POW: BinaryRule = binary_rule!(
    |v0: f64, v1: f64| v0.powf(v1),
    |v0: f64, g0: &[f64], v1: f64| (
        v0.powf(v1),
        g0.iter()
            .map(|g| v1 * v0.powf(v1 - 1.0) * g)
            .collect()
    ),
    |v0: f64, v1: f64, g1: &[f64]| (
        v0.powf(v1),
        g1.iter().map(|g| v0.powf(v1) * v0.ln() * g).collect()
    ),
    |v0: f64, g0, v1: f64, g1, idx0, idx1, n| (
        v0.powf(v1),
        scatter_two(
            g0,
            idx0,
            v1 * v0.powf(v1 - 1.0),
            g1,
            idx1,
            v0.powf(v1) * v0.ln(),
            n,
        )
    )
);

static BINARY_OPS: Lazy<HashMap<&'static str, &'static BinaryRule>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, &'static BinaryRule> = HashMap::new();
    m.insert("plus", &PLUS);
    m.insert("minus", &MINUS);
    m.insert("mul", &MUL);
    m.insert("div", &DIV);
    m.insert("pow", &POW);
    m
});

fn ln10() -> f64 {
    std::f64::consts::LN_10
}
fn ln2() -> f64 {
    std::f64::consts::LN_2
}

static INV: UnaryRule = UnaryRule {
    base: |v0| -v0,
    fgrad: |v0, g0| (-v0, g0.iter().map(|g| -g).collect()),
};

static LOG: UnaryRule = UnaryRule {
    base: |v0| v0.ln(),
    fgrad: |v0, g0| (v0.ln(), g0.iter().map(|g| g / v0).collect()),
};

static LOG10: UnaryRule = UnaryRule {
    base: |v0| v0.log10(),
    fgrad: |v0, g0| (v0.log10(), g0.iter().map(|g| g / (v0 * ln10())).collect()),
};

static LOG2: UnaryRule = UnaryRule {
    base: |v0| v0.log2(),
    fgrad: |v0, g0| (v0.log2(), g0.iter().map(|g| g / (v0 * ln2())).collect()),
};

static SQRT: UnaryRule = UnaryRule {
    base: |v0| v0.sqrt(),
    fgrad: |v0, g0| (v0.sqrt(), g0.iter().map(|g| g / (2.0 * v0.sqrt())).collect()),
};

static LGAMMA: UnaryRule = UnaryRule {
    base: |v0| statrs::function::gamma::ln_gamma(v0),
    fgrad: |v0, g0| {
        (
            statrs::function::gamma::ln_gamma(v0),
            g0.iter().map(|g| digamma(v0) * g).collect(),
        )
    },
};

static LOG1P: UnaryRule = UnaryRule {
    base: |v0| v0.ln_1p(),
    fgrad: |v0, g0| (v0.ln_1p(), g0.iter().map(|g| g / (v0 + 1.0)).collect()),
};

static UNARY_OPS: Lazy<HashMap<&'static str, &'static UnaryRule>> = Lazy::new(|| {
    let mut m: HashMap<&'static str, &'static UnaryRule> = HashMap::new();
    m.insert("inv", &INV);
    m.insert("log", &LOG);
    m.insert("log10", &LOG10);
    m.insert("log2", &LOG2);
    m.insert("sqrt", &SQRT);
    m.insert("lgamma", &LGAMMA);
    m.insert("log1p", &LOG1P);
    m
});

/// Look up a binary operator's rule set by tag.
pub fn binary_rule(tag: &str) -> Option<&'static BinaryRule> {
    BINARY_OPS.get(tag).copied()
}

/// Look up a unary operator's rule set by tag.
pub fn unary_rule(tag: &str) -> Option<&'static UnaryRule> {
    UNARY_OPS.get(tag).copied()
}

pub(crate) use scatter_single as scatter_single_axis;
