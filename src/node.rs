// SPDX-License-Identifier: MIT OR Apache-2.0

//! Expression nodes: the user-facing, operator-overloaded value type.
//!
//! A [`Node`] wraps a [`Dual`] plus an "already evaluated" flag; user
//! formulas are written as ordinary arithmetic on `Node`s. Every operator
//! call dispatches through [`crate::dispatch`] immediately (there is no
//! deferred graph to walk later), so a `Node` is always fully evaluated by
//! construction. Arithmetic is infallible: domain errors propagate as
//! `NaN`/`Inf` in the wrapped value, never as `Result::Err`.

use crate::dispatch::{dispatch_binary, dispatch_sum, dispatch_unary};
use crate::dual::Dual;
use std::ops::{Add, Div, Mul, Neg, Sub};

/// A tracked, already-evaluated expression value.
#[derive(Debug, Clone)]
pub struct Node {
    dual: Dual,
}

impl Node {
    /// Wrap an existing dual as a leaf node (used by the evaluation
    /// orchestrator when binding physical and derived arguments).
    pub fn new(dual: Dual) -> Self {
        Node { dual }
    }

    /// An untracked numeric constant.
    pub fn constant(value: f64) -> Self {
        Node::new(Dual::constant(value))
    }

    pub fn value(&self) -> f64 {
        self.dual.value()
    }

    pub fn dual(&self) -> &Dual {
        &self.dual
    }

    pub fn into_dual(self) -> Dual {
        self.dual
    }

    fn unary(&self, tag: &str) -> Node {
        Node::new(dispatch_unary(tag, &self.dual))
    }

    fn binary(&self, tag: &str, other: &Node) -> Node {
        Node::new(dispatch_binary(tag, &self.dual, &other.dual))
    }

    pub fn pow(&self, other: &Node) -> Node {
        self.binary("pow", other)
    }

    pub fn log(&self) -> Node {
        self.unary("log")
    }

    pub fn log10(&self) -> Node {
        self.unary("log10")
    }

    pub fn log2(&self) -> Node {
        self.unary("log2")
    }

    pub fn sqrt(&self) -> Node {
        self.unary("sqrt")
    }

    pub fn lgamma(&self) -> Node {
        self.unary("lgamma")
    }

    pub fn log1p(&self) -> Node {
        self.unary("log1p")
    }

    /// The `inv` primitive: negation, not reciprocal (matches the source's
    /// `def inv(x0): return -x0`).
    pub fn inv(&self) -> Node {
        self.unary("inv")
    }

    /// Variadic reduction, the scalar specialization of `sum(axis)`.
    pub fn sum(nodes: &[Node]) -> Node {
        let duals: Vec<Dual> = nodes.iter().map(|n| n.dual.clone()).collect();
        Node::new(dispatch_sum(&duals))
    }
}

impl From<f64> for Node {
    fn from(value: f64) -> Self {
        Node::constant(value)
    }
}

impl Add for &Node {
    type Output = Node;
    fn add(self, other: &Node) -> Node {
        self.binary("plus", other)
    }
}

impl Sub for &Node {
    type Output = Node;
    fn sub(self, other: &Node) -> Node {
        self.binary("minus", other)
    }
}

impl Mul for &Node {
    type Output = Node;
    fn mul(self, other: &Node) -> Node {
        self.binary("mul", other)
    }
}

impl Div for &Node {
    type Output = Node;
    fn div(self, other: &Node) -> Node {
        self.binary("div", other)
    }
}

impl Neg for &Node {
    type Output = Node;
    fn neg(self) -> Node {
        self.unary("inv")
    }
}

macro_rules! owned_binary_op {
    ($trait:ident, $method:ident) => {
        impl $trait for Node {
            type Output = Node;
            fn $method(self, other: Node) -> Node {
                (&self).$method(&other)
            }
        }
        impl $trait<&Node> for Node {
            type Output = Node;
            fn $method(self, other: &Node) -> Node {
                (&self).$method(other)
            }
        }
        impl $trait<Node> for &Node {
            type Output = Node;
            fn $method(self, other: Node) -> Node {
                self.$method(&other)
            }
        }
    };
}

owned_binary_op!(Add, add);
owned_binary_op!(Sub, sub);
owned_binary_op!(Mul, mul);
owned_binary_op!(Div, div);

impl Neg for Node {
    type Output = Node;
    fn neg(self) -> Node {
        (&self).neg()
    }
}
