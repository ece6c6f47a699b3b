// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parameter-wrapper (`Dual`) and the `sift` merge operation.
//!
//! A `Dual` carries a scalar value together with an optional forward-mode
//! gradient: an ordered list of tracked variable names and the partial
//! derivative of `value` with respect to each. `grad_names` is present iff
//! `grad_values` is present, and their lengths always match.

/// A value, optionally tagged with forward-mode gradient columns.
#[derive(Debug, Clone, PartialEq)]
pub struct Dual {
    name: Option<String>,
    value: f64,
    grad_names: Option<Vec<String>>,
    grad_values: Option<Vec<f64>>,
}

impl Dual {
    /// A plain value with no gradient tracking.
    pub fn constant(value: f64) -> Self {
        Dual {
            name: None,
            value,
            grad_names: None,
            grad_values: None,
        }
    }

    /// A named leaf with no gradient tracking (used for derived arguments
    /// and raw physical parameters during evaluation).
    pub fn leaf(name: impl Into<String>, value: f64) -> Self {
        Dual {
            name: Some(name.into()),
            value,
            grad_names: None,
            grad_values: None,
        }
    }

    /// A named leaf seeded with its own gradient columns, as supplied by a
    /// caller tracking derivatives with respect to this variable.
    pub fn tracked(
        name: impl Into<String>,
        value: f64,
        grad_names: Vec<String>,
        grad_values: Vec<f64>,
    ) -> Self {
        assert_eq!(
            grad_names.len(),
            grad_values.len(),
            "grad_names and grad_values must have matching length"
        );
        Dual {
            name: Some(name.into()),
            value,
            grad_names: Some(grad_names),
            grad_values: Some(grad_values),
        }
    }

    /// Build a dual from raw parts, e.g. the output of a primitive rule.
    pub fn from_parts(
        name: Option<String>,
        value: f64,
        grad_names: Option<Vec<String>>,
        grad_values: Option<Vec<f64>>,
    ) -> Self {
        Dual {
            name,
            value,
            grad_names,
            grad_values,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn grad_names(&self) -> Option<&[String]> {
        self.grad_names.as_deref()
    }

    pub fn grad_values(&self) -> Option<&[f64]> {
        self.grad_values.as_deref()
    }

    pub fn has_grad(&self) -> bool {
        self.grad_names.is_some()
    }

    /// Whether `grad_names` and `grad_values` are both absent or both
    /// present with matching length. Always true for a `Dual` built via
    /// [`Dual::tracked`]; [`Dual::from_parts`] performs no such check, so a
    /// `Dual` assembled by hand (e.g. by a caller building query
    /// parameters directly) can violate it.
    pub fn is_consistent(&self) -> bool {
        match (&self.grad_names, &self.grad_values) {
            (Some(names), Some(values)) => names.len() == values.len(),
            (None, None) => true,
            _ => false,
        }
    }

    pub fn into_parts(self) -> (Option<String>, f64, Option<Vec<String>>, Option<Vec<f64>>) {
        (self.name, self.value, self.grad_names, self.grad_values)
    }
}

/// The result of merging several duals' tracked-variable sets into one
/// shared column axis.
pub struct Sift {
    /// Total number of distinct gradient names across all inputs.
    pub n: usize,
    /// The merged, first-seen-order list of gradient names.
    pub names: Vec<String>,
    /// For each input, the column indices (into `0..n`) of its own
    /// gradient names within the merged axis. Empty for inputs without
    /// gradients.
    pub idx_per_input: Vec<Vec<usize>>,
}

/// Merge the gradient-name axes of several duals, preserving first-seen
/// order. This is the join operation for forward-mode duals with
/// heterogeneous active-variable sets.
pub fn sift(inputs: &[&Dual]) -> Sift {
    let mut names: Vec<String> = Vec::new();
    let mut index_of: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
    let mut idx_per_input = Vec::with_capacity(inputs.len());

    for input in inputs {
        let mut idx = Vec::new();
        if let Some(grad_names) = input.grad_names() {
            for name in grad_names {
                let i = *index_of.entry(name.as_str()).or_insert_with(|| {
                    names.push(name.clone());
                    names.len() - 1
                });
                idx.push(i);
            }
        }
        idx_per_input.push(idx);
    }

    Sift {
        n: names.len(),
        names,
        idx_per_input,
    }
}
