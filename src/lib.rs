// SPDX-License-Identifier: MIT OR Apache-2.0

//! # propgrad
//!
//! A memoized, gradient-aware property store for numerical scientific
//! pipelines.
//!
//! A user registers named *properties*, each a pure numerical function of
//! other properties (by name). Names that are not registered are
//! *physical parameters*, supplied by the caller at query time. Querying a
//! property resolves its dependency graph, reuses cached results when the
//! same effective inputs recur, and optionally propagates forward-mode
//! derivatives with respect to any subset of the physical parameters.
//!
//! ## Quick start
//!
//! ```
//! # use propgrad::prelude::*;
//! # use std::collections::HashMap;
//! # use std::sync::Arc;
//! # fn main() -> Result<()> {
//! let mut store = Store::new();
//! store.add_prop("a", vec!["g".into()], Arc::new(|args: &[Node]| args[0].clone()))?;
//! store.add_prop("b", vec!["h".into()], Arc::new(|args: &[Node]| args[0].clone()))?;
//! store.add_prop(
//!     "f",
//!     vec!["a".into(), "b".into()],
//!     Arc::new(|args: &[Node]| &args[0] + &args[1]),
//! )?;
//! store.initialize(false)?;
//!
//! let mut params = HashMap::new();
//! params.insert("g".to_string(), PropertyValue::Scalar(1.0));
//! params.insert("h".to_string(), PropertyValue::Scalar(2.0));
//! let result = store.get_prop("f", &params)?;
//! assert_eq!(result.as_scalar(), 3.0);
//! # Ok(())
//! # }
//! ```
//!
//! Querying the same property with a [`Dual`] instead of a raw `f64`
//! engages the gradient-tracking path and returns a [`Dual`] carrying the
//! requested partial derivatives instead of a bare number.
//!
//! ## Design
//!
//! * [`primitive`] holds the per-operator value/gradient rule table.
//! * [`dual`] defines the parameter-wrapper (`Dual`) and the `sift` merge
//!   used to align heterogeneous gradient-name axes across operands.
//! * [`dispatch`] selects which rule arity to invoke for a given call.
//! * [`node`] is the user-facing, operator-overloaded expression type.
//! * [`cache`] implements the bounded, insertion-ordered ("LRU-by-age")
//!   per-property cache.
//! * [`context`] resolves each property's direct and implicit physical
//!   dependencies.
//! * [`wrapper`] binds a user function to its cache and context.
//! * [`store`] is the registry and query entry point.

/// Convenient prelude.
pub mod prelude {
    pub use crate::cache::{CacheConfig, CacheState};
    pub use crate::context::FunctionContext;
    pub use crate::dual::{sift, Dual};
    pub use crate::error::{Error, Result};
    pub use crate::node::Node;
    pub use crate::store::{Store, StoreConfig};
    pub use crate::wrapper::{PropertyFn, PropertyValue};
}

/// Error and result types.
#[macro_use]
pub mod error;

/// The primitive operator table.
pub mod primitive;

/// Parameter-wrapper (`Dual`) and `sift`.
pub mod dual;

/// The AD dispatcher.
pub mod dispatch;

/// Expression nodes, the user-facing operator-overloaded value type.
pub mod node;

/// The bounded, insertion-ordered function cache.
pub mod cache;

/// Dependency resolution.
pub mod context;

/// The function wrapper binding a property to its cache and context.
pub mod wrapper;

/// The property registry and query entry point.
pub mod store;
