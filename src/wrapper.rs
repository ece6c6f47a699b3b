// SPDX-License-Identifier: MIT OR Apache-2.0

//! Function wrapper: binds a user function to named arguments and owns its
//! cache and resolved dependency context.

use crate::cache::{CacheConfig, FunctionCache};
use crate::context::FunctionContext;
use crate::dual::Dual;
use crate::error::{Error, Result};
use crate::node::Node;
use crate::store::Store;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Either a raw numeric value or a gradient-tracking parameter-wrapper:
/// the type flowing into and out of a query, matching the spec's "a raw
/// value or a parameter-wrapper" contract at the query surface.
#[derive(Debug, Clone)]
pub enum PropertyValue {
    Scalar(f64),
    Grad(Dual),
}

impl PropertyValue {
    fn value(&self) -> f64 {
        match self {
            PropertyValue::Scalar(v) => *v,
            PropertyValue::Grad(d) => d.value(),
        }
    }

    /// Extract this value's `Dual`, validating that an externally-built
    /// [`PropertyValue::Grad`] carries matching `grad_names`/`grad_values`
    /// lengths (the invariant [`Dual::tracked`] enforces, but
    /// [`Dual::from_parts`] does not).
    fn to_dual(&self, fallback_name: &str) -> Result<Dual> {
        match self {
            PropertyValue::Scalar(v) => Ok(Dual::leaf(fallback_name, *v)),
            PropertyValue::Grad(d) => {
                if !d.is_consistent() {
                    return Err(Error::gradient_shape_mismatch(
                        fallback_name,
                        d.grad_names().map(<[String]>::len).unwrap_or(0),
                        d.grad_values().map(<[f64]>::len).unwrap_or(0),
                    ));
                }
                Ok(d.clone())
            }
        }
    }
}

impl PartialEq for PropertyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PropertyValue::Scalar(a), PropertyValue::Scalar(b)) => a.to_bits() == b.to_bits(),
            (PropertyValue::Grad(a), PropertyValue::Grad(b)) => {
                a.name() == b.name()
                    && a.value().to_bits() == b.value().to_bits()
                    && a.grad_names() == b.grad_names()
                    && a.grad_values().map(|g| g.iter().map(|v| v.to_bits()).collect::<Vec<_>>())
                        == b.grad_values().map(|g| g.iter().map(|v| v.to_bits()).collect::<Vec<_>>())
            }
            _ => false,
        }
    }
}
impl Eq for PropertyValue {}

impl Hash for PropertyValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            PropertyValue::Scalar(v) => {
                0u8.hash(state);
                v.to_bits().hash(state);
            }
            PropertyValue::Grad(d) => {
                1u8.hash(state);
                d.name().hash(state);
                d.value().to_bits().hash(state);
                d.grad_names().hash(state);
                if let Some(g) = d.grad_values() {
                    for v in g {
                        v.to_bits().hash(state);
                    }
                }
            }
        }
    }
}

/// A user-registered property's formula: positional arguments in
/// `arg_names` order, each bound to a [`Node`], returning the result `Node`.
pub type PropertyFn = Arc<dyn Fn(&[Node]) -> Node + Send + Sync>;

/// The cache key: the effective physical-input tuple (direct, then
/// implicit, in resolver order).
pub type CacheKey = Vec<PropertyValue>;

pub struct PropertyWrapper {
    arg_names: Vec<String>,
    function: PropertyFn,
    pub(crate) context: FunctionContext,
    cache: FunctionCache<CacheKey, PropertyValue>,
}

impl PropertyWrapper {
    pub fn new(
        name: impl Into<String>,
        arg_names: Vec<String>,
        function: PropertyFn,
        cache_config: CacheConfig,
    ) -> Self {
        let name = name.into();
        PropertyWrapper {
            arg_names,
            function,
            context: FunctionContext::new(name),
            cache: FunctionCache::new(cache_config),
        }
    }

    pub fn arg_names(&self) -> &[String] {
        &self.arg_names
    }

    pub fn enable_cache(&mut self) {
        self.cache.enable();
    }

    pub fn disable_cache(&mut self) {
        self.cache.disable();
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn resize_cache(&mut self, size: usize) {
        self.cache.set_size(size);
    }

    pub fn replace_cache(&mut self, cache: FunctionCache<CacheKey, PropertyValue>) {
        self.cache = cache;
    }

    /// Build the cache key from the supplied physical parameters, in
    /// direct-then-implicit resolver order.
    fn build_key(&self, params: &HashMap<String, PropertyValue>) -> Result<CacheKey> {
        let name = self.context.name().to_string();
        self.context
            .physical_props()
            .iter()
            .chain(self.context.implicit_physical_props().iter())
            .map(|p| {
                params
                    .get(p)
                    .cloned()
                    .ok_or_else(|| Error::missing_parameter(&name, p))
            })
            .collect()
    }

    /// Evaluate this property for `params`, memoized by the effective
    /// physical-input tuple. Arguments (including recursive resolution of
    /// derived dependencies) are only gathered on a cache miss.
    pub fn call(&mut self, store: &Store, params: &HashMap<String, PropertyValue>) -> Result<PropertyValue> {
        let key = self.build_key(params)?;
        let function = self.function.clone();
        let context = self.context.clone();
        self.cache.get_or_try_insert_with(key, move || {
            let arguments = gather_arguments(&context, store, params)?;
            let node = function(&arguments);
            let dual = node.into_dual();
            Ok(if dual.has_grad() {
                PropertyValue::Grad(dual)
            } else {
                PropertyValue::Scalar(dual.value())
            })
        })
    }
}

/// Build the `Node` arguments for a property's user function, in
/// `arg_names` order: physical arguments bound from `params`, derived
/// arguments resolved recursively through `store`.
fn gather_arguments(
    context: &FunctionContext,
    store: &Store,
    params: &HashMap<String, PropertyValue>,
) -> Result<Vec<Node>> {
    let mut args: Vec<Option<Node>> = vec![None; context.arity()];

    for (arg_name, &pos) in context
        .physical_props()
        .iter()
        .zip(context.physical_props_indices().iter())
    {
        let value = params
            .get(arg_name)
            .ok_or_else(|| Error::missing_parameter(context.name(), arg_name))?;
        args[pos] = Some(Node::new(value.to_dual(arg_name)?));
    }

    for (prop_name, &pos) in context.props().iter().zip(context.props_indices().iter()) {
        let result = store.get_prop(prop_name, params)?;
        args[pos] = Some(Node::new(result.to_dual(prop_name)?));
    }

    Ok(args
        .into_iter()
        .map(|a| {
            a.expect("every argument position is filled by either a physical or derived dependency")
        })
        .collect())
}

impl PropertyValue {
    pub fn as_scalar(&self) -> f64 {
        self.value()
    }
}
