// SPDX-License-Identifier: MIT OR Apache-2.0

//! The store: the registry of properties, their initialization, and the
//! query entry point.

use crate::cache::CacheConfig;
use crate::context::resolve_implicit_dependencies;
use crate::error::{Error, Result};
use crate::wrapper::{PropertyFn, PropertyValue, PropertyWrapper};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

/// Store-wide defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub default_cache_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            default_cache_size: 1,
        }
    }
}

/// The property registry. Not `Sync`: a concurrent embedder must serialize
/// access to a given store (e.g. behind a `Mutex<Store>`), per the
/// concurrency model — recursive queries re-enter the store and its
/// per-property caches mutate on read. Each property's cache is held in a
/// `RefCell` so that a query can recurse into sibling properties through a
/// shared `&Store` while still mutating the property it is currently
/// evaluating.
pub struct Store {
    props: IndexMap<String, RefCell<PropertyWrapper>>,
    config: StoreConfig,
    initialized: bool,
}

impl Store {
    pub fn new() -> Self {
        Store::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Store {
            props: IndexMap::new(),
            config,
            initialized: false,
        }
    }

    /// Register a property. Duplicate names are a registration error.
    pub fn add_prop(
        &mut self,
        name: impl Into<String>,
        arg_names: Vec<String>,
        function: PropertyFn,
    ) -> Result<()> {
        self.add_prop_with_cache(name, arg_names, function, None)
    }

    /// Register a property with an explicit cache size, overriding
    /// [`StoreConfig::default_cache_size`].
    pub fn add_prop_with_cache(
        &mut self,
        name: impl Into<String>,
        arg_names: Vec<String>,
        function: PropertyFn,
        cache_size: Option<usize>,
    ) -> Result<()> {
        let name = name.into();
        if self.props.contains_key(&name) {
            return Err(Error::duplicate_property(&name));
        }
        tracing::debug!(property = %name, "registering property");
        let cache_config = CacheConfig {
            maxsize: cache_size.unwrap_or(self.config.default_cache_size),
            ..CacheConfig::default()
        };
        let mut wrapper = PropertyWrapper::new(&name, arg_names, function, cache_config);
        wrapper
            .context
            .add_dependencies(wrapper.arg_names().to_vec())?;
        self.props.insert(name, RefCell::new(wrapper));
        self.initialized = false;
        Ok(())
    }

    /// Resolve every property's dependency context and set up its cache.
    /// Idempotent over already-initialized contexts: re-running after
    /// registering a new property does not disturb previously-resolved
    /// ones. When `keep_cache` is true, existing caches are preserved
    /// across re-initialization.
    pub fn initialize(&mut self, keep_cache: bool) -> Result<()> {
        tracing::info!("initializing store");
        let all_props: HashSet<String> = self.props.keys().cloned().collect();

        for wrapper in self.props.values() {
            let mut wrapper = wrapper.borrow_mut();
            if !wrapper.context.physical_deps_initialized() {
                wrapper.context.add_physical_dependencies(&all_props)?;
            }
        }

        let contexts: IndexMap<String, crate::context::FunctionContext> = self
            .props
            .iter()
            .map(|(name, wrapper)| (name.clone(), wrapper.borrow().context.clone()))
            .collect();
        let implicit = resolve_implicit_dependencies(&contexts)?;

        for (name, wrapper) in self.props.iter() {
            let mut wrapper = wrapper.borrow_mut();
            if !wrapper.context.implicit_deps_initialized() {
                let closure = implicit.get(name).cloned().unwrap_or_default();
                wrapper.context.set_implicit_dependencies(closure)?;
            }
        }

        if !keep_cache {
            for wrapper in self.props.values() {
                wrapper.borrow_mut().clear_cache();
            }
        }

        self.initialized = true;
        tracing::info!("store initialized");
        Ok(())
    }

    /// Query a property's value given a set of physical parameters.
    /// `initialize` must have completed first; a store with registered but
    /// unresolved properties returns [`Error::StoreNotInitialized`] rather
    /// than querying against empty dependency sets.
    pub fn get_prop(
        &self,
        name: &str,
        params: &HashMap<String, PropertyValue>,
    ) -> Result<PropertyValue> {
        if !self.initialized {
            return Err(Error::store_not_initialized(name));
        }
        let cell = self
            .props
            .get(name)
            .ok_or_else(|| Error::unknown_property(name))?;
        tracing::trace!(property = %name, "querying property");
        let mut wrapper = cell.borrow_mut();
        wrapper.call(self, params)
    }

    /// Clear the caches of the named properties.
    pub fn reset_caches(&mut self, names: &[String]) -> Result<()> {
        for name in names {
            let cell = self
                .props
                .get(name)
                .ok_or_else(|| Error::unknown_property(name))?;
            cell.borrow_mut().clear_cache();
        }
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl Default for Store {
    fn default() -> Self {
        Store::new()
    }
}
