// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dependency resolution: classifying a property's declared arguments into
//! direct physical parameters and direct derived properties, then
//! computing the transitive ("implicit") physical closure reached through
//! derived dependencies.

use crate::error::{Error, Result};
use std::collections::HashSet;

/// Per-property resolved dependency metadata.
#[derive(Debug, Default, Clone)]
pub struct FunctionContext {
    name: String,
    dependents: Option<Vec<String>>,
    deps_set: bool,

    /// Direct physical dependencies, in `arg_names` order.
    physical_props: Vec<String>,
    /// Original positions of `physical_props` within `arg_names`.
    physical_props_indices: Vec<usize>,
    /// Direct derived (registered-property) dependencies, in `arg_names` order.
    props: Vec<String>,
    /// Original positions of `props` within `arg_names`.
    props_indices: Vec<usize>,
    physical_deps_set: bool,

    /// Physical parameters reached transitively through `props`, in
    /// first-seen DFS order.
    implicit_physical_props: Vec<String>,
    implicit_deps_set: bool,
}

impl FunctionContext {
    pub fn new(name: impl Into<String>) -> Self {
        FunctionContext {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn physical_props(&self) -> &[String] {
        &self.physical_props
    }

    pub fn implicit_physical_props(&self) -> &[String] {
        &self.implicit_physical_props
    }

    pub fn props(&self) -> &[String] {
        &self.props
    }

    pub fn props_indices(&self) -> &[usize] {
        &self.props_indices
    }

    pub fn physical_props_indices(&self) -> &[usize] {
        &self.physical_props_indices
    }

    /// Number of declared arguments (`arg_names.len()`).
    pub fn arity(&self) -> usize {
        self.dependents.as_ref().map(|d| d.len()).unwrap_or(0)
    }

    pub fn physical_deps_initialized(&self) -> bool {
        self.physical_deps_set
    }

    pub fn implicit_deps_initialized(&self) -> bool {
        self.implicit_deps_set
    }

    /// Stage 1: record the property's declared argument names.
    pub fn add_dependencies(&mut self, dependents: Vec<String>) -> Result<()> {
        if self.deps_set {
            return Err(Error::dependencies_already_set(&self.name));
        }
        self.dependents = Some(dependents);
        self.deps_set = true;
        Ok(())
    }

    /// Stage 2: partition `dependents` into direct physical parameters and
    /// direct derived properties, given the store's full set of registered
    /// property names.
    pub fn add_physical_dependencies(&mut self, all_props: &HashSet<String>) -> Result<()> {
        if self.physical_deps_set {
            return Err(Error::physical_dependencies_already_set(&self.name));
        }
        if !self.deps_set {
            return Err(Error::dependencies_not_set(&self.name));
        }

        let dependents = self.dependents.clone().unwrap_or_default();
        for (i, arg) in dependents.iter().enumerate() {
            if all_props.contains(arg) {
                self.props.push(arg.clone());
                self.props_indices.push(i);
            } else {
                self.physical_props.push(arg.clone());
                self.physical_props_indices.push(i);
            }
        }
        self.physical_deps_set = true;
        Ok(())
    }

    /// Stage 3: compute the implicit physical closure, given each
    /// dependency's already-resolved direct and implicit physical sets.
    /// `direct_physical` and `transitive_implicit` are looked up by name
    /// among this property's direct derived dependencies.
    pub fn set_implicit_dependencies(
        &mut self,
        implicit: Vec<String>,
    ) -> Result<()> {
        if !self.deps_set || !self.physical_deps_set {
            return Err(Error::physical_dependencies_not_set(&self.name));
        }
        self.implicit_physical_props = implicit;
        self.implicit_deps_set = true;
        Ok(())
    }
}

/// Colour used by the cycle-detecting DFS over the derived-dependency graph.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Colour {
    White,
    Gray,
    Black,
}

/// Compute the implicit physical closure for every context in `contexts`,
/// in first-seen DFS order, detecting cycles with a standard three-colour
/// DFS. `contexts` must already have completed stage 2
/// (`add_physical_dependencies`) for every entry.
pub fn resolve_implicit_dependencies(
    contexts: &indexmap::IndexMap<String, FunctionContext>,
) -> Result<std::collections::HashMap<String, Vec<String>>> {
    let mut colour: std::collections::HashMap<&str, Colour> = contexts
        .keys()
        .map(|k| (k.as_str(), Colour::White))
        .collect();
    let mut implicit: std::collections::HashMap<String, Vec<String>> = std::collections::HashMap::new();
    let mut stack: Vec<String> = Vec::new();

    fn visit<'a>(
        name: &'a str,
        contexts: &'a indexmap::IndexMap<String, FunctionContext>,
        colour: &mut std::collections::HashMap<&'a str, Colour>,
        implicit: &mut std::collections::HashMap<String, Vec<String>>,
        stack: &mut Vec<String>,
    ) -> Result<()> {
        match colour.get(name) {
            Some(Colour::Black) => return Ok(()),
            Some(Colour::Gray) => {
                stack.push(name.to_string());
                return Err(Error::dependency_cycle(name, stack));
            }
            _ => {}
        }
        colour.insert(name, Colour::Gray);
        stack.push(name.to_string());

        let ctx = &contexts[name];
        let mut seen: HashSet<String> = HashSet::new();
        let mut ordered: Vec<String> = Vec::new();

        for dep in ctx.props().iter() {
            visit(dep, contexts, colour, implicit, stack)?;
            let dep_ctx = &contexts[dep];
            for p in dep_ctx.physical_props().iter().chain(
                implicit
                    .get(dep)
                    .map(|v| v.as_slice())
                    .unwrap_or(&[])
                    .iter(),
            ) {
                if ctx.physical_props().contains(p) {
                    continue;
                }
                if seen.insert(p.clone()) {
                    ordered.push(p.clone());
                }
            }
        }

        implicit.insert(name.to_string(), ordered);
        stack.pop();
        colour.insert(name, Colour::Black);
        Ok(())
    }

    for name in contexts.keys() {
        visit(name, contexts, &mut colour, &mut implicit, &mut stack)?;
    }

    Ok(implicit)
}
