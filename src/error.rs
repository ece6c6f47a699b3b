// SPDX-License-Identifier: MIT OR Apache-2.0

use backtrace::Backtrace;
use thiserror::Error;

/// Default error type for the crate.
#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("Property `{name}` is already registered\n{trace}")]
    DuplicateProperty { name: String, trace: String },

    #[error("Dependency cycle detected while resolving `{name}`: {cycle}\n{trace}")]
    DependencyCycle {
        name: String,
        cycle: String,
        trace: String,
    },

    #[error("Dependencies of `{name}` are already initialized\n{trace}")]
    DependenciesAlreadySet { name: String, trace: String },

    #[error("Physical dependencies of `{name}` are already initialized\n{trace}")]
    PhysicalDependenciesAlreadySet { name: String, trace: String },

    #[error("Dependencies of `{name}` must be initialized before its physical dependencies\n{trace}")]
    DependenciesNotSet { name: String, trace: String },

    #[error("Dependencies and physical dependencies of `{name}` must be initialized before its implicit dependencies\n{trace}")]
    PhysicalDependenciesNotSet { name: String, trace: String },

    #[error("Unknown property `{name}`\n{trace}")]
    UnknownProperty { name: String, trace: String },

    #[error("Store must be initialized before querying `{name}`\n{trace}")]
    StoreNotInitialized { name: String, trace: String },

    #[error("Missing physical parameter `{param}` required by `{name}`\n{trace}")]
    MissingParameter {
        name: String,
        param: String,
        trace: String,
    },

    #[error("Argument `{name}` expected gradient columns matching `{expected}`, found `{found}`\n{trace}")]
    GradientShapeMismatch {
        name: String,
        expected: String,
        found: String,
        trace: String,
    },
}

/// Default result type for the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Computes the name of the current function.
// https://stackoverflow.com/questions/38088067/equivalent-of-func-or-function-in-rust
#[macro_export]
macro_rules! func_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        &name[..name.len() - 3]
    }};
}

impl Error {
    fn backtrace() -> String {
        if std::env::var("RUST_BACKTRACE").is_ok() {
            format!("{:?}", Backtrace::new())
        } else {
            String::new()
        }
    }

    /// Report a duplicate property registration.
    pub fn duplicate_property(name: &str) -> Self {
        Error::DuplicateProperty {
            name: name.to_string(),
            trace: Self::backtrace(),
        }
    }

    /// Report a dependency cycle, with the cycle rendered as `a -> b -> a`.
    pub fn dependency_cycle(name: &str, cycle: &[String]) -> Self {
        Error::DependencyCycle {
            name: name.to_string(),
            cycle: cycle.join(" -> "),
            trace: Self::backtrace(),
        }
    }

    pub fn dependencies_already_set(name: &str) -> Self {
        Error::DependenciesAlreadySet {
            name: name.to_string(),
            trace: Self::backtrace(),
        }
    }

    pub fn physical_dependencies_already_set(name: &str) -> Self {
        Error::PhysicalDependenciesAlreadySet {
            name: name.to_string(),
            trace: Self::backtrace(),
        }
    }

    pub fn dependencies_not_set(name: &str) -> Self {
        Error::DependenciesNotSet {
            name: name.to_string(),
            trace: Self::backtrace(),
        }
    }

    pub fn physical_dependencies_not_set(name: &str) -> Self {
        Error::PhysicalDependenciesNotSet {
            name: name.to_string(),
            trace: Self::backtrace(),
        }
    }

    /// Report a query for an unregistered property.
    pub fn unknown_property(name: &str) -> Self {
        Error::UnknownProperty {
            name: name.to_string(),
            trace: Self::backtrace(),
        }
    }

    /// Report a query against a store that has not completed `initialize`.
    pub fn store_not_initialized(name: &str) -> Self {
        Error::StoreNotInitialized {
            name: name.to_string(),
            trace: Self::backtrace(),
        }
    }

    /// Report a missing physical parameter at query time.
    pub fn missing_parameter(name: &str, param: &str) -> Self {
        Error::MissingParameter {
            name: name.to_string(),
            param: param.to_string(),
            trace: Self::backtrace(),
        }
    }

    pub fn gradient_shape_mismatch(name: &str, expected: usize, found: usize) -> Self {
        Error::GradientShapeMismatch {
            name: name.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
            trace: Self::backtrace(),
        }
    }
}
