use std::sync::Arc;

use thiserror::Error;

use crate::{
    dependency_graph::DependencyGraphErrors,
    types::{DynError, TypeInfo},
};

#[derive(Error, Debug)]
pub enum InjectError {
    /// Could not require the type
    #[error(transparent)]
    RequireError(#[from] RequireError),
    /// The constructor received a different number of arguments than it declared
    #[error("Constructor expects {expected} arguments but received {actual}")]
    ArgumentCount { expected: usize, actual: usize },
    /// Generic error during Injection
    #[error("Error during injection: {0}")]
    Other(DynError),
}

/// Errors when trying to require a certain type
#[derive(thiserror::Error, Debug, Clone)]
pub enum RequireError {
    /// The required type was never bound
    #[error("'{0}' was not registered in the service registry")]
    NotRegistered(TypeInfo),
    /// The required type is bound but has not been constructed yet
    #[error("'{0}' has not been initialized - call `initialize` before resolving")]
    NotInitialized(TypeInfo),

    #[error("Failed to downcast, required: '{required_type}' actual: '{actual_type}'")]
    DowncastFailed {
        required_type: &'static str,
        actual_type: &'static str,
    },
}

/// Errors while Initiating types
#[derive(thiserror::Error, Debug, Clone)]
pub enum InitError {
    /// There are issues with the dependency graph
    #[error(transparent)]
    DependencyGraphError(#[from] DependencyGraphErrors),

    /// Constructing `from` required `to`, which is still being constructed
    #[error("A Circular Dependency exists between '{from}' and '{to}' through {}", format_chain(.chain))]
    CircularReference {
        from: TypeInfo,
        to: TypeInfo,
        chain: Vec<TypeInfo>,
    },

    /// Instantiation ran before the dependencies of a binding were discovered
    #[error("Dependencies of '{0}' were not discovered - call `init_dependencies` first")]
    DependenciesNotDiscovered(TypeInfo),

    /// A Factory failed to build
    #[error("Factory for '{product}' failed - error: {error}")]
    FactoryFailed {
        product: &'static str,
        error: Arc<DynError>,
    },
}

fn format_chain(chain: &[TypeInfo]) -> String {
    chain
        .iter()
        .map(|info| info.type_name)
        .collect::<Vec<_>>()
        .join(" -> ")
}
