use std::{
    any::{type_name, TypeId},
    collections::HashMap,
    fmt::Debug,
    sync::Arc,
};

use crate::{
    dependency_graph::DependencyGraph,
    errors::RequireError,
    types::{Injectable, Instance, TypeInfo},
};

/// Container holding all initiated instances
///
/// Read only - produced by [`crate::ServiceRegistry::build`] and cheap to clone and share between threads.
#[derive(Clone)]
pub struct DiContainer(pub Arc<DiContainerInner>);
pub struct DiContainerInner {
    instances: HashMap<TypeId, Instance>,
    graph: DependencyGraph,
}
impl Debug for DiContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_struct("DiContainer");
        for entry in self.0.graph.entries() {
            map.field(entry.info.type_name, &entry.implementation.type_name);
        }
        map.finish()
    }
}

impl DiContainer {
    pub(crate) fn new(instances: HashMap<TypeId, Instance>, graph: DependencyGraph) -> Self {
        Self(Arc::new(DiContainerInner { instances, graph }))
    }

    /// Attempts to get the instance bound under `Key`
    pub fn resolve<Key: ?Sized + Injectable>(&self) -> Result<Arc<Key>, RequireError> {
        match self.0.instances.get(&TypeId::of::<Key>()) {
            Some(instance) => {
                instance
                    .downcast::<Key>()
                    .map_err(|actual_type| RequireError::DowncastFailed {
                        required_type: type_name::<Key>(),
                        actual_type,
                    })
            }
            None => Err(RequireError::NotRegistered(TypeInfo::of::<Key>())),
        }
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.0.graph
    }
}
