use std::{any::TypeId, collections::HashMap};

use crate::{
    factories::DynFactory,
    types::{Instance, TypeInfo},
};

/// All bindings of a registry, keyed by the bound type
pub(crate) type BindingMap = HashMap<TypeId, Binding>;

/// Construction progress of a single binding
pub(crate) enum BuildState {
    /// Not constructed yet - holds the factory that will construct it
    Unbuilt(Box<dyn DynFactory>),
    /// Construction started and has not completed yet
    InProgress,
    /// Finished instance, shared by every dependent
    Built(Instance),
}

impl BuildState {
    pub(crate) fn is_built(&self) -> bool {
        matches!(self, BuildState::Built(_))
    }
}

/// How to produce the instance registered under `key`
pub(crate) struct Binding {
    pub key: TypeInfo,
    /// The type actually constructed
    pub implementation: TypeInfo,
    /// Constructor parameter keys, `None` until discovered
    pub dependencies: Option<Vec<TypeInfo>>,
    pub state: BuildState,
}

impl Binding {
    /// A binding which is constructed by the given factory during initialization
    pub(crate) fn unbuilt(
        key: TypeInfo,
        implementation: TypeInfo,
        factory: Box<dyn DynFactory>,
    ) -> Self {
        Binding {
            key,
            implementation,
            dependencies: None,
            state: BuildState::Unbuilt(factory),
        }
    }

    /// A binding around an already existing instance - it is never constructed
    pub(crate) fn built(instance: Instance) -> Self {
        Binding {
            key: instance.info,
            implementation: instance.info,
            dependencies: Some(Vec::new()),
            state: BuildState::Built(instance),
        }
    }

    pub(crate) fn instance(&self) -> Option<&Instance> {
        match &self.state {
            BuildState::Built(instance) => Some(instance),
            _ => None,
        }
    }
}
