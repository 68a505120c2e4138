use std::{any::type_name, sync::Arc};

use crate::{
    binding::{Binding, BindingMap},
    container::DiContainer,
    dependency_graph::{self, DependencyGraph},
    errors::{InitError, RequireError},
    factories::{Construct, DependencyList, FnFactory},
    initiator::DiInitiator,
    types::{DynError, Injectable, Instance, TypeInfo},
};

//////////////////////////////////////////////////////////////////////
///
/// The registry is used in three steps.
/// 1. Bind every key to an instance, a constructible type or a factory
/// 2. Initialize - discovers all dependencies and constructs every binding
/// 3. Resolve the finished instances, or freeze everything into a [`DiContainer`]
///
/// Every key is a singleton: it is constructed once and shared by all dependents.
pub struct ServiceRegistry {
    bindings: BindingMap,
    /// Set by the first `initialize` call, whether or not it succeeded
    initialized_once: bool,
}
impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceRegistry {
    pub fn new() -> Self {
        ServiceRegistry {
            bindings: BindingMap::new(),
            initialized_once: false,
        }
    }
}

// Registration
impl ServiceRegistry {
    /// Binds `Key` to an already existing instance, which is never constructed again
    ///
    /// Interfaces are bound by coercing the instance, e.g.
    /// `bind_from_instance::<dyn Cache>(Arc::new(InMemoryCache::default()))`
    pub fn bind_from_instance<Key: ?Sized + Injectable>(
        &mut self,
        instance: Arc<Key>,
    ) -> &mut Self {
        self.insert(Binding::built(Instance::new(instance)))
    }

    /// Binds an existing instance under its own type
    pub fn bind_self_from_instance<T: Injectable>(&mut self, instance: T) -> &mut Self {
        self.bind_from_instance(Arc::new(instance))
    }

    /// Binds `Key` to be constructed from `T` once the registry is initialized
    ///
    /// `upcast` turns the constructed `T` into the key type, for trait objects
    /// this is just the coercion `|service| service`.
    pub fn bind<Key, T>(&mut self, upcast: fn(Arc<T>) -> Arc<Key>) -> &mut Self
    where
        Key: ?Sized + Injectable,
        T: Construct,
    {
        let factory = move |dependencies: T::Dependencies| -> Result<Arc<Key>, DynError> {
            T::construct(dependencies).map(|instance| upcast(Arc::new(instance)))
        };

        self.insert(Binding::unbuilt(
            TypeInfo::of::<Key>(),
            TypeInfo::of::<T>(),
            Box::new(FnFactory::<Key, T::Dependencies, _>::new(factory)),
        ))
    }

    /// Binds `T` to be constructed from itself
    pub fn bind_self<T: Construct>(&mut self) -> &mut Self {
        self.bind::<T, T>(|instance| instance)
    }

    /// Binds `Key` to a factory closure
    ///
    /// The closure receives its dependencies as a tuple, e.g. `(Arc<Database>, Arc<dyn Cache>)`,
    /// each element resolved against the registry in order.
    pub fn bind_factory<Key, Dependencies, F>(&mut self, factory: F) -> &mut Self
    where
        Key: ?Sized + Injectable,
        Dependencies: DependencyList + 'static,
        F: Fn(Dependencies) -> Result<Arc<Key>, DynError> + Send + Sync + 'static,
    {
        self.insert(Binding::unbuilt(
            TypeInfo::of::<Key>(),
            TypeInfo::of::<Key>(),
            Box::new(FnFactory::<Key, Dependencies, _>::new(factory)),
        ))
    }

    fn insert(&mut self, binding: Binding) -> &mut Self {
        if self.initialized_once {
            tracing::warn!(
                "{} was bound after initialization - it is constructed on the next `initialize`",
                binding.key
            );
        }

        let key = binding.key;
        if let Some(previous) = self.bindings.insert(key.type_id, binding) {
            tracing::debug!(
                "Replaced binding {} ({}) with {}",
                key,
                previous.implementation,
                self.bindings[&key.type_id].implementation
            );
        }
        self
    }

    pub fn contains<Key: ?Sized + 'static>(&self) -> bool {
        self.bindings.contains_key(&TypeInfo::of::<Key>().type_id)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

// Initialization
impl ServiceRegistry {
    /// Discovers all dependencies and constructs every binding
    ///
    /// Calling it again only constructs bindings added since, existing instances are kept.
    pub fn initialize(&mut self) -> Result<(), InitError> {
        tracing::debug!(
            "Initializing service registry with {} bindings",
            self.bindings.len()
        );
        self.initialized_once = true;

        self.init_dependencies()?;
        self.resolve_graph()?;

        tracing::debug!("Service registry initialized");
        Ok(())
    }

    /// Records the constructor parameters of every binding and checks that all of them are bound
    pub fn init_dependencies(&mut self) -> Result<(), InitError> {
        let discovered = dependency_graph::discover(&mut self.bindings)?;
        tracing::debug!("Discovered dependencies of {} bindings", discovered);
        Ok(())
    }

    /// Constructs every binding which has no instance yet, dependencies first
    pub fn resolve_graph(&mut self) -> Result<(), InitError> {
        let constructed = DiInitiator::new(&mut self.bindings).initiate()?;
        tracing::debug!("Constructed {} instances", constructed);
        Ok(())
    }

    /// Returns true once every binding has been constructed
    pub fn is_initialized(&self) -> bool {
        self.bindings
            .values()
            .all(|binding| binding.instance().is_some())
    }

    /// Initializes the registry and freezes it into a shareable [`DiContainer`]
    pub fn build(mut self) -> Result<DiContainer, InitError> {
        self.initialize()?;

        let graph = DependencyGraph::new(&self.bindings);
        let instances = self
            .bindings
            .into_iter()
            .filter_map(|(type_id, binding)| {
                let instance = binding.instance()?.clone();
                Some((type_id, instance))
            })
            .collect();

        Ok(DiContainer::new(instances, graph))
    }
}

// Retrieval
impl ServiceRegistry {
    /// Returns the finished instance bound under `Key`
    pub fn resolve<Key: ?Sized + Injectable>(&self) -> Result<Arc<Key>, RequireError> {
        let info = TypeInfo::of::<Key>();
        let Some(binding) = self.bindings.get(&info.type_id) else {
            tracing::debug!("Tried to resolve an unregistered type: {}", info);
            return Err(RequireError::NotRegistered(info));
        };

        let Some(instance) = binding.instance() else {
            return Err(RequireError::NotInitialized(info));
        };

        instance
            .downcast::<Key>()
            .map_err(|actual_type| RequireError::DowncastFailed {
                required_type: type_name::<Key>(),
                actual_type,
            })
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_struct("ServiceRegistry");
        for binding in self.bindings.values() {
            let val = if binding.instance().is_some() {
                "built"
            } else {
                "unbuilt"
            };
            map.field(binding.key.type_name, &val);
        }
        map.finish()
    }
}
