use std::sync::Arc;

use crate::{
    binding::{BindingMap, BuildState},
    dependency_graph::{DependencyGraphError, DependencyGraphErrors},
    errors::InitError,
    factories::DynFactory,
    types::{Instance, TypeInfo},
};

/// Constructs every unbuilt binding of a registry
///
/// Depth first: each dependency is fully constructed before its dependents.
/// A binding is marked [`BuildState::InProgress`] before descending into its
/// dependencies, so reaching it again on the way down is a cycle.
pub(crate) struct DiInitiator<'a> {
    bindings: &'a mut BindingMap,
    /// Keys currently under construction, outermost first
    chain: Vec<TypeInfo>,
    constructed: usize,
}
impl<'a> DiInitiator<'a> {
    pub(crate) fn new(bindings: &'a mut BindingMap) -> Self {
        DiInitiator {
            bindings,
            chain: Vec::new(),
            constructed: 0,
        }
    }

    /// Constructs all bindings which are not built yet
    ///
    /// Returns the number of constructed instances
    pub(crate) fn initiate(mut self) -> Result<usize, InitError> {
        let pending: Vec<TypeInfo> = self
            .bindings
            .values()
            .filter(|binding| !binding.state.is_built())
            .map(|binding| binding.key)
            .collect();

        tracing::debug!("Constructing {} bindings", pending.len());

        for info in pending {
            self.instantiate(info)?;
        }

        Ok(self.constructed)
    }

    fn instantiate(&mut self, info: TypeInfo) -> Result<Instance, InitError> {
        let Some(binding) = self.bindings.get_mut(&info.type_id) else {
            let required_by = self.chain.last().copied().unwrap_or(info);
            return Err(DependencyGraphErrors {
                errors: vec![DependencyGraphError::MissingDependency {
                    dependency: info,
                    required_by,
                }],
            }
            .into());
        };

        let factory = match std::mem::replace(&mut binding.state, BuildState::InProgress) {
            BuildState::Built(instance) => {
                binding.state = BuildState::Built(instance.clone());
                return Ok(instance);
            }
            BuildState::InProgress => return Err(circular_reference(&self.chain, info)),
            BuildState::Unbuilt(factory) => factory,
        };

        let Some(dependencies) = binding.dependencies.clone() else {
            binding.state = BuildState::Unbuilt(factory);
            return Err(InitError::DependenciesNotDiscovered(info));
        };
        let product = binding.implementation.type_name;

        self.chain.push(info);
        let result = self.construct(product, factory.as_ref(), &dependencies);
        self.chain.pop();

        // On failure the factory goes back, so nothing stays in progress
        if let Some(binding) = self.bindings.get_mut(&info.type_id) {
            binding.state = match &result {
                Ok(instance) => {
                    tracing::debug!("Constructed instance of {}", product);
                    self.constructed += 1;
                    BuildState::Built(instance.clone())
                }
                Err(_) => BuildState::Unbuilt(factory),
            };
        }

        result
    }

    /// Builds every dependency in order, then calls the factory with them
    fn construct(
        &mut self,
        product: &'static str,
        factory: &dyn DynFactory,
        dependencies: &[TypeInfo],
    ) -> Result<Instance, InitError> {
        let mut arguments = Vec::with_capacity(dependencies.len());
        for dependency in dependencies {
            tracing::trace!("{} requires {}", product, dependency);
            arguments.push(self.instantiate(*dependency)?);
        }

        factory
            .construct(&arguments)
            .map_err(|error| InitError::FactoryFailed {
                product,
                error: Arc::new(error),
            })
    }
}

fn circular_reference(chain: &[TypeInfo], to: TypeInfo) -> InitError {
    let from = chain.last().copied().unwrap_or(to);
    let start = chain.iter().position(|info| *info == to).unwrap_or(0);

    let mut chain = chain[start..].to_vec();
    chain.push(to); // Add current so chain is complete

    InitError::CircularReference { from, to, chain }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use super::DiInitiator;
    use crate::{
        binding::{Binding, BindingMap, BuildState},
        dependency_graph::discover,
        errors::InitError,
        factories::FnFactory,
        types::{DynError, Instance, TypeInfo},
    };

    struct Leaf;
    struct Branch(Arc<Leaf>);
    struct Root(Arc<Branch>, Arc<Leaf>);

    fn bind<K: Send + Sync + 'static, D: crate::factories::DependencyList + 'static>(
        bindings: &mut BindingMap,
        factory: impl Fn(D) -> Result<Arc<K>, DynError> + Send + Sync + 'static,
    ) {
        let info = TypeInfo::of::<K>();
        let factory = FnFactory::<K, D, _>::new(factory);
        bindings.insert(info.type_id, Binding::unbuilt(info, info, Box::new(factory)));
    }

    #[test]
    fn dependencies_are_built_before_dependents() {
        let leaf_count = Arc::new(AtomicUsize::new(0));
        let counter = leaf_count.clone();

        let mut bindings = BindingMap::new();
        bind(&mut bindings, move |(): ()| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Leaf))
        });
        bind(&mut bindings, |(leaf,): (Arc<Leaf>,)| Ok(Arc::new(Branch(leaf))));
        bind(&mut bindings, |(branch, leaf): (Arc<Branch>, Arc<Leaf>)| {
            Ok(Arc::new(Root(branch, leaf)))
        });
        discover(&mut bindings).unwrap();

        assert_eq!(DiInitiator::new(&mut bindings).initiate().unwrap(), 3);
        assert_eq!(leaf_count.load(Ordering::SeqCst), 1);

        let root = bindings[&TypeInfo::of::<Root>().type_id]
            .instance()
            .unwrap()
            .downcast::<Root>()
            .unwrap();
        assert!(Arc::ptr_eq(&root.0 .0, &root.1));
    }

    #[test]
    fn undiscovered_bindings_are_refused() {
        let mut bindings = BindingMap::new();
        bind(&mut bindings, |(): ()| Ok(Arc::new(Leaf)));

        let error = DiInitiator::new(&mut bindings).initiate().unwrap_err();
        assert!(matches!(error, InitError::DependenciesNotDiscovered(_)));
        assert!(matches!(
            bindings[&TypeInfo::of::<Leaf>().type_id].state,
            BuildState::Unbuilt(_)
        ));
    }

    #[test]
    fn failed_factories_leave_the_binding_unbuilt() {
        let mut bindings = BindingMap::new();
        bind(&mut bindings, |(): ()| -> Result<Arc<Leaf>, DynError> {
            Err("disk on fire".into())
        });
        bind(&mut bindings, |(leaf,): (Arc<Leaf>,)| Ok(Arc::new(Branch(leaf))));
        discover(&mut bindings).unwrap();

        let (product, error) = match DiInitiator::new(&mut bindings).initiate() {
            Err(InitError::FactoryFailed { product, error }) => (product, error),
            other => panic!("expected a factory failure, got {other:?}"),
        };
        assert_eq!(product, std::any::type_name::<Leaf>());
        assert_eq!(error.to_string(), "disk on fire");

        for binding in bindings.values() {
            assert!(matches!(binding.state, BuildState::Unbuilt(_)));
        }
    }

    #[test]
    fn cycles_report_both_participants() {
        struct Egg;
        struct Chicken;

        let mut bindings = BindingMap::new();
        bind(&mut bindings, |_: (Arc<Chicken>,)| Ok(Arc::new(Egg)));
        bind(&mut bindings, |_: (Arc<Egg>,)| Ok(Arc::new(Chicken)));
        discover(&mut bindings).unwrap();

        let (from, to, chain) = match DiInitiator::new(&mut bindings).initiate() {
            Err(InitError::CircularReference { from, to, chain }) => (from, to, chain),
            other => panic!("expected a circular reference, got {other:?}"),
        };
        assert_ne!(from, to);
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.first(), Some(&to));
        assert_eq!(chain.last(), Some(&to));
        assert!([TypeInfo::of::<Egg>(), TypeInfo::of::<Chicken>()].contains(&from));

        for binding in bindings.values() {
            assert!(binding.instance().is_none());
        }
    }

    #[test]
    fn fixed_instances_are_not_constructed_again() {
        let leaf = Arc::new(Leaf);
        let mut bindings = BindingMap::new();
        bindings.insert(
            TypeInfo::of::<Leaf>().type_id,
            Binding::built(Instance::new(leaf.clone())),
        );
        bind(&mut bindings, |(leaf,): (Arc<Leaf>,)| Ok(Arc::new(Branch(leaf))));
        discover(&mut bindings).unwrap();

        assert_eq!(DiInitiator::new(&mut bindings).initiate().unwrap(), 1);

        let branch = bindings[&TypeInfo::of::<Branch>().type_id]
            .instance()
            .unwrap()
            .downcast::<Branch>()
            .unwrap();
        assert!(Arc::ptr_eq(&branch.0, &leaf));
    }
}
