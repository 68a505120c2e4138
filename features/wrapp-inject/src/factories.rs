use std::{any::type_name, marker::PhantomData, sync::Arc};

use crate::{
    errors::{InjectError, RequireError},
    types::{DynError, Injectable, Instance, TypeInfo},
};

/// A type the registry can construct from other registered instances
///
/// `Dependencies` stands in for the constructor's parameter list: every
/// element is one parameter, in declaration order.
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use wrapp_inject::{Construct, DynError};
///
/// struct Database;
/// struct UserService {
///     database: Arc<Database>,
/// }
///
/// impl Construct for UserService {
///     type Dependencies = (Arc<Database>,);
///
///     fn construct((database,): Self::Dependencies) -> Result<Self, DynError> {
///         Ok(UserService { database })
///     }
/// }
/// ```
pub trait Construct: Injectable + Sized {
    type Dependencies: DependencyList + 'static;

    /// Constructs a new instance from its already constructed dependencies
    fn construct(dependencies: Self::Dependencies) -> Result<Self, DynError>;
}

/// A single constructor parameter
pub trait Dependency: Sized {
    /// The registry key this parameter is resolved against
    fn key() -> TypeInfo;

    /// Converts the finished instance stored under [`Dependency::key`] into the parameter
    fn from_instance(instance: &Instance) -> Result<Self, InjectError>;
}

impl<T: ?Sized + Injectable> Dependency for Arc<T> {
    fn key() -> TypeInfo {
        TypeInfo::of::<T>()
    }

    fn from_instance(instance: &Instance) -> Result<Self, InjectError> {
        instance.downcast::<T>().map_err(|actual_type| {
            RequireError::DowncastFailed {
                required_type: type_name::<T>(),
                actual_type,
            }
            .into()
        })
    }
}

/// An ordered list of constructor parameters
pub trait DependencyList: Sized {
    /// Keys of all parameters, in declaration order
    fn keys() -> Vec<TypeInfo>;

    /// Builds the parameter list from finished instances given positionally
    fn from_instances(instances: &[Instance]) -> Result<Self, InjectError>;
}

impl DependencyList for () {
    fn keys() -> Vec<TypeInfo> {
        Vec::new()
    }

    fn from_instances(instances: &[Instance]) -> Result<Self, InjectError> {
        match instances.len() {
            0 => Ok(()),
            actual => Err(InjectError::ArgumentCount {
                expected: 0,
                actual,
            }),
        }
    }
}

macro_rules! define_dependency_list {
    ($count:literal => $($T:ident),+) => {
        impl<$($T: Dependency),+> DependencyList for ($($T,)+) {
            fn keys() -> Vec<TypeInfo> {
                vec![$($T::key()),+]
            }

            #[allow(non_snake_case)]
            fn from_instances(instances: &[Instance]) -> Result<Self, InjectError> {
                let [$($T),+] = instances else {
                    return Err(InjectError::ArgumentCount {
                        expected: $count,
                        actual: instances.len(),
                    });
                };

                Ok(($($T::from_instance($T)?,)+))
            }
        }
    };
}

define_dependency_list! { 1 => T1 }
define_dependency_list! { 2 => T1, T2 }
define_dependency_list! { 3 => T1, T2, T3 }
define_dependency_list! { 4 => T1, T2, T3, T4 }
define_dependency_list! { 5 => T1, T2, T3, T4, T5 }
define_dependency_list! { 6 => T1, T2, T3, T4, T5, T6 }
define_dependency_list! { 7 => T1, T2, T3, T4, T5, T6, T7 }
define_dependency_list! { 8 => T1, T2, T3, T4, T5, T6, T7, T8 }
define_dependency_list! { 9 => T1, T2, T3, T4, T5, T6, T7, T8, T9 }
define_dependency_list! { 10 => T1, T2, T3, T4, T5, T6, T7, T8, T9, T10 }
define_dependency_list! { 11 => T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11 }
define_dependency_list! { 12 => T1, T2, T3, T4, T5, T6, T7, T8, T9, T10, T11, T12 }

/// Type erased factory stored by unbuilt bindings
pub trait DynFactory: Send + Sync {
    /// Returns the keys of all constructor parameters, in order
    fn dependencies(&self) -> Vec<TypeInfo>;

    /// Constructs a new instance from finished dependency instances
    fn construct(&self, arguments: &[Instance]) -> Result<Instance, DynError>;
}

/// Factory closure producing the instance stored under `Key`
pub(crate) struct FnFactory<Key: ?Sized, Dependencies, F> {
    factory: F,
    _marker: PhantomData<fn(Dependencies) -> Arc<Key>>,
}

impl<Key: ?Sized, Dependencies, F> FnFactory<Key, Dependencies, F> {
    pub(crate) fn new(factory: F) -> Self {
        FnFactory {
            factory,
            _marker: PhantomData,
        }
    }
}

impl<Key, Dependencies, F> DynFactory for FnFactory<Key, Dependencies, F>
where
    Key: ?Sized + Injectable,
    Dependencies: DependencyList,
    F: Fn(Dependencies) -> Result<Arc<Key>, DynError> + Send + Sync,
{
    fn dependencies(&self) -> Vec<TypeInfo> {
        Dependencies::keys()
    }

    fn construct(&self, arguments: &[Instance]) -> Result<Instance, DynError> {
        let dependencies = Dependencies::from_instances(arguments)?;
        (self.factory)(dependencies).map(Instance::new::<Key>)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{Dependency, DependencyList, DynFactory, FnFactory};
    use crate::{
        errors::{InjectError, RequireError},
        types::{DynError, Instance, TypeInfo},
    };

    #[derive(Debug)]
    struct Port(u16);
    #[derive(Debug)]
    struct Host(&'static str);

    #[test]
    fn keys_follow_declaration_order() {
        let keys = <(Arc<Host>, Arc<Port>)>::keys();
        assert_eq!(keys, vec![TypeInfo::of::<Host>(), TypeInfo::of::<Port>()]);
    }

    #[test]
    fn arguments_are_passed_positionally() {
        let instances = [
            Instance::new(Arc::new(Host("localhost"))),
            Instance::new(Arc::new(Port(8080))),
        ];

        let (host, port) = <(Arc<Host>, Arc<Port>)>::from_instances(&instances).unwrap();
        assert_eq!(host.0, "localhost");
        assert_eq!(port.0, 8080);
    }

    #[test]
    fn argument_count_is_checked() {
        let instances = [Instance::new(Arc::new(Port(1)))];

        let error = <(Arc<Host>, Arc<Port>)>::from_instances(&instances).unwrap_err();
        assert!(matches!(
            error,
            InjectError::ArgumentCount {
                expected: 2,
                actual: 1
            }
        ));
        assert!(<()>::from_instances(&instances).is_err());
    }

    #[test]
    fn mismatched_instance_fails_to_downcast() {
        let instance = Instance::new(Arc::new(Port(1)));

        let error = <Arc<Host>>::from_instance(&instance).unwrap_err();
        assert!(matches!(
            error,
            InjectError::RequireError(RequireError::DowncastFailed { .. })
        ));
    }

    #[test]
    fn fn_factory_wraps_the_closure() {
        let factory = FnFactory::<String, (Arc<Host>, Arc<Port>), _>::new(
            |(host, port): (Arc<Host>, Arc<Port>)| -> Result<Arc<String>, DynError> {
                Ok(Arc::new(format!("{}:{}", host.0, port.0)))
            },
        );

        assert_eq!(factory.dependencies().len(), 2);

        let instance = factory
            .construct(&[
                Instance::new(Arc::new(Host("localhost"))),
                Instance::new(Arc::new(Port(80))),
            ])
            .unwrap();
        assert_eq!(*instance.downcast::<String>().unwrap(), "localhost:80");
    }
}
