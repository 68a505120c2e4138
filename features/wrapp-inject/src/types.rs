use std::{
    any::{Any, TypeId},
    sync::Arc,
};

/// All errors must be Send + Sync so they can be shared through `Arc`
pub type DynError = Box<dyn std::error::Error + Send + Sync>;

/// The container is built once and may be shared between threads afterwards
/// So anything injectable needs to be Send + Sync + 'static
///
/// Trait objects qualify as long as their trait requires `Send + Sync`.
pub trait Injectable: Send + Sync + 'static {}
impl<T: ?Sized + Send + Sync + 'static> Injectable for T {}

/// A finished, shared instance stored under a key
///
/// The erased value is always an `Arc<K>` where `K` is the key type, so trait
/// objects can be stored and handed out without knowing the implementation.
#[derive(Clone)]
pub struct Instance {
    pub info: TypeInfo,
    instance: Arc<dyn Any + Send + Sync + 'static>,
}

impl Instance {
    pub(crate) fn new<Key: ?Sized + Injectable>(instance: Arc<Key>) -> Self {
        Instance {
            info: TypeInfo::of::<Key>(),
            instance: Arc::new(instance),
        }
    }

    /// Returns the shared instance, or the stored type name if `T` does not match
    pub fn downcast<T: ?Sized + Injectable>(&self) -> Result<Arc<T>, &'static str> {
        match self.instance.downcast_ref::<Arc<T>>() {
            Some(downcasted) => Ok(downcasted.clone()),
            None => Err(self.info.type_name),
        }
    }
}

impl std::fmt::Debug for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Instance").field(&self.info.type_name).finish()
    }
}

/// Type Name and Type Id
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub struct TypeInfo {
    pub type_name: &'static str,
    pub type_id: TypeId,
}
impl std::fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name)
    }
}
impl TypeInfo {
    pub fn of<T: 'static + ?Sized>() -> TypeInfo {
        TypeInfo {
            type_name: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{Instance, TypeInfo};

    trait Greeter: Send + Sync {
        fn greet(&self) -> &'static str;
    }

    #[derive(Debug)]
    struct English;
    impl Greeter for English {
        fn greet(&self) -> &'static str {
            "hello"
        }
    }

    #[test]
    fn type_info_distinguishes_trait_objects_from_implementations() {
        assert_ne!(TypeInfo::of::<dyn Greeter>(), TypeInfo::of::<English>());
        assert_eq!(TypeInfo::of::<English>(), TypeInfo::of::<English>());
    }

    #[test]
    fn instance_downcasts_to_its_key_type() {
        let greeter: Arc<dyn Greeter> = Arc::new(English);
        let instance = Instance::new::<dyn Greeter>(greeter.clone());

        let resolved = instance.downcast::<dyn Greeter>().unwrap();
        assert_eq!(resolved.greet(), "hello");
        assert!(Arc::ptr_eq(&resolved, &greeter));
    }

    #[test]
    fn instance_refuses_the_implementation_type() {
        let instance = Instance::new::<dyn Greeter>(Arc::new(English));

        let error = instance.downcast::<English>().unwrap_err();
        assert_eq!(error, std::any::type_name::<dyn Greeter>());
    }
}
