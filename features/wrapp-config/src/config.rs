use std::{ops::Deref, sync::Arc};

use wrapp_inject::{Dependency, InjectError, Instance, RequireError, TypeInfo};

use crate::provider::ConfigProvider;

/// A wrapper type to allow for config injections
///
/// This provides a simple way to retrieve configs from the [`ConfigProvider`],
/// and take them as a constructor parameter. The provider itself is the
/// dependency, so it must be bound in the registry.
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use wrapp_config::{Config, ConfigProvider};
/// use wrapp_inject::{Construct, DynError, ServiceRegistry};
///
/// pub struct HttpConfig {
///     port: u16,
/// }
///
/// pub struct HttpServer {
///     port: u16,
/// }
/// impl Construct for HttpServer {
///     type Dependencies = (Config<HttpConfig>,);
///
///     fn construct((config,): Self::Dependencies) -> Result<Self, DynError> {
///         Ok(HttpServer { port: config.port })
///     }
/// }
///
/// let mut configs = ConfigProvider::new();
/// configs.add_config(HttpConfig { port: 8080 }).unwrap();
///
/// let mut registry = ServiceRegistry::new();
/// registry.bind_self_from_instance(configs).bind_self::<HttpServer>();
/// registry.initialize().unwrap();
///
/// assert_eq!(registry.resolve::<HttpServer>().unwrap().port, 8080);
/// ```
pub struct Config<T> {
    inner: Arc<T>,
}
impl<T> Deref for Config<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
impl<T> Config<T> {
    pub fn inner(&self) -> Arc<T> {
        self.inner.clone()
    }

    pub fn into_inner(self) -> Arc<T> {
        self.inner
    }
}

impl<T: Send + Sync + 'static> Dependency for Config<T> {
    fn key() -> TypeInfo {
        TypeInfo::of::<ConfigProvider>()
    }

    fn from_instance(instance: &Instance) -> Result<Self, InjectError> {
        let config_provider = instance.downcast::<ConfigProvider>().map_err(|actual_type| {
            RequireError::DowncastFailed {
                required_type: std::any::type_name::<ConfigProvider>(),
                actual_type,
            }
        })?;

        let config = config_provider
            .get_config::<T>()
            .map_err(|e| InjectError::Other(Box::new(e)))?;

        Ok(Config { inner: config })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use wrapp_inject::{Construct, DynError, InitError, ServiceRegistry};

    use super::Config;
    use crate::provider::ConfigProvider;

    struct DatabaseConfig {
        url: &'static str,
    }

    struct Database {
        url: &'static str,
    }
    impl Construct for Database {
        type Dependencies = (Config<DatabaseConfig>,);

        fn construct((config,): Self::Dependencies) -> Result<Self, DynError> {
            Ok(Database { url: config.url })
        }
    }

    #[test]
    fn configs_are_injected_into_constructors() {
        let mut configs = ConfigProvider::new();
        configs
            .add_config(DatabaseConfig {
                url: "postgres://localhost",
            })
            .unwrap();

        let mut registry = ServiceRegistry::new();
        registry
            .bind_self_from_instance(configs)
            .bind_self::<Database>();
        registry.initialize().unwrap();

        assert_eq!(
            registry.resolve::<Database>().unwrap().url,
            "postgres://localhost"
        );
        assert!(registry.resolve::<ConfigProvider>().is_ok());
    }

    #[test]
    fn missing_configs_fail_the_factory() {
        let mut registry = ServiceRegistry::new();
        registry
            .bind_self_from_instance(ConfigProvider::new())
            .bind_self::<Database>();

        match registry.initialize() {
            Err(InitError::FactoryFailed { product, error }) => {
                assert_eq!(product, std::any::type_name::<Database>());
                assert!(error.to_string().contains("DatabaseConfig"));
            }
            other => panic!("expected a factory failure, got {other:?}"),
        }
    }

    #[test]
    fn the_provider_must_be_bound() {
        let mut registry = ServiceRegistry::new();
        registry.bind_self::<Database>();

        assert!(matches!(
            registry.initialize(),
            Err(InitError::DependencyGraphError(_))
        ));
    }

    #[test]
    fn config_shares_the_registered_value() {
        let mut configs = ConfigProvider::new();
        configs.add_config(DatabaseConfig { url: "sqlite::memory:" }).unwrap();
        let registered = configs.get_config::<DatabaseConfig>().unwrap();

        let mut registry = ServiceRegistry::new();
        registry.bind_self_from_instance(configs).bind_factory(
            |(config,): (Config<DatabaseConfig>,)| -> Result<Arc<Arc<DatabaseConfig>>, DynError> {
                Ok(Arc::new(config.into_inner()))
            },
        );
        registry.initialize().unwrap();

        let injected = registry.resolve::<Arc<DatabaseConfig>>().unwrap();
        assert!(Arc::ptr_eq(&*injected, &registered));
    }
}
