//! Wrapp Inject is a minimal dependency injection container.
//!
//! Keys are types - concrete types or trait objects - and every key is a
//! singleton which is constructed once and shared by all of its dependents.
//!
//! Wrapp Inject is split into three parts:
//! 1. ServiceRegistry: bind keys to instances, constructible types or factories
//! 2. Initialization: discovers every constructor's dependencies, then constructs
//!    the whole graph depth first, failing on missing bindings and cycles
//! 3. DiContainer: the frozen, shareable result
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use wrapp_inject::{Construct, DynError, ServiceRegistry};
//!
//! trait Repository: Send + Sync {
//!     fn find(&self, id: u32) -> Option<String>;
//! }
//!
//! struct InMemoryRepository;
//! impl Repository for InMemoryRepository {
//!     fn find(&self, id: u32) -> Option<String> {
//!         (id == 1).then(|| "alice".to_string())
//!     }
//! }
//! impl Construct for InMemoryRepository {
//!     type Dependencies = ();
//!
//!     fn construct(_: ()) -> Result<Self, DynError> {
//!         Ok(InMemoryRepository)
//!     }
//! }
//!
//! struct UserService {
//!     repository: Arc<dyn Repository>,
//! }
//! impl Construct for UserService {
//!     type Dependencies = (Arc<dyn Repository>,);
//!
//!     fn construct((repository,): Self::Dependencies) -> Result<Self, DynError> {
//!         Ok(UserService { repository })
//!     }
//! }
//!
//! let mut registry = ServiceRegistry::new();
//! registry
//!     .bind::<dyn Repository, InMemoryRepository>(|repository| repository)
//!     .bind_self::<UserService>();
//!
//! registry.initialize().unwrap();
//!
//! let users = registry.resolve::<UserService>().unwrap();
//! assert_eq!(users.repository.find(1).as_deref(), Some("alice"));
//! ```

mod binding;
pub mod container;
pub mod dependency_graph;
pub mod errors;
pub mod factories;
mod initiator;
pub mod registry;
pub mod types;

pub use container::DiContainer;
pub use dependency_graph::{DependencyGraph, DependencyGraphError, DependencyGraphErrors};
pub use errors::{InitError, InjectError, RequireError};
pub use factories::{Construct, Dependency, DependencyList, DynFactory};
pub use registry::ServiceRegistry;
pub use types::{DynError, Injectable, Instance, TypeInfo};
