use std::{any::TypeId, collections::BTreeMap};

use thiserror::Error;

use crate::{
    binding::{BindingMap, BuildState},
    types::TypeInfo,
};

/// Records the constructor parameters of every binding which has not been discovered yet
///
/// Afterwards all discovered edges are checked against the registry.
/// Returns a list of all missing dependencies.
pub(crate) fn discover(bindings: &mut BindingMap) -> Result<usize, DependencyGraphErrors> {
    let mut discovered = 0;
    for binding in bindings.values_mut() {
        if binding.dependencies.is_some() {
            continue;
        }

        let dependencies = match &binding.state {
            BuildState::Unbuilt(factory) => factory.dependencies(),
            BuildState::InProgress | BuildState::Built(_) => Vec::new(),
        };

        tracing::trace!(
            "Discovered {} dependencies for {}",
            dependencies.len(),
            binding.key
        );
        binding.dependencies = Some(dependencies);
        discovered += 1;
    }

    let mut errors = Vec::new();
    for binding in bindings.values() {
        for dependency in binding.dependencies.iter().flatten() {
            if !bindings.contains_key(&dependency.type_id) {
                errors.push(DependencyGraphError::MissingDependency {
                    dependency: *dependency,
                    required_by: binding.key,
                });
            }
        }
    }

    if !errors.is_empty() {
        return Err(DependencyGraphErrors { errors });
    }

    Ok(discovered)
}

/// Graph of the entire registry
/// Read only snapshot taken when the container is built, enables visualization of the wiring
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    map: BTreeMap<TypeId, DependencyGraphEntry>,
}
impl DependencyGraph {
    pub(crate) fn new(bindings: &BindingMap) -> Self {
        let map = bindings
            .iter()
            .map(|(type_id, binding)| {
                let entry = DependencyGraphEntry {
                    info: binding.key,
                    implementation: binding.implementation,
                    dependencies: binding.dependencies.clone().unwrap_or_default(),
                };
                (*type_id, entry)
            })
            .collect();

        Self { map }
    }

    /// Constructor parameters of the type bound under `K`
    pub fn dependencies_of<K: ?Sized + 'static>(&self) -> Option<&[TypeInfo]> {
        self.map
            .get(&TypeId::of::<K>())
            .map(|entry| entry.dependencies.as_slice())
    }

    /// The type constructed for the key `K`
    pub fn implementation_of<K: ?Sized + 'static>(&self) -> Option<TypeInfo> {
        self.map
            .get(&TypeId::of::<K>())
            .map(|entry| entry.implementation)
    }

    pub fn entries(&self) -> impl Iterator<Item = &DependencyGraphEntry> {
        self.map.values()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl std::fmt::Display for DependencyGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut entries: Vec<_> = self.map.values().collect();
        entries.sort_by_key(|entry| entry.info.type_name);

        for entry in entries {
            write!(f, "{}", entry.info)?;
            if entry.implementation != entry.info {
                write!(f, " ({})", entry.implementation)?;
            }
            let dependencies: Vec<_> = entry
                .dependencies
                .iter()
                .map(|dependency| dependency.type_name)
                .collect();
            writeln!(f, " <- [{}]", dependencies.join(", "))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct DependencyGraphEntry {
    pub info: TypeInfo,
    pub implementation: TypeInfo,
    pub dependencies: Vec<TypeInfo>,
}

#[derive(Error, Debug, Clone)]
pub enum DependencyGraphError {
    #[error("'{required_by}' needs '{dependency}' but it is missing")]
    MissingDependency {
        dependency: TypeInfo,
        required_by: TypeInfo,
    },
}
impl std::fmt::Display for DependencyGraphErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut display = Vec::new();
        display.push("The dependency graph had one or more errors:".to_string());
        for error in &self.errors {
            display.push(format!("- {}", error));
        }
        f.write_str(&display.join("\n"))
    }
}

#[derive(Error, Debug, Clone)]
pub struct DependencyGraphErrors {
    pub errors: Vec<DependencyGraphError>,
}
