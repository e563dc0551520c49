use std::collections::{HashMap, hash_map};
use std::sync::Arc;

use arc_swap::ArcSwapOption;

use crate::{Dependency, ResolutionError, ResolutionErrorKind};

/// The process-wide current registry.
static CURRENT: ArcSwapOption<Registry> = ArcSwapOption::const_empty();

/// Mapping from dependency names to dependency variants.
///
/// A registry is built by application setup code and then installed as the
/// process-wide current registry, which every accessor read consults.
///
/// Installing is a single atomic pointer swap: a resolution running
/// concurrently with an install observes either the old or the new registry,
/// never a partially built one. Installs themselves are not serialized
/// against each other, so concurrent installs race and the last writer wins.
/// A merging install that races with another install may lose the entries
/// of the other one.
///
/// # Examples
///
/// ```rust
/// use plugboard::{Dynamic, Eager, Registry};
///
/// struct Settings;
///
/// Registry::new()
///     .with(Eager::new(Settings))
///     .install();
///
/// Registry::new()
///     .with(Dynamic::new(|| 42u64).named("answer"))
///     .install_merged();
///
/// let current = Registry::current().unwrap();
/// assert!(current.contains("settings"));
/// assert!(current.contains("answer"));
/// ```
#[derive(Clone, Default)]
pub struct Registry {
    dependencies: HashMap<String, Arc<dyn Dependency>>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry from a list of dependencies.
    ///
    /// Later dependencies overwrite earlier ones with the same name.
    pub fn from_dependencies<I>(dependencies: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Dependency>>,
    {
        let mut registry = Self::new();
        for dependency in dependencies {
            registry.register_arc(dependency);
        }
        registry
    }

    /// Adds a dependency, returning the registry for chaining.
    pub fn with<D>(mut self, dependency: D) -> Self
    where
        D: Dependency + 'static,
    {
        self.register(dependency);
        self
    }

    /// Adds a dependency, overwriting any dependency with the same name.
    pub fn register<D>(&mut self, dependency: D) -> &mut Self
    where
        D: Dependency + 'static,
    {
        self.register_arc(Arc::new(dependency))
    }

    /// Adds a shared dependency, overwriting any dependency with the same name.
    pub fn register_arc(&mut self, dependency: Arc<dyn Dependency>) -> &mut Self {
        match self.dependencies.entry(dependency.name().to_owned()) {
            hash_map::Entry::Occupied(mut v) => {
                tracing::warn!(dependency = %v.key(), "Dependency overwritten");
                v.insert(dependency);
            }
            hash_map::Entry::Vacant(v) => {
                tracing::info!(dependency = %v.key(), "Dependency registered");
                v.insert(dependency);
            }
        };
        self
    }

    /// Installs the registry, replacing the current one.
    pub fn install(self) -> Arc<Registry> {
        self.install_with(false)
    }

    /// Installs the registry on top of the current one.
    ///
    /// Entries of this registry win on name collisions.
    pub fn install_merged(self) -> Arc<Registry> {
        self.install_with(true)
    }

    /// Installs the registry as the current one.
    ///
    /// # Arguments
    ///
    /// * `merge` - When `true` and a registry is already installed, this
    ///   registry is overlaid on a copy of the current mapping.
    ///
    /// # Returns
    ///
    /// The registry that became current.
    pub fn install_with(mut self, merge: bool) -> Arc<Registry> {
        if merge && let Some(current) = CURRENT.load_full() {
            let mut dependencies = current.dependencies.clone();
            dependencies.extend(self.dependencies);
            self.dependencies = dependencies;
        }
        let registry = Arc::new(self);
        CURRENT.store(Some(registry.clone()));
        tracing::info!(dependencies = registry.len(), merge, "Registry installed");
        registry
    }

    /// Returns the current registry, or `None` if none was ever installed.
    pub fn current() -> Option<Arc<Registry>> {
        CURRENT.load_full()
    }

    /// Clears the current registry, returning the one that was installed.
    pub fn uninstall() -> Option<Arc<Registry>> {
        let registry = CURRENT.swap(None);
        if registry.is_some() {
            tracing::info!("Registry uninstalled");
        }
        registry
    }

    /// Looks up a dependency by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Dependency>, ResolutionError> {
        self.dependencies
            .get(name)
            .cloned()
            .ok_or_else(|| ResolutionError::new(name, ResolutionErrorKind::NotFound))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.dependencies.contains_key(name)
    }

    /// Returns registered names in lexicographic order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.dependencies.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.dependencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dependencies.is_empty()
    }
}

impl FromIterator<Arc<dyn Dependency>> for Registry {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Arc<dyn Dependency>>,
    {
        Self::from_dependencies(iter)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("dependencies", &self.names())
            .finish()
    }
}
