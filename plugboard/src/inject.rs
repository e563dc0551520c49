//! Injection binder wiring declared dependencies into consumer types.
//!
//! A consumer is any type implementing [`Consumer`]: it exposes a static
//! [`Binding`] listing the dependency names it requires and an [`Injector`]
//! holding its per-instance injection state. Accessor reads go through
//! [`resolve`], accessor writes through [`assign`].
//!
//! Resolution order for a declared name:
//!
//! 1. The current registry has the name: its dependency produces the value.
//! 2. No registry is installed or the registry lacks the name: a manual
//!    override stored on the consumer is returned.
//! 3. Otherwise resolution fails with a [`ResolutionError`] naming the
//!    dependency and the consumer type.
//!
//! # Examples
//!
//! Implementing a consumer by hand:
//!
//! ```rust
//! use plugboard::{Binding, Consumer, Injector, Overrides, assign, resolve};
//! use std::sync::LazyLock;
//!
//! struct Mailer {
//!     injector: Injector,
//! }
//!
//! impl Consumer for Mailer {
//!     fn binding() -> &'static Binding {
//!         static BINDING: LazyLock<Binding> =
//!             LazyLock::new(|| Binding::new::<Mailer>(["smtp_host"]));
//!         &BINDING
//!     }
//!
//!     fn injector(&self) -> &Injector {
//!         &self.injector
//!     }
//! }
//!
//! let mailer = Mailer {
//!     injector: Injector::bound::<Mailer>(
//!         Overrides::new().with("smtp_host", String::from("localhost")),
//!     ),
//! };
//! let host = resolve::<_, String>(&mailer, "smtp_host").unwrap();
//! assert_eq!(host.as_str(), "localhost");
//!
//! assign(&mailer, "smtp_host", String::from("mail.example.com")).unwrap();
//! let host = resolve::<_, String>(&mailer, "smtp_host").unwrap();
//! assert_eq!(host.as_str(), "mail.example.com");
//! ```

use std::any::type_name;
use std::sync::Arc;

use dashmap::DashMap;

use crate::dependency::short_type_name;
use crate::{Instance, Registry, ResolutionError, ResolutionErrorKind, ScopeCache};

/// Dependency declarations of a consumer type.
#[derive(Debug, Clone)]
pub struct Binding {
    consumer: &'static str,
    names: Vec<&'static str>,
}

impl Binding {
    /// Creates a binding for consumer type `C`.
    ///
    /// Names keep their declaration order, repeated names are ignored.
    pub fn new<C>(names: impl IntoIterator<Item = &'static str>) -> Self
    where
        C: ?Sized,
    {
        let consumer = short_type_name(type_name::<C>());
        let mut declared = Vec::new();
        for name in names {
            if declared.contains(&name) {
                continue;
            }
            tracing::info!(consumer, dependency = name, "Dependency required");
            declared.push(name);
        }
        Self {
            consumer,
            names: declared,
        }
    }

    /// Short type name of the consumer.
    pub fn consumer(&self) -> &'static str {
        self.consumer
    }

    /// Declared dependency names in declaration order.
    pub fn names(&self) -> &[&'static str] {
        &self.names
    }

    pub fn declares(&self, name: &str) -> bool {
        self.names.iter().any(|v| *v == name)
    }
}

/// A type whose instances receive dependencies from the registry.
///
/// Usually implemented with `#[derive(Consumer)]`, which also generates typed
/// accessor methods for every declared dependency.
pub trait Consumer: 'static {
    /// Returns the dependency declarations of this type.
    fn binding() -> &'static Binding;

    /// Returns the injection state of this instance.
    fn injector(&self) -> &Injector;
}

/// Per-instance injection state of a consumer.
///
/// Holds manual overrides and the cache of lazy dependencies scoped to this
/// consumer. Every consumer owns exactly one injector.
#[derive(Default)]
pub struct Injector {
    overrides: DashMap<String, Instance>,
    cache: ScopeCache,
}

impl Injector {
    /// Creates an injector without overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an injector for consumer `C` seeded with constructor overrides.
    ///
    /// Overrides for names not declared by `C` are dropped.
    pub fn bound<C>(overrides: Overrides) -> Self
    where
        C: Consumer,
    {
        let binding = C::binding();
        let injector = Self::new();
        for (name, value) in overrides.values {
            if !binding.declares(&name) {
                tracing::debug!(
                    consumer = binding.consumer(),
                    dependency = %name,
                    "Ignoring override of undeclared dependency"
                );
                continue;
            }
            tracing::info!(
                consumer = binding.consumer(),
                dependency = %name,
                "Dependency injected manually through constructor"
            );
            injector.overrides.insert(name, value);
        }
        injector
    }

    /// Stores a manual override for the dependency.
    ///
    /// The name is not checked against the consumer binding, use [`assign`]
    /// for a checked write.
    pub fn set_override<T>(&self, name: &str, value: Arc<T>)
    where
        T: Send + Sync + 'static,
    {
        let value: Instance = value;
        self.overrides.insert(name.to_owned(), value);
    }

    pub fn has_override(&self, name: &str) -> bool {
        self.overrides.contains_key(name)
    }

    /// Removes a manual override, returning `true` if one was present.
    pub fn clear_override(&self, name: &str) -> bool {
        self.overrides.remove(name).is_some()
    }

    /// Cache of lazy dependencies scoped to this consumer.
    pub fn cache(&self) -> &ScopeCache {
        &self.cache
    }

    fn override_value(&self, name: &str) -> Option<Instance> {
        self.overrides.get(name).map(|v| v.value().clone())
    }
}

/// Named values passed to a consumer at construction time.
///
/// # Examples
///
/// ```rust
/// use plugboard::Overrides;
///
/// let overrides = Overrides::new().with("retries", 3u32).with("endpoint", "localhost");
/// assert_eq!(overrides.len(), 2);
/// ```
#[derive(Default)]
pub struct Overrides {
    values: Vec<(String, Instance)>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an override value.
    pub fn with<T>(self, name: impl Into<String>, value: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        self.with_arc(name, Arc::new(value))
    }

    /// Adds an already shared override value.
    pub fn with_arc<T>(mut self, name: impl Into<String>, value: Arc<T>) -> Self
    where
        T: Send + Sync + 'static,
    {
        let value: Instance = value;
        self.values.push((name.into(), value));
        self
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Resolves a declared dependency of `consumer` through the current registry.
///
/// # Errors
///
/// Fails when the name is not declared by `C`, when neither the registry nor
/// a manual override provides the value, or when the value is not a `T`.
pub fn resolve<C, T>(consumer: &C, name: &str) -> Result<Arc<T>, ResolutionError>
where
    C: Consumer,
    T: Send + Sync + 'static,
{
    let registry = Registry::current();
    resolve_in(registry.as_deref(), consumer, name)
}

/// Resolves a declared dependency of `consumer` through an explicit registry.
///
/// Passing `None` behaves as if no registry was installed.
pub fn resolve_in<C, T>(
    registry: Option<&Registry>,
    consumer: &C,
    name: &str,
) -> Result<Arc<T>, ResolutionError>
where
    C: Consumer,
    T: Send + Sync + 'static,
{
    let binding = C::binding();
    if !binding.declares(name) {
        return Err(ResolutionError::new(name, ResolutionErrorKind::Undeclared)
            .with_consumer(binding.consumer()));
    }
    tracing::debug!(
        consumer = binding.consumer(),
        dependency = name,
        "Injecting dependency"
    );
    let injector = consumer.injector();
    let lookup = match registry {
        Some(registry) => registry.get(name),
        None => Err(ResolutionError::new(name, ResolutionErrorKind::NoRegistry)),
    };
    let instance = match lookup {
        Ok(dependency) => dependency.get(injector),
        Err(err) => match injector.override_value(name) {
            Some(value) => {
                tracing::info!(
                    consumer = binding.consumer(),
                    dependency = name,
                    "Dependency was injected manually"
                );
                value
            }
            None => {
                tracing::debug!(
                    consumer = binding.consumer(),
                    dependency = name,
                    error = %err,
                    "Dependency resolution failed"
                );
                return Err(err.with_consumer(binding.consumer()));
            }
        },
    };
    instance.downcast::<T>().map_err(|_| {
        ResolutionError::new(
            name,
            ResolutionErrorKind::TypeMismatch {
                expected: type_name::<T>(),
            },
        )
        .with_consumer(binding.consumer())
    })
}

/// Stores a manual override for a declared dependency of `consumer`.
///
/// # Errors
///
/// Fails with [`ResolutionErrorKind::Undeclared`] when `C` does not declare `name`.
pub fn assign<C, T>(consumer: &C, name: &str, value: T) -> Result<(), ResolutionError>
where
    C: Consumer,
    T: Send + Sync + 'static,
{
    assign_arc(consumer, name, Arc::new(value))
}

/// Stores an already shared manual override for a declared dependency of `consumer`.
///
/// # Errors
///
/// Fails with [`ResolutionErrorKind::Undeclared`] when `C` does not declare `name`.
pub fn assign_arc<C, T>(consumer: &C, name: &str, value: Arc<T>) -> Result<(), ResolutionError>
where
    C: Consumer,
    T: Send + Sync + 'static,
{
    let binding = C::binding();
    if !binding.declares(name) {
        return Err(ResolutionError::new(name, ResolutionErrorKind::Undeclared)
            .with_consumer(binding.consumer()));
    }
    consumer.injector().set_override(name, value);
    Ok(())
}
