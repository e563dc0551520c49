//! Dependency variants describing how a registered value is produced.
//!
//! Every variant implements [`Dependency`], which is what a [`Registry`](crate::Registry)
//! stores under the dependency name:
//!
//! - [`Eager`] - a single value created up front and shared by every consumer.
//! - [`Dynamic`] - a producer invoked on every access, nothing is cached.
//! - [`Lazy`] - a producer invoked on first access and cached per scope,
//!   where the scope is selected by the `per_thread` and `per_consumer` flags.
//!
//! # Examples
//!
//! ```rust
//! use plugboard::{Dependency, Dynamic, Eager, Lazy};
//!
//! struct MyComponent;
//! struct Connection;
//!
//! assert_eq!(Eager::new(MyComponent).name(), "my_component");
//! assert_eq!(Dynamic::new(|| Connection).name(), "connection");
//! assert_eq!(Lazy::new(|| Connection).named("pool").per_thread().name(), "pool");
//! ```

use std::any::{Any, type_name};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, LazyLock, OnceLock};
use std::thread::{self, ThreadId};

use dashmap::DashMap;
use regex::Regex;

use crate::Injector;

/// Type-erased value handed out by dependencies.
pub type Instance = Arc<dyn Any + Send + Sync>;

/// A named recipe for producing a dependency value.
///
/// Implementations must be cheap to call concurrently: `get` is invoked on
/// every accessor read of the dependency.
pub trait Dependency: Send + Sync {
    /// Name under which the dependency is registered.
    fn name(&self) -> &str;

    /// Produces (or returns a cached) value for the given consumer.
    ///
    /// # Arguments
    ///
    /// * `consumer` - Injection state of the consumer that requested the value.
    ///   Variants caching per consumer store their values there.
    fn get(&self, consumer: &Injector) -> Instance;
}

impl std::fmt::Debug for dyn Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dependency")
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}

/// Dependency wrapping a single value shared by every consumer.
pub struct Eager<T> {
    name: String,
    value: Arc<T>,
}

impl<T> Eager<T>
where
    T: Send + Sync + 'static,
{
    /// Creates a dependency named after the type of `value`.
    pub fn new(value: T) -> Self {
        Self::from_arc(Arc::new(value))
    }

    /// Creates a dependency sharing an already allocated value.
    pub fn from_arc(value: Arc<T>) -> Self {
        Self {
            name: snake_case_name::<T>(),
            value,
        }
    }

    /// Replaces the derived name with an explicit one.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn value(&self) -> &Arc<T> {
        &self.value
    }
}

impl<T> Dependency for Eager<T>
where
    T: Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, _consumer: &Injector) -> Instance {
        self.value.clone()
    }
}

type Producer<T> = Box<dyn Fn() -> T + Send + Sync>;

/// Dependency invoking its producer on every access.
pub struct Dynamic<T> {
    name: String,
    producer: Producer<T>,
}

impl<T> Dynamic<T>
where
    T: Send + Sync + 'static,
{
    /// Creates a dependency named after the produced type.
    pub fn new<F>(producer: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            name: snake_case_name::<T>(),
            producer: Box::new(producer),
        }
    }

    /// Replaces the derived name with an explicit one.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<T> Dependency for Dynamic<T>
where
    T: Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, _consumer: &Injector) -> Instance {
        Arc::new((self.producer)())
    }
}

/// Dependency constructing its value on first access and caching it.
///
/// The cache key is built from two independent flags:
///
/// - `per_thread`: every thread gets its own value.
/// - `per_consumer`: the value is cached on the consumer instead of on the
///   dependency, so every consumer gets its own value.
///
/// With both flags unset the value is a process-wide lazy singleton.
/// For a given key the producer is invoked exactly once, even when several
/// threads race on the first access.
///
/// # Examples
///
/// ```rust
/// use plugboard::{Dependency, Injector, Lazy};
/// use std::sync::Arc;
///
/// struct Session;
///
/// let session = Lazy::new(|| Session).per_consumer();
/// let (first, second) = (Injector::new(), Injector::new());
///
/// assert!(Arc::ptr_eq(&session.get(&first), &session.get(&first)));
/// assert!(!Arc::ptr_eq(&session.get(&first), &session.get(&second)));
/// ```
pub struct Lazy<T> {
    name: String,
    producer: Producer<T>,
    per_thread: bool,
    per_consumer: bool,
    variant: u64,
    cache: ScopeCache,
}

/// Source of [`Lazy`] identities, so consumer caches never mix up two
/// variants registered under the same name.
static NEXT_VARIANT: AtomicU64 = AtomicU64::new(0);

impl<T> Lazy<T>
where
    T: Send + Sync + 'static,
{
    /// Creates a process-wide lazy dependency named after the produced type.
    pub fn new<F>(producer: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            name: snake_case_name::<T>(),
            producer: Box::new(producer),
            per_thread: false,
            per_consumer: false,
            variant: NEXT_VARIANT.fetch_add(1, Ordering::Relaxed),
            cache: ScopeCache::new(),
        }
    }

    /// Replaces the derived name with an explicit one.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Caches a separate value for every thread.
    pub fn per_thread(mut self) -> Self {
        self.per_thread = true;
        self
    }

    /// Caches a separate value for every consumer.
    ///
    /// Values are stored on the consumer's [`Injector`] under this variant's
    /// identity. Replacing the variant in the registry with another one of
    /// the same name starts a fresh value; values built by the old variant
    /// stay on the consumer until it is dropped.
    pub fn per_consumer(mut self) -> Self {
        self.per_consumer = true;
        self
    }

    /// Sets both scoping flags at once.
    pub fn scoped(mut self, per_thread: bool, per_consumer: bool) -> Self {
        self.per_thread = per_thread;
        self.per_consumer = per_consumer;
        self
    }

    pub fn is_per_thread(&self) -> bool {
        self.per_thread
    }

    pub fn is_per_consumer(&self) -> bool {
        self.per_consumer
    }
}

impl<T> Dependency for Lazy<T>
where
    T: Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn get(&self, consumer: &Injector) -> Instance {
        let thread = self.per_thread.then(|| thread::current().id());
        let owner = if self.per_consumer {
            consumer.cache()
        } else {
            &self.cache
        };
        let slot = owner.slot(thread, self.variant, &self.name);
        slot.get_or_init(|| {
            tracing::debug!(
                dependency = %self.name,
                per_thread = self.per_thread,
                per_consumer = self.per_consumer,
                "Constructing lazy dependency"
            );
            let instance: Instance = Arc::new((self.producer)());
            instance
        })
        .clone()
    }
}

/// Storage for lazily constructed values, keyed by thread and dependency name.
///
/// Names are paired with the identity of the [`Lazy`] that built the value.
/// The underlying map is allocated on first use, so owners can embed an empty
/// cache for free.
#[derive(Default)]
pub struct ScopeCache {
    threads: OnceLock<DashMap<Option<ThreadId>, DashMap<(u64, String), Arc<OnceLock<Instance>>>>>,
}

impl ScopeCache {
    pub const fn new() -> Self {
        Self {
            threads: OnceLock::new(),
        }
    }

    /// Returns the slot for the key, creating an empty one if needed.
    ///
    /// Map locks are released before the slot is returned, so initializing
    /// one slot never blocks access to the others.
    fn slot(&self, thread: Option<ThreadId>, variant: u64, name: &str) -> Arc<OnceLock<Instance>> {
        let threads = self.threads.get_or_init(DashMap::new);
        let names = threads.entry(thread).or_default();
        Arc::clone(&names.entry((variant, name.to_owned())).or_default())
    }

    /// Returns the number of values constructed so far.
    pub fn len(&self) -> usize {
        match self.threads.get() {
            Some(threads) => threads
                .iter()
                .map(|names| names.iter().filter(|slot| slot.get().is_some()).count())
                .sum(),
            None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Derives the default dependency name for `T`.
///
/// The last path segment of the type name is converted from CamelCase to
/// lower_snake_case, e.g. `app::MyComponent` becomes `my_component`.
pub fn snake_case_name<T>() -> String
where
    T: ?Sized,
{
    to_snake_case(short_type_name(type_name::<T>()))
}

/// Converts a CamelCase identifier to lower_snake_case.
///
/// Acronyms are kept together: `HTTPServer` becomes `http_server`.
pub fn to_snake_case(name: &str) -> String {
    static WORD_BOUNDARY: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(.)([A-Z][a-z]+)").unwrap());
    static CASE_BOUNDARY: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"([a-z0-9])([A-Z])").unwrap());
    let name = WORD_BOUNDARY.replace_all(name, "${1}_${2}");
    CASE_BOUNDARY
        .replace_all(&name, "${1}_${2}")
        .to_lowercase()
}

/// Reduces a type name to a single identifier.
///
/// Module paths, generic arguments, references and `dyn` are stripped.
/// Types without a nominal name map to a fixed word: `unit`, `tuple`,
/// `array`, `slice`, `fn` or `closure`.
pub(crate) fn short_type_name(name: &str) -> &str {
    let mut name = name.trim();
    loop {
        let stripped = ["&", "mut ", "dyn ", "*const ", "*mut "]
            .iter()
            .find_map(|prefix| name.strip_prefix(*prefix));
        match stripped {
            Some(rest) => name = rest.trim_start(),
            None => break,
        }
    }
    if name == "()" {
        return "unit";
    }
    if name.starts_with('(') {
        return "tuple";
    }
    if let Some(inner) = name.strip_prefix('[') {
        return if is_array(inner) { "array" } else { "slice" };
    }
    if name.starts_with("fn(") || name.starts_with("unsafe ") || name.starts_with("extern ") {
        return "fn";
    }
    let name = name
        .split(['<', '(', ' '])
        .next()
        .unwrap_or(name);
    match name.rsplit("::").next().unwrap_or(name) {
        "{{closure}}" => "closure",
        name => name,
    }
}

/// Checks for a `; N` length at the outer level of `[T; N]`.
fn is_array(inner: &str) -> bool {
    let mut depth = 0usize;
    for c in inner.chars() {
        match c {
            '[' | '(' | '<' => depth += 1,
            ']' | ')' | '>' if depth > 0 => depth -= 1,
            ';' if depth == 0 => return true,
            _ => {}
        }
    }
    false
}
