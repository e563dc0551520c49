/// Type alias for boxed errors that can be sent across threads.
///
/// Used for failures outside dependency resolution, such as loading
/// configuration.
pub type StdError = Box<dyn std::error::Error + Send + Sync>;

/// Error returned when a dependency cannot be resolved for a consumer.
///
/// The error always names the dependency and, when resolution happened on
/// behalf of a consumer, the consumer type that requested it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Cannot resolve dependency {name}{}: {kind}", required_by(.consumer))]
pub struct ResolutionError {
    name: String,
    consumer: Option<&'static str>,
    kind: ResolutionErrorKind,
}

/// Reason of a [`ResolutionError`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionErrorKind {
    /// No registry is installed and no manual override is present.
    #[error("registry not installed")]
    NoRegistry,
    /// The current registry lacks the dependency and no manual override is present.
    #[error("dependency not found in registry")]
    NotFound,
    /// The consumer type does not declare the dependency.
    #[error("dependency is not declared by consumer")]
    Undeclared,
    /// The resolved value has a different type than requested.
    #[error("value is not of type {expected}")]
    TypeMismatch { expected: &'static str },
}

impl ResolutionError {
    pub fn new(name: impl Into<String>, kind: ResolutionErrorKind) -> Self {
        Self {
            name: name.into(),
            consumer: None,
            kind,
        }
    }

    /// Attributes the error to a consumer type.
    pub fn with_consumer(mut self, consumer: &'static str) -> Self {
        self.consumer = Some(consumer);
        self
    }

    /// Name of the dependency that failed to resolve.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type name of the consumer that requested the dependency, if known.
    pub fn consumer(&self) -> Option<&'static str> {
        self.consumer
    }

    pub fn kind(&self) -> &ResolutionErrorKind {
        &self.kind
    }

    /// Returns `true` when the failure can be recovered by a manual override.
    pub fn is_missing(&self) -> bool {
        matches!(
            self.kind,
            ResolutionErrorKind::NoRegistry | ResolutionErrorKind::NotFound
        )
    }
}

fn required_by(consumer: &Option<&'static str>) -> String {
    match consumer {
        Some(consumer) => format!(" required by {consumer}"),
        None => String::new(),
    }
}
