use std::str::FromStr as _;

use plugboard::StdError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing_subscriber::filter::{Directive, EnvFilter};
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;
use tracing_subscriber::{Registry, reload};

use crate::{Config, ConfigSection};

/// Handle of the global tracing subscriber.
///
/// Created once per process by [`Tracing::init`]; the level filter can be
/// changed afterwards through [`Tracing::set_level`].
pub struct Tracing {
    default_level: tracing::Level,
    directives: Vec<Directive>,
    reload_handle: reload::Handle<EnvFilter, Registry>,
}

impl Tracing {
    /// Installs the global subscriber from the `tracing` config section.
    ///
    /// Returns `Ok(None)` without touching the global subscriber if the
    /// section is absent.
    pub fn init(config: &Config) -> Result<Option<Self>, StdError> {
        match config.section::<TracingConfig>()? {
            Some(config) => Self::init_with(config).map(Some),
            None => Ok(None),
        }
    }

    /// Installs the global subscriber.
    ///
    /// Fails if a global subscriber is already set.
    pub fn init_with(config: TracingConfig) -> Result<Self, StdError> {
        let mut directives = Vec::new();
        for directive in config.directives {
            directives.push(directive.parse::<Directive>()?);
        }
        let (env_filter, reload_handle) =
            reload::Layer::new(new_env_filter(&directives, config.level));
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::Layer::default())
            .try_init()?;
        tracing::debug!(level = %config.level, "Tracing initialized");
        Ok(Self {
            default_level: config.level,
            directives,
            reload_handle,
        })
    }

    /// Changes the global level, `None` restores the configured one.
    pub fn set_level(&self, level: Option<tracing::Level>) -> Result<(), StdError> {
        let level = level.unwrap_or(self.default_level);
        self.reload_handle
            .reload(new_env_filter(&self.directives, level))?;
        Ok(())
    }

    pub fn default_level(&self) -> tracing::Level {
        self.default_level
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TracingConfig {
    #[serde(
        serialize_with = "serialize_level",
        deserialize_with = "deserialize_level",
        default = "default_level"
    )]
    pub level: tracing::Level,
    #[serde(default)]
    pub directives: Vec<String>,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            directives: Default::default(),
        }
    }
}

impl ConfigSection for TracingConfig {
    fn key() -> &'static str {
        "tracing"
    }
}

fn new_env_filter(directives: &[Directive], level: tracing::Level) -> EnvFilter {
    let mut filter = EnvFilter::default();
    for directive in directives {
        filter = filter.add_directive(directive.clone());
    }
    filter.add_directive(level.into())
}

fn serialize_level<S>(v: &tracing::Level, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(v.as_str())
}

fn deserialize_level<'de, D>(deserializer: D) -> Result<tracing::Level, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;
    String::deserialize(deserializer)
        .and_then(|v| tracing::Level::from_str(&v).map_err(|v| Error::custom(format!("{v}"))))
}

fn default_level() -> tracing::Level {
    tracing::Level::INFO
}
