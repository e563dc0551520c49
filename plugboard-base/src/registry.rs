use std::sync::Arc;

use plugboard::{Eager, Registry, StdError};
use serde::{Deserialize, Serialize};

use crate::{Config, ConfigSection};

/// Settings of the `registry` config section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Install on top of the current registry instead of replacing it.
    #[serde(default)]
    pub merge: bool,
}

impl ConfigSection for RegistryConfig {
    fn key() -> &'static str {
        "registry"
    }
}

/// Name under which [`ConfigRegistryExt::with_config`] registers the config.
pub const CONFIG_DEPENDENCY: &str = "config";

/// Creates a dependency holding the deserialized section `T`, named `T::key()`.
///
/// # Errors
///
/// Fails if the section is absent or cannot be deserialized.
pub fn section_dependency<T>(config: &Config) -> Result<Eager<T>, StdError>
where
    T: ConfigSection + Send + Sync + 'static,
{
    let section = config
        .section::<T>()?
        .ok_or_else(|| format!("Missing config section: {}", T::key()))?;
    Ok(Eager::new(section).named(T::key()))
}

/// Extension trait registering configuration in a [`Registry`].
pub trait ConfigRegistryExt: Sized {
    /// Registers the whole config under [`CONFIG_DEPENDENCY`].
    fn with_config(self, config: Config) -> Self;

    /// Registers the section `T` under `T::key()`.
    fn with_section<T>(self, config: &Config) -> Result<Self, StdError>
    where
        T: ConfigSection + Send + Sync + 'static;

    /// Installs the registry following the `registry` config section.
    ///
    /// Without the section the registry replaces the current one.
    fn install_configured(self, config: &Config) -> Result<Arc<Registry>, StdError>;
}

impl ConfigRegistryExt for Registry {
    fn with_config(self, config: Config) -> Self {
        self.with(Eager::new(config).named(CONFIG_DEPENDENCY))
    }

    fn with_section<T>(self, config: &Config) -> Result<Self, StdError>
    where
        T: ConfigSection + Send + Sync + 'static,
    {
        Ok(self.with(section_dependency::<T>(config)?))
    }

    fn install_configured(self, config: &Config) -> Result<Arc<Registry>, StdError> {
        let settings = config.section::<RegistryConfig>()?.unwrap_or_default();
        Ok(self.install_with(settings.merge))
    }
}
