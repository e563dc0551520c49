//! # plugboard-base
//!
//! Configuration and tracing support for plugboard applications.
//!
//! ## Core Components
//!
//! - **Configuration**: JSON configuration split into typed sections, see [`Config`]
//! - **Config-backed dependencies**: Sections registered as dependencies, see [`ConfigRegistryExt`]
//! - **Tracing**: Global subscriber setup with a reloadable level filter, see [`Tracing`]
//!
//! ## Example
//!
//! ```rust
//! use plugboard::{Consumer, Injector, Registry};
//! use plugboard_base::{Config, ConfigRegistryExt as _, config_section};
//! use serde::{Deserialize, Serialize};
//!
//! #[config_section("database")]
//! #[derive(Debug, Serialize, Deserialize)]
//! struct DatabaseConfig {
//!     host: String,
//!     port: u16,
//! }
//!
//! #[derive(Consumer)]
//! #[require(database: DatabaseConfig)]
//! struct Repository {
//!     injector: Injector,
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//! let config = Config::parse(r#"{"database": {"host": "localhost", "port": 5432}}"#)?;
//! Registry::new()
//!     .with_section::<DatabaseConfig>(&config)?
//!     .install_configured(&config)?;
//!
//! let repository = Repository {
//!     injector: Injector::new(),
//! };
//! assert_eq!(repository.database()?.port, 5432);
//! # Ok(())
//! # }
//! ```
//!
//! ## Features
//!
//! - `macros` (default): Enables the `#[config_section]` attribute

mod config;
mod registry;
mod tracing;

pub use config::*;
pub use registry::*;
pub use tracing::*;

#[cfg(feature = "macros")]
pub use plugboard_base_macros::*;
