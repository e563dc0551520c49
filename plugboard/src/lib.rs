//! # plugboard
//!
//! A runtime dependency registry: consumer types declare the dependency names
//! they require, and a process-wide [`Registry`] supplies the values on first
//! access.
//!
//! ## Core Concepts
//!
//! - **Dependency**: A named recipe producing a value, see [`Eager`], [`Dynamic`] and [`Lazy`]
//! - **Registry**: The name to dependency mapping, installed once as the current registry
//! - **Consumer**: A type declaring required dependency names through a [`Binding`]
//! - **Injector**: Per-instance consumer state holding manual overrides and scoped caches
//!
//! ## Basic Usage
//!
//! ```rust
//! use plugboard::{Consumer, Eager, Injector, Lazy, Registry};
//!
//! struct Database {
//!     url: String,
//! }
//!
//! struct RequestCounter;
//!
//! #[derive(Consumer)]
//! #[require(database: Database, counter: RequestCounter)]
//! struct Handler {
//!     injector: Injector,
//! }
//!
//! Registry::new()
//!     .with(Eager::new(Database {
//!         url: "postgresql://localhost:5432/app".to_string(),
//!     }))
//!     .with(Lazy::new(|| RequestCounter).named("counter").per_thread())
//!     .install();
//!
//! let handler = Handler {
//!     injector: Injector::new(),
//! };
//! let database = handler.database().unwrap();
//! assert_eq!(database.url, "postgresql://localhost:5432/app");
//! ```
//!
//! ## Manual Overrides
//!
//! Values missing from the registry can be provided per consumer, either at
//! construction time or later through generated setters:
//!
//! ```rust
//! use plugboard::{Consumer, Injector, Overrides};
//!
//! #[derive(Consumer)]
//! #[require(retries: u32)]
//! struct Client {
//!     injector: Injector,
//! }
//!
//! let client = Client {
//!     injector: Injector::bound::<Client>(Overrides::new().with("retries", 3u32)),
//! };
//! assert_eq!(*client.retries().unwrap(), 3);
//!
//! client.set_retries(5);
//! assert_eq!(*client.retries().unwrap(), 5);
//! ```
//!
//! ## Features
//!
//! - `macros` (default): Enables `#[derive(Consumer)]`

mod dependency;
mod error;
mod inject;
mod registry;

pub use dependency::*;
pub use error::*;
pub use inject::*;
pub use registry::*;

#[cfg(feature = "macros")]
pub use plugboard_macros::*;
