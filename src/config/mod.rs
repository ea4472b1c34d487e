//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → command-line overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → ServerConfig (validated, immutable)
//!
//! legacy config.ini
//!     → legacy.rs (linuxpath=... → dataset path)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - Most fields have defaults to allow minimal configs; the dataset path
//!   and refresh policy are required
//! - Validation separates syntactic (serde) from semantic checks

pub mod legacy;
pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::ConfigError;
pub use schema::{
    DatasetConfig, ListenerConfig, LogFormat, ObservabilityConfig, ProtocolConfig,
    ServerConfig, TimeoutConfig, TlsConfig,
};
