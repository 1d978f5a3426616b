//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → Registry::from_config (clusters, credentials, users)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - Optional fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::AdminConfig;
pub use schema::ClusterConfig;
pub use schema::ClusterUserConfig;
pub use schema::KillQueryUserConfig;
pub use schema::LogConfig;
pub use schema::ProxyConfig;
pub use schema::UserConfig;
