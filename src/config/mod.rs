//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (range checks)
//!     → ServerConfig (validated, immutable)
//!     → handed to Server::listen_with_config
//! ```
//!
//! # Design Decisions
//! - Config is immutable once a server is bound
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{BackoffConfig, ServerConfig, DEFAULT_RECV_BUFFER_SIZE};
pub use validation::{validate_config, ValidationError};
