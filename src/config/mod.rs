//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! /.env (optional)
//!     → loader.rs (dotenv into process env)
//! config file (TOML, optional)
//!     → loader.rs (parse & deserialize, defaults for missing fields)
//!     → loader.rs (environment overrides: IPS, PORT, DELAY, ...)
//!     → validation.rs (semantic checks, monitored address list)
//!     → SentinelConfig (immutable for the life of the process)
//! ```
//!
//! # Design Decisions
//! - The backend set is fixed at startup; there is no reload
//! - All fields have defaults so a deployment can be configured by env alone
//! - Validation reports every error, not just the first

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_env_overrides, load_config, resolve_config, ConfigError};
pub use schema::{
    EndpointConfig, NotificationConfig, ObservabilityConfig, ProbeConfig, SentinelConfig,
    TargetConfig,
};
pub use validation::{validate_config, ValidationError};
