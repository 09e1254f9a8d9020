//! Host bootstrap: layered configuration, logging and path handling for the
//! embedding process.

pub mod config;
pub mod logging;
pub mod paths;

pub use config::{AppConfig, MediaConfig, ModulesConfig, PlatformToggles, ServerConfig};
pub use logging::{LoggingConfig, Section, default_logging_config, init_logging};
pub use paths::{default_home_dir, expand_tilde, normalize_path};
