//! Built-in infrastructure modules for the VoiceMenu host.
//!
//! Each module is an opaque activator registered with the bootkit registry;
//! the host installs them as the fixed prefix of every launch. They read
//! the process-wide defaults the configuration seeder applied before the
//! runtime started.

pub mod config_store;
pub mod credentials;
pub mod media_engine;
pub mod net_probe;

pub use config_store::ConfigStoreActivator;
pub use credentials::CredentialsStoreActivator;
pub use media_engine::MediaEngineActivator;
pub use net_probe::NetProbeActivator;

/// Names of the built-in infrastructure modules, in install order.
pub const MODULE_NAMES: &[&str] = &[
    config_store::MODULE_NAME,
    credentials::MODULE_NAME,
    net_probe::MODULE_NAME,
    media_engine::MODULE_NAME,
];
