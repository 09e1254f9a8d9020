//! Structured errors for the lifecycle core.
//!
//! Startup-path errors (installation, startup) are fatal and surface to the
//! caller of `launch`; shutdown-path errors are captured into the
//! `ShutdownReport` and never propagate.

use thiserror::Error;

use crate::contracts::ModuleId;

/// Errors resolving a module reference against the static registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no activator registered for module reference '{0}'")]
    UnknownReference(String),
    #[error("module reference '{0}' is registered more than once")]
    DuplicateReference(String),
}

/// Errors reported by a runtime container.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("container is not initialized")]
    NotInitialized,
    #[error("container is already initialized")]
    AlreadyInitialized,
    #[error("container is already started")]
    AlreadyStarted,
    #[error("container was never started")]
    NotStarted,
    #[error("container is already stopped")]
    AlreadyStopped,
    #[error("install is not allowed after the global start")]
    InstallAfterStart,
    #[error("module '{0}' is already installed")]
    AlreadyInstalled(String),
    #[error("unknown module id {0}")]
    UnknownModuleId(ModuleId),
    #[error("module '{module}' has no bound activator")]
    MissingActivator { module: String },
    #[error("activation failed for module '{module}'")]
    Activation {
        module: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Fatal errors surfaced by `Launcher::launch`.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("container failed to initialize")]
    Init(#[source] ContainerError),
    #[error("failed to install module '{module}'")]
    Installation {
        module: String,
        #[source]
        source: anyhow::Error,
    },
    #[error("container start failed")]
    Startup(#[source] ContainerError),
}

/// Errors validating platform defaults before seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("invalid media port range: min {min} must be below max {max}")]
    InvalidPortRange { min: u16, max: u16 },
}
