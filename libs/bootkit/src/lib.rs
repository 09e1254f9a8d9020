//! bootkit - lifecycle core for the VoiceMenu host process
//!
//! The crate bootstraps a modular runtime: it loads a fixed set of opaque
//! modules into an in-process container, assigns their relative start
//! ordering, issues a single global start, and later drives a bounded,
//! observable teardown.
//!
//! High-level pieces:
//! - [`descriptor`]: module references, start tiers and the ordered module set
//! - [`registry`]: the static activator registry modules register into
//! - [`contracts`]: the `ModuleActivator` and `RuntimeContainer` contracts
//! - [`container`]: `Framework`, the in-process container implementation
//! - [`launcher`]: `Launcher` / `RuntimeHandle`, the lifecycle orchestrator
//! - [`seeder`]: process-wide platform defaults applied before launch
//! - [`bootstrap`]: host bootstrap - layered config, logging, paths

pub mod bootstrap;
pub mod container;
pub mod contracts;
pub mod descriptor;
pub mod error;
pub mod launcher;
pub mod registry;
pub mod seeder;

pub use container::{Framework, LifecycleState};
pub use contracts::{ActivationCtx, ModuleActivator, ModuleId, RuntimeContainer, TeardownHandle};
pub use descriptor::{ModuleDescriptor, ModuleRef, ModuleSet, StartTier};
pub use error::{ContainerError, LaunchError, RegistryError};
pub use launcher::{
    LaunchOptions, Launcher, RuntimeHandle, ShutdownOptions, ShutdownReport, TeardownOutcome,
};
pub use seeder::PlatformDefaults;

// Re-exported for the `register_activator!` macro expansion.
pub use inventory;
