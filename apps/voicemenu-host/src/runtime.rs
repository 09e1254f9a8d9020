//! Start/stop lifecycle hooks of the host application.
//!
//! `start_runtime` is invoked once at process initialization, `stop_runtime`
//! once at teardown; both wrap the bootkit launcher with the host's module
//! set and configuration.

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use bootkit::bootstrap::AppConfig;
use bootkit::{
    LaunchOptions, Launcher, ModuleRef, RuntimeHandle, ShutdownOptions, ShutdownReport, seeder,
};

/// Extension modules loaded when the config names none.
pub const DEFAULT_EXTENSIONS: &[&str] = &[vm_sip::MODULE_NAME];

fn refs(configured: &[String], fallback: &[&str]) -> Vec<ModuleRef> {
    if configured.is_empty() {
        fallback.iter().map(|name| ModuleRef::new(*name)).collect()
    } else {
        configured.iter().cloned().map(ModuleRef::from).collect()
    }
}

/// The infrastructure prefix: configured list, or the built-in platform set.
#[must_use]
pub fn infrastructure_refs(cfg: &AppConfig) -> Vec<ModuleRef> {
    refs(&cfg.modules.infrastructure, vm_platform::MODULE_NAMES)
}

/// The extension suffix: configured list, or the default SIP transport.
#[must_use]
pub fn extension_refs(cfg: &AppConfig) -> Vec<ModuleRef> {
    refs(&cfg.modules.extensions, DEFAULT_EXTENSIONS)
}

/// Start hook: seed the process-wide defaults, then launch the runtime.
///
/// # Errors
/// Returns an error when the seeded defaults are invalid or the launch
/// fails (installation or startup).
pub async fn start_runtime(cfg: &AppConfig) -> Result<RuntimeHandle> {
    let defaults = cfg.to_platform_defaults();
    defaults.validate()?;
    seeder::seed(defaults);

    let launcher = Launcher::new(LaunchOptions {
        infrastructure: infrastructure_refs(cfg),
        start_level: cfg.server.start_level,
        ..LaunchOptions::default()
    });

    let handle = launcher.launch(&extension_refs(cfg)).await?;
    info!("Runtime launched");
    Ok(handle)
}

/// Stop hook: bounded, error-absorbing shutdown of the runtime.
pub async fn stop_runtime(
    handle: &mut RuntimeHandle,
    cfg: &AppConfig,
    interrupt: Option<CancellationToken>,
) -> ShutdownReport {
    let report = handle
        .shutdown(ShutdownOptions {
            grace_window: cfg.server.grace_window,
            interrupt,
        })
        .await;

    if report.clean() {
        info!(waited = ?report.waited, "Runtime shut down cleanly");
    } else {
        warn!(
            outcome = ?report.outcome,
            error = ?report.stop_error,
            "Runtime shutdown finished with issues"
        );
    }
    report
}
