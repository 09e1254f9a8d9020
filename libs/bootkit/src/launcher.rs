//! `Launcher` - the lifecycle orchestrator.
//!
//! Deterministic, sequential sequencing of module installation, the single
//! global start, and a bounded, observable shutdown. The infrastructure
//! module list is injected at construction; extension modules are supplied
//! per launch. Modules themselves are opaque - the launcher only resolves
//! their activation entry points against the static registry and drives the
//! container contract.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::container::{DEFAULT_START_LEVEL, Framework};
use crate::contracts::RuntimeContainer;
use crate::descriptor::{ModuleRef, ModuleSet, StartTier};
use crate::error::{ContainerError, LaunchError};
use crate::registry;

/// Construction-time options for a [`Launcher`].
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Fixed infrastructure prefix installed before any extension module.
    pub infrastructure: Vec<ModuleRef>,
    /// Ordering baseline; every module is installed one tier above it.
    pub tier_baseline: StartTier,
    /// Framework start level the container activates up to.
    pub start_level: u32,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            infrastructure: Vec::new(),
            tier_baseline: StartTier::default(),
            start_level: DEFAULT_START_LEVEL,
        }
    }
}

pub struct Launcher {
    options: LaunchOptions,
}

impl Launcher {
    #[must_use]
    pub fn new(options: LaunchOptions) -> Self {
        Self { options }
    }

    /// Launch a fresh runtime: infrastructure modules first, then the given
    /// extension modules, all at a single flat tier, followed by one global
    /// start. An empty extension list is valid.
    ///
    /// Each call builds an independent container; launching again without
    /// shutting the previous handle down is a caller error and unsupported.
    ///
    /// # Errors
    /// `LaunchError::Installation` if any reference fails to resolve or
    /// install (the global start is never issued in that case),
    /// `LaunchError::Startup` if the container start fails. Already
    /// installed modules are not rolled back on failure; the container is
    /// discarded as a whole.
    pub async fn launch(&self, extensions: &[ModuleRef]) -> Result<RuntimeHandle, LaunchError> {
        self.launch_with(Box::new(Framework::new(self.options.start_level)), extensions)
            .await
    }

    /// Same as [`Self::launch`], against an externally supplied container.
    pub async fn launch_with(
        &self,
        mut container: Box<dyn RuntimeContainer>,
        extensions: &[ModuleRef],
    ) -> Result<RuntimeHandle, LaunchError> {
        let set = ModuleSet::assemble(
            &self.options.infrastructure,
            extensions,
            self.options.tier_baseline.next(),
        );
        tracing::info!(modules = ?set.names(), "Phase: assemble");

        container.init().map_err(LaunchError::Init)?;

        tracing::info!("Phase: install");
        for descriptor in set.iter() {
            let name = descriptor.reference().name();
            let installation = |source: anyhow::Error| LaunchError::Installation {
                module: name.to_owned(),
                source,
            };

            let entry = registry::resolve(name)
                .map_err(|e| installation(anyhow::Error::new(e)))?;
            let id = container
                .install(descriptor.reference())
                .map_err(|e| installation(anyhow::Error::new(e)))?;
            container
                .set_start_tier(id, descriptor.tier())
                .map_err(|e| installation(anyhow::Error::new(e)))?;
            container
                .bind_activator(id, (entry.construct)())
                .map_err(|e| installation(anyhow::Error::new(e)))?;
            tracing::debug!(module = name, tier = %descriptor.tier(), "Installed module");
        }

        tracing::info!("Phase: start");
        container.start().await.map_err(LaunchError::Startup)?;
        tracing::info!(modules = set.len(), "Runtime started");

        Ok(RuntimeHandle {
            container,
            stopped: false,
        })
    }
}

/// Options for one shutdown request.
#[derive(Debug, Clone)]
pub struct ShutdownOptions {
    /// Upper bound on how long to wait for asynchronous module teardown.
    pub grace_window: Duration,
    /// Optional external interrupt; when cancelled, the wait is abandoned
    /// and shutdown proceeds immediately. The stop request itself is not
    /// cancellable.
    pub interrupt: Option<CancellationToken>,
}

impl ShutdownOptions {
    #[must_use]
    pub fn with_grace(grace_window: Duration) -> Self {
        Self {
            grace_window,
            interrupt: None,
        }
    }
}

/// How the shutdown wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownOutcome {
    /// Module teardown signalled completion within the grace window.
    Completed,
    /// The grace window elapsed before teardown completed.
    GraceExpired,
    /// The wait was interrupted; teardown may still be in flight.
    Interrupted,
    /// No wait was performed (stop refused or handle already shut down).
    Skipped,
}

/// Structured record of one shutdown. Shutdown never fails from the
/// caller's point of view; anything that went wrong is captured here.
#[derive(Debug)]
pub struct ShutdownReport {
    pub outcome: TeardownOutcome,
    pub stop_error: Option<ContainerError>,
    pub waited: Duration,
}

impl ShutdownReport {
    /// True when the stop was accepted and teardown finished in time.
    #[must_use]
    pub fn clean(&self) -> bool {
        self.stop_error.is_none() && self.outcome == TeardownOutcome::Completed
    }
}

/// Owned handle to one running container, returned from `launch` and
/// threaded explicitly into shutdown. At most one per process in this
/// design; must not be reused after shutdown.
pub struct RuntimeHandle {
    container: Box<dyn RuntimeContainer>,
    stopped: bool,
}

impl std::fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeHandle")
            .field("stopped", &self.stopped)
            .finish_non_exhaustive()
    }
}

impl RuntimeHandle {
    /// Request the container to stop, then wait up to the grace window for
    /// asynchronous teardown to finish. Returns early as soon as teardown
    /// reports completion; never returns before it when it completes inside
    /// the window.
    ///
    /// Errors from the stop call are recorded in the report and swallowed -
    /// shutdown must not prevent process exit. A second call on the same
    /// handle is a no-op reported as already stopped.
    pub async fn shutdown(&mut self, opts: ShutdownOptions) -> ShutdownReport {
        if self.stopped {
            tracing::warn!("Shutdown requested on an already stopped handle");
            return ShutdownReport {
                outcome: TeardownOutcome::Skipped,
                stop_error: Some(ContainerError::AlreadyStopped),
                waited: Duration::ZERO,
            };
        }
        self.stopped = true;

        tracing::info!(grace = ?opts.grace_window, "Phase: stop");
        let started = tokio::time::Instant::now();

        let teardown = match self.container.stop().await {
            Ok(handle) => handle,
            Err(err) => {
                tracing::warn!(error = %err, "Container stop reported an error");
                return ShutdownReport {
                    outcome: TeardownOutcome::Skipped,
                    stop_error: Some(err),
                    waited: started.elapsed(),
                };
            }
        };

        let interrupt = opts.interrupt.unwrap_or_default();
        let outcome = tokio::select! {
            // Completion wins when several branches are ready at once.
            biased;
            () = teardown.wait() => TeardownOutcome::Completed,
            () = interrupt.cancelled() => TeardownOutcome::Interrupted,
            () = tokio::time::sleep(opts.grace_window) => TeardownOutcome::GraceExpired,
        };

        let waited = started.elapsed();
        match outcome {
            TeardownOutcome::Completed => {
                tracing::info!(?waited, "Runtime stopped");
            }
            TeardownOutcome::GraceExpired => {
                tracing::warn!(?waited, "Grace window elapsed before module teardown finished");
            }
            TeardownOutcome::Interrupted => {
                tracing::warn!(?waited, "Shutdown wait interrupted; proceeding immediately");
            }
            TeardownOutcome::Skipped => {}
        }

        ShutdownReport {
            outcome,
            stop_error: None,
            waited,
        }
    }
}
