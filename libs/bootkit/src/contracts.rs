//! Contracts between the orchestrator, the runtime container and modules.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::descriptor::{ModuleRef, StartTier};
use crate::error::ContainerError;

/// Per-activation context handed to a module when it starts.
#[derive(Debug, Clone)]
pub struct ActivationCtx {
    instance_id: Uuid,
    module: String,
    cancel: CancellationToken,
}

impl ActivationCtx {
    #[must_use]
    pub fn new(instance_id: Uuid, module: impl Into<String>, cancel: CancellationToken) -> Self {
        Self {
            instance_id,
            module: module.into(),
            cancel,
        }
    }

    /// Identifier of the container instance this activation belongs to.
    #[must_use]
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Cancellation token cancelled when the container begins to stop.
    /// Background tasks spawned by the module should wind down on it.
    #[must_use]
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

/// The minimal lifecycle capability every module implements.
///
/// Modules are opaque to the orchestrator: it only drives `start` and
/// `stop`, in the order derived from tiers and install order.
#[async_trait]
pub trait ModuleActivator: Send + Sync {
    /// Activate the module. A returned error fails the global start.
    async fn start(&self, ctx: &ActivationCtx) -> anyhow::Result<()>;

    /// Deactivate the module and release its resources. Errors are logged
    /// by the container and never abort the teardown sweep.
    async fn stop(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Container-assigned identifier of one installed module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleId(u64);

impl ModuleId {
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Completion signal for an in-flight container teardown.
///
/// `stop` returns quickly; per-module teardown continues asynchronously and
/// resolves this handle when the sweep is done. If the teardown task dies,
/// the handle resolves as well, so waiters are never stranded.
#[derive(Debug)]
pub struct TeardownHandle {
    done: oneshot::Receiver<()>,
}

impl TeardownHandle {
    #[must_use]
    pub fn new(done: oneshot::Receiver<()>) -> Self {
        Self { done }
    }

    /// Wait until the teardown sweep has finished.
    pub async fn wait(self) {
        _ = self.done.await;
    }
}

/// The in-process execution environment holding module state.
///
/// The orchestrator drives this contract strictly sequentially from a single
/// control thread: `init`, then one `install`/`set_start_tier`/
/// `bind_activator` round per module in set order, then a single `start`,
/// and eventually one `stop`. Implementations may parallelize activation
/// internally; that concurrency is opaque to the caller.
#[async_trait]
pub trait RuntimeContainer: Send {
    /// Prepare the container. Must be called before any install.
    fn init(&mut self) -> Result<(), ContainerError>;

    /// Install one module. Fails on duplicates or when called outside the
    /// pre-start phase.
    fn install(&mut self, reference: &ModuleRef) -> Result<ModuleId, ContainerError>;

    /// Assign the start tier used to order activation.
    fn set_start_tier(&mut self, id: ModuleId, tier: StartTier) -> Result<(), ContainerError>;

    /// Bind the activation entry point of an installed module.
    fn bind_activator(
        &mut self,
        id: ModuleId,
        activator: Arc<dyn ModuleActivator>,
    ) -> Result<(), ContainerError>;

    /// Activate all installed modules eligible at the configured framework
    /// start level, in (tier, install order). The first activation failure
    /// aborts the start; earlier activations are not rolled back.
    async fn start(&mut self) -> Result<(), ContainerError>;

    /// Request deactivation of active modules, in reverse activation order.
    /// Per-module errors are logged and do not abort the sweep.
    async fn stop(&mut self) -> Result<TeardownHandle, ContainerError>;
}
