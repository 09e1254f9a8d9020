//! `Framework` - the in-process runtime container.
//!
//! Owns per-module lifecycle state and performs activation/deactivation.
//! Activation runs at the single global start, ordered by (tier, install
//! order), and only for modules whose tier is at or below the configured
//! framework start level. Deactivation runs in reverse activation order on
//! a spawned task so the caller can bound its wait on the returned
//! [`TeardownHandle`].

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::contracts::{
    ActivationCtx, ModuleActivator, ModuleId, RuntimeContainer, TeardownHandle,
};
use crate::descriptor::{ModuleRef, StartTier};
use crate::error::ContainerError;

/// Per-module lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Installed,
    Resolved,
    Starting,
    Active,
    Stopping,
    Uninstalled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Created,
    Initialized,
    Started,
    Stopped,
}

struct ModuleRecord {
    id: ModuleId,
    name: String,
    tier: StartTier,
    state: LifecycleState,
    activator: Option<Arc<dyn ModuleActivator>>,
}

/// Default framework start level; modules at or below it activate on start.
pub const DEFAULT_START_LEVEL: u32 = 3;

pub struct Framework {
    instance_id: Uuid,
    start_level: u32,
    cancel: CancellationToken,
    phase: Phase,
    next_id: u64,
    activation_order: Vec<ModuleId>,
    modules: Arc<Mutex<Vec<ModuleRecord>>>,
}

impl Framework {
    #[must_use]
    pub fn new(start_level: u32) -> Self {
        Self {
            instance_id: Uuid::now_v7(),
            start_level,
            cancel: CancellationToken::new(),
            phase: Phase::Created,
            next_id: 0,
            activation_order: Vec::new(),
            modules: Arc::new(Mutex::new(Vec::new())),
        }
    }

    #[must_use]
    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    #[must_use]
    pub fn start_level(&self) -> u32 {
        self.start_level
    }

    /// Snapshot of (module name, lifecycle state) in install order.
    #[must_use]
    pub fn module_states(&self) -> Vec<(String, LifecycleState)> {
        self.modules
            .lock()
            .iter()
            .map(|m| (m.name.clone(), m.state))
            .collect()
    }

    fn set_state(modules: &Mutex<Vec<ModuleRecord>>, id: ModuleId, state: LifecycleState) {
        let mut records = modules.lock();
        if let Some(rec) = records.iter_mut().find(|r| r.id == id) {
            rec.state = state;
        }
    }

    fn require_pre_start(&self) -> Result<(), ContainerError> {
        match self.phase {
            Phase::Created => Err(ContainerError::NotInitialized),
            Phase::Initialized => Ok(()),
            Phase::Started | Phase::Stopped => Err(ContainerError::InstallAfterStart),
        }
    }
}

#[async_trait]
impl RuntimeContainer for Framework {
    fn init(&mut self) -> Result<(), ContainerError> {
        if self.phase != Phase::Created {
            return Err(ContainerError::AlreadyInitialized);
        }
        self.phase = Phase::Initialized;
        tracing::debug!(instance_id = %self.instance_id, start_level = self.start_level, "Framework initialized");
        Ok(())
    }

    fn install(&mut self, reference: &ModuleRef) -> Result<ModuleId, ContainerError> {
        self.require_pre_start()?;

        let mut records = self.modules.lock();
        if records.iter().any(|r| r.name == reference.name()) {
            return Err(ContainerError::AlreadyInstalled(reference.name().to_owned()));
        }

        let id = ModuleId::new(self.next_id);
        self.next_id += 1;
        records.push(ModuleRecord {
            id,
            name: reference.name().to_owned(),
            tier: StartTier::default(),
            state: LifecycleState::Installed,
            activator: None,
        });
        tracing::debug!(module = %reference, %id, "Installed module");
        Ok(id)
    }

    fn set_start_tier(&mut self, id: ModuleId, tier: StartTier) -> Result<(), ContainerError> {
        let mut records = self.modules.lock();
        let rec = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(ContainerError::UnknownModuleId(id))?;
        rec.tier = tier;
        Ok(())
    }

    fn bind_activator(
        &mut self,
        id: ModuleId,
        activator: Arc<dyn ModuleActivator>,
    ) -> Result<(), ContainerError> {
        let mut records = self.modules.lock();
        let rec = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(ContainerError::UnknownModuleId(id))?;
        rec.activator = Some(activator);
        rec.state = LifecycleState::Resolved;
        Ok(())
    }

    async fn start(&mut self) -> Result<(), ContainerError> {
        match self.phase {
            Phase::Created => return Err(ContainerError::NotInitialized),
            Phase::Initialized => {}
            Phase::Started => return Err(ContainerError::AlreadyStarted),
            Phase::Stopped => return Err(ContainerError::AlreadyStopped),
        }

        // Snapshot the eligible modules; the stable sort keeps install order
        // within a tier.
        let mut plan: Vec<(ModuleId, String, StartTier, Option<Arc<dyn ModuleActivator>>)> = {
            self.modules
                .lock()
                .iter()
                .filter(|m| m.tier.get() <= self.start_level)
                .map(|m| (m.id, m.name.clone(), m.tier, m.activator.clone()))
                .collect()
        };
        plan.sort_by_key(|(_, _, tier, _)| *tier);

        for (id, name, tier, activator) in plan {
            let Some(activator) = activator else {
                self.phase = Phase::Stopped;
                return Err(ContainerError::MissingActivator { module: name });
            };

            Self::set_state(&self.modules, id, LifecycleState::Starting);
            let ctx = ActivationCtx::new(self.instance_id, name.as_str(), self.cancel.clone());
            match activator.start(&ctx).await {
                Ok(()) => {
                    Self::set_state(&self.modules, id, LifecycleState::Active);
                    self.activation_order.push(id);
                    tracing::info!(module = %name, %tier, "Started module");
                }
                Err(source) => {
                    self.phase = Phase::Stopped;
                    return Err(ContainerError::Activation {
                        module: name,
                        source,
                    });
                }
            }
        }

        self.phase = Phase::Started;
        Ok(())
    }

    async fn stop(&mut self) -> Result<TeardownHandle, ContainerError> {
        match self.phase {
            Phase::Created | Phase::Initialized => return Err(ContainerError::NotStarted),
            Phase::Started => {}
            Phase::Stopped => return Err(ContainerError::AlreadyStopped),
        }
        self.phase = Phase::Stopped;

        // Signal module background tasks before running individual stops.
        self.cancel.cancel();

        // Reverse activation order; only modules that actually went active
        // are deactivated.
        let sweep: Vec<(ModuleId, String, Arc<dyn ModuleActivator>)> = {
            let mut records = self.modules.lock();
            let mut sweep = Vec::new();
            for id in self.activation_order.iter().rev() {
                if let Some(rec) = records.iter_mut().find(|r| r.id == *id)
                    && rec.state == LifecycleState::Active
                    && let Some(activator) = rec.activator.clone()
                {
                    rec.state = LifecycleState::Stopping;
                    sweep.push((*id, rec.name.clone(), activator));
                }
            }
            sweep
        };

        let modules = Arc::clone(&self.modules);
        let (tx, rx) = oneshot::channel();
        tokio::spawn(async move {
            for (id, name, activator) in sweep {
                match activator.stop().await {
                    Ok(()) => tracing::info!(module = %name, "Stopped module"),
                    Err(err) => {
                        tracing::warn!(module = %name, error = %err, "Failed to stop module");
                    }
                }
                Framework::set_state(&modules, id, LifecycleState::Uninstalled);
            }
            _ = tx.send(());
        });

        Ok(TeardownHandle::new(rx))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    type EventLog = Arc<StdMutex<Vec<String>>>;

    struct TrackingActivator {
        name: &'static str,
        events: EventLog,
        fail_start: bool,
        fail_stop: bool,
    }

    impl TrackingActivator {
        fn new(name: &'static str, events: &EventLog) -> Arc<Self> {
            Arc::new(Self {
                name,
                events: Arc::clone(events),
                fail_start: false,
                fail_stop: false,
            })
        }

        fn failing_start(name: &'static str, events: &EventLog) -> Arc<Self> {
            Arc::new(Self {
                name,
                events: Arc::clone(events),
                fail_start: true,
                fail_stop: false,
            })
        }

        fn failing_stop(name: &'static str, events: &EventLog) -> Arc<Self> {
            Arc::new(Self {
                name,
                events: Arc::clone(events),
                fail_start: false,
                fail_stop: true,
            })
        }
    }

    #[async_trait]
    impl ModuleActivator for TrackingActivator {
        async fn start(&self, _ctx: &ActivationCtx) -> anyhow::Result<()> {
            self.events.lock().unwrap().push(format!("start:{}", self.name));
            if self.fail_start {
                anyhow::bail!("intentional start failure")
            }
            Ok(())
        }

        async fn stop(&self) -> anyhow::Result<()> {
            self.events.lock().unwrap().push(format!("stop:{}", self.name));
            if self.fail_stop {
                anyhow::bail!("intentional stop failure")
            }
            Ok(())
        }
    }

    fn install_bound(
        fw: &mut Framework,
        name: &'static str,
        tier: StartTier,
        activator: Arc<dyn ModuleActivator>,
    ) -> ModuleId {
        let id = fw.install(&ModuleRef::new(name)).unwrap();
        fw.set_start_tier(id, tier).unwrap();
        fw.bind_activator(id, activator).unwrap();
        id
    }

    fn state_of(fw: &Framework, name: &str) -> LifecycleState {
        fw.module_states()
            .into_iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
            .unwrap()
    }

    #[tokio::test]
    async fn activation_orders_by_tier_then_install_order() {
        let events: EventLog = EventLog::default();
        let mut fw = Framework::new(DEFAULT_START_LEVEL);
        fw.init().unwrap();

        install_bound(&mut fw, "a", StartTier::new(2), TrackingActivator::new("a", &events));
        install_bound(&mut fw, "b", StartTier::new(2), TrackingActivator::new("b", &events));
        install_bound(&mut fw, "c", StartTier::new(1), TrackingActivator::new("c", &events));
        // Above the start level: stays resolved, never activated.
        install_bound(&mut fw, "d", StartTier::new(9), TrackingActivator::new("d", &events));

        fw.start().await.unwrap();

        assert_eq!(
            *events.lock().unwrap(),
            vec!["start:c", "start:a", "start:b"]
        );
        assert_eq!(state_of(&fw, "a"), LifecycleState::Active);
        assert_eq!(state_of(&fw, "d"), LifecycleState::Resolved);
    }

    #[tokio::test]
    async fn start_aborts_on_first_activation_failure() {
        let events: EventLog = EventLog::default();
        let mut fw = Framework::new(DEFAULT_START_LEVEL);
        fw.init().unwrap();

        install_bound(&mut fw, "a", StartTier::new(2), TrackingActivator::new("a", &events));
        install_bound(&mut fw, "b", StartTier::new(2), TrackingActivator::failing_start("b", &events));
        install_bound(&mut fw, "c", StartTier::new(2), TrackingActivator::new("c", &events));

        let err = fw.start().await.unwrap_err();
        match err {
            ContainerError::Activation { module, .. } => assert_eq!(module, "b"),
            other => panic!("expected Activation, got: {other:?}"),
        }
        // "c" was never reached.
        assert_eq!(*events.lock().unwrap(), vec!["start:a", "start:b"]);
    }

    #[tokio::test]
    async fn stop_runs_in_reverse_order_and_survives_module_errors() {
        let events: EventLog = EventLog::default();
        let mut fw = Framework::new(DEFAULT_START_LEVEL);
        fw.init().unwrap();

        install_bound(&mut fw, "a", StartTier::new(2), TrackingActivator::new("a", &events));
        install_bound(&mut fw, "b", StartTier::new(2), TrackingActivator::failing_stop("b", &events));
        install_bound(&mut fw, "c", StartTier::new(2), TrackingActivator::new("c", &events));
        fw.start().await.unwrap();
        events.lock().unwrap().clear();

        let teardown = fw.stop().await.unwrap();
        teardown.wait().await;

        assert_eq!(
            *events.lock().unwrap(),
            vec!["stop:c", "stop:b", "stop:a"]
        );
        for name in ["a", "b", "c"] {
            assert_eq!(state_of(&fw, name), LifecycleState::Uninstalled);
        }
    }

    #[tokio::test]
    async fn second_stop_reports_already_stopped() {
        let events: EventLog = EventLog::default();
        let mut fw = Framework::new(DEFAULT_START_LEVEL);
        fw.init().unwrap();
        install_bound(&mut fw, "a", StartTier::new(2), TrackingActivator::new("a", &events));
        fw.start().await.unwrap();

        fw.stop().await.unwrap().wait().await;
        let err = fw.stop().await.unwrap_err();
        assert!(matches!(err, ContainerError::AlreadyStopped));
    }

    #[tokio::test]
    async fn install_requires_init_and_pre_start_phase() {
        let events: EventLog = EventLog::default();
        let mut fw = Framework::new(DEFAULT_START_LEVEL);

        let err = fw.install(&ModuleRef::new("early")).unwrap_err();
        assert!(matches!(err, ContainerError::NotInitialized));

        fw.init().unwrap();
        install_bound(&mut fw, "a", StartTier::new(2), TrackingActivator::new("a", &events));
        fw.start().await.unwrap();

        let err = fw.install(&ModuleRef::new("late")).unwrap_err();
        assert!(matches!(err, ContainerError::InstallAfterStart));
    }

    #[tokio::test]
    async fn duplicate_install_is_rejected() {
        let mut fw = Framework::new(DEFAULT_START_LEVEL);
        fw.init().unwrap();
        fw.install(&ModuleRef::new("a")).unwrap();

        let err = fw.install(&ModuleRef::new("a")).unwrap_err();
        match err {
            ContainerError::AlreadyInstalled(name) => assert_eq!(name, "a"),
            other => panic!("expected AlreadyInstalled, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn eligible_module_without_activator_fails_start() {
        let mut fw = Framework::new(DEFAULT_START_LEVEL);
        fw.init().unwrap();
        let id = fw.install(&ModuleRef::new("bare")).unwrap();
        fw.set_start_tier(id, StartTier::new(2)).unwrap();

        let err = fw.start().await.unwrap_err();
        match err {
            ContainerError::MissingActivator { module } => assert_eq!(module, "bare"),
            other => panic!("expected MissingActivator, got: {other:?}"),
        }
    }
}
