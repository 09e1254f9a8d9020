//! Media engine module.
//!
//! Validates the seeded media transport port range, honors the audio
//! backend disable flags, and keeps a background worker alive for the
//! runtime's lifetime. Deactivation joins the worker, so teardown is
//! genuinely asynchronous and bounded only by the host's grace window.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, ensure};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace};

use bootkit::{ActivationCtx, ModuleActivator, register_activator, seeder};

pub const MODULE_NAME: &str = "media-engine";

const IDLE_TICK: Duration = Duration::from_secs(30);

#[derive(Default)]
pub struct MediaEngineActivator {
    worker: Mutex<Option<JoinHandle<()>>>,
}

register_activator!(MODULE_NAME, || Arc::new(MediaEngineActivator::default()));

fn validate_port_range(min: u16, max: u16) -> anyhow::Result<()> {
    ensure!(min < max, "media port range {min}-{max} is empty");
    Ok(())
}

#[async_trait]
impl ModuleActivator for MediaEngineActivator {
    async fn start(&self, ctx: &ActivationCtx) -> anyhow::Result<()> {
        let defaults = seeder::current_or_default();
        validate_port_range(defaults.media_port_min, defaults.media_port_max)?;

        for backend in &defaults.disabled_audio_backends {
            debug!(backend, "Audio backend disabled; skipping probe");
        }

        info!(
            min_port = defaults.media_port_min,
            max_port = defaults.media_port_max,
            "Media engine ready"
        );

        let cancel = ctx.cancel_token();
        let worker = tokio::spawn(async move {
            let mut tick = tokio::time::interval(IDLE_TICK);
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    _ = tick.tick() => trace!("Media engine idle tick"),
                }
            }
        });

        *self.worker.lock() = Some(worker);
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            // The container cancelled the activation token before the stop
            // sweep, so the worker is already winding down.
            worker.await.context("media worker task failed")?;
        }
        info!("Media engine drained");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn port_range_must_not_be_empty() {
        assert!(validate_port_range(10_000, 20_000).is_ok());
        assert!(validate_port_range(20_000, 10_000).is_err());
        assert!(validate_port_range(5060, 5060).is_err());
    }

    #[tokio::test]
    async fn stop_joins_the_worker_after_cancellation() {
        test_support::seeded_defaults();
        let engine = MediaEngineActivator::default();
        let ctx = test_support::activation_ctx(MODULE_NAME);

        engine.start(&ctx).await.unwrap();
        assert!(engine.worker.lock().is_some());

        // Mirrors the container: cancel first, then run the module stop.
        ctx.cancel_token().cancel();
        engine.stop().await.unwrap();
        assert!(engine.worker.lock().is_none());
    }

    #[tokio::test]
    async fn stop_without_start_is_a_noop() {
        let engine = MediaEngineActivator::default();
        engine.stop().await.unwrap();
    }
}
