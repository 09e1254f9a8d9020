//! SIP transport extension module.
//!
//! The caller-supplied protocol module of a VoiceMenu deployment: binds a
//! UDP listener inside the seeded media port range and counts inbound
//! datagrams until the runtime shuts down. Deactivation joins the receive
//! task, so teardown is asynchronous and bounded by the host's grace
//! window.

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, bail};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tracing::{info, trace, warn};

use bootkit::{ActivationCtx, ModuleActivator, register_activator, seeder};

pub const MODULE_NAME: &str = "sip";

#[derive(Default)]
pub struct SipActivator {
    listener: Mutex<Option<ListenerState>>,
    datagrams: Arc<AtomicU64>,
}

struct ListenerState {
    local_addr: SocketAddr,
    task: JoinHandle<()>,
}

register_activator!(MODULE_NAME, || Arc::new(SipActivator::default()));

async fn bind_in_range(min: u16, max: u16) -> anyhow::Result<UdpSocket> {
    for port in min..=max {
        if let Ok(socket) = UdpSocket::bind((Ipv4Addr::LOCALHOST, port)).await {
            return Ok(socket);
        }
    }
    bail!("no free port in media range {min}-{max}")
}

impl SipActivator {
    #[must_use]
    pub fn bound_addr(&self) -> Option<SocketAddr> {
        self.listener.lock().as_ref().map(|l| l.local_addr)
    }

    #[must_use]
    pub fn datagrams_received(&self) -> u64 {
        self.datagrams.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl ModuleActivator for SipActivator {
    async fn start(&self, ctx: &ActivationCtx) -> anyhow::Result<()> {
        let defaults = seeder::current_or_default();
        let socket = bind_in_range(defaults.media_port_min, defaults.media_port_max).await?;
        let local_addr = socket.local_addr().context("failed to read bound address")?;
        info!(%local_addr, "SIP transport listening");

        let cancel = ctx.cancel_token();
        let datagrams = Arc::clone(&self.datagrams);
        let task = tokio::spawn(async move {
            let mut buf = [0u8; 1500];
            loop {
                tokio::select! {
                    () = cancel.cancelled() => break,
                    received = socket.recv_from(&mut buf) => match received {
                        Ok((len, peer)) => {
                            datagrams.fetch_add(1, Ordering::Relaxed);
                            trace!(len, %peer, "Received SIP datagram");
                        }
                        Err(err) => {
                            warn!(error = %err, "SIP socket receive failed");
                            break;
                        }
                    },
                }
            }
        });

        *self.listener.lock() = Some(ListenerState { local_addr, task });
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        let listener = self.listener.lock().take();
        if let Some(listener) = listener {
            listener.task.await.context("SIP receive task failed")?;
            info!(
                datagrams = self.datagrams_received(),
                "SIP transport closed"
            );
        }
        Ok(())
    }
}
