//! Network probe module.
//!
//! Determines the local address outbound traffic would use so that
//! downstream transport modules can advertise something better than
//! 0.0.0.0. The probe opens a UDP socket and asks the OS for a route; no
//! datagrams are sent.

use std::net::{IpAddr, Ipv4Addr, UdpSocket};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

use bootkit::{ActivationCtx, ModuleActivator, register_activator};

pub const MODULE_NAME: &str = "net-probe";

#[derive(Default)]
pub struct NetProbeActivator {
    local_addr: Mutex<Option<IpAddr>>,
}

register_activator!(MODULE_NAME, || Arc::new(NetProbeActivator::default()));

fn probe_local_addr() -> Option<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).ok()?;
    // TEST-NET-2 address; connect() only picks a route.
    socket.connect(("198.51.100.1", 9)).ok()?;
    socket.local_addr().ok().map(|addr| addr.ip())
}

impl NetProbeActivator {
    #[must_use]
    pub fn local_addr(&self) -> Option<IpAddr> {
        *self.local_addr.lock()
    }
}

#[async_trait]
impl ModuleActivator for NetProbeActivator {
    async fn start(&self, _ctx: &ActivationCtx) -> anyhow::Result<()> {
        let addr = probe_local_addr().unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
        info!(%addr, "Local address resolved");
        *self.local_addr.lock() = Some(addr);
        Ok(())
    }
}
