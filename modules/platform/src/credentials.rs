//! Credentials store module.
//!
//! Read-only account secret storage backed by a JSON file in the seeded
//! config directory. Secret values never reach the logs.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::info;

use bootkit::{ActivationCtx, ModuleActivator, register_activator, seeder};

pub const MODULE_NAME: &str = "credentials-store";

const CREDENTIALS_FILE: &str = "credentials.json";

#[derive(Default)]
pub struct CredentialsStoreActivator {
    accounts: Mutex<HashMap<String, String>>,
}

register_activator!(MODULE_NAME, || Arc::new(CredentialsStoreActivator::default()));

impl CredentialsStoreActivator {
    #[must_use]
    pub fn secret_for(&self, account: &str) -> Option<String> {
        self.accounts.lock().get(account).cloned()
    }
}

#[async_trait]
impl ModuleActivator for CredentialsStoreActivator {
    async fn start(&self, _ctx: &ActivationCtx) -> anyhow::Result<()> {
        let defaults = seeder::current_or_default();
        let path = defaults.config_dir.join(CREDENTIALS_FILE);

        let accounts: HashMap<String, String> = if path.is_file() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("invalid credentials file {}", path.display()))?
        } else {
            HashMap::new()
        };

        info!(accounts = accounts.len(), "Credentials store loaded");
        *self.accounts.lock() = accounts;
        Ok(())
    }
}
