//! Configuration store module.
//!
//! Loads persisted settings from a properties file under the seeded config
//! directory and, unless the read-only-configuration flag is set, writes
//! them back on deactivation.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::{debug, info};

use bootkit::{ActivationCtx, ModuleActivator, register_activator, seeder};

pub const MODULE_NAME: &str = "config-store";

const PROPERTIES_FILE: &str = "voicemenu.properties";

#[derive(Default)]
pub struct ConfigStoreActivator {
    state: Mutex<Option<StoreState>>,
}

struct StoreState {
    path: PathBuf,
    read_only: bool,
    entries: BTreeMap<String, String>,
}

register_activator!(MODULE_NAME, || Arc::new(ConfigStoreActivator::default()));

fn parse_properties(raw: &str) -> BTreeMap<String, String> {
    raw.lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }
            let (key, value) = line.split_once('=')?;
            Some((key.trim().to_owned(), value.trim().to_owned()))
        })
        .collect()
}

fn render_properties(entries: &BTreeMap<String, String>) -> String {
    let mut out = String::new();
    for (key, value) in entries {
        out.push_str(key);
        out.push('=');
        out.push_str(value);
        out.push('\n');
    }
    out
}

impl ConfigStoreActivator {
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.state
            .lock()
            .as_ref()
            .and_then(|s| s.entries.get(key).cloned())
    }

    /// Set a property; persisted on deactivation unless the store is
    /// read-only.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        if let Some(state) = self.state.lock().as_mut() {
            state.entries.insert(key.into(), value.into());
        }
    }
}

#[async_trait]
impl ModuleActivator for ConfigStoreActivator {
    async fn start(&self, _ctx: &ActivationCtx) -> anyhow::Result<()> {
        let defaults = seeder::current_or_default();
        let path = defaults.config_dir.join(PROPERTIES_FILE);

        let entries = if path.is_file() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            parse_properties(&raw)
        } else {
            BTreeMap::new()
        };

        info!(
            path = %path.display(),
            entries = entries.len(),
            read_only = defaults.read_only_config,
            "Configuration store loaded"
        );

        *self.state.lock() = Some(StoreState {
            path,
            read_only: defaults.read_only_config,
            entries,
        });
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        let Some(state) = self.state.lock().take() else {
            return Ok(());
        };

        if state.read_only {
            debug!("Read-only configuration; skipping persist");
            return Ok(());
        }

        std::fs::write(&state.path, render_properties(&state.entries))
            .with_context(|| format!("failed to persist {}", state.path.display()))?;
        info!(entries = state.entries.len(), "Configuration store persisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[test]
    fn parse_skips_comments_and_blank_lines() {
        let raw = "# header\n\nsip.account = alice \nsip.registrar=example.org\nbroken-line\n";
        let entries = parse_properties(raw);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries["sip.account"], "alice");
        assert_eq!(entries["sip.registrar"], "example.org");
    }

    #[test]
    fn render_is_parseable_again() {
        let mut entries = BTreeMap::new();
        entries.insert("a".to_owned(), "1".to_owned());
        entries.insert("b".to_owned(), "2".to_owned());

        assert_eq!(parse_properties(&render_properties(&entries)), entries);
    }

    #[tokio::test]
    async fn start_loads_and_stop_persists_when_writable() {
        let defaults = test_support::seeded_defaults();
        let path = defaults.config_dir.join(PROPERTIES_FILE);
        std::fs::write(&path, "sip.account=alice\n").unwrap();

        let store = ConfigStoreActivator::default();
        let ctx = test_support::activation_ctx(MODULE_NAME);
        store.start(&ctx).await.unwrap();

        assert_eq!(store.get("sip.account").as_deref(), Some("alice"));
        store.set("sip.registrar", "example.org");
        store.stop().await.unwrap();

        // The test seed is writable, so the new key must be on disk.
        let persisted = std::fs::read_to_string(&path).unwrap();
        assert!(persisted.contains("sip.registrar=example.org"));
    }
}
