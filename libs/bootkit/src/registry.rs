// bootkit/src/registry.rs
use std::sync::Arc;

use crate::contracts::ModuleActivator;
use crate::error::RegistryError;

/// One statically registered module: a name and the factory constructing
/// its activator. Modules submit entries via [`crate::register_activator!`];
/// the launcher resolves `ModuleRef`s against this registry instead of any
/// runtime discovery.
#[derive(Debug)]
pub struct ActivatorEntry {
    pub name: &'static str,
    pub construct: fn() -> Arc<dyn ModuleActivator>,
}

inventory::collect!(ActivatorEntry);

/// Register a module activator under a fixed name.
///
/// ```ignore
/// bootkit::register_activator!("media-engine", || Arc::new(MediaEngineActivator::default()));
/// ```
#[macro_export]
macro_rules! register_activator {
    ($name:expr, $construct:expr) => {
        $crate::inventory::submit! {
            $crate::registry::ActivatorEntry {
                name: $name,
                construct: $construct,
            }
        }
    };
}

/// Resolve a module reference to its registered entry.
///
/// # Errors
/// Returns `RegistryError::UnknownReference` when nothing is registered
/// under the name, `RegistryError::DuplicateReference` when more than one
/// entry claims it.
pub fn resolve(name: &str) -> Result<&'static ActivatorEntry, RegistryError> {
    resolve_in(inventory::iter::<ActivatorEntry>, name)
}

fn resolve_in<'a>(
    entries: impl IntoIterator<Item = &'a ActivatorEntry>,
    name: &str,
) -> Result<&'a ActivatorEntry, RegistryError> {
    let mut found = None;
    for entry in entries {
        if entry.name == name {
            if found.is_some() {
                return Err(RegistryError::DuplicateReference(name.to_owned()));
            }
            found = Some(entry);
        }
    }
    found.ok_or_else(|| RegistryError::UnknownReference(name.to_owned()))
}

/// Names of every registered module, sorted. Used for startup diagnostics.
#[must_use]
pub fn registered_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = inventory::iter::<ActivatorEntry>
        .into_iter()
        .map(|e| e.name)
        .collect();
    names.sort_unstable();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::ActivationCtx;
    use async_trait::async_trait;

    #[derive(Default)]
    struct NoopActivator;

    #[async_trait]
    impl ModuleActivator for NoopActivator {
        async fn start(&self, _ctx: &ActivationCtx) -> anyhow::Result<()> {
            Ok(())
        }
    }

    crate::register_activator!("registry-test-noop", || Arc::new(NoopActivator));

    #[test]
    fn resolve_finds_registered_entry() {
        let entry = resolve("registry-test-noop").unwrap();
        assert_eq!(entry.name, "registry-test-noop");
        // The factory must produce a usable activator.
        let _activator = (entry.construct)();
    }

    #[test]
    fn resolve_unknown_reference_fails() {
        let err = resolve("registry-test-missing").unwrap_err();
        match err {
            RegistryError::UnknownReference(name) => assert_eq!(name, "registry-test-missing"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn duplicate_registration_is_detected() {
        let ctor: fn() -> Arc<dyn ModuleActivator> = || Arc::new(NoopActivator);
        let entries = [
            ActivatorEntry {
                name: "dup",
                construct: ctor,
            },
            ActivatorEntry {
                name: "dup",
                construct: ctor,
            },
        ];

        let err = resolve_in(entries.iter(), "dup").unwrap_err();
        match err {
            RegistryError::DuplicateReference(name) => assert_eq!(name, "dup"),
            other => panic!("expected DuplicateReference, got: {other:?}"),
        }
    }

    #[test]
    fn registered_names_contains_test_entry() {
        assert!(registered_names().contains(&"registry-test-noop"));
    }
}
