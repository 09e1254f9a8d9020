//! Module identity and ordering model.
//!
//! A [`ModuleRef`] names one loadable unit; a [`ModuleDescriptor`] pairs it
//! with the [`StartTier`] that controls relative activation order. The
//! [`ModuleSet`] is the ordered launch plan: a fixed infrastructure prefix
//! followed by the caller-supplied extension suffix, built once per launch
//! and never mutated afterwards.

use std::fmt;

/// Opaque, cheap handle naming a loadable module.
///
/// References are resolved against the static activator registry at launch
/// time; an unknown name fails installation for that module.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModuleRef(String);

impl ModuleRef {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleRef {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ModuleRef {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Integer ordering hint controlling relative activation order.
///
/// The container activates modules whose tier is at or below its configured
/// framework start level, lowest tier first; ties are broken by install
/// order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StartTier(u32);

impl StartTier {
    #[must_use]
    pub const fn new(tier: u32) -> Self {
        Self(tier)
    }

    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// The tier one level above this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl Default for StartTier {
    fn default() -> Self {
        Self(1)
    }
}

impl fmt::Display for StartTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One loadable unit plus its ordering tier. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDescriptor {
    reference: ModuleRef,
    tier: StartTier,
}

impl ModuleDescriptor {
    #[must_use]
    pub fn new(reference: ModuleRef, tier: StartTier) -> Self {
        Self { reference, tier }
    }

    #[must_use]
    pub fn reference(&self) -> &ModuleRef {
        &self.reference
    }

    #[must_use]
    pub fn tier(&self) -> StartTier {
        self.tier
    }
}

/// Ordered launch plan: infrastructure prefix ++ extension suffix.
#[derive(Debug, Clone)]
pub struct ModuleSet {
    descriptors: Vec<ModuleDescriptor>,
}

impl ModuleSet {
    /// Concatenate the infrastructure prefix and extension suffix, assigning
    /// every module the same flat `tier`. Caller order is preserved within
    /// each group.
    #[must_use]
    pub fn assemble(infrastructure: &[ModuleRef], extensions: &[ModuleRef], tier: StartTier) -> Self {
        let descriptors = infrastructure
            .iter()
            .chain(extensions.iter())
            .cloned()
            .map(|reference| ModuleDescriptor::new(reference, tier))
            .collect();
        Self { descriptors }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.descriptors.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Module names in install order, for logging.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.descriptors.iter().map(|d| d.reference.name()).collect()
    }
}
