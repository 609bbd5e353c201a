//! Component identities, the initializer trait, and the fixed phase table.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bootstrap::error::ComponentError;

/// The subsystems brought up by the bootstrap sequencer.
///
/// Declaration order is the initialization order, so the derived `Ord`
/// sorts names the same way the sequencer runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentName {
    Config,
    Cache,
    Database,
    Logger,
    Security,
    Session,
}

impl ComponentName {
    /// Every component, in initialization order.
    pub const ALL: [ComponentName; 6] = [
        ComponentName::Config,
        ComponentName::Cache,
        ComponentName::Database,
        ComponentName::Logger,
        ComponentName::Security,
        ComponentName::Session,
    ];

    /// Optional components are skipped when their capability is absent.
    pub const fn is_optional(self) -> bool {
        matches!(self, ComponentName::Cache | ComponentName::Security)
    }

    /// Phase number (1-based) the component belongs to.
    pub const fn phase(self) -> u8 {
        match self {
            ComponentName::Config | ComponentName::Cache => 1,
            ComponentName::Database | ComponentName::Logger => 2,
            ComponentName::Security | ComponentName::Session => 3,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            ComponentName::Config => "config",
            ComponentName::Cache => "cache",
            ComponentName::Database => "database",
            ComponentName::Logger => "logger",
            ComponentName::Security => "security",
            ComponentName::Session => "session",
        }
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A subsystem initializer.
///
/// Implementations may read any component from an earlier phase but never
/// one from a later phase. Config and Database initializers must not log
/// through `tracing`; the sequencer reports their failures on the raw
/// fault channel.
pub trait Component: Send + Sync {
    /// Whether the capability is present at all. Only consulted for
    /// optional components; `false` means "skip", not "fail".
    fn is_available(&self) -> bool {
        true
    }

    /// Perform the subsystem's setup.
    fn initialize(&self) -> Result<(), ComponentError>;
}

/// A component backed by a plain closure; always available.
pub struct FnComponent<F>(F);

/// Wrap a closure as a [`Component`].
pub fn from_fn<F>(f: F) -> FnComponent<F>
where
    F: Fn() -> Result<(), ComponentError> + Send + Sync,
{
    FnComponent(f)
}

impl<F> Component for FnComponent<F>
where
    F: Fn() -> Result<(), ComponentError> + Send + Sync,
{
    fn initialize(&self) -> Result<(), ComponentError> {
        (self.0)()
    }
}

/// Registered initializers, at most one per component.
#[derive(Default)]
pub struct ComponentTable {
    entries: HashMap<ComponentName, Box<dyn Component>>,
}

impl ComponentTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an initializer, replacing any earlier registration.
    pub fn register(&mut self, name: ComponentName, component: impl Component + 'static) -> &mut Self {
        self.entries.insert(name, Box::new(component));
        self
    }

    /// Builder-style variant of [`ComponentTable::register`].
    pub fn with(mut self, name: ComponentName, component: impl Component + 'static) -> Self {
        self.register(name, component);
        self
    }

    pub fn get(&self, name: ComponentName) -> Option<&dyn Component> {
        self.entries.get(&name).map(|c| c.as_ref())
    }

    pub fn contains(&self, name: ComponentName) -> bool {
        self.entries.contains_key(&name)
    }
}

/// The ordered phases the sequencer walks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhasePlan {
    phases: Vec<Vec<ComponentName>>,
}

impl PhasePlan {
    /// Foundational, then single-dependency, then composite components.
    pub fn standard() -> Self {
        Self {
            phases: vec![
                vec![ComponentName::Config, ComponentName::Cache],
                vec![ComponentName::Database, ComponentName::Logger],
                vec![ComponentName::Security, ComponentName::Session],
            ],
        }
    }

    /// Arbitrary plans exist only for fault injection.
    #[cfg(test)]
    pub(crate) fn custom(phases: Vec<Vec<ComponentName>>) -> Self {
        Self { phases }
    }

    pub fn phases(&self) -> impl Iterator<Item = &[ComponentName]> {
        self.phases.iter().map(Vec::as_slice)
    }
}

impl Default for PhasePlan {
    fn default() -> Self {
        Self::standard()
    }
}
