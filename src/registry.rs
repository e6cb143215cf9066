//! Ordered registry of available checks.
//!
//! The registry is built by a wiring step (see [`crate::checks::build_registry`])
//! and handed to the engine as-is. Entries that could not be turned into a
//! check stay in the registry as `Unresolved` so listings can skip them
//! without failing.

use crate::Check;
use std::fmt;
use std::sync::Arc;

/// Whether a registry entry refers to a usable check.
#[derive(Clone)]
pub enum Resolution {
    Resolved(Arc<dyn Check>),
    Unresolved(String),
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Resolved(check) => f.debug_tuple("Resolved").field(&check.name()).finish(),
            Resolution::Unresolved(reason) => f.debug_tuple("Unresolved").field(reason).finish(),
        }
    }
}

/// One `(identity, check)` pair.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub id: String,
    pub resolution: Resolution,
}

impl RegistryEntry {
    /// The check, if this entry resolved to one
    pub fn check(&self) -> Option<&Arc<dyn Check>> {
        match &self.resolution {
            Resolution::Resolved(check) => Some(check),
            Resolution::Unresolved(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    entries: Vec<RegistryEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            entries: Vec::new(),
        }
    }

    /// Append a constructed check under `id`.
    pub fn register(&mut self, id: impl Into<String>, check: Arc<dyn Check>) {
        self.entries.push(RegistryEntry {
            id: id.into(),
            resolution: Resolution::Resolved(check),
        });
    }

    /// Append an entry whose definition could not be resolved.
    pub fn register_unresolved(&mut self, id: impl Into<String>, reason: impl Into<String>) {
        self.entries.push(RegistryEntry {
            id: id.into(),
            resolution: Resolution::Unresolved(reason.into()),
        });
    }

    /// Builder-style [`Registry::register`]
    pub fn with_check(mut self, id: impl Into<String>, check: Arc<dyn Check>) -> Self {
        self.register(id, check);
        self
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.iter().any(|e| e.id == id)
    }
}
