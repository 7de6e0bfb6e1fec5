//! Engine lookup by identifier.
//!
//! Configuration names engines by string (`runway.events.engine: standard`).
//! The registry turns that string into a factory. Lookups of unregistered
//! identifiers fail; they are never silently replaced by the default.

use crate::engine::{EventEngine, StandardEngine};
use crate::error::EventError;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Builds a fresh engine instance.
pub type EngineFactory = Rc<dyn Fn() -> Rc<dyn EventEngine>>;

/// Maps engine identifiers to factories.
#[derive(Clone)]
pub struct EngineRegistry {
    factories: HashMap<String, EngineFactory>,
}

impl EngineRegistry {
    /// Identifier of [`StandardEngine`], registered by default.
    pub const STANDARD: &'static str = "standard";

    /// Creates a registry with the standard engine registered.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(Self::STANDARD, || Rc::new(StandardEngine::new()));
        registry
    }

    /// Creates a registry with nothing registered.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Registers (or replaces) the factory for `id`.
    pub fn register<F>(&mut self, id: impl Into<String>, factory: F) -> &mut Self
    where
        F: Fn() -> Rc<dyn EventEngine> + 'static,
    {
        self.factories.insert(id.into(), Rc::new(factory));
        self
    }

    /// Returns true if `id` has a factory.
    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Looks up the factory for `id`.
    pub fn resolve(&self, id: &str) -> Result<EngineFactory, EventError> {
        self.factories
            .get(id)
            .cloned()
            .ok_or_else(|| EventError::UnknownEngine(id.to_string()))
    }
}

impl Default for EngineRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EngineRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&String> = self.factories.keys().collect();
        ids.sort();
        f.debug_struct("EngineRegistry").field("engines", &ids).finish()
    }
}
