//! The event bus facade.
//!
//! [`EventBus`] is the object components hold to emit and listen. It owns a
//! single engine, constructed lazily on first use from the factory chosen at
//! construction time, and replaceable with [`EventBus::set_engine`].
//!
//! # Listener Lifecycle
//!
//! ```text
//! add_listener(l)    → bind every (name, callback) l declares, in order
//! remove_listener(l) → unbind every (name, callback) l declares
//! ```
//!
//! Removing a binding that was never registered is skipped and does not stop
//! the remaining bindings from being removed.

use crate::binding::{Callback, EventBinding, Listener};
use crate::engine::{EventEngine, StandardEngine};
use crate::error::EventError;
use crate::registry::{EngineFactory, EngineRegistry};
use serde_json::Value;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

/// Facade over one [`EventEngine`].
pub struct EventBus {
    engine: RefCell<Option<Rc<dyn EventEngine>>>,
    engine_id: String,
    factory: EngineFactory,
}

impl EventBus {
    /// Creates a bus backed by the standard engine.
    pub fn new() -> Self {
        let factory: EngineFactory =
            Rc::new(|| Rc::new(StandardEngine::new()) as Rc<dyn EventEngine>);
        Self::with_factory(EngineRegistry::STANDARD, factory)
    }

    /// Creates a bus backed by the engine registered under `id`.
    ///
    /// The identifier is checked now; the engine itself is only built when
    /// the bus is first used.
    pub fn from_engine_id(id: &str, registry: &EngineRegistry) -> Result<Self, EventError> {
        let factory = registry.resolve(id)?;
        Ok(Self::with_factory(id, factory))
    }

    /// Creates a bus around an already-built engine.
    pub fn with_engine(engine: Rc<dyn EventEngine>) -> Self {
        let bus = Self::new();
        bus.set_engine(engine);
        bus
    }

    fn with_factory(id: &str, factory: EngineFactory) -> Self {
        Self {
            engine: RefCell::new(None),
            engine_id: id.to_string(),
            factory,
        }
    }

    /// Identifier of the engine this bus was configured with.
    pub fn engine_id(&self) -> &str {
        &self.engine_id
    }

    /// Returns true once the engine has been built or installed.
    pub fn is_engine_initialized(&self) -> bool {
        self.engine.borrow().is_some()
    }

    /// Returns the engine, building it on first access.
    pub fn engine(&self) -> Rc<dyn EventEngine> {
        let mut slot = self.engine.borrow_mut();
        match slot.as_ref() {
            Some(engine) => engine.clone(),
            None => {
                debug!(engine = %self.engine_id, "constructing event engine");
                let engine = (self.factory)();
                *slot = Some(engine.clone());
                engine
            }
        }
    }

    /// Replaces the engine. Bindings made on the previous engine stay there.
    pub fn set_engine(&self, engine: Rc<dyn EventEngine>) {
        *self.engine.borrow_mut() = Some(engine);
    }

    /// Registers every binding `listener` declares.
    pub fn add_listener(&self, listener: &dyn Listener) {
        let engine = self.engine();
        for binding in listener.event_bindings() {
            engine.bind(&binding.name, binding.callback);
        }
    }

    /// Removes every binding `listener` declares.
    pub fn remove_listener(&self, listener: &dyn Listener) {
        let engine = self.engine();
        for binding in listener.event_bindings() {
            if engine.unbind(&binding.name, &binding.callback) == 0 {
                debug!(event = %binding.name, "listener binding was not bound, skipping");
            }
        }
    }

    pub fn bind(&self, name: &str, callback: &Callback) {
        self.engine().bind(name, callback.clone());
    }

    /// Returns how many bindings were removed.
    pub fn unbind(&self, name: &str, callback: &Callback) -> usize {
        self.engine().unbind(name, callback)
    }

    pub fn bind_all<I>(&self, bindings: I)
    where
        I: IntoIterator<Item = EventBinding>,
    {
        let engine = self.engine();
        for binding in bindings {
            engine.bind(&binding.name, binding.callback);
        }
    }

    pub fn unbind_all<I>(&self, bindings: I)
    where
        I: IntoIterator<Item = EventBinding>,
    {
        let engine = self.engine();
        for binding in bindings {
            engine.unbind(&binding.name, &binding.callback);
        }
    }

    /// Emits `name` with positional `args`.
    pub fn emit(&self, name: &str, args: &[Value]) -> Result<(), EventError> {
        // Clone the handle first so callbacks can call back into the bus.
        let engine = self.engine();
        engine.emit(name, args)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("engine_id", &self.engine_id)
            .field("initialized", &self.is_engine_initialized())
            .finish()
    }
}
