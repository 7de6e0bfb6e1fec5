//! The pub/sub core.
//!
//! An engine keeps, per event name, the callbacks bound to it in the order
//! they were bound. Emission walks that list front to back.
//!
//! # Emission Semantics
//!
//! - Emitting a name nobody is bound to does nothing. Producers never need to
//!   know whether anyone is listening.
//! - Emission is not a fault-isolation boundary: the first callback that fails
//!   stops the dispatch and its error is returned to the emitter.
//! - The callbacks invoked are the ones bound when `emit` starts. A callback
//!   may bind or unbind during emission; the change applies to the next emit.

use crate::binding::Callback;
use crate::error::EventError;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use tracing::trace;

/// A swappable event dispatch backend.
///
/// Methods take `&self` so a bus can keep handing out the engine while one of
/// its callbacks is running.
pub trait EventEngine {
    /// Appends `callback` to the list for `name`. Binding the same callback
    /// twice makes it run twice per emit.
    fn bind(&self, name: &str, callback: Callback);

    /// Removes every binding of `callback` under `name` and returns how many
    /// were removed. Unknown names and callbacks remove nothing.
    fn unbind(&self, name: &str, callback: &Callback) -> usize;

    /// Invokes the callbacks bound to `name`, in binding order.
    fn emit(&self, name: &str, args: &[Value]) -> Result<(), EventError>;

    /// Number of bindings currently registered for `name`.
    fn binding_count(&self, name: &str) -> usize;
}

/// The default in-memory engine.
#[derive(Default)]
pub struct StandardEngine {
    bindings: RefCell<HashMap<String, Vec<Callback>>>,
}

impl StandardEngine {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventEngine for StandardEngine {
    fn bind(&self, name: &str, callback: Callback) {
        self.bindings
            .borrow_mut()
            .entry(name.to_string())
            .or_default()
            .push(callback);
    }

    fn unbind(&self, name: &str, callback: &Callback) -> usize {
        let mut bindings = self.bindings.borrow_mut();
        let Some(list) = bindings.get_mut(name) else {
            return 0;
        };

        let before = list.len();
        list.retain(|bound| bound != callback);
        let removed = before - list.len();

        if list.is_empty() {
            bindings.remove(name);
        }
        removed
    }

    fn emit(&self, name: &str, args: &[Value]) -> Result<(), EventError> {
        // Snapshot so callbacks can re-enter the engine.
        let callbacks = match self.bindings.borrow().get(name) {
            Some(list) => list.clone(),
            None => return Ok(()),
        };

        trace!(event = name, listeners = callbacks.len(), "emitting event");
        for callback in &callbacks {
            callback.call(args).map_err(|source| EventError::Listener {
                event: name.to_string(),
                source,
            })?;
        }
        Ok(())
    }

    fn binding_count(&self, name: &str) -> usize {
        self.bindings.borrow().get(name).map_or(0, Vec::len)
    }
}

impl fmt::Debug for StandardEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bindings = self.bindings.borrow();
        f.debug_struct("StandardEngine")
            .field("event_count", &bindings.len())
            .field(
                "binding_count",
                &bindings.values().map(Vec::len).sum::<usize>(),
            )
            .finish()
    }
}
