//! Callbacks, bindings and the listener capability.

use serde_json::Value;
use std::fmt;
use std::rc::Rc;

type CallbackFn = dyn Fn(&[Value]) -> anyhow::Result<()>;

/// A shared handle to a unit of behavior bound to an event.
///
/// Callbacks receive the emitted arguments as a positional slice. Cloning a
/// `Callback` clones the handle, not the closure: both clones compare equal
/// and unbinding either one removes bindings made with the other.
///
/// Two callbacks built from separate [`Callback::new`] calls are never
/// equal, even when the closures are identical.
#[derive(Clone)]
pub struct Callback(Rc<CallbackFn>);

impl Callback {
    /// Wraps a closure in a new callback handle.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value]) -> anyhow::Result<()> + 'static,
    {
        Self(Rc::new(f))
    }

    /// Invokes the callback with the given positional arguments.
    pub fn call(&self, args: &[Value]) -> anyhow::Result<()> {
        (self.0)(args)
    }

    fn addr(&self) -> *const () {
        Rc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        self.addr() == other.addr()
    }
}

impl Eq for Callback {}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callback").field(&self.addr()).finish()
    }
}

/// An event name paired with the callback bound to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventBinding {
    pub name: String,
    pub callback: Callback,
}

impl EventBinding {
    pub fn new(name: impl Into<String>, callback: Callback) -> Self {
        Self {
            name: name.into(),
            callback,
        }
    }
}

/// A type that declares a set of bindings to register and remove as a unit.
///
/// Implementors should build their callbacks once and hand out clones, so the
/// bindings returned for removal are the same handles that were registered.
///
/// # Example
///
/// ```rust
/// use runway_events::{Callback, EventBinding, Listener};
///
/// struct Audit {
///     on_parsed: Callback,
/// }
///
/// impl Listener for Audit {
///     fn event_bindings(&self) -> Vec<EventBinding> {
///         vec![EventBinding::new("cli.parsed", self.on_parsed.clone())]
///     }
/// }
/// ```
pub trait Listener {
    /// Returns the bindings in the order they should be registered.
    fn event_bindings(&self) -> Vec<EventBinding>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::cell::RefCell;

    #[test]
    fn test_clone_shares_identity() {
        let cb = Callback::new(|_| Ok(()));
        let clone = cb.clone();
        assert_eq!(cb, clone);
    }

    #[test]
    fn test_identical_closures_are_distinct() {
        let a = Callback::new(|_| Ok(()));
        let b = Callback::new(|_| Ok(()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_call_passes_arguments() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = seen.clone();
        let cb = Callback::new(move |args| {
            seen_clone.borrow_mut().extend(args.iter().cloned());
            Ok(())
        });

        cb.call(&[json!("a"), json!(2)]).unwrap();
        assert_eq!(*seen.borrow(), vec![json!("a"), json!(2)]);
    }
}
