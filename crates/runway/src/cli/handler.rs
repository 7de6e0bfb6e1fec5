//! Command handlers and their registry.
//!
//! A handler is the unit of application logic a run dispatches to. The
//! [`CommandConfig`](super::CommandConfig) names it by identifier; the
//! [`HandlerRegistry`] maps that identifier to a factory. The factory
//! receives the [`App`] so the handler can read options, arguments and
//! configuration for itself.
//!
//! # Example
//!
//! ```rust
//! use runway::cli::{App, Arity, Command, HandlerRegistry};
//!
//! struct Greet<'a> {
//!     app: &'a App,
//! }
//!
//! impl Command for Greet<'_> {
//!     fn execute(&mut self, arguments: &[String]) -> anyhow::Result<()> {
//!         let loud = self.app.has_option("loud");
//!         let line = format!("hello {}", arguments[0]);
//!         println!("{}", if loud { line.to_uppercase() } else { line });
//!         Ok(())
//!     }
//!
//!     fn arity(&self) -> Arity {
//!         Arity::Exact(1)
//!     }
//! }
//!
//! let mut handlers = HandlerRegistry::new();
//! handlers.register("greet", |app| Box::new(Greet { app }));
//! assert!(handlers.contains("greet"));
//! ```

use super::app::App;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// How many positional arguments a handler accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Arity {
    /// Any number.
    #[default]
    Any,
    /// Exactly this many.
    Exact(usize),
    /// At least this many.
    AtLeast(usize),
    /// Between `min` and `max`, inclusive.
    Range(usize, usize),
}

impl Arity {
    pub fn accepts(&self, count: usize) -> bool {
        match *self {
            Arity::Any => true,
            Arity::Exact(n) => count == n,
            Arity::AtLeast(n) => count >= n,
            Arity::Range(min, max) => (min..=max).contains(&count),
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Any => write!(f, "any number of"),
            Arity::Exact(n) => write!(f, "exactly {}", n),
            Arity::AtLeast(n) => write!(f, "at least {}", n),
            Arity::Range(min, max) => write!(f, "{} to {}", min, max),
        }
    }
}

/// The entry point of a command handler.
pub trait Command {
    /// Runs the command with the parsed positional arguments.
    fn execute(&mut self, arguments: &[String]) -> anyhow::Result<()>;

    /// Positional arguments this handler accepts. Checked before `execute`.
    fn arity(&self) -> Arity {
        Arity::Any
    }
}

/// Builds a handler bound to the running [`App`].
pub type CommandFactory = Rc<dyn for<'a> Fn(&'a App) -> Box<dyn Command + 'a>>;

/// A handler backed by a closure.
///
/// Built by [`HandlerRegistry::register_fn`].
pub struct FnCommand<'a, F> {
    app: &'a App,
    f: Rc<F>,
    arity: Arity,
}

impl<F> Command for FnCommand<'_, F>
where
    F: Fn(&App, &[String]) -> anyhow::Result<()>,
{
    fn execute(&mut self, arguments: &[String]) -> anyhow::Result<()> {
        (self.f)(self.app, arguments)
    }

    fn arity(&self) -> Arity {
        self.arity
    }
}

/// Maps handler identifiers to factories.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    factories: HashMap<String, CommandFactory>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the factory for `id`.
    pub fn register<F>(&mut self, id: impl Into<String>, factory: F) -> &mut Self
    where
        F: for<'a> Fn(&'a App) -> Box<dyn Command + 'a> + 'static,
    {
        self.factories.insert(id.into(), Rc::new(factory));
        self
    }

    /// Registers a closure as the handler for `id`.
    pub fn register_fn<F>(&mut self, id: impl Into<String>, arity: Arity, f: F) -> &mut Self
    where
        F: Fn(&App, &[String]) -> anyhow::Result<()> + 'static,
    {
        let f = Rc::new(f);
        self.register(id, move |app| {
            Box::new(FnCommand {
                app,
                f: f.clone(),
                arity,
            })
        })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Looks up the factory for `id`.
    pub fn get(&self, id: &str) -> Option<&CommandFactory> {
        self.factories.get(id)
    }

    /// Registered identifiers, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arity_accepts() {
        assert!(Arity::Any.accepts(0));
        assert!(Arity::Any.accepts(7));
        assert!(Arity::Exact(2).accepts(2));
        assert!(!Arity::Exact(2).accepts(1));
        assert!(Arity::AtLeast(1).accepts(3));
        assert!(!Arity::AtLeast(1).accepts(0));
        assert!(Arity::Range(1, 2).accepts(2));
        assert!(!Arity::Range(1, 2).accepts(3));
    }

    #[test]
    fn test_arity_display() {
        assert_eq!(Arity::Exact(2).to_string(), "exactly 2");
        assert_eq!(Arity::Range(1, 3).to_string(), "1 to 3");
    }

    #[test]
    fn test_registry_lookup() {
        let mut handlers = HandlerRegistry::new();
        handlers
            .register_fn("b", Arity::Any, |_, _| Ok(()))
            .register_fn("a", Arity::Exact(1), |_, _| Ok(()));

        assert!(handlers.contains("a"));
        assert!(handlers.get("missing").is_none());
        assert_eq!(handlers.ids(), vec!["a", "b"]);
    }
}
