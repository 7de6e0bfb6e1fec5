//! In-process event dispatch for runway CLIs.
//!
//! `runway-events` lets framework components extend the command lifecycle
//! without the lifecycle depending on them. Producers emit named events with
//! positional arguments; consumers bind callbacks to those names, either one
//! at a time or as a [`Listener`] that declares a set of bindings.
//!
//! # Pieces
//!
//! - [`EventEngine`]: the pub/sub core (bind, unbind, emit). [`StandardEngine`]
//!   is the in-memory implementation.
//! - [`EngineRegistry`]: maps engine identifiers (as found in configuration)
//!   to factories, so the engine can be swapped without code changes.
//! - [`EventBus`]: the facade components actually talk to. It owns one engine,
//!   constructed lazily on first use, and expands listeners into bindings.
//!
//! # Example
//!
//! ```rust
//! use runway_events::{Callback, EventBus};
//! use serde_json::json;
//!
//! let bus = EventBus::new();
//! let greet = Callback::new(|args| {
//!     println!("hello {}", args[0]);
//!     Ok(())
//! });
//!
//! bus.bind("greet", &greet);
//! bus.emit("greet", &[json!("world")])?;
//! bus.unbind("greet", &greet);
//! # Ok::<(), runway_events::EventError>(())
//! ```
//!
//! # Threading
//!
//! Everything here is single-threaded (`Rc`/`RefCell`). A host that needs to
//! share a bus across threads must wrap its own engine in a mutex.

mod binding;
mod bus;
mod engine;
mod error;
mod registry;

pub use binding::{Callback, EventBinding, Listener};
pub use bus::EventBus;
pub use engine::{EventEngine, StandardEngine};
pub use error::EventError;
pub use registry::{EngineFactory, EngineRegistry};
