//! Process-wide access to one [`EventBus`].
//!
//! Library code should take an `&EventBus` (or get one from
//! [`App::bus`](crate::cli::App::bus)). This module exists for the outermost
//! layer, where [`crate::run`] installs the bus every later call shares, and
//! for listeners registered before any `App` exists.
//!
//! The bus is per thread. Until one is [`install`]ed (or an engine is set),
//! the first call that needs it builds a provisional bus on the standard
//! engine. [`install_from_config`] replaces a provisional bus with one on the
//! configured engine and re-binds everything registered through this module.

use runway_events::{
    Callback, EngineRegistry, EventBinding, EventBus, EventEngine, EventError, Listener,
};
use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;
use tracing::debug;

use crate::config::{Config, EVENT_ENGINE_KEY};

struct Shared {
    bus: Rc<EventBus>,
    /// Installed or given an engine explicitly; configuration no longer applies.
    explicit: bool,
    /// Bindings made through this module while the bus is provisional.
    bindings: Vec<EventBinding>,
}

thread_local! {
    static SHARED: RefCell<Option<Shared>> = const { RefCell::new(None) };
}

/// Returns the shared bus, creating a provisional one on first use.
pub fn bus() -> Rc<EventBus> {
    SHARED.with(|slot| {
        slot.borrow_mut()
            .get_or_insert_with(|| Shared {
                bus: Rc::new(EventBus::new()),
                explicit: false,
                bindings: Vec::new(),
            })
            .bus
            .clone()
    })
}

/// Replaces the shared bus. Configuration no longer changes it.
pub fn install(bus: Rc<EventBus>) {
    SHARED.with(|slot| {
        *slot.borrow_mut() = Some(Shared {
            bus,
            explicit: true,
            bindings: Vec::new(),
        })
    });
}

/// Returns the shared bus, building it from `runway.events.engine` unless a
/// bus was installed or an engine set explicitly.
///
/// A provisional bus is replaced; bindings made through this module carry
/// over to the new bus in their original order.
pub fn install_from_config(
    config: &Config,
    engines: &EngineRegistry,
) -> Result<Rc<EventBus>, EventError> {
    let explicit = SHARED.with(|slot| {
        slot.borrow()
            .as_ref()
            .filter(|shared| shared.explicit)
            .map(|shared| shared.bus.clone())
    });
    if let Some(bus) = explicit {
        return Ok(bus);
    }

    let id = config.get_strategy(EVENT_ENGINE_KEY, EngineRegistry::STANDARD);
    let bus = Rc::new(EventBus::from_engine_id(&id, engines)?);
    let carried = SHARED.with(|slot| {
        slot.borrow()
            .as_ref()
            .map(|shared| shared.bindings.clone())
            .unwrap_or_default()
    });
    debug!(engine = %id, bindings = carried.len(), "installing configured event bus");
    bus.bind_all(carried);
    install(bus.clone());
    Ok(bus)
}

/// Drops the shared bus; the next access builds a fresh provisional one.
pub fn reset() {
    SHARED.with(|slot| *slot.borrow_mut() = None);
}

fn record(f: impl FnOnce(&mut Vec<EventBinding>)) {
    SHARED.with(|slot| {
        if let Some(shared) = slot.borrow_mut().as_mut().filter(|shared| !shared.explicit) {
            f(&mut shared.bindings);
        }
    });
}

fn forget(bindings: &mut Vec<EventBinding>, name: &str, callback: &Callback) {
    bindings.retain(|binding| !(binding.name == name && binding.callback == *callback));
}

pub fn add_listener(listener: &dyn Listener) {
    bus().add_listener(listener);
    record(|bindings| bindings.extend(listener.event_bindings()));
}

pub fn remove_listener(listener: &dyn Listener) {
    bus().remove_listener(listener);
    record(|bindings| {
        for binding in listener.event_bindings() {
            forget(bindings, &binding.name, &binding.callback);
        }
    });
}

pub fn bind(name: &str, callback: &Callback) {
    bus().bind(name, callback);
    record(|bindings| bindings.push(EventBinding::new(name, callback.clone())));
}

pub fn unbind(name: &str, callback: &Callback) -> usize {
    let removed = bus().unbind(name, callback);
    record(|bindings| forget(bindings, name, callback));
    removed
}

pub fn bind_all<I>(bindings: I)
where
    I: IntoIterator<Item = EventBinding>,
{
    let bindings: Vec<EventBinding> = bindings.into_iter().collect();
    bus().bind_all(bindings.clone());
    record(|recorded| recorded.extend(bindings));
}

pub fn unbind_all<I>(bindings: I)
where
    I: IntoIterator<Item = EventBinding>,
{
    let bindings: Vec<EventBinding> = bindings.into_iter().collect();
    bus().unbind_all(bindings.clone());
    record(|recorded| {
        for binding in &bindings {
            forget(recorded, &binding.name, &binding.callback);
        }
    });
}

pub fn emit(name: &str, args: &[Value]) -> Result<(), EventError> {
    bus().emit(name, args)
}

/// Replaces the shared bus's engine. Configuration no longer changes it.
pub fn set_engine(engine: Rc<dyn EventEngine>) {
    bus().set_engine(engine);
    SHARED.with(|slot| {
        if let Some(shared) = slot.borrow_mut().as_mut() {
            shared.explicit = true;
            shared.bindings.clear();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use runway_events::StandardEngine;
    use std::cell::Cell;

    // Each test runs on its own thread, so the thread-local starts empty.

    struct Counter {
        callback: Callback,
    }

    impl Counter {
        fn new(hits: Rc<Cell<usize>>) -> Self {
            Self {
                callback: Callback::new(move |_| {
                    hits.set(hits.get() + 1);
                    Ok(())
                }),
            }
        }
    }

    impl Listener for Counter {
        fn event_bindings(&self) -> Vec<EventBinding> {
            vec![EventBinding::new("ping", self.callback.clone())]
        }
    }

    fn custom_engines() -> EngineRegistry {
        let mut engines = EngineRegistry::new();
        engines.register("custom", || Rc::new(StandardEngine::new()) as Rc<dyn EventEngine>);
        engines
    }

    fn custom_config() -> Config {
        let mut config = Config::new();
        config.set(EVENT_ENGINE_KEY, "custom");
        config
    }

    #[test]
    fn test_bus_is_created_once() {
        let a = bus();
        let b = bus();
        assert!(Rc::ptr_eq(&a, &b));
    }

    #[test]
    fn test_reset_builds_a_fresh_bus() {
        let before = bus();
        reset();
        assert!(!Rc::ptr_eq(&before, &bus()));
    }

    #[test]
    fn test_install_from_config_keeps_installed_bus() {
        let installed = Rc::new(EventBus::new());
        install(installed.clone());

        let mut config = Config::new();
        config.set(EVENT_ENGINE_KEY, "missing");
        let bus = install_from_config(&config, &EngineRegistry::new()).unwrap();
        assert!(Rc::ptr_eq(&bus, &installed));
    }

    #[test]
    fn test_install_from_config_unknown_engine() {
        let mut config = Config::new();
        config.set(EVENT_ENGINE_KEY, "missing");
        let result = install_from_config(&config, &EngineRegistry::new());
        assert!(matches!(result, Err(EventError::UnknownEngine(_))));
    }

    #[test]
    fn test_configured_engine_replaces_provisional_bus() {
        let hits = Rc::new(Cell::new(0));
        let listener = Counter::new(hits.clone());
        add_listener(&listener);
        assert_eq!(bus().engine_id(), EngineRegistry::STANDARD);

        let installed = install_from_config(&custom_config(), &custom_engines()).unwrap();
        assert_eq!(installed.engine_id(), "custom");
        assert!(Rc::ptr_eq(&installed, &bus()));

        emit("ping", &[]).unwrap();
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_removed_listener_does_not_carry_over() {
        let hits = Rc::new(Cell::new(0));
        let listener = Counter::new(hits.clone());
        add_listener(&listener);
        remove_listener(&listener);

        install_from_config(&custom_config(), &custom_engines()).unwrap();
        emit("ping", &[]).unwrap();
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_set_engine_pins_the_bus() {
        set_engine(Rc::new(StandardEngine::new()));
        let before = bus();

        let after = install_from_config(&custom_config(), &custom_engines()).unwrap();
        assert!(Rc::ptr_eq(&before, &after));
        assert_eq!(after.engine_id(), EngineRegistry::STANDARD);
    }

    #[test]
    fn test_free_functions_share_the_bus() {
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        let callback = Callback::new(move |_| {
            counter.set(counter.get() + 1);
            Ok(())
        });

        bind("ping", &callback);
        emit("ping", &[]).unwrap();
        assert_eq!(unbind("ping", &callback), 1);
        emit("ping", &[]).unwrap();

        assert_eq!(hits.get(), 1);
    }
}
