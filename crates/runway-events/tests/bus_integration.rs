use proptest::prelude::*;
use runway_events::{Callback, EventBinding, EventBus, EventEngine, EventError, Listener};
use serde_json::{json, Value};
use std::cell::RefCell;
use std::rc::Rc;

type Log = Rc<RefCell<Vec<String>>>;

fn recorder(log: &Log, label: impl Into<String>) -> Callback {
    let log = log.clone();
    let label = label.into();
    Callback::new(move |_| {
        log.borrow_mut().push(label.clone());
        Ok(())
    })
}

struct Audit {
    on_start: Callback,
    on_stop: Callback,
}

impl Audit {
    fn new(log: &Log) -> Self {
        Self {
            on_start: recorder(log, "audit.start"),
            on_stop: recorder(log, "audit.stop"),
        }
    }
}

impl Listener for Audit {
    fn event_bindings(&self) -> Vec<EventBinding> {
        vec![
            EventBinding::new("start", self.on_start.clone()),
            EventBinding::new("stop", self.on_stop.clone()),
        ]
    }
}

#[test]
fn test_bind_emit_unbind_sequence() {
    let bus = EventBus::new();
    let log: Log = Rc::default();
    let c1 = recorder(&log, "C1");
    let c2 = recorder(&log, "C2");

    bus.bind("x", &c1);
    bus.bind("x", &c2);
    bus.emit("x", &[]).unwrap();
    assert_eq!(*log.borrow(), vec!["C1", "C2"]);

    log.borrow_mut().clear();
    bus.unbind("x", &c1);
    bus.emit("x", &[]).unwrap();
    assert_eq!(*log.borrow(), vec!["C2"]);
}

#[test]
fn test_unbind_never_bound_is_noop() {
    let bus = EventBus::new();
    let cb = Callback::new(|_| Ok(()));
    assert_eq!(bus.unbind("never", &cb), 0);
}

#[test]
fn test_emit_without_listeners_is_noop() {
    let bus = EventBus::new();
    assert!(bus.emit("quiet", &[json!("ignored")]).is_ok());
}

#[test]
fn test_double_registration_is_expected() {
    let bus = EventBus::new();
    let log: Log = Rc::default();
    let audit = Audit::new(&log);

    bus.add_listener(&audit);
    bus.add_listener(&audit);
    bus.emit("start", &[]).unwrap();

    assert_eq!(*log.borrow(), vec!["audit.start", "audit.start"]);

    // One removal takes both registrations out.
    bus.remove_listener(&audit);
    log.borrow_mut().clear();
    bus.emit("start", &[]).unwrap();
    assert!(log.borrow().is_empty());
}

#[test]
fn test_listener_bindings_cover_each_event() {
    let bus = EventBus::new();
    let log: Log = Rc::default();
    let audit = Audit::new(&log);

    bus.add_listener(&audit);
    bus.emit("stop", &[]).unwrap();
    bus.emit("start", &[]).unwrap();

    assert_eq!(*log.borrow(), vec!["audit.stop", "audit.start"]);
}

#[test]
fn test_listener_failure_reaches_emitter() {
    let bus = EventBus::new();
    let log: Log = Rc::default();

    bus.bind("x", &Callback::new(|_| anyhow::bail!("listener exploded")));
    bus.bind("x", &recorder(&log, "after"));

    let err = bus.emit("x", &[]).unwrap_err();
    match err {
        EventError::Listener { event, source } => {
            assert_eq!(event, "x");
            assert_eq!(source.to_string(), "listener exploded");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(log.borrow().is_empty());
}

#[test]
fn test_custom_engine_can_be_swapped_in() {
    #[derive(Default)]
    struct Recording {
        emitted: RefCell<Vec<(String, Vec<Value>)>>,
    }

    impl EventEngine for Recording {
        fn bind(&self, _name: &str, _callback: Callback) {}
        fn unbind(&self, _name: &str, _callback: &Callback) -> usize {
            0
        }
        fn emit(&self, name: &str, args: &[Value]) -> Result<(), EventError> {
            self.emitted
                .borrow_mut()
                .push((name.to_string(), args.to_vec()));
            Ok(())
        }
        fn binding_count(&self, _name: &str) -> usize {
            0
        }
    }

    let engine = Rc::new(Recording::default());
    let bus = EventBus::with_engine(engine.clone());
    bus.emit("x", &[json!(1), json!("two")]).unwrap();

    assert_eq!(
        *engine.emitted.borrow(),
        vec![("x".to_string(), vec![json!(1), json!("two")])]
    );
}

proptest! {
    #[test]
    fn prop_emit_order_matches_bind_order(count in 1usize..12, removed in proptest::collection::vec(any::<bool>(), 12)) {
        let bus = EventBus::new();
        let log: Log = Rc::default();
        let callbacks: Vec<Callback> = (0..count).map(|i| recorder(&log, i.to_string())).collect();

        for cb in &callbacks {
            bus.bind("x", cb);
        }
        for (cb, remove) in callbacks.iter().zip(&removed) {
            if *remove {
                bus.unbind("x", cb);
            }
        }
        bus.emit("x", &[]).unwrap();

        let expected: Vec<String> = (0..count)
            .filter(|i| !removed[*i])
            .map(|i| i.to_string())
            .collect();
        prop_assert_eq!(log.borrow().clone(), expected);
    }
}
