use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use scene_anchor::{
    Anchor, AnchorError, AnchorId, AnchorRecord, BindingRegistry, ExternalBindings,
    LifecycleState, OpTable, ScriptRuntime, Value, ANCHOR_MODULE,
};

// ---------------------------------------------------------------------------
// A small "external runtime": per-anchor integer state, serialized as text
// ---------------------------------------------------------------------------

type SideTable = Arc<Mutex<HashMap<AnchorId, i64>>>;

fn counter_module(table: &SideTable) -> OpTable {
    let serialize_table = Arc::clone(table);
    let deserialize_table = Arc::clone(table);
    let destroy_table = Arc::clone(table);
    OpTable::new()
        .with_op("serialize", move |anchor: &mut Anchor| {
            match serialize_table.lock().get(&anchor.id()) {
                Some(value) => Ok(Value::Text(value.to_string())),
                None => Ok(Value::Text("nil".to_string())),
            }
        })
        .with_op("deserialize", move |anchor: &mut Anchor| {
            if anchor.payload != "nil" {
                let value = anchor.payload.parse::<i64>().map_err(|e| {
                    scene_anchor::ExternalOperationError::new(format!(
                        "bad counter payload '{}': {e}",
                        anchor.payload
                    ))
                })?;
                deserialize_table.lock().insert(anchor.id(), value);
            }
            Ok(Value::Nil)
        })
        .with_op("destroy", move |anchor: &mut Anchor| {
            destroy_table.lock().remove(&anchor.id());
            Ok(Value::Nil)
        })
}

fn counter_bindings(table: &SideTable) -> Arc<BindingRegistry> {
    let runtime = ScriptRuntime::new();
    runtime.register_module(ANCHOR_MODULE, Arc::new(counter_module(table)));
    Arc::new(BindingRegistry::new(Arc::new(runtime)))
}

// ---------------------------------------------------------------------------
// Full save → load → destroy cycle
// ---------------------------------------------------------------------------

#[test]
fn save_load_destroy_cycle() {
    let table: SideTable = Arc::default();
    let bindings = counter_bindings(&table);

    // Live object with attached external state.
    let mut original = Anchor::new(Arc::clone(&bindings) as Arc<dyn ExternalBindings>);
    table.lock().insert(original.id(), 41);

    // Host saves the scene.
    original.on_before_serialize().unwrap();
    assert_eq!(original.payload, "41");
    let record = AnchorRecord::capture(&original);

    // Host loads the scene into a fresh object; the anchor is recreated and
    // its payload populated before the deserialize event fires.
    let mut loaded = Anchor::new(Arc::clone(&bindings) as Arc<dyn ExternalBindings>);
    assert_eq!(loaded.payload, "nil");
    record.apply(&mut loaded);
    loaded.on_after_deserialize().unwrap();
    assert_eq!(table.lock().get(&loaded.id()), Some(&41));

    // The reconstructed state evolves and survives another save.
    table.lock().insert(loaded.id(), 42);
    loaded.on_before_serialize().unwrap();
    assert_eq!(loaded.payload, "42");

    // Teardown removes all side-state.
    original.on_destroy().unwrap();
    loaded.on_destroy().unwrap();
    assert!(table.lock().is_empty());
    assert_eq!(original.state(), LifecycleState::Gone);
    assert_eq!(loaded.state(), LifecycleState::Gone);
}

#[test]
fn anchor_without_external_state_serializes_nil() {
    let table: SideTable = Arc::default();
    let mut anchor = Anchor::new(counter_bindings(&table) as Arc<dyn ExternalBindings>);

    anchor.on_before_serialize().unwrap();
    assert_eq!(anchor.payload, "nil");
}

// ---------------------------------------------------------------------------
// Deferred module registration
// ---------------------------------------------------------------------------

#[test]
fn lifecycle_event_before_module_registration_fails_then_recovers() {
    let table: SideTable = Arc::default();
    let runtime = Arc::new(ScriptRuntime::new());
    let bindings = Arc::new(BindingRegistry::new(
        Arc::clone(&runtime) as Arc<dyn scene_anchor::ModuleRuntime>
    ));

    let mut anchor = Anchor::new(Arc::clone(&bindings) as Arc<dyn ExternalBindings>);
    table.lock().insert(anchor.id(), 7);

    // The script module is not loadable yet: the event fails, the payload is
    // untouched, and nothing is poisoned.
    let err = anchor.on_before_serialize().unwrap_err();
    assert!(matches!(err, AnchorError::Binding(_)));
    assert_eq!(anchor.payload, "nil");
    assert_eq!(anchor.state(), LifecycleState::Attached);

    // Host's scripting bootstrap finishes; the same event now succeeds.
    runtime.register_module(ANCHOR_MODULE, Arc::new(counter_module(&table)));
    anchor.on_before_serialize().unwrap();
    assert_eq!(anchor.payload, "7");

    anchor.on_destroy().unwrap();
}

// ---------------------------------------------------------------------------
// Interleaved anchors share one resolution
// ---------------------------------------------------------------------------

#[test]
fn many_anchors_share_one_registry() {
    let table: SideTable = Arc::default();
    let bindings = counter_bindings(&table);

    let mut anchors: Vec<Anchor> = (0..16)
        .map(|_| Anchor::new(Arc::clone(&bindings) as Arc<dyn ExternalBindings>))
        .collect();
    for (i, anchor) in anchors.iter().enumerate() {
        table.lock().insert(anchor.id(), i as i64);
    }

    // Interleave serialize and deserialize events across instances.
    for anchor in anchors.iter_mut() {
        anchor.on_before_serialize().unwrap();
    }
    for (i, anchor) in anchors.iter_mut().enumerate() {
        assert_eq!(anchor.payload, i.to_string());
        anchor.on_after_deserialize().unwrap();
    }
    for anchor in anchors.iter_mut() {
        anchor.on_destroy().unwrap();
    }
    assert!(table.lock().is_empty());
}

#[test]
fn concurrent_first_events_resolve_bindings_once() {
    let table: SideTable = Arc::default();
    let bindings = counter_bindings(&table);
    assert!(!bindings.is_ready());

    std::thread::scope(|scope| {
        for _ in 0..8 {
            let bindings = Arc::clone(&bindings);
            let table = Arc::clone(&table);
            scope.spawn(move || {
                let mut anchor = Anchor::new(bindings as Arc<dyn ExternalBindings>);
                table.lock().insert(anchor.id(), 1);
                anchor.on_before_serialize().unwrap();
                assert_eq!(anchor.payload, "1");
                anchor.on_destroy().unwrap();
            });
        }
    });
    assert!(bindings.is_ready());
    assert!(table.lock().is_empty());
}
