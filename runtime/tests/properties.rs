//! Property tests: random registration and dispatch sequences against a
//! plain model of what the dispatcher should hold.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use flux_core::{Action, Store};
use flux_runtime::Dispatcher;
use flux_testing::NotificationRecorder;
use indexmap::IndexMap;
use proptest::prelude::*;
use std::rc::Rc;

const KEYS: [&str; 4] = ["alpha", "beta", "gamma", "delta"];

#[derive(Debug, Clone)]
enum Op {
    Register(usize),
    Increment(usize),
    Unrelated,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..KEYS.len()).prop_map(Op::Register),
        (0..KEYS.len()).prop_map(Op::Increment),
        Just(Op::Unrelated),
    ]
}

fn counter(key: &str) -> Store {
    let own = format!("INCREMENT_{key}");
    Store::from_fn(move |state: Option<Rc<u32>>, action: &Action| {
        let state = state.unwrap_or_else(|| Rc::new(0));
        if action.action_type() == own {
            Some(Rc::new(*state + 1))
        } else {
            Some(state)
        }
    })
}

#[derive(Default)]
struct Model {
    counts: IndexMap<&'static str, u32>,
    recorders: IndexMap<&'static str, NotificationRecorder>,
}

proptest! {
    #[test]
    fn state_tracks_registry_and_notifies_only_on_change(
        ops in prop::collection::vec(op(), 1..40)
    ) {
        let dispatcher = Dispatcher::new();
        let mut model = Model::default();

        for op in ops {
            match op {
                Op::Register(index) => {
                    let key = KEYS[index];
                    let store = counter(key);
                    dispatcher.receive_stores([(key, store.clone())]).unwrap();
                    model.counts.entry(key).or_insert(0);
                    if !model.recorders.contains_key(key) {
                        let recorder = NotificationRecorder::new();
                        dispatcher.observe_stores(&[store], recorder.observer()).unwrap();
                        model.recorders.insert(key, recorder);
                    }
                }
                Op::Increment(index) => {
                    let key = KEYS[index];
                    dispatcher.dispatch(Action::new(format!("INCREMENT_{key}"))).unwrap();
                    if let Some(count) = model.counts.get_mut(key) {
                        *count += 1;
                    }
                }
                Op::Unrelated => {
                    let before = dispatcher.state();
                    dispatcher.dispatch(Action::new("UNRELATED")).unwrap();
                    prop_assert!(dispatcher.state().ptr_eq(&before));
                }
            }

            let state = dispatcher.state();
            prop_assert_eq!(
                state.keys().collect::<Vec<_>>(),
                model.counts.keys().copied().collect::<Vec<_>>()
            );
            for (key, count) in &model.counts {
                let value = state.get::<u32>(key);
                prop_assert_eq!(value.as_deref(), Some(count));
            }
        }

        // One initial call, then one per increment of that key
        for (key, recorder) in &model.recorders {
            let increments = usize::try_from(model.counts[*key]).unwrap();
            prop_assert_eq!(recorder.count(), increments + 1);
        }
    }
}
