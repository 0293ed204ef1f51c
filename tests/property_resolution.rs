/// Property-based tests for resolution behavior
///
/// These verify the ordering and caching guarantees hold regardless of the
/// specific registry shape or request interleaving.

use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use suture_di::{injected, Injector, InjectedExt, ProviderFn};

proptest! {
    #[test]
    fn slot_order_always_matches_input_order(
        registered in prop::collection::vec(any::<bool>(), 1..12),
    ) {
        let injector = Injector::new();
        let mut names = Vec::new();
        for (index, register) in registered.iter().enumerate() {
            let name = format!("dep{}", index);
            if *register {
                injector.add_mapping(&name).unwrap().to_value_of(index as i64).unwrap();
            }
            names.push(name);
        }

        let delivered = Arc::new(Mutex::new(None));
        let sink = delivered.clone();
        injector.resolve_injections(names, move |values| {
            *sink.lock().unwrap() = Some(
                values.iter().map(|v| v.value_of::<i64>().map(|v| *v)).collect::<Vec<_>>(),
            );
        });

        let expected: Vec<Option<i64>> = registered
            .iter()
            .enumerate()
            .map(|(index, register)| register.then_some(index as i64))
            .collect();
        prop_assert_eq!(delivered.lock().unwrap().clone(), Some(expected));
    }
}

proptest! {
    #[test]
    fn singleton_provider_runs_once_for_any_request_count(requests in 1usize..20) {
        let injector = Injector::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = calls.clone();
        let mapping = injector.add_mapping("single").unwrap();
        mapping
            .to_provider(ProviderFn::without_deps(move |_| {
                counted.fetch_add(1, Ordering::SeqCst);
                injected(7i32)
            }))
            .unwrap()
            .as_singleton()
            .unwrap();

        let delivered = Arc::new(AtomicUsize::new(0));
        for _ in 0..requests {
            let sink = delivered.clone();
            mapping.resolve_injection(move |value| {
                assert_eq!(*value.value_of::<i32>().unwrap(), 7);
                sink.fetch_add(1, Ordering::SeqCst);
            });
        }

        prop_assert_eq!(calls.load(Ordering::SeqCst), 1);
        prop_assert_eq!(delivered.load(Ordering::SeqCst), requests);
    }
}

proptest! {
    #[test]
    fn transient_provider_runs_once_per_request(requests in 1usize..20) {
        let injector = Injector::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = calls.clone();
        let mapping = injector.add_mapping("fresh").unwrap();
        mapping
            .to_provider(ProviderFn::without_deps(move |_| {
                injected(counted.fetch_add(1, Ordering::SeqCst))
            }))
            .unwrap();

        for expected in 0..requests {
            mapping.resolve_injection(move |value| {
                assert_eq!(*value.value_of::<usize>().unwrap(), expected);
            });
        }
        prop_assert_eq!(calls.load(Ordering::SeqCst), requests);
    }
}

proptest! {
    #[test]
    fn value_mappings_deliver_exactly_what_was_bound(text in "\\PC{0,40}") {
        let injector = Injector::new();
        injector.add_mapping("text").unwrap().to_value_of(text.clone()).unwrap();

        let delivered = Arc::new(Mutex::new(None));
        let sink = delivered.clone();
        injector.get_mapping("text").unwrap().resolve_injection(move |value| {
            *sink.lock().unwrap() = Some((*value.value_of::<String>().unwrap()).clone());
        });
        prop_assert_eq!(delivered.lock().unwrap().clone(), Some(text));
    }
}
