use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use suture_di::{
    injected, Completion, DeferredScheduler, InjectedFn, Injector, InjectedExt, ProviderFn,
    TaskQueue,
};

fn values_as_i32(values: &[suture_di::Injected]) -> Vec<Option<i32>> {
    values.iter().map(|v| v.value_of::<i32>().map(|v| *v)).collect()
}

#[test]
fn test_mixed_registry_resolves_in_input_order() {
    let injector = Injector::new();
    injector.add_mapping("a").unwrap().to_value_of(10i32).unwrap();
    injector
        .add_mapping("b")
        .unwrap()
        .to_provider(ProviderFn::without_deps(|_| injected(20i32)))
        .unwrap();

    let delivered = Arc::new(Mutex::new(Vec::new()));
    let calls = Arc::new(AtomicUsize::new(0));
    let sink = delivered.clone();
    let counted = calls.clone();
    injector.resolve_injections(["a", "b", "missing"], move |values| {
        counted.fetch_add(1, Ordering::SeqCst);
        *sink.lock().unwrap() = values_as_i32(&values);
    });

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(*delivered.lock().unwrap(), vec![Some(10), Some(20), None]);
}

#[test]
fn test_slot_order_is_independent_of_completion_order() {
    let queue = Arc::new(TaskQueue::new());
    let injector = Injector::with_scheduler(queue.clone());

    injector.add_mapping("n1").unwrap().to_value_of(1i32).unwrap();
    let defer_to = queue.clone();
    injector
        .add_mapping("n2")
        .unwrap()
        .to_provider(ProviderFn::new(["callback"], move |args| {
            let done = Completion::from_arg(&args[0]).unwrap();
            defer_to.schedule_deferred(Box::new(move || done.resolve(injected(2i32))));
            None
        }))
        .unwrap();
    injector.add_mapping("n3").unwrap().to_value_of(3i32).unwrap();

    let delivered = Arc::new(Mutex::new(Vec::new()));
    let sink = delivered.clone();
    injector.resolve_injections(["n1", "n2", "n3"], move |values| {
        *sink.lock().unwrap() = values_as_i32(&values);
    });

    // n2 completes last; nothing fires until it does.
    assert!(delivered.lock().unwrap().is_empty());
    queue.run_until_idle();
    assert_eq!(*delivered.lock().unwrap(), vec![Some(1), Some(2), Some(3)]);
}

#[test]
fn test_empty_name_list_fires_immediately() {
    let injector = Injector::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = calls.clone();
    injector.resolve_injections(Vec::<String>::new(), move |values| {
        assert!(values.is_empty());
        counted.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_all_unmatched_names_still_fire_exactly_once() {
    let injector = Injector::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = calls.clone();
    injector.resolve_injections(["ghost1", "ghost2"], move |values| {
        assert!(values.iter().all(|v| v.is_absent()));
        counted.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_force_async_defers_the_fan_in_continuation() {
    let queue = Arc::new(TaskQueue::new());
    let injector = Injector::with_scheduler(queue.clone());
    injector.add_mapping("a").unwrap().to_value_of(10i32).unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let counted = calls.clone();
    injector.resolve_injections_with(
        ["a"],
        move |values| {
            assert_eq!(values_as_i32(&values), vec![Some(10)]);
            counted.fetch_add(1, Ordering::SeqCst);
        },
        true,
    );

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    queue.run_until_idle();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_invoke_injected_resolves_declared_deps() {
    let injector = Injector::new();
    injector.add_mapping("injection1").unwrap().to_value_of(10i32).unwrap();
    injector
        .add_mapping("injection2")
        .unwrap()
        .to_provider(ProviderFn::without_deps(|_| injected(20i32)))
        .unwrap();

    let delivered = Arc::new(Mutex::new(Vec::new()));
    let sink = delivered.clone();
    injector.invoke_injected(InjectedFn::new(
        ["injection2", "injection1", "unmatched"],
        move |args| {
            *sink.lock().unwrap() = values_as_i32(&args);
        },
    ));

    assert_eq!(*delivered.lock().unwrap(), vec![Some(20), Some(10), None]);
}

#[test]
fn test_invoke_injected_after_callback_runs_after_the_body() {
    let injector = Injector::new();
    injector.add_mapping("a").unwrap().to_value_of(1i32).unwrap();

    let order = Arc::new(Mutex::new(Vec::new()));
    let body_order = order.clone();
    let after_order = order.clone();
    injector.invoke_injected_with(
        InjectedFn::new(["a"], move |_| body_order.lock().unwrap().push("body")),
        false,
        Some(Box::new(move || after_order.lock().unwrap().push("after"))),
    );

    assert_eq!(*order.lock().unwrap(), vec!["body", "after"]);
}

#[test]
fn test_chained_providers_resolve_recursively() {
    // injection6 depends on injection5, which depends on injection4; all
    // three complete through deferred completions, with singleton type
    // instances threaded through the chain.
    #[derive(Default)]
    struct Counterpart;

    let queue = Arc::new(TaskQueue::new());
    let injector = Injector::with_scheduler(queue.clone());

    injector.add_mapping("injection1").unwrap().to_value_of(10i32).unwrap();
    injector
        .add_mapping("injection2")
        .unwrap()
        .to_provider(ProviderFn::without_deps(|_| injected(20i32)))
        .unwrap();

    let defer_to = queue.clone();
    injector
        .add_mapping("injection3")
        .unwrap()
        .to_provider(ProviderFn::new(["callback"], move |args| {
            let done = Completion::from_arg(&args[0]).unwrap();
            defer_to.schedule_deferred(Box::new(move || done.resolve(injected(30i32))));
            None
        }))
        .unwrap();

    let defer_to = queue.clone();
    injector
        .add_mapping("injection4")
        .unwrap()
        .to_provider(ProviderFn::new(["callback", "injection9"], move |args| {
            assert!(args[1].value_of::<Counterpart>().is_some());
            let done = Completion::from_arg(&args[0]).unwrap();
            defer_to.schedule_deferred(Box::new(move || done.resolve(injected(40i32))));
            None
        }))
        .unwrap();

    let defer_to = queue.clone();
    injector
        .add_mapping("injection5")
        .unwrap()
        .to_provider(ProviderFn::new(["callback", "injection4"], move |args| {
            let base = *args[1].value_of::<i32>().unwrap();
            let done = Completion::from_arg(&args[0]).unwrap();
            defer_to.schedule_deferred(Box::new(move || done.resolve(injected(base + 10))));
            None
        }))
        .unwrap();

    let defer_to = queue.clone();
    injector
        .add_mapping("injection6")
        .unwrap()
        .to_provider(ProviderFn::new(["callback", "injection5"], move |args| {
            let base = *args[1].value_of::<i32>().unwrap();
            let done = Completion::from_arg(&args[0]).unwrap();
            defer_to.schedule_deferred(Box::new(move || done.resolve(injected(base + 10))));
            None
        }))
        .unwrap()
        .as_singleton()
        .unwrap();

    injector
        .add_mapping("injection7")
        .unwrap()
        .to_provider(ProviderFn::new(["injection9"], |args| {
            assert!(args[0].value_of::<Counterpart>().is_some());
            injected(70i32)
        }))
        .unwrap();

    injector
        .add_mapping("injection9")
        .unwrap()
        .to_type_of::<Counterpart>()
        .unwrap()
        .as_singleton()
        .unwrap();

    let delivered = Arc::new(Mutex::new(Vec::new()));
    let sink = delivered.clone();
    injector.invoke_injected(InjectedFn::new(
        [
            "injection2",
            "injection1",
            "unmatched",
            "injection6",
            "injection3",
            "injection7",
        ],
        move |args| {
            *sink.lock().unwrap() = values_as_i32(&args);
        },
    ));

    queue.run_until_idle();
    assert_eq!(
        *delivered.lock().unwrap(),
        vec![Some(20), Some(10), None, Some(60), Some(30), Some(70)]
    );
}
