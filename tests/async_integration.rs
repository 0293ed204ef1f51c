#![cfg(feature = "async")]

use std::sync::Arc;
use std::time::Duration;

use suture_di::{
    AsyncLoaderBridge, AsyncUnitLoader, Injector, InjectedExt, LoadedUnit, TokioScheduler,
};

#[tokio::test]
async fn test_tokio_scheduler_defers_to_a_later_turn() {
    let injector = Injector::with_scheduler(Arc::new(TokioScheduler::new()));
    injector.add_mapping("n").unwrap().to_value_of(5u32).unwrap();

    let (tx, rx) = tokio::sync::oneshot::channel();
    injector
        .get_mapping("n")
        .unwrap()
        .resolve_injection_deferred(move |value| {
            let _ = tx.send(*value.value_of::<u32>().unwrap());
        });

    assert_eq!(rx.await.unwrap(), 5);
}

struct SlowLoader;

#[async_trait::async_trait]
impl AsyncUnitLoader for SlowLoader {
    async fn load_unit(&self, path: &str) -> LoadedUnit {
        tokio::time::sleep(Duration::from_millis(5)).await;
        LoadedUnit::of(format!("unit:{}", path))
    }
}

#[tokio::test]
async fn test_async_unit_loader_bridges_into_module_mappings() {
    let injector = Injector::with_scheduler(Arc::new(TokioScheduler::new()));
    injector.set_unit_loader(Arc::new(AsyncLoaderBridge::new(Arc::new(SlowLoader))));
    let mapping = injector.add_mapping("util").unwrap();
    mapping.to_module("util").unwrap();

    let (tx, rx) = tokio::sync::oneshot::channel();
    mapping.resolve_injection(move |value| {
        let _ = tx.send((*value.value_of::<String>().unwrap()).clone());
    });

    assert_eq!(rx.await.unwrap(), "unit:util");
}

#[tokio::test]
async fn test_singleton_module_caches_across_async_loads() {
    let injector = Injector::with_scheduler(Arc::new(TokioScheduler::new()));
    injector.set_unit_loader(Arc::new(AsyncLoaderBridge::new(Arc::new(SlowLoader))));
    let mapping = injector.add_mapping("util").unwrap();
    mapping.to_module("util").unwrap().as_singleton().unwrap();

    let (tx1, rx1) = tokio::sync::oneshot::channel();
    let (tx2, rx2) = tokio::sync::oneshot::channel();
    mapping.resolve_injection(move |value| {
        let _ = tx1.send((*value.value_of::<String>().unwrap()).clone());
    });
    mapping.resolve_injection(move |value| {
        let _ = tx2.send((*value.value_of::<String>().unwrap()).clone());
    });

    assert_eq!(rx1.await.unwrap(), "unit:util");
    assert_eq!(rx2.await.unwrap(), "unit:util");
}
