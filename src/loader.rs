//! The external-unit loading collaborator.
//!
//! A mapping configured with [`Mapping::to_module`](crate::Mapping::to_module)
//! delegates production to a [`UnitLoader`]: some environments hand the unit
//! back on the caller's stack, others on a later turn. The callback form of
//! [`UnitLoader::load_unit`] serves both.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::value::{Injected, InjectionValue};

/// Completion callback for a unit load.
pub type OnUnitLoaded = Box<dyn FnOnce(LoadedUnit) + Send>;

/// Loads an external code unit or value by path.
///
/// Synchronous loaders invoke `on_loaded` before returning; asynchronous
/// loaders invoke it on a later turn. The resolution engine is correct
/// either way.
pub trait UnitLoader: Send + Sync {
    /// Loads the unit identified by `path` and hands it to `on_loaded`.
    ///
    /// Unknown paths deliver an empty unit; path validity is the loader's
    /// concern, not the container's.
    fn load_unit(&self, path: &str, on_loaded: OnUnitLoaded);
}

/// A loaded external unit: a whole-unit value plus named exports.
///
/// Property extraction for `to_module_prop` reads the exports table; a
/// missing property resolves to the absent sentinel.
#[derive(Clone, Default)]
pub struct LoadedUnit {
    value: Injected,
    exports: HashMap<String, InjectionValue>,
}

impl LoadedUnit {
    /// An empty unit (whole-unit value absent, no exports).
    pub fn new() -> Self {
        Self::default()
    }

    /// A unit whose whole-unit value is `value`.
    pub fn of<T: Send + Sync + 'static>(value: T) -> Self {
        Self {
            value: crate::value::injected(value),
            exports: HashMap::new(),
        }
    }

    /// A unit built from an already-erased slot.
    pub fn from_value(value: Injected) -> Self {
        Self {
            value,
            exports: HashMap::new(),
        }
    }

    /// Adds a named export.
    pub fn with_export<T: Send + Sync + 'static>(mut self, name: impl Into<String>, value: T) -> Self {
        self.exports.insert(name.into(), std::sync::Arc::new(value));
        self
    }

    /// The whole-unit value.
    pub fn value(&self) -> Injected {
        self.value.clone()
    }

    /// A named export, absent when the unit does not provide it.
    pub fn export(&self, name: &str) -> Injected {
        self.exports.get(name).cloned()
    }

    /// Resolves what a module mapping produces: the named export when a
    /// property was configured, the whole-unit value otherwise.
    pub(crate) fn extract(&self, property: Option<&str>) -> Injected {
        match property {
            Some(name) => self.export(name),
            None => self.value(),
        }
    }
}

/// An in-memory path → unit registry implementing [`UnitLoader`].
///
/// The natural collaborator for embeddings and tests: units register up
/// front and load synchronously.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use suture_di::{Injector, InjectedExt, LoadedUnit, UnitRegistry};
///
/// let units = Arc::new(UnitRegistry::new());
/// units.register("util", LoadedUnit::of("whole unit").with_export("format", "formatted"));
///
/// let injector = Injector::new();
/// injector.set_unit_loader(units);
/// injector.add_mapping("fmt").unwrap().to_module_prop("util", "format").unwrap();
///
/// injector.get_mapping("fmt").unwrap().resolve_injection(|value| {
///     assert_eq!(*value.value_of::<&str>().unwrap(), "formatted");
/// });
/// ```
#[derive(Default)]
pub struct UnitRegistry {
    units: Mutex<HashMap<String, LoadedUnit>>,
}

impl UnitRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the unit under `path`.
    pub fn register(&self, path: impl Into<String>, unit: LoadedUnit) {
        self.units.lock().unwrap().insert(path.into(), unit);
    }
}

impl UnitLoader for UnitRegistry {
    fn load_unit(&self, path: &str, on_loaded: OnUnitLoaded) {
        let unit = self.units.lock().unwrap().get(path).cloned().unwrap_or_default();
        on_loaded(unit);
    }
}

/// A unit loader with an async loading step.
#[cfg(feature = "async")]
#[async_trait::async_trait]
pub trait AsyncUnitLoader: Send + Sync {
    /// Loads the unit identified by `path`.
    async fn load_unit(&self, path: &str) -> LoadedUnit;
}

/// Bridges an [`AsyncUnitLoader`] into the callback-form [`UnitLoader`] by
/// spawning each load onto a Tokio runtime.
#[cfg(feature = "async")]
pub struct AsyncLoaderBridge {
    loader: std::sync::Arc<dyn AsyncUnitLoader>,
    handle: tokio::runtime::Handle,
}

#[cfg(feature = "async")]
impl AsyncLoaderBridge {
    /// Bridges `loader` through the ambient runtime.
    pub fn new(loader: std::sync::Arc<dyn AsyncUnitLoader>) -> Self {
        Self {
            loader,
            handle: tokio::runtime::Handle::current(),
        }
    }

    /// Bridges `loader` through an explicit runtime handle.
    pub fn with_handle(loader: std::sync::Arc<dyn AsyncUnitLoader>, handle: tokio::runtime::Handle) -> Self {
        Self { loader, handle }
    }
}

#[cfg(feature = "async")]
impl UnitLoader for AsyncLoaderBridge {
    fn load_unit(&self, path: &str, on_loaded: OnUnitLoaded) {
        let loader = self.loader.clone();
        let path = path.to_string();
        self.handle.spawn(async move {
            let unit = loader.load_unit(&path).await;
            on_loaded(unit);
        });
    }
}
