//! Injection mappings: one name's production strategy and its resolution
//! state machine.
//!
//! A [`Mapping`] is a handle created through
//! [`Injector::add_mapping`](crate::Injector::add_mapping). The shared state
//! behind it is owned by the injector's registry; handles are cheap clones.
//!
//! Resolution priority: cached singleton value, fixed value, constructed
//! type, provider/module production, then the absent sentinel when no
//! strategy is configured. Singleton provider/module mappings run an
//! Idle → InFlight → Idle state machine: requests arriving while a
//! production is outstanding are queued and flushed, in order, the moment
//! the produced value lands.

use std::sync::{Arc, Mutex};

use uuid::Uuid;

use crate::error::{InjectError, InjectResult};
use crate::function::{Completion, Continuation, ProviderFn};
use crate::injector::{dispatch_continuation, fan_out, InjectorCore, Slot};
use crate::value::{Injected, InjectionValue, TypeCtor};

#[cfg(feature = "smallvec")]
type PendingVec = smallvec::SmallVec<[PendingResolution; 4]>;
#[cfg(not(feature = "smallvec"))]
type PendingVec = Vec<PendingResolution>;

/// Opaque token returned by [`Mapping::seal`].
///
/// Unsealing requires presenting the exact key; keys are random identifiers
/// compared by value and cannot be forged from the mapping alone.
#[derive(Debug)]
pub struct SealKey(Uuid);

/// One name's production strategy. Exactly one is active; configuring a new
/// strategy replaces the previous one.
pub(crate) enum Strategy {
    Unset,
    Value(Injected),
    Provider(ProviderFn),
    Type(TypeCtor),
    Module {
        path: String,
        property: Option<String>,
    },
}

impl Strategy {
    fn kind_name(&self) -> &'static str {
        match self {
            Strategy::Unset => "unset",
            Strategy::Value(_) => "value",
            Strategy::Provider(_) => "provider",
            Strategy::Type(_) => "type",
            Strategy::Module { .. } => "module",
        }
    }
}

pub(crate) struct PendingResolution {
    continuation: Continuation,
    force_async: bool,
}

pub(crate) struct MappingState {
    strategy: Strategy,
    singleton: bool,
    cached: Option<Injected>,
    seal: Option<Uuid>,
    in_flight: bool,
    pending: PendingVec,
}

/// Shared state behind a [`Mapping`] handle, owned by the injector registry.
pub(crate) struct MappingShared {
    pub(crate) name: Arc<str>,
    state: Mutex<MappingState>,
}

impl MappingShared {
    pub(crate) fn new(name: Arc<str>) -> Self {
        Self {
            name,
            state: Mutex::new(MappingState {
                strategy: Strategy::Unset,
                singleton: false,
                cached: None,
                seal: None,
                in_flight: false,
                pending: PendingVec::default(),
            }),
        }
    }

    pub(crate) fn is_sealed(&self) -> bool {
        self.state.lock().unwrap().seal.is_some()
    }

    #[cfg(feature = "diagnostics")]
    pub(crate) fn describe(&self) -> String {
        let state = self.state.lock().unwrap();
        format!(
            "{}: {}{}{}",
            self.name,
            state.strategy.kind_name(),
            if state.singleton { " (singleton)" } else { "" },
            if state.seal.is_some() { " (sealed)" } else { "" },
        )
    }
}

/// A named injection mapping.
///
/// Configuration calls are builder-style and chain through
/// `InjectResult<&Self>`; every mutator fails with
/// [`InjectError::SealedMapping`] once the mapping is sealed.
///
/// # Examples
///
/// ```rust
/// use suture_di::{injected, Injector, InjectedExt, ProviderFn};
///
/// let injector = Injector::new();
/// injector.add_mapping("base").unwrap().to_value_of(30i32).unwrap();
///
/// let mapping = injector.add_mapping("answer").unwrap();
/// mapping
///     .to_provider(ProviderFn::new(["base"], |args| {
///         let base = *args[0].value_of::<i32>().unwrap();
///         injected(base + 12)
///     }))
///     .unwrap()
///     .as_singleton()
///     .unwrap();
///
/// mapping.resolve_injection(|value| {
///     assert_eq!(*value.value_of::<i32>().unwrap(), 42);
/// });
/// ```
pub struct Mapping {
    pub(crate) shared: Arc<MappingShared>,
    pub(crate) core: Arc<InjectorCore>,
}

impl Clone for Mapping {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            core: self.core.clone(),
        }
    }
}

impl std::fmt::Debug for Mapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.state.lock().unwrap();
        f.debug_struct("Mapping")
            .field("name", &self.shared.name)
            .field("strategy", &state.strategy.kind_name())
            .field("singleton", &state.singleton)
            .field("sealed", &state.seal.is_some())
            .finish()
    }
}

impl Mapping {
    /// The mapping's injection name.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    fn configure(&self, apply: impl FnOnce(&mut MappingState)) -> InjectResult<&Self> {
        let mut state = self.shared.state.lock().unwrap();
        if state.seal.is_some() {
            return Err(InjectError::SealedMapping(self.shared.name.to_string()));
        }
        apply(&mut state);
        Ok(self)
    }

    /// Fixed-value strategy: resolve to `value` immediately, no recursion.
    pub fn to_value(&self, value: Injected) -> InjectResult<&Self> {
        self.configure(|state| state.strategy = Strategy::Value(value))
    }

    /// Fixed-value strategy from a concrete value.
    pub fn to_value_of<T: Send + Sync + 'static>(&self, value: T) -> InjectResult<&Self> {
        self.to_value(crate::value::injected(value))
    }

    /// Provider strategy: the provider's declared deps resolve recursively
    /// before its body runs. See [`ProviderFn`] for the async form.
    pub fn to_provider(&self, provider: ProviderFn) -> InjectResult<&Self> {
        self.configure(|state| state.strategy = Strategy::Provider(provider))
    }

    /// Type strategy from a type-erased constructor value.
    ///
    /// Fails with [`InjectError::NotConstructible`] when `ctor` is not a
    /// [`TypeCtor`]. Useful when constructors arrive through loaded units;
    /// statically known types read better with [`to_type_of`](Self::to_type_of).
    pub fn to_type(&self, ctor: InjectionValue) -> InjectResult<&Self> {
        let ctor = ctor
            .downcast::<TypeCtor>()
            .map_err(|_| InjectError::NotConstructible(self.shared.name.to_string()))?;
        self.to_type_ctor((*ctor).clone())
    }

    /// Type strategy: construct a fresh instance per resolution.
    pub fn to_type_ctor(&self, ctor: TypeCtor) -> InjectResult<&Self> {
        self.configure(|state| state.strategy = Strategy::Type(ctor))
    }

    /// Type strategy for a `Default`-constructible type.
    pub fn to_type_of<T: Default + Send + Sync + 'static>(&self) -> InjectResult<&Self> {
        self.to_type_ctor(TypeCtor::of::<T>())
    }

    /// Module strategy: resolve to the unit loaded from `path`.
    pub fn to_module(&self, path: impl Into<String>) -> InjectResult<&Self> {
        self.set_module(path.into(), None)
    }

    /// Module strategy extracting one named export from the loaded unit.
    pub fn to_module_prop(
        &self,
        path: impl Into<String>,
        property: impl Into<String>,
    ) -> InjectResult<&Self> {
        self.set_module(path.into(), Some(property.into()))
    }

    fn set_module(&self, path: String, property: Option<String>) -> InjectResult<&Self> {
        let mut state = self.shared.state.lock().unwrap();
        if state.seal.is_some() {
            return Err(InjectError::SealedMapping(self.shared.name.to_string()));
        }
        if self.core.unit_loader().is_none() {
            return Err(InjectError::ModuleLoadUnsupported(path));
        }
        state.strategy = Strategy::Module { path, property };
        Ok(self)
    }

    /// Caches the first successfully produced value for all future
    /// resolutions. A no-op in effect for fixed values.
    pub fn as_singleton(&self) -> InjectResult<&Self> {
        self.configure(|state| state.singleton = true)
    }

    /// Seals the mapping: all mutators fail until [`unseal`](Self::unseal)
    /// is presented the returned key.
    pub fn seal(&self) -> InjectResult<SealKey> {
        let mut state = self.shared.state.lock().unwrap();
        if state.seal.is_some() {
            return Err(InjectError::SealedMapping(self.shared.name.to_string()));
        }
        let key = Uuid::new_v4();
        state.seal = Some(key);
        Ok(SealKey(key))
    }

    /// Unseals the mapping with the key issued by [`seal`](Self::seal).
    pub fn unseal(&self, key: &SealKey) -> InjectResult<&Self> {
        let mut state = self.shared.state.lock().unwrap();
        match state.seal {
            None => Err(InjectError::NotSealed(self.shared.name.to_string())),
            Some(seal) if seal == key.0 => {
                state.seal = None;
                Ok(self)
            }
            Some(_) => Err(InjectError::InvalidSealKey(self.shared.name.to_string())),
        }
    }

    /// True when the mapping is currently sealed.
    pub fn is_sealed(&self) -> bool {
        self.shared.is_sealed()
    }

    /// Resolves this mapping, delivering the produced value to `on_resolved`.
    ///
    /// Value, type, and cached-singleton strategies deliver before this call
    /// returns; provider and module strategies deliver whenever production
    /// completes, possibly on the same stack.
    pub fn resolve_injection<F>(&self, on_resolved: F)
    where
        F: FnOnce(Injected) + Send + 'static,
    {
        resolve_prepared(&self.shared, &self.core, Continuation::simple(on_resolved), false);
    }

    /// Like [`resolve_injection`](Self::resolve_injection), but the delivery
    /// is always deferred to a later scheduler turn.
    pub fn resolve_injection_deferred<F>(&self, on_resolved: F)
    where
        F: FnOnce(Injected) + Send + 'static,
    {
        resolve_prepared(&self.shared, &self.core, Continuation::simple(on_resolved), true);
    }

    /// Resolves this mapping with a full [`Continuation`].
    ///
    /// Fails with [`InjectError::InvalidCallbackSignature`] when a
    /// continuation declaring two or more deps omits the reserved
    /// [`VALUE_PARAM`](crate::VALUE_PARAM) slot. The check happens before
    /// any production starts, so the error always reaches this caller
    /// synchronously.
    pub fn resolve_injection_with(
        &self,
        continuation: Continuation,
        force_async: bool,
    ) -> InjectResult<()> {
        continuation.validate()?;
        resolve_prepared(&self.shared, &self.core, continuation, force_async);
        Ok(())
    }
}

// ----- Resolution engine -----

enum ProductionStrategy {
    Provider(ProviderFn),
    Module {
        path: String,
        property: Option<String>,
    },
}

/// Where a produced value goes once the strategy completes.
pub(crate) enum ProductionSink {
    /// Per-call production: deliver straight to the requesting continuation.
    Direct {
        continuation: Continuation,
        force_async: bool,
    },
    /// Singleton production: cache, leave InFlight, flush the queue.
    Singleton(Arc<MappingShared>),
}

enum Action {
    Deliver(Injected, Continuation),
    Construct {
        ctor: TypeCtor,
        singleton: bool,
        continuation: Continuation,
    },
    Produce {
        strategy: ProductionStrategy,
        sink: ProductionSink,
    },
    Queued,
}

/// Core resolution: continuation already validated.
///
/// The state lock is released before any user code (constructors, provider
/// bodies, continuations) runs, so re-entrant resolution from inside a
/// provider never deadlocks.
pub(crate) fn resolve_prepared(
    shared: &Arc<MappingShared>,
    core: &Arc<InjectorCore>,
    continuation: Continuation,
    force_async: bool,
) {
    core.observers.resolving(&shared.name);

    let action = {
        let mut state = shared.state.lock().unwrap();
        if let Some(cached) = state.cached.clone() {
            Action::Deliver(cached, continuation)
        } else {
            match &state.strategy {
                Strategy::Unset => Action::Deliver(None, continuation),
                Strategy::Value(value) => Action::Deliver(value.clone(), continuation),
                Strategy::Type(ctor) => Action::Construct {
                    ctor: ctor.clone(),
                    singleton: state.singleton,
                    continuation,
                },
                Strategy::Provider(provider) => {
                    let strategy = ProductionStrategy::Provider(provider.clone());
                    prepare_production(&mut state, shared, strategy, continuation, force_async)
                }
                Strategy::Module { path, property } => {
                    let strategy = ProductionStrategy::Module {
                        path: path.clone(),
                        property: property.clone(),
                    };
                    prepare_production(&mut state, shared, strategy, continuation, force_async)
                }
            }
        }
    };

    match action {
        Action::Deliver(value, continuation) => {
            dispatch_continuation(core, continuation, value, force_async);
        }
        Action::Construct {
            ctor,
            singleton,
            continuation,
        } => {
            let value = if singleton {
                // Construct outside the lock; first publication wins.
                let instance = Some(ctor.construct());
                let mut state = shared.state.lock().unwrap();
                state.cached.get_or_insert_with(|| instance).clone()
            } else {
                Some(ctor.construct())
            };
            dispatch_continuation(core, continuation, value, force_async);
        }
        Action::Produce { strategy, sink } => match strategy {
            ProductionStrategy::Provider(provider) => {
                run_provider(shared.name.clone(), core, provider, sink);
            }
            ProductionStrategy::Module { path, property } => {
                run_module(core, path, property, sink);
            }
        },
        Action::Queued => {}
    }
}

/// Decides how a provider/module production request proceeds: queue behind an
/// in-flight singleton production, start one, or run per-call.
fn prepare_production(
    state: &mut MappingState,
    shared: &Arc<MappingShared>,
    strategy: ProductionStrategy,
    continuation: Continuation,
    force_async: bool,
) -> Action {
    if !state.singleton {
        return Action::Produce {
            strategy,
            sink: ProductionSink::Direct {
                continuation,
                force_async,
            },
        };
    }
    // The requesting continuation joins the queue either way; the completed
    // production flushes the whole queue at once.
    state.pending.push(PendingResolution {
        continuation,
        force_async,
    });
    if state.in_flight {
        Action::Queued
    } else {
        state.in_flight = true;
        Action::Produce {
            strategy,
            sink: ProductionSink::Singleton(shared.clone()),
        }
    }
}

/// Delivers a produced value to its sink. For singleton productions this is
/// the InFlight → Idle transition: cache, then flush the queued requests.
pub(crate) fn finish_production(core: &Arc<InjectorCore>, sink: ProductionSink, value: Injected) {
    match sink {
        ProductionSink::Direct {
            continuation,
            force_async,
        } => {
            dispatch_continuation(core, continuation, value, force_async);
        }
        ProductionSink::Singleton(shared) => {
            let pending = {
                let mut state = shared.state.lock().unwrap();
                state.cached = Some(value.clone());
                state.in_flight = false;
                std::mem::take(&mut state.pending)
            };
            for request in pending {
                dispatch_continuation(core, request.continuation, value.clone(), request.force_async);
            }
        }
    }
}

fn run_provider(
    name: Arc<str>,
    core: &Arc<InjectorCore>,
    provider: ProviderFn,
    sink: ProductionSink,
) {
    let mut slots: Vec<Slot> = provider
        .deps()
        .iter()
        .map(|dep| Slot::Named(dep.clone()))
        .collect();

    match provider.completion_slot() {
        Some(index) => {
            // Asynchronous provider: the reserved slot carries the one-shot
            // completion handle and the body's return value is ignored.
            let completion_core = core.clone();
            let completion = Completion::new(Box::new(move |value| {
                finish_production(&completion_core, sink, value);
            }));
            slots[index] = Slot::Preset(Some(completion.as_value()));

            let body = provider.body();
            let observers_core = core.clone();
            fan_out(
                core,
                slots,
                Box::new(move |args| {
                    observers_core.observers.provider_invoked(&name);
                    let _ = body(args);
                }),
                false,
            );
        }
        None => {
            let body = provider.body();
            let finish_core = core.clone();
            fan_out(
                core,
                slots,
                Box::new(move |args| {
                    finish_core.observers.provider_invoked(&name);
                    let value = body(args);
                    finish_production(&finish_core, sink, value);
                }),
                false,
            );
        }
    }
}

fn run_module(
    core: &Arc<InjectorCore>,
    path: String,
    property: Option<String>,
    sink: ProductionSink,
) {
    match core.unit_loader() {
        // The loader is checked when the strategy is configured; a missing
        // loader here resolves to the absent sentinel rather than stalling
        // the queued requests.
        None => finish_production(core, sink, None),
        Some(loader) => {
            let finish_core = core.clone();
            loader.load_unit(
                &path,
                Box::new(move |unit| {
                    finish_production(&finish_core, sink, unit.extract(property.as_deref()));
                }),
            );
        }
    }
}
