//! The injector: mapping registry plus the fan-out/fan-in resolution
//! coordinator.
//!
//! `resolve_injections` is the multi-dependency core: every name resolves
//! through its mapping (or fills its slot with the absent sentinel when no
//! mapping exists), slots fill at their original index regardless of
//! completion order, and the continuation fires exactly once when the last
//! slot lands. The operation introduces no scheduling of its own — timing is
//! entirely governed by the mappings involved.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{InjectError, InjectResult};
use crate::function::{Continuation, ContinuationKind, InjectedFn};
use crate::injectable::Injectable;
use crate::loader::UnitLoader;
use crate::mapping::{resolve_prepared, Mapping, MappingShared};
use crate::observer::{InjectObserver, Observers};
use crate::registry::Registry;
use crate::reserved::{is_reserved_name, VALUE_PARAM};
use crate::scheduler::{DeferredScheduler, TaskQueue};
use crate::template;
use crate::value::Injected;

/// Default name of the method invoked on an instance after field injection.
pub const DEFAULT_POST_INJECTION_HOOK: &str = "post_injections";

pub(crate) struct InjectorCore {
    registry: Mutex<Registry>,
    hook_name: Mutex<String>,
    pub(crate) scheduler: Arc<dyn DeferredScheduler>,
    unit_loader: Mutex<Option<Arc<dyn UnitLoader>>>,
    pub(crate) observers: Observers,
}

impl InjectorCore {
    pub(crate) fn lookup(&self, name: &str) -> Option<Arc<MappingShared>> {
        self.registry.lock().unwrap().get(name).cloned()
    }

    pub(crate) fn unit_loader(&self) -> Option<Arc<dyn UnitLoader>> {
        self.unit_loader.lock().unwrap().clone()
    }
}

/// Name-keyed injection container.
///
/// Owns the name → mapping registry, and coordinates multi-dependency
/// resolution: given an ordered list of names it resolves all of them (each
/// through its mapping, recursively) and invokes a continuation once with
/// the resolved values in matching order.
///
/// The injector clones cheaply (`Arc` internally); clones share the same
/// registry.
///
/// # Examples
///
/// ```rust
/// use suture_di::{injected, Injector, InjectedExt, ProviderFn};
///
/// let injector = Injector::new();
/// injector.add_mapping("a").unwrap().to_value_of(10i32).unwrap();
/// injector
///     .add_mapping("b")
///     .unwrap()
///     .to_provider(ProviderFn::without_deps(|_| injected(20i32)))
///     .unwrap();
///
/// injector.resolve_injections(["a", "b", "missing"], |values| {
///     assert_eq!(*values[0].value_of::<i32>().unwrap(), 10);
///     assert_eq!(*values[1].value_of::<i32>().unwrap(), 20);
///     assert!(values[2].is_absent());
/// });
/// ```
pub struct Injector {
    core: Arc<InjectorCore>,
}

impl Clone for Injector {
    fn clone(&self) -> Self {
        Self {
            core: self.core.clone(),
        }
    }
}

impl Default for Injector {
    fn default() -> Self {
        Self::new()
    }
}

impl Injector {
    /// An injector deferring through its own [`TaskQueue`].
    ///
    /// Purely synchronous resolution needs no pumping; anything deferred
    /// waits until the embedding code drains the queue. Pass the queue in
    /// explicitly when you need to pump it:
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use suture_di::{Injector, TaskQueue};
    ///
    /// let queue = Arc::new(TaskQueue::new());
    /// let injector = Injector::with_scheduler(queue.clone());
    /// // ... request deferred resolutions ...
    /// queue.run_until_idle();
    /// ```
    pub fn new() -> Self {
        Self::with_scheduler(Arc::new(TaskQueue::new()))
    }

    /// An injector deferring through the given scheduler.
    pub fn with_scheduler(scheduler: Arc<dyn DeferredScheduler>) -> Self {
        Self {
            core: Arc::new(InjectorCore {
                registry: Mutex::new(Registry::new()),
                hook_name: Mutex::new(DEFAULT_POST_INJECTION_HOOK.to_string()),
                scheduler,
                unit_loader: Mutex::new(None),
                observers: Observers::new(),
            }),
        }
    }

    /// Installs the external-unit loading collaborator, enabling
    /// [`Mapping::to_module`].
    pub fn set_unit_loader(&self, loader: Arc<dyn UnitLoader>) {
        *self.core.unit_loader.lock().unwrap() = Some(loader);
    }

    /// Registers a diagnostic observer.
    pub fn add_observer(&self, observer: Arc<dyn InjectObserver>) {
        self.core.observers.add(observer);
    }

    /// The method name [`inject_into`](Self::inject_into) invokes on an
    /// instance after field injection.
    pub fn post_injection_hook_name(&self) -> String {
        self.core.hook_name.lock().unwrap().clone()
    }

    /// Overrides the post-injection hook name.
    pub fn set_post_injection_hook_name(&self, name: impl Into<String>) {
        *self.core.hook_name.lock().unwrap() = name.into();
    }

    // ----- Registry -----

    /// Registers a new mapping under `name`.
    ///
    /// Fails with [`InjectError::ForbiddenName`] for the reserved parameter
    /// names, and with [`InjectError::DuplicateMapping`] when `name` is
    /// already bound to a sealed mapping. An existing unsealed mapping is
    /// replaced.
    pub fn add_mapping(&self, name: &str) -> InjectResult<Mapping> {
        if is_reserved_name(name) {
            return Err(InjectError::ForbiddenName(name.to_string()));
        }
        let shared = {
            let mut registry = self.core.registry.lock().unwrap();
            if let Some(existing) = registry.get(name) {
                if existing.is_sealed() {
                    return Err(InjectError::DuplicateMapping(name.to_string()));
                }
            }
            let name: Arc<str> = Arc::from(name);
            let shared = Arc::new(MappingShared::new(name.clone()));
            registry.insert(name, shared.clone());
            shared
        };
        self.core.observers.mapping_added(name);
        Ok(Mapping {
            shared,
            core: self.core.clone(),
        })
    }

    /// Removes the mapping under `name`.
    ///
    /// Fails with [`InjectError::SealedMapping`] when the mapping is sealed;
    /// removing an absent name is a no-op.
    pub fn remove_mapping(&self, name: &str) -> InjectResult<()> {
        let removed = {
            let mut registry = self.core.registry.lock().unwrap();
            match registry.get(name) {
                None => false,
                Some(existing) => {
                    if existing.is_sealed() {
                        return Err(InjectError::SealedMapping(name.to_string()));
                    }
                    registry.remove(name)
                }
            }
        };
        if removed {
            self.core.observers.mapping_removed(name);
        }
        Ok(())
    }

    /// True when a mapping is registered under `name`.
    pub fn has_mapping(&self, name: &str) -> bool {
        self.core.registry.lock().unwrap().contains(name)
    }

    /// The mapping registered under `name`, if any.
    pub fn get_mapping(&self, name: &str) -> Option<Mapping> {
        self.core.lookup(name).map(|shared| Mapping {
            shared,
            core: self.core.clone(),
        })
    }

    /// Registered mapping names, in registration order.
    pub fn mapping_names(&self) -> Vec<String> {
        self.core
            .registry
            .lock()
            .unwrap()
            .names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    /// Number of registered mappings.
    pub fn mapping_count(&self) -> usize {
        self.core.registry.lock().unwrap().len()
    }

    #[cfg(feature = "diagnostics")]
    pub fn to_debug_string(&self) -> String {
        let mut out = String::from("=== Injector Debug ===\n");
        let registry = self.core.registry.lock().unwrap();
        for name in registry.names() {
            if let Some(shared) = registry.get(&name) {
                out.push_str("  ");
                out.push_str(&shared.describe());
                out.push('\n');
            }
        }
        out
    }

    // ----- Multi-dependency resolution -----

    /// Resolves `names` in order and hands the ordered values to
    /// `on_resolved`, which fires exactly once after every slot is filled.
    ///
    /// Names without a mapping fill their slot with the absent sentinel; an
    /// empty list fires immediately with an empty vec. Slot order is always
    /// input order, independent of which dependency completed first.
    pub fn resolve_injections<I, S, F>(&self, names: I, on_resolved: F)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnOnce(Vec<Injected>) + Send + 'static,
    {
        self.resolve_injections_with(names, on_resolved, false);
    }

    /// Like [`resolve_injections`](Self::resolve_injections); with
    /// `force_async` the continuation is deferred one scheduler turn.
    pub fn resolve_injections_with<I, S, F>(&self, names: I, on_resolved: F, force_async: bool)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnOnce(Vec<Injected>) + Send + 'static,
    {
        let slots = names
            .into_iter()
            .map(|name| Slot::Named(name.into()))
            .collect();
        fan_out(&self.core, slots, Box::new(on_resolved), force_async);
    }

    /// Resolves the function's declared deps and invokes its body with the
    /// ordered values.
    pub fn invoke_injected(&self, func: InjectedFn) {
        self.invoke_injected_with(func, false, None);
    }

    /// Like [`invoke_injected`](Self::invoke_injected); with `force_async`
    /// the invocation itself is deferred one turn, and `after` (when given)
    /// fires once the body has returned.
    pub fn invoke_injected_with(
        &self,
        func: InjectedFn,
        force_async: bool,
        after: Option<Box<dyn FnOnce() + Send>>,
    ) {
        let (deps, body) = func.into_parts();
        self.resolve_injections_with(
            deps,
            move |values| {
                body(values);
                if let Some(after) = after {
                    after();
                }
            },
            force_async,
        );
    }

    // ----- Instance injection -----

    /// Resolves and assigns the target's absent, mapped fields, then invokes
    /// its post-injection hook when it declares one.
    pub fn inject_into<T>(&self, target: &Arc<Mutex<T>>)
    where
        T: Injectable + ?Sized + 'static,
    {
        self.inject_into_impl(target, Box::new(|| {}), false);
    }

    /// Like [`inject_into`](Self::inject_into), with a completion callback
    /// fired after the hook (or immediately after assignment when there is
    /// none). With `inject_hook_params`, the hook's declared deps resolve as
    /// injections before it runs.
    pub fn inject_into_with<T, F>(&self, target: &Arc<Mutex<T>>, on_complete: F, inject_hook_params: bool)
    where
        T: Injectable + ?Sized + 'static,
        F: FnOnce() + Send + 'static,
    {
        self.inject_into_impl(target, Box::new(on_complete), inject_hook_params);
    }

    fn inject_into_impl<T>(
        &self,
        target: &Arc<Mutex<T>>,
        on_complete: Box<dyn FnOnce() + Send>,
        inject_hook_params: bool,
    ) where
        T: Injectable + ?Sized + 'static,
    {
        let names: Vec<String> = {
            let instance = target.lock().unwrap();
            instance
                .injection_fields()
                .into_iter()
                .filter(|field| field.is_absent && self.has_mapping(&field.name))
                .map(|field| field.name)
                .collect()
        };

        let target = target.clone();
        let injector = self.clone();
        let assigned = names.clone();
        self.resolve_injections(names, move |values| {
            {
                let mut instance = target.lock().unwrap();
                for (name, value) in assigned.into_iter().zip(values) {
                    instance.set_injection_field(&name, value);
                }
            }
            injector.run_post_injection_hook(target, on_complete, inject_hook_params);
        });
    }

    fn run_post_injection_hook<T>(
        &self,
        target: Arc<Mutex<T>>,
        on_complete: Box<dyn FnOnce() + Send>,
        inject_hook_params: bool,
    ) where
        T: Injectable + ?Sized + 'static,
    {
        let hook_name = self.post_injection_hook_name();
        let hook_deps = target.lock().unwrap().post_injection_hook(&hook_name);
        match hook_deps {
            None => on_complete(),
            Some(deps) if inject_hook_params && !deps.is_empty() => {
                self.resolve_injections(deps, move |args| {
                    target.lock().unwrap().invoke_post_injection_hook(&hook_name, args);
                    on_complete();
                });
            }
            Some(_) => {
                target
                    .lock()
                    .unwrap()
                    .invoke_post_injection_hook(&hook_name, Vec::new());
                on_complete();
            }
        }
    }

    /// Constructs a `T`, injects into it, and hands the shared instance to
    /// `on_ready` once injection (and the post-injection hook) completed.
    pub fn create_injected_instance<T, F>(&self, on_ready: F, inject_hook_params: bool)
    where
        T: Injectable + Default + 'static,
        F: FnOnce(Arc<Mutex<T>>) + Send + 'static,
    {
        let instance = Arc::new(Mutex::new(T::default()));
        let ready_instance = instance.clone();
        self.inject_into_impl(
            &instance,
            Box::new(move || on_ready(ready_instance)),
            inject_hook_params,
        );
    }

    /// Resets every target field whose name has a registered mapping back to
    /// the absent sentinel. Synchronous; in-flight resolutions are not
    /// aborted.
    pub fn cancel_injections_into<T>(&self, target: &Mutex<T>)
    where
        T: Injectable + ?Sized,
    {
        let mut instance = target.lock().unwrap();
        for field in instance.injection_fields() {
            if self.has_mapping(&field.name) {
                instance.set_injection_field(&field.name, None);
            }
        }
    }

    // ----- Template parsing -----

    /// Substitutes `${name}` placeholders whose names have registered
    /// mappings with their resolved values, and delivers the result.
    ///
    /// An absent resolved value (or one with no textual rendering)
    /// substitutes the empty string; a placeholder with no mapping is left
    /// untouched.
    pub fn parse_str<F>(&self, template: &str, on_parsed: F)
    where
        F: FnOnce(String) + Send + 'static,
    {
        let mapped: Vec<String> = template::placeholder_names(template)
            .into_iter()
            .filter(|name| self.has_mapping(name))
            .collect();
        let template = template.to_string();
        let resolved_names = mapped.clone();
        self.resolve_injections(mapped, move |values| {
            let mut rendered = HashMap::new();
            for (name, value) in resolved_names.into_iter().zip(values) {
                rendered.insert(name, template::render_value(&value));
            }
            on_parsed(template::substitute(&template, &rendered));
        });
    }
}

// ----- Fan-out/fan-in -----

/// One slot of a fan-out: either resolved by name or preset to a value.
pub(crate) enum Slot {
    Named(String),
    Preset(Injected),
}

struct FanState {
    values: Vec<Injected>,
    filled: usize,
    total: usize,
    on_done: Option<Box<dyn FnOnce(Vec<Injected>) + Send>>,
}

/// Shared completion tracker for one fan-out. Slots may fill on the
/// issuing stack or on later turns, in any order; the continuation is taken
/// exactly once, when the fill count reaches the slot count.
struct FanIn {
    state: Mutex<FanState>,
    scheduler: Arc<dyn DeferredScheduler>,
    force_async: bool,
}

impl FanIn {
    fn fill(&self, index: usize, value: Injected) {
        let done = {
            let mut state = self.state.lock().unwrap();
            state.values[index] = value;
            state.filled += 1;
            if state.filled == state.total {
                state
                    .on_done
                    .take()
                    .map(|on_done| (on_done, std::mem::take(&mut state.values)))
            } else {
                None
            }
        };
        if let Some((on_done, values)) = done {
            if self.force_async {
                self.scheduler
                    .schedule_deferred(Box::new(move || on_done(values)));
            } else {
                on_done(values);
            }
        }
    }
}

pub(crate) fn fan_out(
    core: &Arc<InjectorCore>,
    slots: Vec<Slot>,
    on_done: Box<dyn FnOnce(Vec<Injected>) + Send>,
    force_async: bool,
) {
    let total = slots.len();
    if total == 0 {
        if force_async {
            core.scheduler
                .schedule_deferred(Box::new(move || on_done(Vec::new())));
        } else {
            on_done(Vec::new());
        }
        return;
    }

    let fan = Arc::new(FanIn {
        state: Mutex::new(FanState {
            values: vec![None; total],
            filled: 0,
            total,
            on_done: Some(on_done),
        }),
        scheduler: core.scheduler.clone(),
        force_async,
    });

    for (index, slot) in slots.into_iter().enumerate() {
        match slot {
            Slot::Preset(value) => fan.fill(index, value),
            Slot::Named(name) => match core.lookup(&name) {
                // No mapping for this name: the slot is absent immediately.
                None => fan.fill(index, None),
                Some(shared) => {
                    let fan = fan.clone();
                    resolve_prepared(
                        &shared,
                        core,
                        Continuation::simple(move |value| fan.fill(index, value)),
                        false,
                    );
                }
            },
        }
    }
}

/// Delivers a produced value to a continuation.
///
/// Multi-parameter continuations re-enter the fan-out with the reserved
/// value slot preset; everything else goes straight to the body, deferred
/// one turn when `force_async` is set.
pub(crate) fn dispatch_continuation(
    core: &Arc<InjectorCore>,
    continuation: Continuation,
    value: Injected,
    force_async: bool,
) {
    match continuation.into_kind() {
        ContinuationKind::Simple(body) => {
            if force_async {
                core.scheduler
                    .schedule_deferred(Box::new(move || body(value)));
            } else {
                body(value);
            }
        }
        ContinuationKind::WithDeps { deps, body } => {
            if deps.len() <= 1 {
                if force_async {
                    core.scheduler
                        .schedule_deferred(Box::new(move || body(vec![value])));
                } else {
                    body(vec![value]);
                }
            } else {
                let value_index = deps
                    .iter()
                    .position(|dep| dep == VALUE_PARAM)
                    .expect("continuation validated before dispatch");
                let slots = deps
                    .into_iter()
                    .enumerate()
                    .map(|(index, dep)| {
                        if index == value_index {
                            Slot::Preset(value.clone())
                        } else {
                            Slot::Named(dep)
                        }
                    })
                    .collect();
                fan_out(core, slots, body, force_async);
            }
        }
    }
}
