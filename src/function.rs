//! Callable descriptors: providers, injected functions, continuations.
//!
//! Dependency names are never inferred from signatures; every callable that
//! wants injections carries an explicit ordered deps list. The list plays
//! the role a formal parameter list plays in reflective injectors: each name
//! resolves to the argument at the same position, unmatched names resolve to
//! the absent sentinel, and the two reserved names keep their special
//! meaning (see [`crate::reserved`]).

use std::sync::{Arc, Mutex};

use crate::error::{InjectError, InjectResult};
use crate::reserved::{COMPLETION_PARAM, VALUE_PARAM};
use crate::value::{Injected, InjectionValue};

fn collect_deps<I, S>(deps: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    deps.into_iter().map(Into::into).collect()
}

/// A provider: a re-invocable function strategy with declared dependencies.
///
/// Each declared name resolves (recursively, through the owning injector)
/// before the body runs, and arrives at the matching position of the body's
/// argument list. Declaring [`COMPLETION_PARAM`] makes the provider
/// asynchronous: that slot receives a [`Completion`] handle, the body's
/// return value is ignored, and the produced value is whatever the handle
/// is resolved with.
///
/// # Examples
///
/// A synchronous provider with one injected dependency:
///
/// ```rust
/// use suture_di::{injected, InjectedExt, ProviderFn};
///
/// let provider = ProviderFn::new(["base"], |args| {
///     let base = *args[0].value_of::<i32>().unwrap();
///     injected(base + 10)
/// });
/// assert_eq!(provider.deps()[0], "base");
/// ```
#[derive(Clone)]
pub struct ProviderFn {
    deps: Vec<String>,
    body: Arc<dyn Fn(Vec<Injected>) -> Injected + Send + Sync>,
}

impl ProviderFn {
    /// A provider with the given deps list.
    pub fn new<I, S, F>(deps: I, body: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: Fn(Vec<Injected>) -> Injected + Send + Sync + 'static,
    {
        Self {
            deps: collect_deps(deps),
            body: Arc::new(body),
        }
    }

    /// A provider that declares no dependencies.
    pub fn without_deps<F>(body: F) -> Self
    where
        F: Fn(Vec<Injected>) -> Injected + Send + Sync + 'static,
    {
        Self {
            deps: Vec::new(),
            body: Arc::new(body),
        }
    }

    /// The declared dependency names, in argument order.
    pub fn deps(&self) -> &[String] {
        &self.deps
    }

    /// Position of the reserved completion slot, when declared.
    pub(crate) fn completion_slot(&self) -> Option<usize> {
        self.deps.iter().position(|dep| dep == COMPLETION_PARAM)
    }

    pub(crate) fn body(&self) -> Arc<dyn Fn(Vec<Injected>) -> Injected + Send + Sync> {
        self.body.clone()
    }
}

/// A one-shot function invocation with declared dependencies, for
/// [`Injector::invoke_injected`](crate::Injector::invoke_injected).
pub struct InjectedFn {
    deps: Vec<String>,
    body: Box<dyn FnOnce(Vec<Injected>) + Send>,
}

impl InjectedFn {
    /// A function with the given deps list.
    pub fn new<I, S, F>(deps: I, body: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnOnce(Vec<Injected>) + Send + 'static,
    {
        Self {
            deps: collect_deps(deps),
            body: Box::new(body),
        }
    }

    /// A function that declares no dependencies.
    pub fn without_deps<F>(body: F) -> Self
    where
        F: FnOnce(Vec<Injected>) + Send + 'static,
    {
        Self {
            deps: Vec::new(),
            body: Box::new(body),
        }
    }

    /// The declared dependency names, in argument order.
    pub fn deps(&self) -> &[String] {
        &self.deps
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Box<dyn FnOnce(Vec<Injected>) + Send>) {
        (self.deps, self.body)
    }
}

pub(crate) enum ContinuationKind {
    Simple(Box<dyn FnOnce(Injected) + Send>),
    WithDeps {
        deps: Vec<String>,
        body: Box<dyn FnOnce(Vec<Injected>) + Send>,
    },
}

/// What a resolution delivers its produced value to.
///
/// The common form takes the value alone. A continuation may instead declare
/// a deps list: with zero or one declared name the body still receives just
/// the produced value, and with two or more the list must name
/// [`VALUE_PARAM`] — that slot carries the produced value while every other
/// name resolves as a further injection. The latter form lets a continuation
/// pull extra injected context along with the value it waited for.
pub struct Continuation {
    kind: ContinuationKind,
}

impl Continuation {
    /// A continuation receiving only the produced value.
    pub fn simple<F>(body: F) -> Self
    where
        F: FnOnce(Injected) + Send + 'static,
    {
        Self {
            kind: ContinuationKind::Simple(Box::new(body)),
        }
    }

    /// A continuation with a declared deps list.
    pub fn with_deps<I, S, F>(deps: I, body: F) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        F: FnOnce(Vec<Injected>) + Send + 'static,
    {
        Self {
            kind: ContinuationKind::WithDeps {
                deps: collect_deps(deps),
                body: Box::new(body),
            },
        }
    }

    /// Checks the reserved-slot rule for multi-parameter continuations.
    pub(crate) fn validate(&self) -> InjectResult<()> {
        if let ContinuationKind::WithDeps { deps, .. } = &self.kind {
            if deps.len() >= 2 && !deps.iter().any(|dep| dep == VALUE_PARAM) {
                return Err(InjectError::InvalidCallbackSignature(format!(
                    "a continuation with {} parameters must name \"{}\"",
                    deps.len(),
                    VALUE_PARAM
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn into_kind(self) -> ContinuationKind {
        self.kind
    }
}

/// One-shot completion handle for asynchronous providers.
///
/// The handle arrives as a regular injection value at the provider's
/// declared [`COMPLETION_PARAM`] position; the body claims it with
/// [`Completion::from_arg`] and later resolves it with the produced value.
/// A second resolution of the same handle is a no-op.
///
/// # Examples
///
/// ```rust
/// use suture_di::{injected, Completion, ProviderFn};
///
/// let provider = ProviderFn::new(["callback"], |args| {
///     let done = Completion::from_arg(&args[0]).unwrap();
///     done.resolve(injected("produced later, delivered now"));
///     None // ignored for asynchronous providers
/// });
/// assert_eq!(provider.deps()[0], "callback");
/// ```
pub struct Completion {
    sink: Mutex<Option<Box<dyn FnOnce(Injected) + Send>>>,
}

impl Completion {
    pub(crate) fn new(sink: Box<dyn FnOnce(Injected) + Send>) -> Arc<Self> {
        Arc::new(Self {
            sink: Mutex::new(Some(sink)),
        })
    }

    /// Recovers the handle from a provider argument slot.
    pub fn from_arg(arg: &Injected) -> Option<Arc<Completion>> {
        arg.as_ref().and_then(|value| value.clone().downcast::<Completion>().ok())
    }

    /// Delivers the produced value. Only the first call has any effect.
    pub fn resolve(&self, value: Injected) {
        let sink = self.sink.lock().unwrap().take();
        if let Some(sink) = sink {
            sink(value);
        }
    }

    pub(crate) fn as_value(self: Arc<Self>) -> InjectionValue {
        self as InjectionValue
    }
}
