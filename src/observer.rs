//! Diagnostic observers for injection traceability.
//!
//! Observers hook the container's lifecycle events for structured logging
//! and debugging. Calls are synchronous and happen on the resolution path;
//! keep implementations lightweight.

use std::sync::{Arc, Mutex};

/// Observer for injector lifecycle and resolution events.
///
/// Every method has a no-op default, so implementations subscribe only to
/// the events they care about.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use suture_di::{InjectObserver, Injector};
///
/// struct CountingObserver(std::sync::atomic::AtomicUsize);
///
/// impl InjectObserver for CountingObserver {
///     fn resolving(&self, _name: &str) {
///         self.0.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
///     }
/// }
///
/// let observer = Arc::new(CountingObserver(Default::default()));
/// let injector = Injector::new();
/// injector.add_observer(observer.clone());
/// injector.add_mapping("n").unwrap().to_value_of(1u8).unwrap();
/// injector.get_mapping("n").unwrap().resolve_injection(|_| {});
/// assert_eq!(observer.0.load(std::sync::atomic::Ordering::SeqCst), 1);
/// ```
pub trait InjectObserver: Send + Sync {
    /// A mapping was registered.
    fn mapping_added(&self, name: &str) {
        let _ = name;
    }

    /// A mapping was removed.
    fn mapping_removed(&self, name: &str) {
        let _ = name;
    }

    /// A resolution request reached the named mapping.
    fn resolving(&self, name: &str) {
        let _ = name;
    }

    /// The named mapping's provider body is about to run.
    fn provider_invoked(&self, name: &str) {
        let _ = name;
    }
}

/// Simple observer that prints events to stdout.
pub struct LoggingObserver {
    prefix: String,
}

impl LoggingObserver {
    /// An observer tagging every line with `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new("[suture-di]")
    }
}

impl InjectObserver for LoggingObserver {
    fn mapping_added(&self, name: &str) {
        println!("{} mapping added: {}", self.prefix, name);
    }

    fn mapping_removed(&self, name: &str) {
        println!("{} mapping removed: {}", self.prefix, name);
    }

    fn resolving(&self, name: &str) {
        println!("{} resolving: {}", self.prefix, name);
    }

    fn provider_invoked(&self, name: &str) {
        println!("{} provider invoked: {}", self.prefix, name);
    }
}

/// Fan-out collection of registered observers.
pub(crate) struct Observers {
    list: Mutex<Vec<Arc<dyn InjectObserver>>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self {
            list: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn add(&self, observer: Arc<dyn InjectObserver>) {
        self.list.lock().unwrap().push(observer);
    }

    fn snapshot(&self) -> Vec<Arc<dyn InjectObserver>> {
        self.list.lock().unwrap().clone()
    }

    pub(crate) fn mapping_added(&self, name: &str) {
        for observer in self.snapshot() {
            observer.mapping_added(name);
        }
    }

    pub(crate) fn mapping_removed(&self, name: &str) {
        for observer in self.snapshot() {
            observer.mapping_removed(name);
        }
    }

    pub(crate) fn resolving(&self, name: &str) {
        for observer in self.snapshot() {
            observer.resolving(name);
        }
    }

    pub(crate) fn provider_invoked(&self, name: &str) {
        for observer in self.snapshot() {
            observer.provider_invoked(name);
        }
    }
}
