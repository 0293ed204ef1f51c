//! The `Injectable` seam for instance injection.
//!
//! There is no property reflection to scan an arbitrary struct, so a type
//! opting into [`Injector::inject_into`](crate::Injector::inject_into)
//! declares its injection points explicitly: which named fields it has,
//! whether each is currently absent, and how to assign a resolved value
//! back. The optional hook methods expose the post-injection protocol.

use crate::value::Injected;

/// One declared injection point on an instance.
#[derive(Debug, Clone)]
pub struct InjectionField {
    /// The field's injection name (matched against mapping names).
    pub name: String,
    /// True when the field currently holds the absent sentinel.
    pub is_absent: bool,
}

impl InjectionField {
    pub fn new(name: impl Into<String>, is_absent: bool) -> Self {
        Self {
            name: name.into(),
            is_absent,
        }
    }
}

/// A type whose instances can receive field injection.
///
/// Only fields reported absent *and* matching a registered mapping are
/// resolved; everything else is left untouched.
/// [`Injector::cancel_injections_into`](crate::Injector::cancel_injections_into)
/// uses the same seam to reset mapped fields back to absent.
///
/// # Examples
///
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use suture_di::{Injectable, Injected, InjectedExt, InjectionField, Injector};
///
/// struct Greeter {
///     greeting: Injected,
/// }
///
/// impl Injectable for Greeter {
///     fn injection_fields(&self) -> Vec<InjectionField> {
///         vec![InjectionField::new("greeting", self.greeting.is_absent())]
///     }
///
///     fn set_injection_field(&mut self, name: &str, value: Injected) {
///         if name == "greeting" {
///             self.greeting = value;
///         }
///     }
/// }
///
/// let injector = Injector::new();
/// injector.add_mapping("greeting").unwrap().to_value_of("hello").unwrap();
///
/// let greeter = Arc::new(Mutex::new(Greeter { greeting: None }));
/// injector.inject_into(&greeter);
/// assert_eq!(*greeter.lock().unwrap().greeting.value_of::<&str>().unwrap(), "hello");
/// ```
pub trait Injectable: Send {
    /// Enumerates the instance's injection points with their current state.
    fn injection_fields(&self) -> Vec<InjectionField>;

    /// Assigns a resolved value to the named field.
    ///
    /// Also called with the absent sentinel to reset a field when
    /// injections are cancelled.
    fn set_injection_field(&mut self, name: &str, value: Injected);

    /// Deps list of the post-injection hook named `hook_name`, or `None`
    /// when the instance exposes no such hook. An empty list declares a
    /// hook that takes no injections.
    fn post_injection_hook(&self, hook_name: &str) -> Option<Vec<String>> {
        let _ = hook_name;
        None
    }

    /// Invokes the post-injection hook named `hook_name`.
    ///
    /// `args` holds the hook's resolved deps when the caller asked for hook
    /// parameter injection, and is empty otherwise.
    fn invoke_post_injection_hook(&mut self, hook_name: &str, args: Vec<Injected>) {
        let _ = (hook_name, args);
    }
}
