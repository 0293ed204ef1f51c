//! Type-erased injection values.
//!
//! Mappings are keyed by name, not by type, so every produced value travels
//! through the container as `Arc<dyn Any + Send + Sync>`. Consumers downcast
//! at the edges with [`InjectedExt::value_of`].

use std::any::Any;
use std::sync::Arc;

/// A produced injection value, shared and type-erased.
pub type InjectionValue = Arc<dyn Any + Send + Sync>;

/// One resolution slot: either a produced value or the absent sentinel.
///
/// `None` is what an unmatched dependency name, or a mapping with no
/// configured strategy, resolves to. It is not an error condition.
pub type Injected = Option<InjectionValue>;

/// Wraps a concrete value into an occupied injection slot.
///
/// # Examples
///
/// ```rust
/// use suture_di::{injected, InjectedExt};
///
/// let slot = injected(42u32);
/// assert_eq!(*slot.value_of::<u32>().unwrap(), 42);
/// ```
pub fn injected<T: Send + Sync + 'static>(value: T) -> Injected {
    Some(Arc::new(value))
}

/// Downcast helpers for resolution slots.
pub trait InjectedExt {
    /// Returns the value as `Arc<T>` when the slot holds a `T`.
    fn value_of<T: Send + Sync + 'static>(&self) -> Option<Arc<T>>;

    /// True when the slot carries the absent sentinel.
    fn is_absent(&self) -> bool;
}

impl InjectedExt for Injected {
    fn value_of<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.as_ref().and_then(|value| value.clone().downcast::<T>().ok())
    }

    fn is_absent(&self) -> bool {
        self.is_none()
    }
}

/// A constructor object for the type strategy.
///
/// [`Mapping::to_type`](crate::Mapping::to_type) accepts any
/// [`InjectionValue`] and requires it to downcast to a `TypeCtor`; values
/// that are not constructors fail with
/// [`InjectError::NotConstructible`](crate::InjectError::NotConstructible).
/// Construction always takes no arguments.
///
/// # Examples
///
/// ```rust
/// use suture_di::TypeCtor;
///
/// #[derive(Default)]
/// struct Session {
///     token: Option<String>,
/// }
///
/// let ctor = TypeCtor::of::<Session>();
/// let instance = ctor.construct();
/// assert!(instance.downcast::<Session>().is_ok());
/// ```
#[derive(Clone)]
pub struct TypeCtor {
    type_name: &'static str,
    construct: Arc<dyn Fn() -> InjectionValue + Send + Sync>,
}

impl TypeCtor {
    /// Constructor for a `Default`-constructible type.
    pub fn of<T: Default + Send + Sync + 'static>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            construct: Arc::new(|| Arc::new(T::default()) as InjectionValue),
        }
    }

    /// Constructor backed by an arbitrary no-argument factory.
    pub fn from_fn<F>(type_name: &'static str, construct: F) -> Self
    where
        F: Fn() -> InjectionValue + Send + Sync + 'static,
    {
        Self {
            type_name,
            construct: Arc::new(construct),
        }
    }

    /// Builds one new instance.
    pub fn construct(&self) -> InjectionValue {
        (self.construct)()
    }

    /// The constructed type's name, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl std::fmt::Debug for TypeCtor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeCtor").field("type_name", &self.type_name).finish()
    }
}
