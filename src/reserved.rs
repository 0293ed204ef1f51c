//! Reserved parameter names.
//!
//! Two dependency names carry special meaning inside declared deps lists and
//! are therefore forbidden as mapping names:
//!
//! - [`COMPLETION_PARAM`] marks a provider as asynchronous; that slot of the
//!   provider's argument list receives a [`Completion`](crate::Completion)
//!   handle instead of a resolved injection.
//! - [`VALUE_PARAM`] marks, in a multi-parameter continuation, the slot that
//!   receives the produced injection value.

/// Deps-list name that receives a provider's completion handle.
pub const COMPLETION_PARAM: &str = "callback";

/// Deps-list name that receives the produced value in a continuation.
pub const VALUE_PARAM: &str = "injectionValue";

/// True when `name` is one of the reserved parameter names.
pub fn is_reserved_name(name: &str) -> bool {
    name == COMPLETION_PARAM || name == VALUE_PARAM
}
