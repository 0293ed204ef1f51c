//! Error types for the injection container.

use std::fmt;

/// Injection errors
///
/// Represents the error conditions that can occur while configuring
/// mappings, sealing them, or requesting a resolution in suture-di.
///
/// All errors are raised synchronously to the immediate caller of the
/// operation that produced them; nothing is retried or swallowed. A panic
/// inside a *deferred* continuation is outside the engine's reach and
/// surfaces through the scheduler that ran the task.
///
/// # Examples
///
/// ```rust
/// use suture_di::{Injector, InjectError};
///
/// let injector = Injector::new();
/// injector.add_mapping("config").unwrap();
///
/// // Reserved parameter names can never be mapping names.
/// match injector.add_mapping("injectionValue") {
///     Err(InjectError::ForbiddenName(name)) => assert_eq!(name, "injectionValue"),
///     _ => unreachable!(),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InjectError {
    /// Adding a name whose existing mapping is sealed
    DuplicateMapping(String),
    /// Adding a mapping under a reserved parameter name
    ForbiddenName(String),
    /// Mutating or removing a sealed mapping
    SealedMapping(String),
    /// Unsealing with a key that does not match the seal
    InvalidSealKey(String),
    /// Unsealing a mapping that is not sealed
    NotSealed(String),
    /// `to_type` given a value that is not a constructor
    NotConstructible(String),
    /// Module strategy requested with no unit loader installed
    ModuleLoadUnsupported(String),
    /// A multi-parameter continuation without the reserved value slot
    InvalidCallbackSignature(String),
}

impl fmt::Display for InjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InjectError::DuplicateMapping(name) => {
                write!(f, "Injection name \"{}\" is already used by a sealed mapping", name)
            }
            InjectError::ForbiddenName(name) => {
                write!(f, "Injection name \"{}\" is reserved and cannot be mapped", name)
            }
            InjectError::SealedMapping(name) => {
                write!(f, "Modification of the sealed mapping \"{}\" is forbidden", name)
            }
            InjectError::InvalidSealKey(name) => {
                write!(f, "Wrong key for the sealed mapping \"{}\"", name)
            }
            InjectError::NotSealed(name) => {
                write!(f, "Mapping \"{}\" is not sealed", name)
            }
            InjectError::NotConstructible(name) => {
                write!(f, "Value bound to \"{}\" is not a constructor", name)
            }
            InjectError::ModuleLoadUnsupported(path) => {
                write!(f, "No unit loader available to load \"{}\"", path)
            }
            InjectError::InvalidCallbackSignature(detail) => {
                write!(f, "Invalid resolution callback signature: {}", detail)
            }
        }
    }
}

impl std::error::Error for InjectError {}

/// Result type for injection operations
///
/// A convenience alias for `Result<T, InjectError>` used throughout
/// suture-di, following the common Rust pattern of a crate-specific
/// Result type to reduce boilerplate in signatures.
pub type InjectResult<T> = Result<T, InjectError>;
