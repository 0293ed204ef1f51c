//! # suture-di
//!
//! Name-keyed, callback-driven dependency injection for Rust.
//!
//! ## Features
//!
//! - **Name-keyed mappings**: symbolic names bound to value-production
//!   strategies (fixed value, provider function, constructible type,
//!   external unit)
//! - **Recursive resolution**: providers declare their own dependency names
//!   and are injected before they run
//! - **Sync or deferred**: continuations fire on the caller's stack or on a
//!   later scheduler turn, with `force_async` to defer on demand
//! - **Singleton coalescing**: overlapping resolutions of an in-flight
//!   singleton production are queued and all receive the single produced
//!   value
//! - **Order-preserving fan-in**: multi-dependency resolution delivers
//!   values in request order regardless of completion order
//! - **Sealing**: mappings lock against mutation, reversible only with the
//!   issued key
//!
//! ## Quick Start
//!
//! ```rust
//! use suture_di::{injected, Injector, InjectedExt, ProviderFn};
//!
//! let injector = Injector::new();
//!
//! // A fixed value and a provider that depends on it by name.
//! injector
//!     .add_mapping("db_url")
//!     .unwrap()
//!     .to_value_of(String::from("postgres://localhost"))
//!     .unwrap();
//! injector
//!     .add_mapping("connection_info")
//!     .unwrap()
//!     .to_provider(ProviderFn::new(["db_url"], |args| {
//!         let url = args[0].value_of::<String>().unwrap();
//!         injected(format!("connected to {}", url))
//!     }))
//!     .unwrap()
//!     .as_singleton()
//!     .unwrap();
//!
//! injector.resolve_injections(["connection_info"], |values| {
//!     let info = values[0].value_of::<String>().unwrap();
//!     assert_eq!(*info, "connected to postgres://localhost");
//! });
//! ```
//!
//! ## Asynchronous providers
//!
//! A provider declaring the reserved `"callback"` dependency receives a
//! one-shot [`Completion`] handle at that position and produces its value by
//! resolving the handle — typically from a deferred task:
//!
//! ```rust
//! use std::sync::Arc;
//! use suture_di::{injected, Completion, DeferredScheduler, Injector, InjectedExt, ProviderFn, TaskQueue};
//!
//! let queue = Arc::new(TaskQueue::new());
//! let injector = Injector::with_scheduler(queue.clone());
//!
//! let defer_to = queue.clone();
//! injector
//!     .add_mapping("token")
//!     .unwrap()
//!     .to_provider(ProviderFn::new(["callback"], move |args| {
//!         let done = Completion::from_arg(&args[0]).unwrap();
//!         defer_to.schedule_deferred(Box::new(move || done.resolve(injected(5u32))));
//!         None // the value arrives through the completion handle
//!     }))
//!     .unwrap();
//!
//! let delivered = Arc::new(std::sync::Mutex::new(None));
//! let sink = delivered.clone();
//! injector.get_mapping("token").unwrap().resolve_injection(move |value| {
//!     *sink.lock().unwrap() = Some(*value.value_of::<u32>().unwrap());
//! });
//!
//! assert_eq!(*delivered.lock().unwrap(), None); // still pending
//! queue.run_until_idle();
//! assert_eq!(*delivered.lock().unwrap(), Some(5));
//! ```
//!
//! ## Instance injection
//!
//! Types implementing [`Injectable`] declare their injection points
//! explicitly; [`Injector::inject_into`] fills exactly the absent, mapped
//! fields and then invokes the instance's post-injection hook. See the
//! [`Injectable`] docs for a worked example.

// Module declarations
pub mod error;
pub mod function;
pub mod injectable;
pub mod injector;
pub mod loader;
pub mod mapping;
pub mod observer;
pub mod reserved;
pub mod scheduler;
pub mod value;

// Internal modules
mod registry;
mod template;

// Re-export core types
pub use error::{InjectError, InjectResult};
pub use function::{Completion, Continuation, InjectedFn, ProviderFn};
pub use injectable::{Injectable, InjectionField};
pub use injector::{Injector, DEFAULT_POST_INJECTION_HOOK};
pub use loader::{LoadedUnit, OnUnitLoaded, UnitLoader, UnitRegistry};
pub use mapping::{Mapping, SealKey};
pub use observer::{InjectObserver, LoggingObserver};
pub use reserved::{is_reserved_name, COMPLETION_PARAM, VALUE_PARAM};
pub use scheduler::{DeferredScheduler, DeferredTask, TaskQueue};
pub use value::{injected, Injected, InjectedExt, InjectionValue, TypeCtor};

#[cfg(feature = "async")]
pub use loader::{AsyncLoaderBridge, AsyncUnitLoader};
#[cfg(feature = "async")]
pub use scheduler::TokioScheduler;
