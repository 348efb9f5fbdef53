//! beanwatch - Transparent Change Notification
//!
//! Zero-wiring API: annotate a struct with `#[observable]`, register
//! listeners, and every write through a generated setter that actually
//! changes a value is announced to them.
//!
//! # Example
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use beanwatch::prelude::*;
//!
//! #[observable]
//! pub struct Account {
//!     #[change_support]
//!     support: PropertyChangeSupport,
//!     balance: i64,
//! }
//!
//! let mut account = Account {
//!     support: PropertyChangeSupport::for_type::<Account>(),
//!     balance: 100,
//! };
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! account.add_listener(listener_fn(move |event| {
//!     sink.lock().unwrap().push(event.new_value().clone());
//! }));
//!
//! account.set_balance(100); // unchanged, nothing fires
//! account.set_balance(150);
//!
//! assert_eq!(*seen.lock().unwrap(), vec![PropertyValue::I64(150)]);
//! ```

// User-facing macro
pub use beanwatch_macros::observable;

// Derive macro (used by the attribute macro, not called directly by users)
#[doc(hidden)]
pub use beanwatch_macros::ObservableImpl;

// Events, listeners and the observable capability
pub use beanwatch_core::{
    listener_fn, try_listener_fn, CollectionPolicy, DispatchReport, Dispatcher,
    ListenerError, ListenerFailure, ListenerRef, LoggingListener, Observable, OpaqueRef,
    PropertyChangeEvent, PropertyChangeListener, PropertyChangeSupport, PropertyValue, SourceId,
    ToPropertyValue,
};

// Interception
pub use beanwatch_intercept::{
    FieldDescriptor, FieldKind, Interceptor, PropertyNaming, RuleError, SkipReason, WriteOutcome,
};

// Configuration
pub use beanwatch_config::{ConfigError, ObservingConfig};

pub use beanwatch_intercept as intercept;
pub use beanwatch_config as config;

#[cfg(feature = "console")]
pub use beanwatch_console as console;

/// Installs the process-wide interceptor from `config`.
///
/// Call once at startup, before the first intercepted write. With the
/// `console` feature, also initializes console logging.
///
/// # Errors
///
/// Returns [`RuleError`] if the configuration is malformed or an interceptor
/// is already installed.
pub fn install(config: &ObservingConfig) -> Result<&'static Interceptor, RuleError> {
    #[cfg(feature = "console")]
    beanwatch_console::init();

    Interceptor::install(config)
}

/// Internal types for macro-generated code. Do not use directly.
#[doc(hidden)]
pub mod __internal {
    pub use beanwatch_core::{PropertyValue, ToPropertyValue};
    pub use beanwatch_intercept::{
        FieldDescriptor, Interceptor, MemberDescriptor, TypeDescriptor, WriteOutcome, WriteSite,
    };
}

pub mod prelude {
    pub use super::observable;
    pub use super::{
        listener_fn, try_listener_fn, ListenerRef, Observable, PropertyChangeEvent,
        PropertyChangeListener, PropertyChangeSupport, PropertyValue, ToPropertyValue, WriteOutcome,
    };
}
