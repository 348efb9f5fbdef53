//! beanwatch Intercept - deciding which writes announce changes
//!
//! This crate holds the rule set that classifies a field write and the
//! [`Interceptor`] that wraps the write with old-value capture and change
//! notification:
//! - Static [`WriteSite`] descriptors emitted by generated setters
//! - [`InterceptionRules`] with configured exclusions and a memo cache
//! - A process-wide interceptor installed once from [`ObservingConfig`]
//!
//! [`ObservingConfig`]: beanwatch_config::ObservingConfig

pub mod error;
pub mod interceptor;
pub mod rules;

pub use error::RuleError;
pub use interceptor::{Interceptor, PendingWrite, WriteOutcome};
pub use rules::{
    FieldDescriptor, FieldKind, Interception, InterceptionRules, MemberDescriptor, MemberKind,
    PropertyNaming, SkipReason, TypeDescriptor, WriteSite,
};
