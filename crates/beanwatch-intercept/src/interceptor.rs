//! The write interceptor.
//!
//! Wraps a field write with old-value capture and change notification:
//!
//! 1. classify the [`WriteSite`] against the [`InterceptionRules`];
//! 2. capture the current value through [`Observable::read_property`];
//! 3. perform the write;
//! 4. decide whether the write changed anything and notify the object's
//!    listeners.
//!
//! Listeners run after the write, so they observe the new state. A failing
//! listener never undoes the write.

use std::sync::OnceLock;

use beanwatch_config::{CollectionPolicyConfig, ObservingConfig};
use beanwatch_core::{
    should_notify, CollectionPolicy, DispatchReport, Dispatcher, Observable, OldValue,
    PropertyChangeEvent, PropertyValue, ToPropertyValue,
};
use tracing::{info, trace, warn};

use crate::error::RuleError;
use crate::rules::{Interception, InterceptionRules, SkipReason, WriteSite};

static GLOBAL: OnceLock<Interceptor> = OnceLock::new();

/// Result of one intercepted write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The site is not intercepted; the write happened without capture.
    Skipped(SkipReason),
    /// The write stored a value equal to the previous one.
    Unchanged,
    /// Listeners were notified.
    Notified(DispatchReport),
    /// Collection write under [`CollectionPolicy::Ignore`].
    Silent,
}

impl WriteOutcome {
    pub fn is_notified(&self) -> bool {
        matches!(self, WriteOutcome::Notified(_))
    }

    pub fn report(&self) -> Option<&DispatchReport> {
        match self {
            WriteOutcome::Notified(report) => Some(report),
            _ => None,
        }
    }
}

/// State carried from before a write to after it.
///
/// Obtained from [`Interceptor::begin_write`] and consumed by
/// [`Interceptor::complete_write`].
#[derive(Debug, Clone, PartialEq)]
#[must_use = "a pending write must be completed after the field is assigned"]
pub struct PendingWrite {
    interception: Interception,
    old: Option<OldValue>,
}

impl PendingWrite {
    pub fn is_intercepted(&self) -> bool {
        self.interception.is_intercepted()
    }

    /// Whether [`complete_write`](Interceptor::complete_write) will look at
    /// the new value.
    pub fn needs_new_value(&self) -> bool {
        self.old.is_some()
    }

    pub fn property(&self) -> Option<&str> {
        self.interception.property()
    }

    pub fn old_value(&self) -> Option<&OldValue> {
        self.old.as_ref()
    }
}

/// Applies the rule set and the change decision to field writes.
#[derive(Debug, Default)]
pub struct Interceptor {
    rules: InterceptionRules,
    collection_policy: CollectionPolicy,
    dispatcher: Dispatcher,
}

impl Interceptor {
    pub fn new(rules: InterceptionRules) -> Self {
        Self {
            rules,
            ..Self::default()
        }
    }

    /// Builds an interceptor from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Config`] if an exclusion is malformed.
    pub fn from_config(config: &ObservingConfig) -> Result<Self, RuleError> {
        let collection_policy = match config.collection_policy {
            CollectionPolicyConfig::Ignore => CollectionPolicy::Ignore,
            CollectionPolicyConfig::NotifyOnReplace => CollectionPolicy::NotifyOnReplace,
            CollectionPolicyConfig::NotifyOnChange => CollectionPolicy::NotifyOnChange,
        };
        Ok(Self {
            rules: InterceptionRules::from_config(config)?,
            collection_policy,
            dispatcher: Dispatcher::new().with_catch_panics(config.dispatch.catch_panics),
        })
    }

    pub fn with_collection_policy(mut self, policy: CollectionPolicy) -> Self {
        self.collection_policy = policy;
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn rules(&self) -> &InterceptionRules {
        &self.rules
    }

    pub fn collection_policy(&self) -> CollectionPolicy {
        self.collection_policy
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Installs the process-wide interceptor.
    ///
    /// Must run before the first intercepted write; afterwards the default
    /// interceptor is already in place.
    ///
    /// # Errors
    ///
    /// [`RuleError::Config`] for a malformed configuration and
    /// [`RuleError::AlreadyInstalled`] if an interceptor is already in place.
    pub fn install(config: &ObservingConfig) -> Result<&'static Interceptor, RuleError> {
        let mut candidate = Some(Self::from_config(config)?);
        let installed = GLOBAL.get_or_init(|| candidate.take().unwrap_or_default());
        if candidate.is_some() {
            return Err(RuleError::AlreadyInstalled);
        }
        info!(
            event = "interceptor_installed",
            naming = ?installed.rules.naming(),
            collection_policy = ?installed.collection_policy,
            catch_panics = installed.dispatcher.catch_panics(),
        );
        Ok(installed)
    }

    /// The process-wide interceptor, installing the default one on first use.
    pub fn global() -> &'static Interceptor {
        GLOBAL.get_or_init(Interceptor::default)
    }

    /// Reads the current value of `property` before it is overwritten.
    pub fn capture_old_value<O>(&self, obj: &O, declaring_type: &str, property: &str) -> OldValue
    where
        O: Observable + ?Sized,
    {
        let old = OldValue::from(obj.read_property(property));
        if old.is_unknown() {
            warn!(
                event = "capture_failed",
                source = %obj.source_id(),
                declaring_type = %declaring_type,
                property = %property,
                "could not retrieve value for property",
            );
        }
        old
    }

    /// Notifies the listeners of `obj` if `old` and `new` differ.
    ///
    /// Returns `None` when the write is not a change.
    pub fn maybe_notify<O>(
        &self,
        obj: &O,
        property: &str,
        old: OldValue,
        new: PropertyValue,
    ) -> Option<DispatchReport>
    where
        O: Observable + ?Sized,
    {
        let old = old.into_value();
        if !should_notify(&old, &new) {
            return None;
        }
        Some(self.notify(obj, property, old, new))
    }

    /// Classifies the write and captures the old value if it will be needed.
    pub fn begin_write<O>(&self, obj: &O, site: &WriteSite) -> PendingWrite
    where
        O: Observable + ?Sized,
    {
        let interception = self.rules.classify(site);
        let old = match &interception {
            Interception::Generic { property } => {
                Some(self.capture_old_value(obj, site.declaring_type.name, property))
            }
            Interception::Collection { property, .. }
                if self.collection_policy.captures_old_value() =>
            {
                Some(self.capture_old_value(obj, site.declaring_type.name, property))
            }
            Interception::Collection { .. } | Interception::Skip(_) => None,
        };
        PendingWrite { interception, old }
    }

    /// Decides and notifies once the field holds `new`.
    pub fn complete_write<O>(&self, obj: &O, pending: PendingWrite, new: PropertyValue) -> WriteOutcome
    where
        O: Observable + ?Sized,
    {
        let PendingWrite { interception, old } = pending;
        match (interception, old) {
            (Interception::Skip(reason), _) => WriteOutcome::Skipped(reason),
            (Interception::Generic { property }, old) => {
                let old = old.unwrap_or(OldValue::Unknown);
                match self.maybe_notify(obj, &property, old, new) {
                    Some(report) => WriteOutcome::Notified(report),
                    None => WriteOutcome::Unchanged,
                }
            }
            (Interception::Collection { property, .. }, Some(old)) => {
                let old = old.into_value();
                if self.collection_policy.should_notify(&old, &new) {
                    WriteOutcome::Notified(self.notify(obj, &property, old, new))
                } else {
                    WriteOutcome::Unchanged
                }
            }
            (Interception::Collection { .. }, None) => WriteOutcome::Silent,
        }
    }

    /// Performs `*slot(obj) = value` with interception.
    ///
    /// The write always happens, whatever the classification and whatever
    /// the listeners do.
    pub fn write_property<O, T, F>(&self, obj: &mut O, site: &WriteSite, slot: F, value: T) -> WriteOutcome
    where
        O: Observable + ?Sized,
        T: ToPropertyValue,
        F: FnOnce(&mut O) -> &mut T,
    {
        let pending = self.begin_write(&*obj, site);
        let new = if pending.needs_new_value() {
            value.to_property_value()
        } else {
            PropertyValue::None
        };
        *slot(&mut *obj) = value;

        trace!(event = "write", site = %site, intercepted = pending.is_intercepted());
        self.complete_write(&*obj, pending, new)
    }

    fn notify<O>(&self, obj: &O, property: &str, old: PropertyValue, new: PropertyValue) -> DispatchReport
    where
        O: Observable + ?Sized,
    {
        let support = obj.change_support();
        let event = PropertyChangeEvent::new(support.source(), property, old, new);
        support.dispatch_with(&self.dispatcher, &event)
    }
}

#[cfg(test)]
#[path = "interceptor_tests.rs"]
mod tests;
