//! Interception rule set.
//!
//! Classifies a field write, described by a static [`WriteSite`], as a
//! generic property write, a collection write, or not intercepted at all.
//!
//! # Rules
//!
//! All predicates of a rule must hold (conjunction):
//!
//! | Field kind | Type | Enclosing member | Field |
//! |------------|------|------------------|-------|
//! | scalar | observable, not opted out | method, not opted out, not static, name not `get*` | not opted out, not static |
//! | list   | observable, not opted out | method or constructor, not opted out, not static | not opted out, not static |
//! | map    | observable, not opted out | not consulted | not opted out, not static |
//!
//! Opt-outs come from the descriptors themselves (attributes on the
//! declaration) or from the configured exclusions.
//!
//! Classification depends only on the site and the rule configuration, so
//! results are memoised per [`WriteSite`]. Two sites that share names but
//! differ in any descriptor flag are cached separately.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use beanwatch_config::{ExclusionConfig, ObservingConfig, PropertyNamingConfig};
use tracing::debug;

use crate::error::RuleError;

/// Kind of member performing a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Method,
    Constructor,
}

/// Storage kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// Any non-collection field.
    Scalar,
    /// List-like field (`Vec`, `VecDeque`).
    List,
    /// Map-like field (`HashMap`, `BTreeMap`).
    Map,
}

impl FieldKind {
    pub fn is_collection(self) -> bool {
        !matches!(self, FieldKind::Scalar)
    }
}

/// Describes the type declaring an intercepted field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeDescriptor {
    pub name: &'static str,
    /// Whether the type implements the observable capability.
    pub observable: bool,
    pub opted_out: bool,
}

impl TypeDescriptor {
    /// A type implementing the observable capability.
    pub const fn observable(name: &'static str) -> Self {
        Self {
            name,
            observable: true,
            opted_out: false,
        }
    }

    /// A type without the observable capability.
    pub const fn plain(name: &'static str) -> Self {
        Self {
            name,
            observable: false,
            opted_out: false,
        }
    }

    pub const fn opted_out(mut self) -> Self {
        self.opted_out = true;
        self
    }
}

/// Describes the member (method or constructor) performing a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemberDescriptor {
    pub name: &'static str,
    pub kind: MemberKind,
    /// Associated function without a receiver.
    pub is_static: bool,
    pub opted_out: bool,
}

impl MemberDescriptor {
    pub const fn method(name: &'static str) -> Self {
        Self {
            name,
            kind: MemberKind::Method,
            is_static: false,
            opted_out: false,
        }
    }

    pub const fn constructor(name: &'static str) -> Self {
        Self {
            name,
            kind: MemberKind::Constructor,
            is_static: false,
            opted_out: false,
        }
    }

    pub const fn associated(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub const fn opted_out(mut self) -> Self {
        self.opted_out = true;
        self
    }

    /// Whether the member follows the getter naming convention.
    pub fn is_getter(&self) -> bool {
        self.name.starts_with("get")
    }
}

/// Describes an intercepted field and the property it backs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldDescriptor {
    pub name: &'static str,
    /// Declared property name; the field name unless overridden.
    pub property: &'static str,
    pub kind: FieldKind,
    pub is_static: bool,
    pub opted_out: bool,
}

impl FieldDescriptor {
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            property: name,
            kind,
            is_static: false,
            opted_out: false,
        }
    }

    pub const fn scalar(name: &'static str) -> Self {
        Self::new(name, FieldKind::Scalar)
    }

    pub const fn list(name: &'static str) -> Self {
        Self::new(name, FieldKind::List)
    }

    pub const fn map(name: &'static str) -> Self {
        Self::new(name, FieldKind::Map)
    }

    pub const fn with_property(mut self, property: &'static str) -> Self {
        self.property = property;
        self
    }

    pub const fn associated(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub const fn opted_out(mut self) -> Self {
        self.opted_out = true;
        self
    }
}

/// One statically known write: which member writes which field of which
/// type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WriteSite {
    pub declaring_type: TypeDescriptor,
    pub member: MemberDescriptor,
    pub field: FieldDescriptor,
}

impl WriteSite {
    pub const fn new(
        declaring_type: TypeDescriptor,
        member: MemberDescriptor,
        field: FieldDescriptor,
    ) -> Self {
        Self {
            declaring_type,
            member,
            field,
        }
    }
}

impl fmt::Display for WriteSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}::{} writes {}",
            self.declaring_type.name, self.member.name, self.field.name
        )
    }
}

/// Why a write is not intercepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    TypeNotObservable,
    TypeOptedOut,
    MemberOptedOut,
    StaticMember,
    FieldOptedOut,
    StaticField,
    /// Scalar fields written from a constructor are initialisation, not change.
    ConstructorWrite,
    /// Scalar fields written from a `get*` member (lazy initialisation).
    GetterWrite,
}

/// Classification of a write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interception {
    /// Compare old and new value, notify on change.
    Generic { property: Arc<str> },
    /// Collection-typed field; the collection policy decides.
    Collection { property: Arc<str>, kind: FieldKind },
    /// Write proceeds without interception.
    Skip(SkipReason),
}

impl Interception {
    pub fn is_intercepted(&self) -> bool {
        !matches!(self, Interception::Skip(_))
    }

    pub fn property(&self) -> Option<&str> {
        match self {
            Interception::Generic { property } | Interception::Collection { property, .. } => {
                Some(property)
            }
            Interception::Skip(_) => None,
        }
    }
}

/// Where the property name of an intercepted write comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PropertyNaming {
    /// The field's declared property name.
    #[default]
    Declared,
    /// The name of the member performing the write.
    ///
    /// Mirrors call-site naming: a field written by two differently named
    /// members is announced under two names.
    MemberName,
}

impl From<PropertyNamingConfig> for PropertyNaming {
    fn from(config: PropertyNamingConfig) -> Self {
        match config {
            PropertyNamingConfig::Declared => PropertyNaming::Declared,
            PropertyNamingConfig::MemberName => PropertyNaming::MemberName,
        }
    }
}

/// The rule set, with configured exclusions and a classification cache.
#[derive(Debug, Default)]
pub struct InterceptionRules {
    naming: PropertyNaming,
    exclusions: ExclusionConfig,
    cache: RwLock<HashMap<WriteSite, Interception>>,
}

impl InterceptionRules {
    /// Rules without exclusions, naming properties as declared.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds rules from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`RuleError::Config`] if an exclusion is malformed.
    pub fn from_config(config: &ObservingConfig) -> Result<Self, RuleError> {
        config.validate()?;

        Ok(Self {
            naming: config.property_naming.into(),
            exclusions: config.exclusions.clone(),
            cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn with_naming(mut self, naming: PropertyNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn naming(&self) -> PropertyNaming {
        self.naming
    }

    /// Classifies a write, consulting the cache first.
    pub fn classify(&self, site: &WriteSite) -> Interception {
        if let Some(hit) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(site)
        {
            return hit.clone();
        }

        let decision = self.evaluate(site);
        debug!(
            event = "classify",
            site = %site,
            intercepted = decision.is_intercepted(),
            decision = ?decision,
        );
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(*site, decision.clone());
        decision
    }

    /// Number of memoised classifications.
    pub fn cached_sites(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn evaluate(&self, site: &WriteSite) -> Interception {
        if let Err(reason) = self.check_type(&site.declaring_type) {
            return Interception::Skip(reason);
        }
        if let Err(reason) = self.check_field(site) {
            return Interception::Skip(reason);
        }

        match site.field.kind {
            FieldKind::Scalar => {
                if let Err(reason) = self.check_member(site, false) {
                    return Interception::Skip(reason);
                }
                if site.member.is_getter() {
                    return Interception::Skip(SkipReason::GetterWrite);
                }
                Interception::Generic {
                    property: self.property_name(site),
                }
            }
            FieldKind::List => {
                if let Err(reason) = self.check_member(site, true) {
                    return Interception::Skip(reason);
                }
                Interception::Collection {
                    property: self.property_name(site),
                    kind: FieldKind::List,
                }
            }
            FieldKind::Map => Interception::Collection {
                property: self.property_name(site),
                kind: FieldKind::Map,
            },
        }
    }

    fn check_type(&self, ty: &TypeDescriptor) -> Result<(), SkipReason> {
        if !ty.observable {
            return Err(SkipReason::TypeNotObservable);
        }
        if ty.opted_out || self.exclusions.excludes_type(ty.name) {
            return Err(SkipReason::TypeOptedOut);
        }
        Ok(())
    }

    fn check_field(&self, site: &WriteSite) -> Result<(), SkipReason> {
        let field = &site.field;
        if field.opted_out
            || self
                .exclusions
                .excludes_field(site.declaring_type.name, field.name)
        {
            return Err(SkipReason::FieldOptedOut);
        }
        if field.is_static {
            return Err(SkipReason::StaticField);
        }
        Ok(())
    }

    fn check_member(&self, site: &WriteSite, allow_constructor: bool) -> Result<(), SkipReason> {
        let member = &site.member;
        if member.opted_out
            || self
                .exclusions
                .excludes_member(site.declaring_type.name, member.name)
        {
            return Err(SkipReason::MemberOptedOut);
        }
        if member.is_static {
            return Err(SkipReason::StaticMember);
        }
        if member.kind == MemberKind::Constructor && !allow_constructor {
            return Err(SkipReason::ConstructorWrite);
        }
        Ok(())
    }

    fn property_name(&self, site: &WriteSite) -> Arc<str> {
        match self.naming {
            PropertyNaming::Declared => Arc::from(site.field.property),
            PropertyNaming::MemberName => Arc::from(site.member.name),
        }
    }
}

#[cfg(test)]
#[path = "rules_tests.rs"]
mod tests;
