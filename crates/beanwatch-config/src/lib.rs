//! Configuration system for beanwatch.
//!
//! Load interception and dispatch settings from TOML or YAML so that
//! exclusions and policies can change without touching the observed types.
//!
//! # Examples
//!
//! Load configuration from TOML string:
//!
//! ```
//! use beanwatch_config::{CollectionPolicyConfig, ObservingConfig, PropertyNamingConfig};
//!
//! let config = ObservingConfig::from_toml_str(r#"
//!     property_naming = "declared"
//!     collection_policy = "notify_on_change"
//!
//!     [dispatch]
//!     catch_panics = true
//!
//!     [exclusions]
//!     types = ["Scratchpad"]
//!     members = ["Account::reset"]
//!     fields = ["Account::cache"]
//! "#).unwrap();
//!
//! assert_eq!(config.collection_policy, CollectionPolicyConfig::NotifyOnChange);
//! assert_eq!(config.property_naming, PropertyNamingConfig::Declared);
//! assert!(config.exclusions.excludes_field("Account", "cache"));
//! ```
//!
//! Use default config when file is missing:
//!
//! ```
//! use beanwatch_config::ObservingConfig;
//!
//! let config = ObservingConfig::load("beanwatch.toml").unwrap_or_default();
//! // Proceeds with defaults if file doesn't exist
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Main observing configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ObservingConfig {
    /// Where the property name of an intercepted write comes from.
    #[serde(default)]
    pub property_naming: PropertyNamingConfig,

    /// How writes to collection-typed fields are announced.
    #[serde(default)]
    pub collection_policy: CollectionPolicyConfig,

    /// Listener invocation options.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Types, members and fields excluded from interception by name.
    #[serde(default)]
    pub exclusions: ExclusionConfig,
}

impl ObservingConfig {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if file doesn't exist, contains invalid TOML or names a
    /// malformed exclusion.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_file(path)
    }

    /// Loads configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Parses configuration from a YAML string.
    pub fn from_yaml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every exclusion names a well-formed type, member or field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.exclusions.validate()
    }

    pub fn with_property_naming(mut self, naming: PropertyNamingConfig) -> Self {
        self.property_naming = naming;
        self
    }

    pub fn with_collection_policy(mut self, policy: CollectionPolicyConfig) -> Self {
        self.collection_policy = policy;
        self
    }

    pub fn with_catch_panics(mut self, catch_panics: bool) -> Self {
        self.dispatch.catch_panics = catch_panics;
        self
    }

    /// Excludes every field of the named type.
    pub fn exclude_type(mut self, type_name: impl Into<String>) -> Self {
        self.exclusions.types.push(type_name.into());
        self
    }

    /// Excludes writes performed by `Type::member`.
    pub fn exclude_member(mut self, qualified: impl Into<String>) -> Self {
        self.exclusions.members.push(qualified.into());
        self
    }

    /// Excludes writes to `Type::field`.
    pub fn exclude_field(mut self, qualified: impl Into<String>) -> Self {
        self.exclusions.fields.push(qualified.into());
        self
    }
}

/// Source of the property name carried by events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyNamingConfig {
    /// The property name declared on the field (the field name by default).
    #[default]
    Declared,

    /// The name of the member performing the write.
    MemberName,
}

/// Collection write policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionPolicyConfig {
    /// Writes proceed silently.
    #[default]
    Ignore,

    /// Every write fires.
    NotifyOnReplace,

    /// Writes fire when the contents differ.
    NotifyOnChange,
}

/// Dispatch configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DispatchConfig {
    /// Contain panicking listeners instead of unwinding into the writer.
    #[serde(default = "default_catch_panics")]
    pub catch_panics: bool,
}

fn default_catch_panics() -> bool {
    true
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            catch_panics: default_catch_panics(),
        }
    }
}

/// Exclusions by name.
///
/// Members and fields are written `Type::name`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct ExclusionConfig {
    #[serde(default)]
    pub types: Vec<String>,

    #[serde(default)]
    pub members: Vec<String>,

    #[serde(default)]
    pub fields: Vec<String>,
}

impl ExclusionConfig {
    pub fn excludes_type(&self, type_name: &str) -> bool {
        self.types.iter().any(|t| t == type_name)
    }

    pub fn excludes_member(&self, type_name: &str, member: &str) -> bool {
        self.members
            .iter()
            .filter_map(|m| split_qualified(m))
            .any(|(t, m)| t == type_name && m == member)
    }

    pub fn excludes_field(&self, type_name: &str, field: &str) -> bool {
        self.fields
            .iter()
            .filter_map(|f| split_qualified(f))
            .any(|(t, f)| t == type_name && f == field)
    }

    /// Rejects empty names, non-identifiers and unqualified member or field
    /// entries.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for t in &self.types {
            if !is_identifier(t) {
                return Err(ConfigError::Invalid(format!(
                    "excluded type `{}` is not a type name",
                    t
                )));
            }
        }
        for (kind, entries) in [("member", &self.members), ("field", &self.fields)] {
            for entry in entries {
                match split_qualified(entry) {
                    Some((t, n)) if is_identifier(t) && is_identifier(n) => {}
                    _ => {
                        return Err(ConfigError::Invalid(format!(
                            "excluded {} `{}` must be written as Type::{}",
                            kind, entry, kind
                        )))
                    }
                }
            }
        }
        Ok(())
    }
}

fn split_qualified(s: &str) -> Option<(&str, &str)> {
    let (type_name, name) = s.split_once("::")?;
    Some((type_name.trim(), name.trim()))
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c.is_alphanumeric())
}
