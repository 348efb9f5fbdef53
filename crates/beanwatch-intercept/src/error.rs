//! Error types for interception setup.

use beanwatch_config::ConfigError;
use thiserror::Error;

/// Errors raised while building or installing interception rules.
///
/// These are setup-time errors: they are reported before any write is
/// accepted, never during a write.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid observing configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("an interceptor is already installed for this process")]
    AlreadyInstalled,
}
