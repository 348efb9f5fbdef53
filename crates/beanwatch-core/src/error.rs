//! Error types for beanwatch

use thiserror::Error;

/// Error returned by a listener from `property_change`.
///
/// Listener errors never fail the write that triggered the event; the
/// dispatcher logs them and moves on to the next listener.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ListenerError {
    /// The listener could not handle the event
    #[error("{0}")]
    Failed(String),
}

impl ListenerError {
    pub fn failed(message: impl Into<String>) -> Self {
        ListenerError::Failed(message.into())
    }
}
