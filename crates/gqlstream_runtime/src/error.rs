//! Error types for the delivery engine.
//!
//! Nothing here ever escapes a producer as a failure: resolver errors are
//! folded into [`ErrorEntry`](crate::envelope::ErrorEntry) values and trigger
//! errors are diagnostics for whoever drives the operation.

use crate::trigger::TriggerKind;
use std::time::Duration;
use thiserror::Error;

/// A trigger could not be handed to a producer.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerError {
    /// No producer was suspended on the channel within the bounded wait.
    #[error("no active consumer for {kind} trigger after {waited:?}")]
    NoActiveConsumer {
        /// The trigger that was dropped.
        kind: TriggerKind,
        /// How long the sender waited.
        waited: Duration,
    },
}

impl TriggerError {
    /// Returns the trigger kind that failed to deliver.
    pub fn kind(&self) -> TriggerKind {
        match self {
            Self::NoActiveConsumer { kind, .. } => *kind,
        }
    }
}

/// Error returned by a resolution step.
#[derive(Error, Debug)]
pub enum ResolverError {
    /// A plain resolver failure.
    #[error("{0}")]
    Message(String),

    /// The resolved value could not be serialized into a payload.
    #[error("failed to serialize resolved value: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl ResolverError {
    /// Creates a message error.
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }
}
