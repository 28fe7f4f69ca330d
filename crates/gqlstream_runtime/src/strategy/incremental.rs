//! Incremental (`@defer`) delivery: a placeholder part followed by the
//! resolved part, each released by a continuation trigger.

use crate::envelope::ResponseEnvelope;
use crate::operation::OperationContext;
use crate::producer::ResponseProducer;
use crate::trigger::{TriggerChannel, Wake};
use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, trace};

/// Payloads of the two parts of an incremental response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncrementalParts {
    /// Sent first, with `hasNext: true`.
    pub placeholder: Bytes,
    /// Sent last, with `hasNext: false`.
    pub resolved: Bytes,
}

impl IncrementalParts {
    pub fn new(placeholder: impl Into<Bytes>, resolved: impl Into<Bytes>) -> Self {
        Self {
            placeholder: placeholder.into(),
            resolved: resolved.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncrementalState {
    AwaitingInitial,
    AwaitingFollowup,
    Done,
}

/// Two-part producer paced by a [`TriggerChannel`].
#[derive(Debug)]
pub struct Incremental {
    triggers: TriggerChannel,
    parts: IncrementalParts,
    state: IncrementalState,
}

impl Incremental {
    pub fn new(triggers: TriggerChannel, parts: IncrementalParts) -> Self {
        Self {
            triggers,
            parts,
            state: IncrementalState::AwaitingInitial,
        }
    }

    pub fn state(&self) -> IncrementalState {
        self.state
    }
}

#[async_trait]
impl ResponseProducer for Incremental {
    async fn next(&mut self, ctx: &OperationContext) -> Option<ResponseEnvelope> {
        if self.state == IncrementalState::Done {
            return None;
        }

        match self.triggers.wait(ctx).await {
            Wake::Cancelled => {
                debug!(state = ?self.state, "incremental delivery cancelled");
                self.state = IncrementalState::Done;
                None
            }
            Wake::Complete => {
                debug!(state = ?self.state, "incremental delivery closed");
                self.state = IncrementalState::Done;
                None
            }
            Wake::Continue => match self.state {
                IncrementalState::AwaitingInitial => {
                    self.state = IncrementalState::AwaitingFollowup;
                    trace!("emitting initial incremental part");
                    Some(ResponseEnvelope::new(self.parts.placeholder.clone()).with_has_next(true))
                }
                IncrementalState::AwaitingFollowup => {
                    self.state = IncrementalState::Done;
                    trace!("emitting final incremental part");
                    Some(ResponseEnvelope::new(self.parts.resolved.clone()).with_has_next(false))
                }
                IncrementalState::Done => None,
            },
        }
    }
}
