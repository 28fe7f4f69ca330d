//! Subscription delivery: one envelope per continuation trigger.

use crate::envelope::ResponseEnvelope;
use crate::operation::OperationContext;
use crate::producer::ResponseProducer;
use crate::trigger::{TriggerChannel, Wake};
use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, trace};

/// Unbounded producer that emits `event` on every continuation trigger until
/// completed or cancelled.
#[derive(Debug)]
pub struct Streaming {
    triggers: TriggerChannel,
    event: Bytes,
    delivered: u64,
    done: bool,
}

impl Streaming {
    pub fn new(triggers: TriggerChannel, event: impl Into<Bytes>) -> Self {
        Self {
            triggers,
            event: event.into(),
            delivered: 0,
            done: false,
        }
    }

    /// Number of events emitted so far.
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub fn is_done(&self) -> bool {
        self.done
    }
}

#[async_trait]
impl ResponseProducer for Streaming {
    async fn next(&mut self, ctx: &OperationContext) -> Option<ResponseEnvelope> {
        if self.done {
            return None;
        }

        match self.triggers.wait(ctx).await {
            Wake::Continue => {
                self.delivered += 1;
                trace!(sequence = self.delivered, "emitting stream event");
                Some(ResponseEnvelope::new(self.event.clone()))
            }
            wake @ (Wake::Complete | Wake::Cancelled) => {
                debug!(delivered = self.delivered, ?wake, "stream closed");
                self.done = true;
                None
            }
        }
    }
}
