//! Response producers: resumable units that yield the envelopes of one
//! operation.

use crate::envelope::ResponseEnvelope;
use crate::operation::OperationContext;
use async_trait::async_trait;
use futures::stream::{self, Stream};
use std::sync::Arc;

/// Yields the envelopes of one operation, one per invocation.
///
/// `None` is terminal: once a producer returns it, every later call returns
/// it too. Taking `&mut self` keeps invocations of one producer sequential.
#[async_trait]
pub trait ResponseProducer: Send {
    async fn next(&mut self, ctx: &OperationContext) -> Option<ResponseEnvelope>;
}

/// A boxed producer.
pub type BoxProducer = Box<dyn ResponseProducer>;

#[async_trait]
impl<P: ResponseProducer + ?Sized> ResponseProducer for Box<P> {
    async fn next(&mut self, ctx: &OperationContext) -> Option<ResponseEnvelope> {
        (**self).next(ctx).await
    }
}

/// Producer that yields a prepared envelope once.
#[derive(Debug, Clone)]
pub struct OneShot {
    envelope: Option<ResponseEnvelope>,
}

impl OneShot {
    pub fn new(envelope: ResponseEnvelope) -> Self {
        Self {
            envelope: Some(envelope),
        }
    }

    /// A producer whose only envelope carries a single error.
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(ResponseEnvelope::error(message))
    }
}

#[async_trait]
impl ResponseProducer for OneShot {
    async fn next(&mut self, _ctx: &OperationContext) -> Option<ResponseEnvelope> {
        self.envelope.take()
    }
}

/// Host-side helpers for driving a producer.
#[async_trait]
pub trait ResponseProducerExt: ResponseProducer {
    /// Invokes the producer until it is terminal.
    async fn collect_all(&mut self, ctx: &OperationContext) -> Vec<ResponseEnvelope> {
        let mut envelopes = Vec::new();
        while let Some(envelope) = self.next(ctx).await {
            envelopes.push(envelope);
        }
        envelopes
    }
}

impl<P: ResponseProducer + ?Sized> ResponseProducerExt for P {}

/// Adapts a producer into a stream that ends at terminal.
pub fn into_stream<P>(producer: P, ctx: Arc<OperationContext>) -> impl Stream<Item = ResponseEnvelope>
where
    P: ResponseProducer,
{
    stream::unfold(Some((producer, ctx)), |state| async move {
        let (mut producer, ctx) = state?;
        let envelope = producer.next(&ctx).await?;
        Some((envelope, Some((producer, ctx))))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::OperationKind;
    use futures::StreamExt;

    fn op() -> OperationContext {
        OperationContext::new(OperationKind::Mutation, "mutation { name }")
    }

    #[tokio::test]
    async fn test_one_shot_is_idempotent() {
        let ctx = op();
        let mut producer = OneShot::error("mutations are not supported");

        let first = producer.next(&ctx).await.unwrap();
        assert_eq!(first.errors.len(), 1);
        assert!(producer.next(&ctx).await.is_none());
        assert!(producer.next(&ctx).await.is_none());
    }

    #[tokio::test]
    async fn test_collect_all_through_box() {
        let ctx = op();
        let mut producer: BoxProducer = Box::new(OneShot::new(ResponseEnvelope::new("{}")));

        let envelopes = producer.collect_all(&ctx).await;
        assert_eq!(envelopes, vec![ResponseEnvelope::new("{}")]);
    }

    #[tokio::test]
    async fn test_into_stream_ends_at_terminal() {
        let ctx = Arc::new(op());
        let stream = into_stream(OneShot::error("nope"), ctx);

        let envelopes: Vec<_> = stream.collect().await;
        assert_eq!(envelopes.len(), 1);
        assert_eq!(envelopes[0].errors[0].message, "nope");
    }
}
