//! Delivery strategy selection.

use crate::config::EngineConfig;
use crate::field::{FieldContext, Resolver};
use crate::operation::{OperationContext, OperationKind};
use crate::producer::{BoxProducer, OneShot};
use crate::strategy::{Incremental, IncrementalParts, SingleShot, Streaming};
use crate::trigger::TriggerChannel;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Message for operation kinds the engine cannot deliver.
pub const UNSUPPORTED_OPERATION: &str = "unsupported GraphQL operation";

/// Message for every mutation.
pub const MUTATIONS_NOT_SUPPORTED: &str = "mutations are not supported";

/// Message for subscriptions when no event stream is bound.
pub const SUBSCRIPTIONS_NOT_SUPPORTED: &str = "subscriptions are not supported";

/// How an operation will be delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStrategy {
    SingleShot,
    Incremental,
    Streaming,
    /// A single error envelope with the given message.
    Rejected(&'static str),
}

#[derive(Debug, Clone)]
struct IncrementalBinding {
    triggers: TriggerChannel,
    parts: IncrementalParts,
}

#[derive(Debug, Clone)]
struct StreamingBinding {
    triggers: TriggerChannel,
    event: Bytes,
}

/// Picks a strategy for each operation and builds its producer.
///
/// Queries always have a single-shot resolution bound. Incremental delivery
/// and subscription streams are optional; without them `@defer` queries fall
/// back to single-shot and subscriptions are rejected.
pub struct DeliverySelector {
    config: EngineConfig,
    query_field: FieldContext,
    resolver: Arc<dyn Resolver>,
    incremental: Option<IncrementalBinding>,
    streaming: Option<StreamingBinding>,
}

impl DeliverySelector {
    /// Starts a selector whose queries resolve `field` with `resolver`.
    pub fn builder(field: FieldContext, resolver: Arc<dyn Resolver>) -> DeliverySelectorBuilder {
        DeliverySelectorBuilder {
            selector: Self {
                config: EngineConfig::default(),
                query_field: field,
                resolver,
                incremental: None,
                streaming: None,
            },
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Decides how `ctx` will be delivered.
    pub fn strategy_for(&self, ctx: &OperationContext) -> DeliveryStrategy {
        match ctx.kind() {
            OperationKind::Query
                if self.incremental.is_some()
                    && ctx.requests_incremental_delivery(&self.config.incremental_marker) =>
            {
                DeliveryStrategy::Incremental
            }
            OperationKind::Query => DeliveryStrategy::SingleShot,
            OperationKind::Mutation => DeliveryStrategy::Rejected(MUTATIONS_NOT_SUPPORTED),
            OperationKind::Subscription if self.streaming.is_some() => DeliveryStrategy::Streaming,
            OperationKind::Subscription => DeliveryStrategy::Rejected(SUBSCRIPTIONS_NOT_SUPPORTED),
            OperationKind::Other(_) => DeliveryStrategy::Rejected(UNSUPPORTED_OPERATION),
        }
    }

    /// Builds a fresh producer for `ctx`.
    pub fn select(&self, ctx: &OperationContext) -> BoxProducer {
        let strategy = self.strategy_for(ctx);
        debug!(operation = %ctx.kind(), ?strategy, "selected delivery strategy");

        match (strategy, &self.incremental, &self.streaming) {
            (DeliveryStrategy::Incremental, Some(binding), _) => Box::new(Incremental::new(
                binding.triggers.clone(),
                binding.parts.clone(),
            )),
            (DeliveryStrategy::Streaming, _, Some(binding)) => Box::new(Streaming::new(
                binding.triggers.clone(),
                binding.event.clone(),
            )),
            (DeliveryStrategy::Rejected(message), _, _) => Box::new(OneShot::error(message)),
            _ => Box::new(SingleShot::new(
                self.query_field.clone(),
                Arc::clone(&self.resolver),
            )),
        }
    }
}

impl fmt::Debug for DeliverySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeliverySelector")
            .field("config", &self.config)
            .field("query_field", &self.query_field)
            .field("incremental", &self.incremental.is_some())
            .field("streaming", &self.streaming.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for [`DeliverySelector`].
pub struct DeliverySelectorBuilder {
    selector: DeliverySelector,
}

impl DeliverySelectorBuilder {
    /// Sets the engine configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.selector.config = config;
        self
    }

    /// Delivers queries carrying the incremental marker in two parts.
    pub fn incremental(mut self, triggers: TriggerChannel, parts: IncrementalParts) -> Self {
        self.selector.incremental = Some(IncrementalBinding { triggers, parts });
        self
    }

    /// Streams `event` to subscriptions on every continuation trigger.
    pub fn streaming(mut self, triggers: TriggerChannel, event: impl Into<Bytes>) -> Self {
        self.selector.streaming = Some(StreamingBinding {
            triggers,
            event: event.into(),
        });
        self
    }

    pub fn build(self) -> DeliverySelector {
        self.selector
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{CollectedField, FnResolver};
    use crate::producer::ResponseProducerExt;
    use std::time::Duration;

    fn bare() -> DeliverySelector {
        DeliverySelector::builder(
            FieldContext::new("Query", CollectedField::new("name")),
            Arc::new(FnResolver::constant(serde_json::json!({"name": "test"}))),
        )
        .build()
    }

    fn full() -> DeliverySelector {
        let triggers = TriggerChannel::new(Duration::from_millis(10));
        DeliverySelector::builder(
            FieldContext::new("Query", CollectedField::new("name")),
            Arc::new(FnResolver::constant(serde_json::json!({"name": "test"}))),
        )
        .incremental(
            triggers.clone(),
            IncrementalParts::new(r#"{"name":null}"#, r#"{"name":"test"}"#),
        )
        .streaming(triggers, r#"{"name":"test"}"#)
        .build()
    }

    fn op(kind: OperationKind, query: &str) -> OperationContext {
        OperationContext::new(kind, query)
    }

    #[test]
    fn test_strategy_table() {
        let selector = full();

        assert_eq!(
            selector.strategy_for(&op(OperationKind::Query, "{ name }")),
            DeliveryStrategy::SingleShot
        );
        assert_eq!(
            selector.strategy_for(&op(OperationKind::Query, "{ ... @defer { name } }")),
            DeliveryStrategy::Incremental
        );
        assert_eq!(
            selector.strategy_for(&op(OperationKind::Mutation, "mutation { name }")),
            DeliveryStrategy::Rejected(MUTATIONS_NOT_SUPPORTED)
        );
        assert_eq!(
            selector.strategy_for(&op(OperationKind::Subscription, "subscription { name }")),
            DeliveryStrategy::Streaming
        );
        assert_eq!(
            selector.strategy_for(&op(OperationKind::parse("fragment"), "fragment F on Q { a }")),
            DeliveryStrategy::Rejected(UNSUPPORTED_OPERATION)
        );
    }

    #[test]
    fn test_unbound_strategies_fall_back() {
        let selector = bare();

        assert_eq!(
            selector.strategy_for(&op(OperationKind::Query, "{ ... @defer { name } }")),
            DeliveryStrategy::SingleShot
        );
        assert_eq!(
            selector.strategy_for(&op(OperationKind::Subscription, "subscription { name }")),
            DeliveryStrategy::Rejected(SUBSCRIPTIONS_NOT_SUPPORTED)
        );
    }

    #[test]
    fn test_custom_marker() {
        let triggers = TriggerChannel::new(Duration::from_millis(10));
        let selector = DeliverySelector::builder(
            FieldContext::new("Query", CollectedField::new("name")),
            Arc::new(FnResolver::constant(serde_json::Value::Null)),
        )
        .config(EngineConfig::new().with_incremental_marker("@stream"))
        .incremental(triggers, IncrementalParts::new("null", "null"))
        .build();

        assert_eq!(
            selector.strategy_for(&op(OperationKind::Query, "{ ... @defer { name } }")),
            DeliveryStrategy::SingleShot
        );
        assert_eq!(
            selector.strategy_for(&op(OperationKind::Query, "{ list @stream }")),
            DeliveryStrategy::Incremental
        );
    }

    #[tokio::test]
    async fn test_rejection_is_single_error_envelope() {
        let selector = bare();
        let ctx = op(OperationKind::Mutation, "mutation { name }");

        let envelopes = selector.select(&ctx).collect_all(&ctx).await;
        assert_eq!(envelopes.len(), 1);
        assert_eq!(envelopes[0].errors.len(), 1);
        assert_eq!(envelopes[0].errors[0].message, MUTATIONS_NOT_SUPPORTED);
        assert!(!envelopes[0].has_data());
    }

    #[tokio::test]
    async fn test_rejection_messages_on_the_wire() {
        let selector = bare();
        let cases = [
            (OperationKind::Subscription, "subscriptions are not supported"),
            (OperationKind::Mutation, "mutations are not supported"),
            (OperationKind::parse("fragment"), "unsupported GraphQL operation"),
        ];

        for (kind, message) in cases {
            let ctx = op(kind, "{ name }");
            let envelopes = selector.select(&ctx).collect_all(&ctx).await;
            let body: serde_json::Value =
                serde_json::from_slice(&envelopes[0].to_json().unwrap()).unwrap();
            assert_eq!(
                body,
                serde_json::json!({ "data": null, "errors": [{ "message": message }] })
            );
        }
    }
}
