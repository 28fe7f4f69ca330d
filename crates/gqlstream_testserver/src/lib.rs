//! Test server for the gqlstream delivery engine.
//!
//! Serves a tiny fixed schema without any generated code so hosts and
//! transports can be tested against every delivery strategy. Incremental and
//! subscription responses are paced by hand through [`TestServer::send_continue`]
//! and [`TestServer::send_complete`], which give up after the configured
//! trigger timeout instead of blocking when nothing is listening.
//!
//! ```ignore
//! let server = TestServer::new();
//! let ctx = OperationContext::new(OperationKind::Subscription, "subscription { name }");
//! let mut producer = server.execute(&ctx);
//!
//! tokio::spawn(async move { server.send_continue().await });
//! let event = producer.next(&ctx).await;
//! ```

pub mod schema;

use gqlstream_runtime::{
    BoxProducer, CollectedField, DeliverySelector, DeliveryStrategy, EngineConfig,
    ExecutableSchema, FieldContext, FnResolver, IncrementalParts, OperationContext,
    SchemaDescriptor, TriggerChannel, TriggerError,
};
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Payload of the resolved `name` field.
pub const NAME_RESOLVED: &str = r#"{"name":"test"}"#;

/// Placeholder sent as the first part of a deferred `name`.
pub const NAME_PENDING: &str = r#"{"name":null}"#;

/// Error recorded by the error server's query resolver.
pub const RESOLVER_ERROR: &str = "resolver error";

/// An executable schema with hand-paced incremental and streaming delivery.
pub struct TestServer {
    selector: DeliverySelector,
    schema: SchemaDescriptor,
    triggers: TriggerChannel,
    complexity: AtomicU32,
}

impl Default for TestServer {
    fn default() -> Self {
        Self::new()
    }
}

impl TestServer {
    /// Creates the default server.
    ///
    /// Queries resolve `name` to `"test"`, `@defer` queries arrive in two
    /// parts, subscriptions emit one `name` event per continuation trigger.
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        let schema = schema::default_schema();
        let triggers = TriggerChannel::from_config(&config);
        let selector = DeliverySelector::builder(
            name_field(&schema),
            Arc::new(FnResolver::constant(json!({ "name": "test" }))),
        )
        .config(config)
        .incremental(
            triggers.clone(),
            IncrementalParts::new(NAME_PENDING, NAME_RESOLVED),
        )
        .streaming(triggers.clone(), NAME_RESOLVED)
        .build();

        Self {
            selector,
            schema,
            triggers,
            complexity: AtomicU32::new(0),
        }
    }

    /// Creates a server whose query resolver always records an error.
    ///
    /// Queries yield `null` data plus [`RESOLVER_ERROR`]; `@defer` is ignored
    /// and subscriptions are rejected.
    pub fn new_error() -> Self {
        Self::new_error_with_config(EngineConfig::default())
    }

    pub fn new_error_with_config(config: EngineConfig) -> Self {
        let schema = schema::error_schema();
        let triggers = TriggerChannel::from_config(&config);
        let resolver = FnResolver::new(|ctx| {
            ctx.add_error(RESOLVER_ERROR);
            Ok(Value::Null)
        });
        let selector = DeliverySelector::builder(name_field(&schema), Arc::new(resolver))
            .config(config)
            .build();

        Self {
            selector,
            schema,
            triggers,
            complexity: AtomicU32::new(0),
        }
    }

    /// Releases the next incremental part or subscription event.
    pub async fn send_continue(&self) -> Result<(), TriggerError> {
        self.triggers.send_continue().await
    }

    /// Closes the suspended incremental response or subscription.
    pub async fn send_complete(&self) -> Result<(), TriggerError> {
        self.triggers.send_complete().await
    }

    /// Sets the score returned for every field by [`ExecutableSchema::complexity`].
    pub fn set_calculated_complexity(&self, complexity: u32) {
        debug!(complexity, "calculated complexity updated");
        self.complexity.store(complexity, Ordering::Relaxed);
    }

    pub fn calculated_complexity(&self) -> u32 {
        self.complexity.load(Ordering::Relaxed)
    }

    /// Returns how `ctx` would be delivered.
    pub fn strategy_for(&self, ctx: &OperationContext) -> DeliveryStrategy {
        self.selector.strategy_for(ctx)
    }

    pub fn triggers(&self) -> &TriggerChannel {
        &self.triggers
    }
}

impl ExecutableSchema for TestServer {
    fn execute(&self, ctx: &OperationContext) -> BoxProducer {
        self.selector.select(ctx)
    }

    fn schema(&self) -> &SchemaDescriptor {
        &self.schema
    }

    fn complexity(
        &self,
        _type_name: &str,
        _field_name: &str,
        _child_complexity: u32,
        _arguments: &Map<String, Value>,
    ) -> Option<u32> {
        Some(self.calculated_complexity())
    }
}

fn name_field(schema: &SchemaDescriptor) -> FieldContext {
    let mut field = CollectedField::new("name");
    if let Some(definition) = schema.field("Query", "name") {
        field = field.with_definition(definition.clone());
    }
    FieldContext::new("Query", field)
}
