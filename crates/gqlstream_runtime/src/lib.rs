//! Response delivery engine for GraphQL.
//!
//! Turns one operation into a correctly sequenced series of response
//! envelopes:
//! - `operation`: Operation kind and context (cancellation, middleware)
//! - `field`: Field contexts, resolver scope and error side-channel
//! - `envelope`: Response envelopes and GraphQL errors
//! - `producer`: The resumable producer contract and host helpers
//! - `trigger`: Bounded-wait continue/complete rendezvous
//! - `strategy`: Single-shot, incremental (`@defer`) and streaming delivery
//! - `selector`: Strategy selection per operation
//! - `schema`: Static schema metadata
//! - `executable`: The capability set exposed to hosts
//! - `config`: Engine configuration

pub mod config;
pub mod envelope;
pub mod error;
pub mod executable;
pub mod field;
pub mod operation;
pub mod producer;
pub mod schema;
pub mod selector;
pub mod strategy;
pub mod trigger;

pub use config::{ConfigError, EngineConfig};
pub use envelope::{ErrorEntry, PathSegment, ResponseEnvelope};
pub use error::{ResolverError, TriggerError};
pub use executable::ExecutableSchema;
pub use field::{
    CollectedField, FieldContext, FnResolver, PassThrough, Resolver, ResolverContext,
    ResolverFuture, ResolverMiddleware, ResolverResult,
};
pub use operation::{OperationContext, OperationKind};
pub use producer::{into_stream, BoxProducer, OneShot, ResponseProducer, ResponseProducerExt};
pub use schema::{FieldDef, InputFieldDef, ObjectDef, SchemaBuilder, SchemaDescriptor, TypeDef, TypeRef};
pub use selector::{DeliverySelector, DeliverySelectorBuilder, DeliveryStrategy};
pub use strategy::{Incremental, IncrementalParts, IncrementalState, SingleShot, Streaming};
pub use trigger::{TriggerChannel, TriggerKind, Wake};

pub use tokio_util::sync::CancellationToken;
