//! Single-shot delivery: resolve once, emit one envelope.

use crate::envelope::ResponseEnvelope;
use crate::error::ResolverError;
use crate::field::{FieldContext, Resolver, ResolverContext};
use crate::operation::OperationContext;
use crate::producer::ResponseProducer;
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// Runs the bound resolver exactly once inside `field`'s scope.
///
/// Errors recorded during resolution travel with the data. A resolver that
/// fails outright produces a `null` payload and one error at the field path.
pub struct SingleShot {
    field: FieldContext,
    resolver: Arc<dyn Resolver>,
    ran: bool,
}

impl SingleShot {
    pub fn new(field: FieldContext, resolver: Arc<dyn Resolver>) -> Self {
        Self {
            field,
            resolver,
            ran: false,
        }
    }
}

#[async_trait]
impl ResponseProducer for SingleShot {
    async fn next(&mut self, ctx: &OperationContext) -> Option<ResponseEnvelope> {
        if self.ran {
            return None;
        }
        self.ran = true;

        let root = ResolverContext::new(ctx);
        let scope = root.with_field_context(self.field.clone());
        let resolved = ctx
            .resolver_middleware()
            .around(&scope, self.resolver.as_ref())
            .await
            .and_then(|value| serde_json::to_vec(&value).map_err(ResolverError::from));

        let payload = match resolved {
            Ok(bytes) => Bytes::from(bytes),
            Err(err) => {
                debug!(
                    object = %self.field.object,
                    field = %self.field.field.name,
                    error = %err,
                    "resolver failed"
                );
                scope.add_error(&err);
                Bytes::from_static(b"null")
            }
        };
        drop(scope);

        let envelope = ResponseEnvelope::new(payload).with_errors(root.take_errors());
        trace!(errors = envelope.errors.len(), "emitting single-shot envelope");
        Some(envelope)
    }
}

impl fmt::Debug for SingleShot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleShot")
            .field("field", &self.field)
            .field("ran", &self.ran)
            .finish_non_exhaustive()
    }
}
