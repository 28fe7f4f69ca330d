//! Operation context handed to the delivery engine.

use crate::field::{PassThrough, ResolverMiddleware};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

/// The kind of GraphQL operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
    /// An operation keyword the engine does not know how to deliver.
    Other(String),
}

impl OperationKind {
    /// Maps an operation keyword to its kind.
    pub fn parse(keyword: &str) -> Self {
        match keyword {
            "query" => Self::Query,
            "mutation" => Self::Mutation,
            "subscription" => Self::Subscription,
            other => Self::Other(other.to_string()),
        }
    }

    /// Returns the operation keyword.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Query => "query",
            Self::Mutation => "mutation",
            Self::Subscription => "subscription",
            Self::Other(keyword) => keyword,
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the engine knows about the operation being delivered.
///
/// Built once by the host and not mutated afterwards. Cloning shares the
/// cancellation token, so cancelling any clone cancels the operation.
#[derive(Clone)]
pub struct OperationContext {
    kind: OperationKind,
    raw_query: String,
    operation_name: Option<String>,
    variables: Map<String, Value>,
    cancellation: CancellationToken,
    resolver_middleware: Arc<dyn ResolverMiddleware>,
}

impl OperationContext {
    /// Creates a context for an operation of the given kind.
    pub fn new(kind: OperationKind, raw_query: impl Into<String>) -> Self {
        Self {
            kind,
            raw_query: raw_query.into(),
            operation_name: None,
            variables: Map::new(),
            cancellation: CancellationToken::new(),
            resolver_middleware: Arc::new(PassThrough),
        }
    }

    /// Sets the operation name.
    pub fn with_operation_name(mut self, name: impl Into<String>) -> Self {
        self.operation_name = Some(name.into());
        self
    }

    /// Sets the operation variables.
    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = variables;
        self
    }

    /// Ties the operation to an existing cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }

    /// Wraps every resolution step with the given middleware.
    pub fn with_resolver_middleware(mut self, middleware: Arc<dyn ResolverMiddleware>) -> Self {
        self.resolver_middleware = middleware;
        self
    }

    pub fn kind(&self) -> &OperationKind {
        &self.kind
    }

    pub fn raw_query(&self) -> &str {
        &self.raw_query
    }

    pub fn operation_name(&self) -> Option<&str> {
        self.operation_name.as_deref()
    }

    pub fn variables(&self) -> &Map<String, Value> {
        &self.variables
    }

    pub fn resolver_middleware(&self) -> &dyn ResolverMiddleware {
        self.resolver_middleware.as_ref()
    }

    /// Returns true if the raw query asks for incremental delivery.
    pub fn requests_incremental_delivery(&self, marker: &str) -> bool {
        self.raw_query.contains(marker)
    }

    /// Returns the token that cancels this operation.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancellation
    }

    /// Cancels the operation.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Resolves once the operation is cancelled.
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancellation.cancelled()
    }
}

impl fmt::Debug for OperationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationContext")
            .field("kind", &self.kind)
            .field("raw_query", &self.raw_query)
            .field("operation_name", &self.operation_name)
            .field("cancelled", &self.is_cancelled())
            .finish_non_exhaustive()
    }
}
