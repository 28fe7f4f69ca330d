//! Field resolution scope.
//!
//! A [`ResolverContext`] is the value resolution code sees while a field is
//! being resolved. Pushing a [`FieldContext`] yields a child context; errors
//! recorded through [`ResolverContext::add_error`] are stamped with the path
//! of every field context on the stack at that moment.

use crate::envelope::{ErrorEntry, PathSegment};
use crate::error::ResolverError;
use crate::operation::OperationContext;
use crate::schema::FieldDef;
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};

/// A field as it was selected by the operation.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedField {
    /// Field name in the schema.
    pub name: String,
    /// Response key (the name unless aliased).
    pub alias: String,
    /// Declared definition, when the schema knows the field.
    pub definition: Option<FieldDef>,
}

impl CollectedField {
    /// Creates an un-aliased field.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            alias: name.clone(),
            name,
            definition: None,
        }
    }

    /// Sets the response alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    /// Attaches the declared definition.
    pub fn with_definition(mut self, definition: FieldDef) -> Self {
        self.definition = Some(definition);
        self
    }
}

/// Identifies the field currently being resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldContext {
    /// Name of the object type that owns the field.
    pub object: String,
    /// The selected field.
    pub field: CollectedField,
    /// Arguments passed to the field.
    pub arguments: Map<String, Value>,
}

impl FieldContext {
    pub fn new(object: impl Into<String>, field: CollectedField) -> Self {
        Self {
            object: object.into(),
            field,
            arguments: Map::new(),
        }
    }

    pub fn with_arguments(mut self, arguments: Map<String, Value>) -> Self {
        self.arguments = arguments;
        self
    }

    fn path_segment(&self) -> PathSegment {
        PathSegment::Field(self.field.alias.clone())
    }
}

/// Resolution scope handed to resolvers and middleware.
///
/// Child scopes created with [`with_field_context`](Self::with_field_context)
/// share the error list of their parent but not its field stack, so dropping
/// a child is all it takes to pop its field context.
#[derive(Clone)]
pub struct ResolverContext<'a> {
    operation: &'a OperationContext,
    fields: Vec<FieldContext>,
    errors: Arc<Mutex<Vec<ErrorEntry>>>,
}

impl<'a> ResolverContext<'a> {
    /// Creates a root scope with no active field.
    pub fn new(operation: &'a OperationContext) -> Self {
        Self {
            operation,
            fields: Vec::new(),
            errors: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn operation(&self) -> &'a OperationContext {
        self.operation
    }

    /// Returns a child scope with `field` pushed on the stack.
    pub fn with_field_context(&self, field: FieldContext) -> Self {
        let mut fields = self.fields.clone();
        fields.push(field);
        Self {
            operation: self.operation,
            fields,
            errors: Arc::clone(&self.errors),
        }
    }

    /// Returns the innermost field context.
    pub fn field_context(&self) -> Option<&FieldContext> {
        self.fields.last()
    }

    /// Returns the response path of the active field stack.
    pub fn path(&self) -> Vec<PathSegment> {
        self.fields.iter().map(FieldContext::path_segment).collect()
    }

    /// Records an error against the current path.
    pub fn add_error(&self, error: impl fmt::Display) {
        let entry = ErrorEntry::new(error.to_string()).with_path(self.path());
        self.errors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry);
    }

    /// Drains every error recorded through this scope or its children.
    pub fn take_errors(&self) -> Vec<ErrorEntry> {
        std::mem::take(&mut *self.errors.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl fmt::Debug for ResolverContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverContext")
            .field("operation", &self.operation.kind())
            .field("path", &self.path())
            .finish_non_exhaustive()
    }
}

/// Result type for resolvers.
pub type ResolverResult = Result<Value, ResolverError>;

/// Future type for async resolvers.
pub type ResolverFuture<'a> = Pin<Box<dyn Future<Output = ResolverResult> + Send + 'a>>;

/// A resolution step.
pub trait Resolver: Send + Sync {
    fn resolve<'a>(&'a self, ctx: &'a ResolverContext<'a>) -> ResolverFuture<'a>;
}

/// Wraps every resolution step of an operation.
pub trait ResolverMiddleware: Send + Sync {
    /// Runs `next` inside `ctx`, possibly observing or replacing its result.
    fn around<'a>(
        &'a self,
        ctx: &'a ResolverContext<'a>,
        next: &'a dyn Resolver,
    ) -> ResolverFuture<'a>;
}

/// Middleware that calls the resolver unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThrough;

impl ResolverMiddleware for PassThrough {
    fn around<'a>(
        &'a self,
        ctx: &'a ResolverContext<'a>,
        next: &'a dyn Resolver,
    ) -> ResolverFuture<'a> {
        next.resolve(ctx)
    }
}

/// A sync resolver function.
pub type SyncResolverFn = Arc<dyn Fn(&ResolverContext<'_>) -> ResolverResult + Send + Sync>;

/// A wrapper for sync resolver functions.
#[derive(Clone)]
pub struct FnResolver {
    func: SyncResolverFn,
}

impl FnResolver {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&ResolverContext<'_>) -> ResolverResult + Send + Sync + 'static,
    {
        Self { func: Arc::new(f) }
    }

    /// A resolver that always returns `value`.
    pub fn constant(value: Value) -> Self {
        Self::new(move |_| Ok(value.clone()))
    }
}

impl Resolver for FnResolver {
    fn resolve<'a>(&'a self, ctx: &'a ResolverContext<'a>) -> ResolverFuture<'a> {
        let result = (self.func)(ctx);
        Box::pin(async move { result })
    }
}

impl fmt::Debug for FnResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnResolver").finish_non_exhaustive()
    }
}
