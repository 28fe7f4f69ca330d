//! The capability set a host dispatcher sees.

use crate::operation::OperationContext;
use crate::producer::BoxProducer;
use crate::schema::SchemaDescriptor;
use serde_json::{Map, Value};

/// An executable schema: entry point, static metadata, and complexity scoring.
pub trait ExecutableSchema: Send + Sync {
    /// Builds the producer that delivers `ctx`.
    fn execute(&self, ctx: &OperationContext) -> BoxProducer;

    /// Static type and field metadata.
    fn schema(&self) -> &SchemaDescriptor;

    /// Scores one field. `None` means the schema does not handle this field
    /// and the host should fall back to its own scoring.
    fn complexity(
        &self,
        type_name: &str,
        field_name: &str,
        child_complexity: u32,
        arguments: &Map<String, Value>,
    ) -> Option<u32>;
}
