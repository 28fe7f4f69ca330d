//! Schemas served by the test servers.

use gqlstream_runtime::schema::{FieldDef, ObjectDef, SchemaBuilder, SchemaDescriptor, TypeRef};

/// ```graphql
/// type Query { name: String!  find(id: Int!): String! }
/// type Mutation { name: String! }
/// type Subscription { name: String! }
/// ```
pub fn default_schema() -> SchemaDescriptor {
    SchemaBuilder::new()
        .query(
            ObjectDef::new("Query")
                .field(name_field())
                .field(
                    FieldDef::new("find", TypeRef::named("String"))
                        .argument("id", TypeRef::named("Int")),
                ),
        )
        .mutation(ObjectDef::new("Mutation").field(name_field()))
        .subscription(ObjectDef::new("Subscription").field(name_field()))
        .build()
}

/// ```graphql
/// type Query { name: String! }
/// ```
pub fn error_schema() -> SchemaDescriptor {
    SchemaBuilder::new()
        .query(ObjectDef::new("Query").field(name_field()))
        .build()
}

fn name_field() -> FieldDef {
    FieldDef::new("name", TypeRef::named("String"))
}
