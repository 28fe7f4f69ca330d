//! Static schema metadata exposed by an executable schema.
//!
//! The engine never mutates a descriptor; hosts read it for type and field
//! lookups and field contexts reference its field definitions.

use crate::operation::OperationKind;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Read-only type and field metadata of a schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub query_type: Option<String>,
    pub mutation_type: Option<String>,
    pub subscription_type: Option<String>,
    pub types: IndexMap<String, TypeDef>,
}

impl SchemaDescriptor {
    /// Gets a type by name.
    pub fn get_type(&self, name: &str) -> Option<&TypeDef> {
        self.types.get(name)
    }

    /// Returns all types.
    pub fn types(&self) -> impl Iterator<Item = (&String, &TypeDef)> {
        self.types.iter()
    }

    /// Gets an object type by name.
    pub fn object(&self, name: &str) -> Option<&ObjectDef> {
        match self.types.get(name)? {
            TypeDef::Object(object) => Some(object),
            TypeDef::Scalar(_) => None,
        }
    }

    /// Looks up a field declared on an object type.
    pub fn field(&self, type_name: &str, field_name: &str) -> Option<&FieldDef> {
        self.object(type_name)?.fields.get(field_name)
    }

    /// Returns the root type that serves the given operation kind.
    pub fn root_type(&self, kind: &OperationKind) -> Option<&ObjectDef> {
        let name = match kind {
            OperationKind::Query => self.query_type.as_deref(),
            OperationKind::Mutation => self.mutation_type.as_deref(),
            OperationKind::Subscription => self.subscription_type.as_deref(),
            OperationKind::Other(_) => None,
        }?;
        self.object(name)
    }
}

/// A type definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TypeDef {
    Scalar(ScalarDef),
    Object(ObjectDef),
}

impl TypeDef {
    pub fn name(&self) -> &str {
        match self {
            Self::Scalar(s) => &s.name,
            Self::Object(o) => &o.name,
        }
    }
}

/// Scalar type definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarDef {
    pub name: String,
    pub description: Option<String>,
}

/// Object type definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDef {
    pub name: String,
    pub description: Option<String>,
    pub fields: IndexMap<String, FieldDef>,
}

impl ObjectDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            fields: IndexMap::new(),
        }
    }

    /// Adds a field.
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }
}

/// Field definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub arguments: IndexMap<String, InputFieldDef>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            description: None,
            ty,
            arguments: IndexMap::new(),
        }
    }

    /// Adds an argument.
    pub fn argument(mut self, name: impl Into<String>, ty: TypeRef) -> Self {
        let name = name.into();
        self.arguments.insert(
            name.clone(),
            InputFieldDef {
                name,
                description: None,
                ty,
                default_value: None,
            },
        );
        self
    }
}

/// Input field definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputFieldDef {
    pub name: String,
    pub description: Option<String>,
    pub ty: TypeRef,
    pub default_value: Option<String>,
}

/// Type reference. Named types are non-null; `Option` marks nullability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TypeRef {
    Named(String),
    Option(Box<TypeRef>),
    List(Box<TypeRef>),
}

impl TypeRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    pub fn option(inner: TypeRef) -> Self {
        Self::Option(Box::new(inner))
    }

    pub fn list(inner: TypeRef) -> Self {
        Self::List(Box::new(inner))
    }

    /// Returns the innermost named type.
    pub fn base_name(&self) -> &str {
        match self {
            Self::Named(name) => name,
            Self::Option(inner) | Self::List(inner) => inner.base_name(),
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}!"),
            Self::List(inner) => write!(f, "[{inner}]!"),
            Self::Option(inner) => {
                let rendered = inner.to_string();
                f.write_str(rendered.strip_suffix('!').unwrap_or(&rendered))
            }
        }
    }
}

/// Schema builder.
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    schema: SchemaDescriptor,
}

impl SchemaBuilder {
    /// Creates a new schema builder.
    pub fn new() -> Self {
        let mut builder = Self::default();
        // Add built-in scalars
        for name in ["Int", "Float", "String", "Boolean", "ID"] {
            builder.schema.types.insert(
                name.to_string(),
                TypeDef::Scalar(ScalarDef {
                    name: name.to_string(),
                    description: Some(format!("Built-in {name} scalar")),
                }),
            );
        }
        builder
    }

    /// Adds `object` and makes it the query root.
    pub fn query(mut self, object: ObjectDef) -> Self {
        self.schema.query_type = Some(object.name.clone());
        self.add_type(TypeDef::Object(object))
    }

    /// Adds `object` and makes it the mutation root.
    pub fn mutation(mut self, object: ObjectDef) -> Self {
        self.schema.mutation_type = Some(object.name.clone());
        self.add_type(TypeDef::Object(object))
    }

    /// Adds `object` and makes it the subscription root.
    pub fn subscription(mut self, object: ObjectDef) -> Self {
        self.schema.subscription_type = Some(object.name.clone());
        self.add_type(TypeDef::Object(object))
    }

    /// Adds a type.
    pub fn add_type(mut self, type_def: TypeDef) -> Self {
        self.schema
            .types
            .insert(type_def.name().to_string(), type_def);
        self
    }

    /// Builds the schema.
    pub fn build(self) -> SchemaDescriptor {
        self.schema
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> SchemaDescriptor {
        SchemaBuilder::new()
            .query(
                ObjectDef::new("Query")
                    .field(FieldDef::new("name", TypeRef::named("String")))
                    .field(
                        FieldDef::new("find", TypeRef::named("String"))
                            .argument("id", TypeRef::named("Int")),
                    ),
            )
            .subscription(
                ObjectDef::new("Subscription")
                    .field(FieldDef::new("name", TypeRef::named("String"))),
            )
            .build()
    }

    #[test]
    fn test_schema_builder() {
        let schema = schema();

        assert_eq!(schema.query_type, Some("Query".to_string()));
        assert_eq!(schema.mutation_type, None);
        assert!(matches!(schema.get_type("Int"), Some(TypeDef::Scalar(_))));
        assert!(schema.object("Int").is_none());
    }

    #[test]
    fn test_field_lookup() {
        let schema = schema();

        let find = schema.field("Query", "find").unwrap();
        assert_eq!(find.arguments["id"].ty, TypeRef::named("Int"));
        assert!(schema.field("Query", "missing").is_none());
        assert!(schema.field("Nope", "name").is_none());
    }

    #[test]
    fn test_root_type() {
        let schema = schema();

        assert_eq!(
            schema.root_type(&OperationKind::Subscription).map(|o| o.name.as_str()),
            Some("Subscription")
        );
        assert!(schema.root_type(&OperationKind::Mutation).is_none());
        assert!(schema
            .root_type(&OperationKind::Other("fragment".into()))
            .is_none());
    }

    #[test]
    fn test_type_ref_display() {
        assert_eq!(TypeRef::named("String").to_string(), "String!");
        assert_eq!(TypeRef::option(TypeRef::named("String")).to_string(), "String");
        assert_eq!(
            TypeRef::option(TypeRef::list(TypeRef::named("Int"))).to_string(),
            "[Int!]"
        );
        assert_eq!(TypeRef::list(TypeRef::named("Int")).base_name(), "Int");
    }
}
