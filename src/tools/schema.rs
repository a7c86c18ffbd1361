//! Fluent JSON-Schema builder for tool input shapes.
//! Supports the leaf types string/number/integer/boolean, plus
//! array-of-primitive, object-with-properties, and string-enum.

use serde_json::{json, Value};

#[derive(Clone)]
enum LeafType {
    String,
    Number,
    Integer,
    Boolean,
    ArrayOf(Box<LeafType>),
    StringEnum(Vec<String>),
}

impl LeafType {
    fn to_schema(&self) -> Value {
        match self {
            LeafType::String => json!({ "type": "string" }),
            LeafType::Number => json!({ "type": "number" }),
            LeafType::Integer => json!({ "type": "integer" }),
            LeafType::Boolean => json!({ "type": "boolean" }),
            LeafType::ArrayOf(inner) => json!({ "type": "array", "items": inner.to_schema() }),
            LeafType::StringEnum(values) => json!({ "type": "string", "enum": values }),
        }
    }
}

/// Builds a JSON-Schema `object` with `properties` and `required`.
#[derive(Clone, Default)]
pub struct SchemaBuilder {
    properties: Vec<(String, LeafType)>,
    nested_objects: Vec<(String, Value)>,
    required: Vec<String>,
}

impl SchemaBuilder {
    pub fn object() -> Self {
        Self::default()
    }

    fn push(mut self, name: &str, leaf: LeafType, required: bool) -> Self {
        self.properties.push((name.to_string(), leaf));
        if required {
            self.required.push(name.to_string());
        }
        self
    }

    pub fn string(self, name: &str, required: bool) -> Self {
        self.push(name, LeafType::String, required)
    }

    pub fn number(self, name: &str, required: bool) -> Self {
        self.push(name, LeafType::Number, required)
    }

    pub fn integer(self, name: &str, required: bool) -> Self {
        self.push(name, LeafType::Integer, required)
    }

    pub fn boolean(self, name: &str, required: bool) -> Self {
        self.push(name, LeafType::Boolean, required)
    }

    pub fn array_of_string(self, name: &str, required: bool) -> Self {
        self.push(name, LeafType::ArrayOf(Box::new(LeafType::String)), required)
    }

    pub fn array_of_number(self, name: &str, required: bool) -> Self {
        self.push(name, LeafType::ArrayOf(Box::new(LeafType::Number)), required)
    }

    pub fn string_enum(self, name: &str, values: &[&str], required: bool) -> Self {
        self.push(name, LeafType::StringEnum(values.iter().map(|s| s.to_string()).collect()), required)
    }

    /// A nested object property, built from an already-constructed
    /// [`SchemaBuilder`].
    pub fn object_property(mut self, name: &str, nested: SchemaBuilder, required: bool) -> Self {
        if required {
            self.required.push(name.to_string());
        }
        self.nested_objects.push((name.to_string(), nested.build()));
        self
    }

    pub fn build(self) -> Value {
        let mut properties = serde_json::Map::new();
        for (name, leaf) in &self.properties {
            properties.insert(name.clone(), leaf.to_schema());
        }
        for (name, schema) in &self.nested_objects {
            properties.insert(name.clone(), schema.clone());
        }
        json!({
            "type": "object",
            "properties": Value::Object(properties),
            "required": self.required,
        })
    }
}
