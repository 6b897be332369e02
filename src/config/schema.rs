//! Declarative schemas for configuration records.
//!
//! Schemas are written as a JSON-Schema subset and parsed once into a
//! [`Schema`] tree. Parsing rejects anything it does not understand, so a
//! typo in a schema definition surfaces as a [`SchemaDefinitionError`] when the
//! schema is built rather than as a silently ignored constraint at validation
//! time.
//!
//! Supported keywords: `type`, `required`, `properties`,
//! `additionalProperties`, `items`, `enum`, `minimum`, `maximum`. The
//! annotation keywords `$schema`, `title`, `description` and `default` are
//! accepted and ignored by validation.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use super::violation::{join_path, Violation};

/// A schema definition that could not be understood.
///
/// This is a programming error in the schema text, never a problem with the
/// value being validated.
#[derive(Debug, thiserror::Error)]
pub enum SchemaDefinitionError {
    #[error("schema definition is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("schema at '{at}' must be a JSON object")]
    NotAnObject { at: String },

    #[error("unknown schema keyword '{keyword}' at '{at}'")]
    UnknownKeyword { at: String, keyword: String },

    #[error("unknown type '{name}' at '{at}'")]
    UnknownType { at: String, name: String },

    #[error("keyword '{keyword}' at '{at}' must be {expected}")]
    InvalidKeyword {
        at: String,
        keyword: String,
        expected: &'static str,
    },
}

/// Primitive JSON types a schema can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaType {
    Object,
    Array,
    String,
    Integer,
    Number,
    Boolean,
    Null,
}

impl SchemaType {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "object" => Some(Self::Object),
            "array" => Some(Self::Array),
            "string" => Some(Self::String),
            "integer" => Some(Self::Integer),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "null" => Some(Self::Null),
            _ => None,
        }
    }

    fn matches(self, value: &Value) -> bool {
        match self {
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
            Self::String => value.is_string(),
            // Whole floats such as 3.0 are rejected: serde cannot read them into integer fields.
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Number => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::Null => value.is_null(),
        }
    }
}

impl fmt::Display for SchemaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Object => "object",
            Self::Array => "array",
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Null => "null",
        };
        f.write_str(name)
    }
}

/// How an object schema treats keys it does not list in `properties`.
#[derive(Debug, Clone, Default)]
pub enum AdditionalProperties {
    #[default]
    Allowed,
    Denied,
    Schema(Box<Schema>),
}

/// An immutable, parsed schema.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    title: Option<String>,
    kind: Option<SchemaType>,
    required: Vec<String>,
    properties: BTreeMap<String, Schema>,
    additional: AdditionalProperties,
    items: Option<Box<Schema>>,
    allowed: Option<Vec<Value>>,
    minimum: Option<f64>,
    maximum: Option<f64>,
}

impl Schema {
    /// Parses a schema from its JSON text.
    pub fn from_json(text: &str) -> Result<Self, SchemaDefinitionError> {
        let value: Value = serde_json::from_str(text)?;
        Self::parse(&value)
    }

    /// Parses a schema from its JSON text, panicking on a malformed definition.
    ///
    /// Used for the schemas compiled into the crate, where a bad definition is
    /// a build defect.
    ///
    /// # Panics
    ///
    /// Panics if `text` is not a valid schema definition.
    pub fn must(text: &str) -> Self {
        match Self::from_json(text) {
            Ok(schema) => schema,
            Err(e) => panic!("invalid built-in schema definition: {e}"),
        }
    }

    /// Parses a schema from an already decoded JSON value.
    pub fn parse(value: &Value) -> Result<Self, SchemaDefinitionError> {
        Self::parse_at(value, "")
    }

    fn parse_at(value: &Value, at: &str) -> Result<Self, SchemaDefinitionError> {
        let object = value.as_object().ok_or_else(|| SchemaDefinitionError::NotAnObject {
            at: display_at(at),
        })?;

        let mut schema = Schema::default();
        for (keyword, body) in object {
            let here = join_path(at, keyword);
            match keyword.as_str() {
                "$schema" | "description" | "default" => {}
                "title" => {
                    schema.title = Some(expect_str(body, at, keyword)?.to_string());
                }
                "type" => {
                    let name = expect_str(body, at, keyword)?;
                    schema.kind = Some(SchemaType::parse(name).ok_or_else(|| {
                        SchemaDefinitionError::UnknownType {
                            at: display_at(at),
                            name: name.to_string(),
                        }
                    })?);
                }
                "required" => {
                    let entries = body
                        .as_array()
                        .ok_or_else(|| invalid(at, keyword, "an array of strings"))?;
                    for entry in entries {
                        let name = entry
                            .as_str()
                            .ok_or_else(|| invalid(at, keyword, "an array of strings"))?;
                        schema.required.push(name.to_string());
                    }
                }
                "properties" => {
                    let props = body.as_object().ok_or_else(|| invalid(at, keyword, "an object"))?;
                    for (name, sub) in props {
                        let sub_at = join_path(&here, name);
                        schema
                            .properties
                            .insert(name.clone(), Schema::parse_at(sub, &sub_at)?);
                    }
                }
                "additionalProperties" => {
                    schema.additional = match body {
                        Value::Bool(true) => AdditionalProperties::Allowed,
                        Value::Bool(false) => AdditionalProperties::Denied,
                        Value::Object(_) => {
                            AdditionalProperties::Schema(Box::new(Schema::parse_at(body, &here)?))
                        }
                        _ => return Err(invalid(at, keyword, "a boolean or a schema")),
                    };
                }
                "items" => {
                    schema.items = Some(Box::new(Schema::parse_at(body, &here)?));
                }
                "enum" => {
                    let values = body
                        .as_array()
                        .filter(|values| !values.is_empty())
                        .ok_or_else(|| invalid(at, keyword, "a non-empty array"))?;
                    schema.allowed = Some(values.clone());
                }
                "minimum" => {
                    let bound = body.as_f64().ok_or_else(|| invalid(at, keyword, "a number"))?;
                    schema.minimum = Some(bound);
                }
                "maximum" => {
                    let bound = body.as_f64().ok_or_else(|| invalid(at, keyword, "a number"))?;
                    schema.maximum = Some(bound);
                }
                other => {
                    return Err(SchemaDefinitionError::UnknownKeyword {
                        at: display_at(at),
                        keyword: other.to_string(),
                    })
                }
            }
        }
        Ok(schema)
    }

    /// Schema title, when the definition carries one.
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Validates `value`, returning every violation found.
    ///
    /// An empty list means the value conforms. The value is never modified.
    pub fn validate(&self, value: &Value) -> Vec<Violation> {
        let mut violations = Vec::new();
        self.check(value, "", &mut violations);
        violations
    }

    fn check(&self, value: &Value, path: &str, out: &mut Vec<Violation>) {
        if let Some(kind) = self.kind {
            if !kind.matches(value) {
                out.push(Violation::new(
                    path,
                    format!("expected {}, found {}", kind, type_name(value)),
                ));
                // Nested keywords assume the declared type.
                return;
            }
        }

        if let Some(allowed) = &self.allowed {
            if !allowed.contains(value) {
                out.push(Violation::new(
                    path,
                    format!("value {} is not one of {}", value, Value::Array(allowed.clone())),
                ));
            }
        }

        if let Some(n) = value.as_f64() {
            if let Some(min) = self.minimum {
                if n < min {
                    let message = format!("{} is less than minimum {}", value, min);
                    out.push(Violation::new(path, message));
                }
            }
            if let Some(max) = self.maximum {
                if n > max {
                    let message = format!("{} is greater than maximum {}", value, max);
                    out.push(Violation::new(path, message));
                }
            }
        }

        match value {
            Value::Object(fields) => self.check_object(fields, path, out),
            Value::Array(items) => {
                if let Some(item_schema) = &self.items {
                    for (i, item) in items.iter().enumerate() {
                        item_schema.check(item, &format!("{path}[{i}]"), out);
                    }
                }
            }
            _ => {}
        }
    }

    fn check_object(&self, fields: &Map<String, Value>, path: &str, out: &mut Vec<Violation>) {
        for name in &self.required {
            if !fields.contains_key(name) {
                out.push(Violation::new(join_path(path, name), "required field is missing"));
            }
        }

        for (name, field) in fields {
            let field_path = join_path(path, name);
            match self.properties.get(name) {
                Some(sub) => sub.check(field, &field_path, out),
                None => match &self.additional {
                    AdditionalProperties::Allowed => {}
                    AdditionalProperties::Denied => {
                        out.push(Violation::new(field_path, "unknown field"));
                    }
                    AdditionalProperties::Schema(sub) => sub.check(field, &field_path, out),
                },
            }
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn expect_str<'a>(
    body: &'a Value,
    at: &str,
    keyword: &str,
) -> Result<&'a str, SchemaDefinitionError> {
    body.as_str().ok_or_else(|| invalid(at, keyword, "a string"))
}

fn invalid(at: &str, keyword: &str, expected: &'static str) -> SchemaDefinitionError {
    SchemaDefinitionError::InvalidKeyword {
        at: display_at(at),
        keyword: keyword.to_string(),
        expected,
    }
}

fn display_at(at: &str) -> String {
    if at.is_empty() {
        "<root>".to_string()
    } else {
        at.to_string()
    }
}
