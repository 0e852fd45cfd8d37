//! Typed tool input schemas.
//!
//! Tool servers describe their inputs with JSON Schema. Instead of
//! forwarding those blobs to the provider untouched, they are parsed into
//! this closed node tree when the registry is fetched, so a malformed
//! schema fails the connect instead of surfacing later as an opaque
//! provider error. Re-serialization via [`SchemaNode::to_value`] is pure:
//! the same node always yields a structurally identical JSON value.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("schema is not a JSON object")]
    NotAnObject,

    #[error("missing \"type\"")]
    MissingType,

    #[error("unsupported type \"{0}\"")]
    Unsupported(String),

    #[error("{0}")]
    Malformed(String),

    #[error("property \"{name}\": {source}")]
    Property {
        name: String,
        #[source]
        source: Box<SchemaError>,
    },
}

/// One schema node: shared annotations plus the type-specific shape.
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaNode {
    pub title: Option<String>,
    pub description: Option<String>,
    pub kind: SchemaKind,
}

/// The closed set of schema shapes we accept from tool servers.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaKind {
    String,
    Number,
    Integer,
    Boolean,
    Object {
        properties: BTreeMap<String, SchemaNode>,
        required: Vec<String>,
    },
    Array {
        items: Option<Box<SchemaNode>>,
    },
}

impl SchemaKind {
    fn type_name(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Integer => "integer",
            Self::Boolean => "boolean",
            Self::Object { .. } => "object",
            Self::Array { .. } => "array",
        }
    }
}

impl SchemaNode {
    /// Parse and validate a JSON Schema value.
    ///
    /// Annotation keywords beyond `title`/`description` are dropped; the
    /// structural keywords must be well-formed or the whole schema is
    /// rejected.
    pub fn parse(value: &Value) -> Result<Self, SchemaError> {
        let obj = value.as_object().ok_or(SchemaError::NotAnObject)?;

        let type_tag = obj
            .get("type")
            .ok_or(SchemaError::MissingType)?
            .as_str()
            .ok_or_else(|| SchemaError::Malformed("\"type\" must be a string".into()))?;

        let kind = match type_tag {
            "string" => SchemaKind::String,
            "number" => SchemaKind::Number,
            "integer" => SchemaKind::Integer,
            "boolean" => SchemaKind::Boolean,
            "object" => Self::parse_object(obj)?,
            "array" => Self::parse_array(obj)?,
            other => return Err(SchemaError::Unsupported(other.to_string())),
        };

        Ok(Self {
            title: string_field(obj, "title"),
            description: string_field(obj, "description"),
            kind,
        })
    }

    fn parse_object(obj: &Map<String, Value>) -> Result<SchemaKind, SchemaError> {
        let mut properties = BTreeMap::new();
        if let Some(props) = obj.get("properties") {
            let props = props.as_object().ok_or_else(|| {
                SchemaError::Malformed("\"properties\" must be an object".into())
            })?;
            for (name, prop) in props {
                let node = Self::parse(prop).map_err(|source| SchemaError::Property {
                    name: name.clone(),
                    source: Box::new(source),
                })?;
                properties.insert(name.clone(), node);
            }
        }

        let mut required = Vec::new();
        if let Some(value) = obj.get("required") {
            let entries = value.as_array().ok_or_else(|| {
                SchemaError::Malformed("\"required\" must be an array".into())
            })?;
            for entry in entries {
                let name = entry.as_str().ok_or_else(|| {
                    SchemaError::Malformed("\"required\" entries must be strings".into())
                })?;
                required.push(name.to_string());
            }
        }

        Ok(SchemaKind::Object {
            properties,
            required,
        })
    }

    fn parse_array(obj: &Map<String, Value>) -> Result<SchemaKind, SchemaError> {
        let items = match obj.get("items") {
            Some(value) => Some(Box::new(Self::parse(value)?)),
            None => None,
        };
        Ok(SchemaKind::Array { items })
    }

    /// Serialize back to JSON Schema. Key order is stable, so equal nodes
    /// always produce identical values.
    pub fn to_value(&self) -> Value {
        let mut out = Map::new();
        out.insert("type".into(), Value::String(self.kind.type_name().into()));
        if let Some(title) = &self.title {
            out.insert("title".into(), Value::String(title.clone()));
        }
        if let Some(description) = &self.description {
            out.insert("description".into(), Value::String(description.clone()));
        }
        match &self.kind {
            SchemaKind::Object {
                properties,
                required,
            } => {
                let props: Map<String, Value> = properties
                    .iter()
                    .map(|(name, node)| (name.clone(), node.to_value()))
                    .collect();
                out.insert("properties".into(), Value::Object(props));
                if !required.is_empty() {
                    out.insert(
                        "required".into(),
                        Value::Array(
                            required
                                .iter()
                                .map(|name| Value::String(name.clone()))
                                .collect(),
                        ),
                    );
                }
            }
            SchemaKind::Array { items: Some(items) } => {
                out.insert("items".into(), items.to_value());
            }
            _ => {}
        }
        Value::Object(out)
    }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(str::to_string)
}
