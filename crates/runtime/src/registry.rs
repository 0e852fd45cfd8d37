//! Tool registry: discovery and schema translation.
//!
//! Descriptors are fetched once per session and cached; a changed server
//! tool set is only picked up by reconnecting.

use crate::model::ToolSpec;
use crate::schema::SchemaNode;
use crate::{Error, Result};
use mcp::Channel;
use tracing::info;

/// One discovered tool, with its input schema already validated.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub schema: SchemaNode,
}

impl ToolDescriptor {
    /// Validate a wire tool into a descriptor. Malformed input schemas are
    /// rejected here, at fetch time.
    pub fn from_wire(tool: mcp::Tool) -> Result<Self> {
        let schema = SchemaNode::parse(&tool.input_schema).map_err(|source| Error::Schema {
            tool: tool.name.clone(),
            source,
        })?;
        Ok(Self {
            name: tool.name,
            description: tool.description.unwrap_or_default(),
            schema,
        })
    }

    /// Translate into the provider's function-calling shape.
    ///
    /// Pure and deterministic: name and description pass through, the
    /// schema serializes with stable key order.
    pub fn to_spec(&self) -> ToolSpec {
        ToolSpec {
            name: self.name.clone(),
            description: self.description.clone(),
            schema: self.schema.to_value(),
        }
    }
}

/// Fetch and validate the server's tool set.
pub async fn discover(channel: &Channel) -> Result<Vec<ToolDescriptor>> {
    let descriptors = channel
        .list_tools()
        .await?
        .into_iter()
        .map(ToolDescriptor::from_wire)
        .collect::<Result<Vec<_>>>()?;
    info!(
        tools = %descriptors
            .iter()
            .map(|d| d.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        "discovered tool registry"
    );
    Ok(descriptors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn alerts_tool() -> mcp::Tool {
        mcp::Tool {
            name: "get_alerts".into(),
            description: Some("Fetch active weather alerts for a US state".into()),
            input_schema: json!({
                "type": "object",
                "properties": { "state": { "type": "string" } },
                "required": ["state"]
            }),
        }
    }

    #[test]
    fn descriptor_passes_name_and_description_through() {
        let descriptor = ToolDescriptor::from_wire(alerts_tool()).unwrap();
        assert_eq!(descriptor.name, "get_alerts");
        assert_eq!(
            descriptor.description,
            "Fetch active weather alerts for a US state"
        );
    }

    #[test]
    fn missing_description_becomes_empty() {
        let mut tool = alerts_tool();
        tool.description = None;
        let descriptor = ToolDescriptor::from_wire(tool).unwrap();
        assert_eq!(descriptor.description, "");
    }

    #[test]
    fn malformed_schema_is_rejected_at_fetch() {
        let mut tool = alerts_tool();
        tool.input_schema = json!({ "type": "mystery" });
        let err = ToolDescriptor::from_wire(tool).unwrap_err();
        assert!(matches!(err, Error::Schema { ref tool, .. } if tool == "get_alerts"));
    }

    #[test]
    fn to_spec_is_pure() {
        let descriptor = ToolDescriptor::from_wire(alerts_tool()).unwrap();
        let first = descriptor.to_spec();
        let second = descriptor.to_spec();
        assert_eq!(first, second);
        assert_eq!(first.schema, second.schema);
    }
}
