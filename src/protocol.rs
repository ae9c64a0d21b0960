//! MCP protocol data structures: the JSON-RPC envelope, tool descriptors and
//! result content items.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// MCP revision announced in the `initialize` reply.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// An incoming JSON-RPC message.
///
/// `jsonrpc` is tolerated when absent but must be `"2.0"` when present.
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

impl Request {
    /// Notifications carry no id and never receive a reply.
    pub fn is_notification(&self) -> bool {
        self.id.is_none() && self.method.starts_with("notifications/")
    }
}

/// An outgoing JSON-RPC reply. Exactly one of `result` and `error` is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorObject>,
}

impl Response {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: ErrorObject) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    pub code: i32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ErrorObject {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code: code.code(),
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// Error classes surfaced on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ParseError,
    InvalidRequest,
    MethodNotFound,
    InvalidParams,
    Internal,
    /// An input or capture call failed at the OS layer
    OperationFailed,
    /// The OS has not granted the monitoring entitlement
    PermissionDenied,
}

impl ErrorCode {
    pub const fn code(self) -> i32 {
        match self {
            ErrorCode::ParseError => -32700,
            ErrorCode::InvalidRequest => -32600,
            ErrorCode::MethodNotFound => -32601,
            ErrorCode::InvalidParams => -32602,
            ErrorCode::Internal => -32603,
            ErrorCode::OperationFailed => -32001,
            ErrorCode::PermissionDenied => -32002,
        }
    }
}

/// Immutable catalog entry returned by `tools/list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsListResult {
    pub tools: Vec<ToolDescriptor>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallToolParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// One item of a `tools/call` result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Content {
    Text { text: String },
    Json { json: Value },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolResult {
    pub content: Vec<Content>,
}

impl CallToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content::Text { text: text.into() }],
        }
    }

    /// A human-readable summary followed by a structured payload.
    pub fn text_and_json(text: impl Into<String>, json: Value) -> Self {
        Self {
            content: vec![Content::Text { text: text.into() }, Content::Json { json }],
        }
    }

    pub fn json_payload(&self) -> Option<&Value> {
        self.content.iter().find_map(|item| match item {
            Content::Json { json } => Some(json),
            Content::Text { .. } => None,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    #[serde(default)]
    pub protocol_version: Option<String>,
    #[serde(default)]
    pub capabilities: Option<Value>,
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: Capabilities,
    pub server_info: ServerInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct Capabilities {
    pub tools: ToolsCapability,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolsCapability {
    pub list_changed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_without_jsonrpc_field_parses() {
        let request: Request =
            serde_json::from_str(r#"{"id":3,"method":"tools/list"}"#).expect("Should parse");

        assert!(request.jsonrpc.is_none());
        assert_eq!(request.id, Some(json!(3)));
        assert!(request.params.is_none());
        assert!(!request.is_notification());
    }

    #[test]
    fn notification_has_no_id() {
        let request: Request =
            serde_json::from_str(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
                .expect("Should parse");

        assert!(request.is_notification());
    }

    #[test]
    fn error_response_omits_result() {
        let response = Response::failure(
            json!(9),
            ErrorObject::new(ErrorCode::MethodNotFound, "Unknown tool: nope"),
        );
        let json = serde_json::to_string(&response).expect("Should serialize");

        assert_eq!(
            json,
            r#"{"jsonrpc":"2.0","id":9,"error":{"code":-32601,"message":"Unknown tool: nope"}}"#
        );
    }

    #[test]
    fn content_items_are_tagged_by_type() {
        let result = CallToolResult::text_and_json("3 events", json!({"next_cursor": 3}));
        let value = serde_json::to_value(&result).expect("Should serialize");

        assert_eq!(value["content"][0], json!({"type": "text", "text": "3 events"}));
        assert_eq!(
            value["content"][1],
            json!({"type": "json", "json": {"next_cursor": 3}})
        );
        assert_eq!(result.json_payload(), Some(&json!({"next_cursor": 3})));
    }

    #[test]
    fn initialize_result_uses_camel_case() {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: Capabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: "input_mcp".to_string(),
                version: "0.1.0".to_string(),
            },
        };
        let value = serde_json::to_value(&result).expect("Should serialize");

        assert_eq!(value["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(value["capabilities"]["tools"]["listChanged"], false);
        assert_eq!(value["serverInfo"]["name"], "input_mcp");
    }
}
