//! Tool catalog and dispatch
//!
//! [`Tool`] is the fixed, ordered catalog. [`ToolCall::parse`] turns a tool
//! name and its JSON arguments into a typed call, rejecting anything that
//! does not fit the schema before a handler runs, and [`ToolCall::execute`]
//! runs it against the [`Context`].

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

use crate::capture::{CaptureError, DeviceClass};
use crate::context::Context;
use crate::error::ToolError;
use crate::input::{Direction, PointerButton, SynthKey, SystemCommand};
use crate::protocol::{CallToolResult, ToolDescriptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    MouseMove,
    MouseClick,
    TypeText,
    MonitorScreenEvents,
    MonitorKeyboardEvents,
    MonitorMouseEvents,
    MouseDoubleClick,
    MouseScroll,
    MouseGetPosition,
    MouseDrag,
    MouseButtonControl,
    MouseMovePath,
    KeyControl,
    SystemCommand,
}

impl Tool {
    /// Catalog order, as returned by `tools/list`.
    pub const ALL: [Tool; 14] = [
        Tool::MouseMove,
        Tool::MouseClick,
        Tool::TypeText,
        Tool::MonitorScreenEvents,
        Tool::MonitorKeyboardEvents,
        Tool::MonitorMouseEvents,
        Tool::MouseDoubleClick,
        Tool::MouseScroll,
        Tool::MouseGetPosition,
        Tool::MouseDrag,
        Tool::MouseButtonControl,
        Tool::MouseMovePath,
        Tool::KeyControl,
        Tool::SystemCommand,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Tool::MouseMove => "mouse_move",
            Tool::MouseClick => "mouse_click",
            Tool::TypeText => "type_text",
            Tool::MonitorScreenEvents => "monitor_screen_events",
            Tool::MonitorKeyboardEvents => "monitor_keyboard_events",
            Tool::MonitorMouseEvents => "monitor_mouse_events",
            Tool::MouseDoubleClick => "mouse_double_click",
            Tool::MouseScroll => "mouse_scroll",
            Tool::MouseGetPosition => "mouse_get_position",
            Tool::MouseDrag => "mouse_drag",
            Tool::MouseButtonControl => "mouse_button_control",
            Tool::MouseMovePath => "mouse_move_path",
            Tool::KeyControl => "key_control",
            Tool::SystemCommand => "system_command",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tool| tool.name() == name)
    }

    pub fn description(self) -> &'static str {
        match self {
            Tool::MouseMove => "Move the mouse pointer to absolute screen coordinates",
            Tool::MouseClick => "Move the pointer to (x, y) and click a mouse button there",
            Tool::TypeText => "Type text as a sequence of key presses",
            Tool::MonitorScreenEvents => {
                "Capture one PNG frame of the primary display, returned as base64"
            }
            Tool::MonitorKeyboardEvents => {
                "Read keyboard events recorded after the given cursor"
            }
            Tool::MonitorMouseEvents => "Read mouse events recorded after the given cursor",
            Tool::MouseDoubleClick => "Move the pointer to (x, y) and double-click there",
            Tool::MouseScroll => "Scroll horizontally and/or vertically by whole lines",
            Tool::MouseGetPosition => "Report the current pointer position",
            Tool::MouseDrag => {
                "Press a button at the current position, move to the target and release"
            }
            Tool::MouseButtonControl => {
                "Press, release or click a mouse button at the current position"
            }
            Tool::MouseMovePath => {
                "Move the pointer through a list of points, pausing speed_ms between them"
            }
            Tool::KeyControl => "Press, release or click a single key",
            Tool::SystemCommand => "Send an editing shortcut such as copy or paste",
        }
    }

    pub fn input_schema(self) -> Value {
        let button = json!({
            "type": "string",
            "enum": ["left", "right", "middle"],
            "default": "left"
        });
        let cursor = json!({
            "type": "object",
            "properties": {
                "cursor": {
                    "type": "integer",
                    "minimum": 0,
                    "default": 0,
                    "description": "Sequence number of the last event already seen"
                },
                "reason": {"type": "string", "description": "Why the events are being read"}
            }
        });

        match self {
            Tool::MouseMove => json!({
                "type": "object",
                "properties": {
                    "x": {"type": "integer"},
                    "y": {"type": "integer"}
                },
                "required": ["x", "y"]
            }),
            Tool::MouseClick | Tool::MouseDoubleClick => json!({
                "type": "object",
                "properties": {
                    "x": {"type": "integer"},
                    "y": {"type": "integer"},
                    "button": button
                },
                "required": ["x", "y"]
            }),
            Tool::TypeText => json!({
                "type": "object",
                "properties": {"text": {"type": "string"}},
                "required": ["text"]
            }),
            Tool::MonitorScreenEvents => json!({
                "type": "object",
                "properties": {
                    "reason": {"type": "string", "description": "Why the screen is being captured"}
                }
            }),
            Tool::MonitorKeyboardEvents | Tool::MonitorMouseEvents => cursor,
            Tool::MouseScroll => json!({
                "type": "object",
                "properties": {
                    "lines_x": {"type": "integer", "default": 0},
                    "lines_y": {"type": "integer", "default": 0}
                }
            }),
            Tool::MouseGetPosition => json!({"type": "object", "properties": {}}),
            Tool::MouseDrag => json!({
                "type": "object",
                "properties": {
                    "target_x": {"type": "integer"},
                    "target_y": {"type": "integer"},
                    "button": button
                },
                "required": ["target_x", "target_y"]
            }),
            Tool::MouseButtonControl => json!({
                "type": "object",
                "properties": {
                    "button": {"type": "string", "enum": ["left", "right", "middle"]},
                    "direction": {"type": "string", "enum": ["press", "release", "click"]}
                },
                "required": ["button", "direction"]
            }),
            Tool::MouseMovePath => json!({
                "type": "object",
                "properties": {
                    "points": {
                        "type": "array",
                        "minItems": 1,
                        "items": {
                            "type": "object",
                            "properties": {
                                "x": {"type": "integer"},
                                "y": {"type": "integer"}
                            },
                            "required": ["x", "y"]
                        }
                    },
                    "speed_ms": {
                        "type": "integer",
                        "minimum": 0,
                        "maximum": MAX_PATH_PAUSE_MS,
                        "description": "Pause between consecutive points in milliseconds"
                    }
                },
                "required": ["points", "speed_ms"]
            }),
            Tool::KeyControl => json!({
                "type": "object",
                "properties": {
                    "key": {
                        "type": "string",
                        "description": "A key name such as enter, shift or f5, or a single character"
                    },
                    "direction": {"type": "string", "enum": ["press", "release", "click"]}
                },
                "required": ["key", "direction"]
            }),
            Tool::SystemCommand => json!({
                "type": "object",
                "properties": {
                    "command": {
                        "type": "string",
                        "enum": ["copy", "paste", "cut", "undo", "save", "select_all"]
                    }
                },
                "required": ["command"]
            }),
        }
    }

    pub fn descriptor(self) -> ToolDescriptor {
        ToolDescriptor {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: self.input_schema(),
        }
    }
}

/// Longest pause `mouse_move_path` accepts between two points.
pub const MAX_PATH_PAUSE_MS: u64 = 5_000;

/// The full catalog in stable order.
pub fn catalog() -> Vec<ToolDescriptor> {
    Tool::ALL.into_iter().map(Tool::descriptor).collect()
}

#[derive(Deserialize)]
struct PointArgs {
    x: i32,
    y: i32,
}

#[derive(Deserialize)]
struct ClickArgs {
    x: i32,
    y: i32,
    #[serde(default)]
    button: PointerButton,
}

#[derive(Deserialize)]
struct TextArgs {
    text: String,
}

#[derive(Deserialize)]
struct ScreenArgs {
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Deserialize)]
struct MonitorArgs {
    #[serde(default)]
    cursor: u64,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Deserialize)]
struct ScrollArgs {
    #[serde(default)]
    lines_x: i32,
    #[serde(default)]
    lines_y: i32,
}

#[derive(Deserialize)]
struct DragArgs {
    target_x: i32,
    target_y: i32,
    #[serde(default)]
    button: PointerButton,
}

#[derive(Deserialize)]
struct ButtonControlArgs {
    button: PointerButton,
    direction: Direction,
}

#[derive(Deserialize)]
struct PathPoint {
    x: i32,
    y: i32,
}

#[derive(Deserialize)]
struct PathArgs {
    points: Vec<PathPoint>,
    speed_ms: u64,
}

#[derive(Deserialize)]
struct KeyControlArgs {
    key: String,
    direction: Direction,
}

#[derive(Deserialize)]
struct SystemCommandArgs {
    command: SystemCommand,
}

/// A validated tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    MouseMove { x: i32, y: i32 },
    MouseClick { x: i32, y: i32, button: PointerButton },
    TypeText { text: String },
    MonitorScreen { reason: Option<String> },
    MonitorKeyboard { cursor: u64, reason: Option<String> },
    MonitorMouse { cursor: u64, reason: Option<String> },
    MouseDoubleClick { x: i32, y: i32, button: PointerButton },
    MouseScroll { lines_x: i32, lines_y: i32 },
    MouseGetPosition,
    MouseDrag { target_x: i32, target_y: i32, button: PointerButton },
    MouseButtonControl { button: PointerButton, direction: Direction },
    MouseMovePath { points: Vec<(i32, i32)>, speed_ms: u64 },
    KeyControl { key: SynthKey, direction: Direction },
    SystemCommand(SystemCommand),
}

impl ToolCall {
    /// Resolve `name` and validate `arguments` against its schema.
    ///
    /// Missing or `null` arguments are treated as an empty object. Anything
    /// else that is not an object is rejected, even for tools that take no
    /// arguments.
    pub fn parse(name: &str, arguments: Option<Value>) -> Result<Self, ToolError> {
        let tool = Tool::from_name(name).ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;
        let arguments = match arguments {
            None | Some(Value::Null) => json!({}),
            Some(value @ Value::Object(_)) => value,
            Some(other) => {
                return Err(ToolError::InvalidParams(format!(
                    "{}: arguments must be an object, got {}",
                    tool.name(),
                    json_type(&other)
                )))
            }
        };

        let call = match tool {
            Tool::MouseMove => {
                let PointArgs { x, y } = args(tool, arguments)?;
                ToolCall::MouseMove { x, y }
            }
            Tool::MouseClick => {
                let ClickArgs { x, y, button } = args(tool, arguments)?;
                ToolCall::MouseClick { x, y, button }
            }
            Tool::TypeText => {
                let TextArgs { text } = args(tool, arguments)?;
                ToolCall::TypeText { text }
            }
            Tool::MonitorScreenEvents => {
                let ScreenArgs { reason } = args(tool, arguments)?;
                ToolCall::MonitorScreen { reason }
            }
            Tool::MonitorKeyboardEvents => {
                let MonitorArgs { cursor, reason } = args(tool, arguments)?;
                ToolCall::MonitorKeyboard { cursor, reason }
            }
            Tool::MonitorMouseEvents => {
                let MonitorArgs { cursor, reason } = args(tool, arguments)?;
                ToolCall::MonitorMouse { cursor, reason }
            }
            Tool::MouseDoubleClick => {
                let ClickArgs { x, y, button } = args(tool, arguments)?;
                ToolCall::MouseDoubleClick { x, y, button }
            }
            Tool::MouseScroll => {
                let ScrollArgs { lines_x, lines_y } = args(tool, arguments)?;
                ToolCall::MouseScroll { lines_x, lines_y }
            }
            Tool::MouseGetPosition => ToolCall::MouseGetPosition,
            Tool::MouseDrag => {
                let DragArgs {
                    target_x,
                    target_y,
                    button,
                } = args(tool, arguments)?;
                ToolCall::MouseDrag {
                    target_x,
                    target_y,
                    button,
                }
            }
            Tool::MouseButtonControl => {
                let ButtonControlArgs { button, direction } = args(tool, arguments)?;
                ToolCall::MouseButtonControl { button, direction }
            }
            Tool::MouseMovePath => {
                let PathArgs { points, speed_ms } = args(tool, arguments)?;
                if points.is_empty() {
                    return Err(ToolError::InvalidParams(format!(
                        "{}: points must not be empty",
                        tool.name()
                    )));
                }
                if speed_ms > MAX_PATH_PAUSE_MS {
                    return Err(ToolError::InvalidParams(format!(
                        "{}: speed_ms must be at most {}",
                        tool.name(),
                        MAX_PATH_PAUSE_MS
                    )));
                }
                ToolCall::MouseMovePath {
                    points: points.into_iter().map(|p| (p.x, p.y)).collect(),
                    speed_ms,
                }
            }
            Tool::KeyControl => {
                let KeyControlArgs { key, direction } = args(tool, arguments)?;
                let key = SynthKey::parse(&key)
                    .map_err(|e| ToolError::InvalidParams(format!("{}: {}", tool.name(), e)))?;
                ToolCall::KeyControl { key, direction }
            }
            Tool::SystemCommand => {
                let SystemCommandArgs { command } = args(tool, arguments)?;
                ToolCall::SystemCommand(command)
            }
        };
        Ok(call)
    }

    pub fn tool(&self) -> Tool {
        match self {
            ToolCall::MouseMove { .. } => Tool::MouseMove,
            ToolCall::MouseClick { .. } => Tool::MouseClick,
            ToolCall::TypeText { .. } => Tool::TypeText,
            ToolCall::MonitorScreen { .. } => Tool::MonitorScreenEvents,
            ToolCall::MonitorKeyboard { .. } => Tool::MonitorKeyboardEvents,
            ToolCall::MonitorMouse { .. } => Tool::MonitorMouseEvents,
            ToolCall::MouseDoubleClick { .. } => Tool::MouseDoubleClick,
            ToolCall::MouseScroll { .. } => Tool::MouseScroll,
            ToolCall::MouseGetPosition => Tool::MouseGetPosition,
            ToolCall::MouseDrag { .. } => Tool::MouseDrag,
            ToolCall::MouseButtonControl { .. } => Tool::MouseButtonControl,
            ToolCall::MouseMovePath { .. } => Tool::MouseMovePath,
            ToolCall::KeyControl { .. } => Tool::KeyControl,
            ToolCall::SystemCommand(_) => Tool::SystemCommand,
        }
    }

    pub fn execute(self, ctx: &Context) -> Result<CallToolResult, ToolError> {
        match self {
            ToolCall::MouseMove { x, y } => {
                ctx.input.mouse_move(x, y)?;
                Ok(CallToolResult::text(format!("Mouse moved to ({}, {})", x, y)))
            }
            ToolCall::MouseClick { x, y, button } => {
                ctx.input.mouse_click(x, y, button)?;
                Ok(CallToolResult::text(format!(
                    "Clicked {} button at ({}, {})",
                    button, x, y
                )))
            }
            ToolCall::TypeText { text } => {
                let keys = ctx.input.type_text(&text)?;
                Ok(CallToolResult::text(format!("Typed {} keys", keys)))
            }
            ToolCall::MonitorScreen { reason } => {
                audit(Tool::MonitorScreenEvents, reason.as_deref());
                let frame = ctx.screen.capture()?;
                let payload = json!({
                    "event": {
                        "timestamp_micros": frame.timestamp_micros,
                        "kind": {
                            "type": "frame_captured",
                            "width": frame.width,
                            "height": frame.height,
                            "format": "png"
                        }
                    },
                    "image_base64": frame.base64(),
                    "width": frame.width,
                    "height": frame.height
                });
                Ok(CallToolResult::text_and_json(
                    format!("Captured {}x{} screen frame", frame.width, frame.height),
                    payload,
                ))
            }
            ToolCall::MonitorKeyboard { cursor, reason } => {
                audit(Tool::MonitorKeyboardEvents, reason.as_deref());
                let batch = ctx
                    .capture
                    .read_keyboard(cursor)
                    .map_err(|e| unavailable(DeviceClass::Keyboard, e))?;
                let summary = format!(
                    "{} keyboard events (next_cursor {})",
                    batch.events.len(),
                    batch.next_cursor
                );
                Ok(CallToolResult::text_and_json(summary, to_json(&batch)?))
            }
            ToolCall::MonitorMouse { cursor, reason } => {
                audit(Tool::MonitorMouseEvents, reason.as_deref());
                let batch = ctx
                    .capture
                    .read_mouse(cursor)
                    .map_err(|e| unavailable(DeviceClass::Mouse, e))?;
                let summary = format!(
                    "{} mouse events (next_cursor {})",
                    batch.events.len(),
                    batch.next_cursor
                );
                Ok(CallToolResult::text_and_json(summary, to_json(&batch)?))
            }
            ToolCall::MouseDoubleClick { x, y, button } => {
                ctx.input.mouse_double_click(x, y, button)?;
                Ok(CallToolResult::text(format!(
                    "Double-clicked {} button at ({}, {})",
                    button, x, y
                )))
            }
            ToolCall::MouseScroll { lines_x, lines_y } => {
                ctx.input.mouse_scroll(lines_x, lines_y)?;
                Ok(CallToolResult::text(format!(
                    "Scrolled ({}, {})",
                    lines_x, lines_y
                )))
            }
            ToolCall::MouseGetPosition => {
                let (x, y) = ctx.input.mouse_position()?;
                Ok(CallToolResult::text_and_json(
                    format!("Mouse is at ({}, {})", x, y),
                    json!({"x": x, "y": y}),
                ))
            }
            ToolCall::MouseDrag {
                target_x,
                target_y,
                button,
            } => {
                ctx.input.mouse_drag(target_x, target_y, button)?;
                Ok(CallToolResult::text(format!(
                    "Dragged with {} button to ({}, {})",
                    button, target_x, target_y
                )))
            }
            ToolCall::MouseButtonControl { button, direction } => {
                ctx.input.mouse_button_control(button, direction)?;
                Ok(CallToolResult::text(format!(
                    "Mouse {} button {}",
                    button,
                    direction.as_str()
                )))
            }
            ToolCall::MouseMovePath { points, speed_ms } => {
                ctx.input.mouse_move_path(&points, Duration::from_millis(speed_ms))?;
                Ok(CallToolResult::text(match points.last() {
                    Some((x, y)) => {
                        format!("Moved through {} points to ({}, {})", points.len(), x, y)
                    }
                    None => "No points to move through".to_string(),
                }))
            }
            ToolCall::KeyControl { key, direction } => {
                ctx.input.key_control(key, direction)?;
                Ok(CallToolResult::text(format!(
                    "Key {:?} {}",
                    key,
                    direction.as_str()
                )))
            }
            ToolCall::SystemCommand(command) => {
                ctx.input.system_command(command)?;
                Ok(CallToolResult::text(format!(
                    "Executed {} command",
                    command.as_str()
                )))
            }
        }
    }
}

/// Parse and run a `tools/call` request.
pub fn call_tool(
    ctx: &Context,
    name: &str,
    arguments: Option<Value>,
) -> Result<CallToolResult, ToolError> {
    let call = ToolCall::parse(name, arguments)?;
    tracing::debug!("Executing {}", name);
    call.execute(ctx)
}

fn args<T: DeserializeOwned>(tool: Tool, arguments: Value) -> Result<T, ToolError> {
    serde_json::from_value(arguments)
        .map_err(|e| ToolError::InvalidParams(format!("{}: {}", tool.name(), e)))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value).map_err(|e| ToolError::Internal(e.to_string()))
}

fn unavailable(device: DeviceClass, source: CaptureError) -> ToolError {
    ToolError::PermissionDenied { device, source }
}

fn audit(tool: Tool, reason: Option<&str>) {
    if let Some(reason) = reason {
        tracing::info!(tool = tool.name(), reason, "Monitor access");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::mock::{DeniedHook, ManualHook};
    use crate::capture::{KeyCode, PressState};
    use crate::config::Config;
    use crate::input::mock::{Action, RecordingDriver};
    use crate::protocol::Content;
    use crate::screen::mock::{NoDisplayGrabber, SolidGrabber};

    fn context(hook: &ManualHook, driver: &RecordingDriver) -> Context {
        Context::with_backends(
            Box::new(hook.clone()),
            Box::new(driver.clone()),
            Box::new(SolidGrabber::new(4, 3)),
            &Config::default(),
        )
    }

    fn text(result: &CallToolResult) -> &str {
        match &result.content[0] {
            Content::Text { text } => text,
            other => panic!("expected text content, got {:?}", other),
        }
    }

    #[test]
    fn catalog_names_are_unique_and_stable() {
        let names: Vec<String> = catalog().into_iter().map(|t| t.name).collect();

        assert_eq!(&names[..6], &[
            "mouse_move",
            "mouse_click",
            "type_text",
            "monitor_screen_events",
            "monitor_keyboard_events",
            "monitor_mouse_events",
        ]);
        let mut deduped = names.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(deduped.len(), names.len());
        assert_eq!(catalog().len(), Tool::ALL.len());
    }

    #[test]
    fn unknown_tool_is_rejected() {
        assert!(matches!(
            ToolCall::parse("teleport", None),
            Err(ToolError::UnknownTool(name)) if name == "teleport"
        ));
    }

    #[test]
    fn arguments_are_validated_before_execution() {
        let invalid = [
            ("mouse_move", json!({"x": 1})),
            ("mouse_move", json!({"x": 1.5, "y": 2})),
            ("mouse_click", json!({"x": 1, "y": 2, "button": "thumb"})),
            ("monitor_keyboard_events", json!({"cursor": -1})),
            ("type_text", json!({"text": 5})),
            ("key_control", json!({"key": "hyper", "direction": "press"})),
            ("key_control", json!({"key": "a", "direction": "hold"})),
            ("system_command", json!({"command": "print"})),
            ("mouse_move", json!([500, 300])),
            ("mouse_move", json!("500,300")),
            ("mouse_get_position", json!(5)),
            ("mouse_get_position", json!("abc")),
            ("mouse_get_position", json!([])),
            ("monitor_keyboard_events", json!(true)),
            ("mouse_button_control", json!({"button": "left"})),
            ("mouse_button_control", json!({"button": "left", "direction": "hold"})),
            ("mouse_move_path", json!({"points": [], "speed_ms": 10})),
            ("mouse_move_path", json!({"points": [{"x": 1, "y": 1}], "speed_ms": -5})),
            ("mouse_move_path", json!({"points": [{"x": 1}], "speed_ms": 10})),
            ("mouse_move_path", json!({"points": [{"x": 1, "y": 1}]})),
            (
                "mouse_move_path",
                json!({"points": [{"x": 1, "y": 1}], "speed_ms": MAX_PATH_PAUSE_MS + 1}),
            ),
        ];

        for (name, arguments) in invalid {
            assert!(
                matches!(
                    ToolCall::parse(name, Some(arguments.clone())),
                    Err(ToolError::InvalidParams(_))
                ),
                "{} {} should be invalid",
                name,
                arguments
            );
        }
    }

    #[test]
    fn defaults_apply_to_optional_arguments() {
        assert_eq!(
            ToolCall::parse("mouse_click", Some(json!({"x": 3, "y": 4}))).unwrap(),
            ToolCall::MouseClick {
                x: 3,
                y: 4,
                button: PointerButton::Left
            }
        );
        assert_eq!(
            ToolCall::parse("monitor_mouse_events", Some(Value::Null)).unwrap(),
            ToolCall::MonitorMouse {
                cursor: 0,
                reason: None
            }
        );
    }

    #[test]
    fn mouse_move_reports_coordinates() {
        let hook = ManualHook::new();
        let driver = RecordingDriver::new();
        let ctx = context(&hook, &driver);

        let result = call_tool(&ctx, "mouse_move", Some(json!({"x": 500, "y": 300}))).unwrap();

        assert!(text(&result).contains("500"));
        assert!(text(&result).contains("300"));
        assert_eq!(driver.actions(), vec![Action::Move { x: 500, y: 300 }]);
    }

    #[test]
    fn keyboard_monitor_returns_batch() {
        let hook = ManualHook::new();
        let driver = RecordingDriver::new();
        let ctx = context(&hook, &driver);

        let first = call_tool(&ctx, "monitor_keyboard_events", None).unwrap();
        assert_eq!(
            first.json_payload(),
            Some(&json!({"events": [], "next_cursor": 0}))
        );

        hook.key(KeyCode::Char('k'), PressState::Press);
        let second = call_tool(&ctx, "monitor_keyboard_events", Some(json!({"cursor": 0}))).unwrap();
        let payload = second.json_payload().unwrap();

        assert_eq!(payload["next_cursor"], 1);
        assert_eq!(payload["events"][0]["key"], json!({"type": "char", "value": "k"}));
        assert_eq!(payload["events"][0]["state"], "press");
    }

    #[test]
    fn denied_monitoring_uses_dedicated_error() {
        let ctx = Context::with_backends(
            Box::new(DeniedHook::new()),
            Box::new(RecordingDriver::new()),
            Box::new(SolidGrabber::new(1, 1)),
            &Config::default(),
        );

        for _ in 0..2 {
            let error = call_tool(&ctx, "monitor_mouse_events", None).unwrap_err();
            assert_eq!(error.to_error_object().code, -32002);
        }
    }

    #[test]
    fn screen_capture_payload_shape() {
        let hook = ManualHook::new();
        let driver = RecordingDriver::new();
        let ctx = context(&hook, &driver);

        let result = call_tool(&ctx, "monitor_screen_events", Some(json!({}))).unwrap();
        let payload = result.json_payload().unwrap();

        assert_eq!(payload["width"], 4);
        assert_eq!(payload["height"], 3);
        assert_eq!(payload["event"]["kind"]["type"], "frame_captured");
        assert!(payload["image_base64"].as_str().unwrap().len() > 8);
    }

    #[test]
    fn screen_failure_is_an_operation_failure() {
        let ctx = Context::with_backends(
            Box::new(ManualHook::new()),
            Box::new(RecordingDriver::new()),
            Box::new(NoDisplayGrabber),
            &Config::default(),
        );

        let error = call_tool(&ctx, "monitor_screen_events", None).unwrap_err();

        assert_eq!(error.to_error_object().code, -32001);
    }

    #[test]
    fn position_is_reported_as_json() {
        let hook = ManualHook::new();
        let driver = RecordingDriver::new();
        let ctx = context(&hook, &driver);
        call_tool(&ctx, "mouse_move", Some(json!({"x": 7, "y": 9}))).unwrap();

        let result = call_tool(&ctx, "mouse_get_position", None).unwrap();

        assert_eq!(result.json_payload(), Some(&json!({"x": 7, "y": 9})));
    }

    #[test]
    fn typed_text_is_not_echoed() {
        let hook = ManualHook::new();
        let driver = RecordingDriver::new();
        let ctx = context(&hook, &driver);

        let result = call_tool(&ctx, "type_text", Some(json!({"text": "hunter2"}))).unwrap();

        assert_eq!(text(&result), "Typed 7 keys");
    }

    #[test]
    fn type_text_failure_partway_is_an_operation_failure() {
        let hook = ManualHook::new();
        let driver = RecordingDriver::new().fail_keys_after(4);
        let ctx = context(&hook, &driver);

        let error = call_tool(&ctx, "type_text", Some(json!({"text": "abcdef"}))).unwrap_err();

        assert_eq!(error.to_error_object().code, -32001);
        assert_eq!(driver.typed().len(), 2);
    }

    #[test]
    fn unavailable_driver_fails_without_acting() {
        let hook = ManualHook::new();
        let driver = RecordingDriver::new().unavailable();
        let ctx = context(&hook, &driver);

        let error = call_tool(&ctx, "mouse_move", Some(json!({"x": 1, "y": 2}))).unwrap_err();

        assert_eq!(error.to_error_object().code, -32001);
        assert!(driver.actions().is_empty());
        assert_eq!(driver.position(), (0, 0));
    }

    #[test]
    fn button_control_reaches_the_driver() {
        let hook = ManualHook::new();
        let driver = RecordingDriver::new();
        let ctx = context(&hook, &driver);

        call_tool(
            &ctx,
            "mouse_button_control",
            Some(json!({"button": "right", "direction": "release"})),
        )
        .unwrap();

        assert_eq!(
            driver.actions(),
            vec![Action::Button(PointerButton::Right, Direction::Release)]
        );
    }

    #[test]
    fn move_path_ends_at_the_last_point() {
        let hook = ManualHook::new();
        let driver = RecordingDriver::new();
        let ctx = context(&hook, &driver);

        let result = call_tool(
            &ctx,
            "mouse_move_path",
            Some(json!({"points": [{"x": 0, "y": 0}, {"x": 10, "y": 5}], "speed_ms": 0})),
        )
        .unwrap();

        assert_eq!(text(&result), "Moved through 2 points to (10, 5)");
        assert_eq!(driver.position(), (10, 5));
        assert_eq!(driver.actions().len(), 2);
    }

    #[test]
    fn unencodable_text_types_nothing() {
        let hook = ManualHook::new();
        let driver = RecordingDriver::new();
        let ctx = context(&hook, &driver);

        let error = call_tool(&ctx, "type_text", Some(json!({"text": "ok\u{0}"}))).unwrap_err();

        assert_eq!(error.to_error_object().code, -32602);
        assert!(driver.actions().is_empty());
    }
}
