//! Input MCP Server
//!
//! This crate provides a Model Context Protocol (MCP) server that lets a
//! coding agent drive the mouse and keyboard, capture the screen, and read
//! back the keyboard and mouse activity recorded since the server started.
//!
//! Captured events live in append-only, sequence-numbered logs (one per
//! device class). Clients poll them with a cursor: each read returns the
//! events after the cursor plus the cursor to use next time.
//!
//! # Example
//!
//! ```no_run
//! use input_mcp::{start_server, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let server = start_server(Config::from_env()?)?;
//!     server.wait().await
//! }
//! ```

pub mod capture;
pub mod config;
pub mod context;
pub mod error;
pub mod input;
pub mod protocol;
pub mod screen;
pub mod server;
pub mod tools;

pub use config::{init_logging, Config, LogLevel, TransportKind};
pub use context::Context;
pub use error::ToolError;
pub use server::{
    handle_line, serve, start_server, start_server_with_context, McpHandle, SessionEnd,
};
pub use tools::{call_tool, catalog, Tool, ToolCall};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::mock::ManualHook;
    use crate::input::mock::RecordingDriver;
    use crate::screen::mock::SolidGrabber;

    fn mock_context() -> Context {
        Context::with_backends(
            Box::new(ManualHook::new()),
            Box::new(RecordingDriver::new()),
            Box::new(SolidGrabber::new(8, 8)),
            &Config::default(),
        )
    }

    #[test]
    fn catalog_lists_every_tool() {
        let tools = catalog();

        assert_eq!(tools.len(), Tool::ALL.len());
        assert!(tools.iter().all(|t| t.input_schema["type"] == "object"));
    }

    #[test]
    #[cfg(unix)]
    fn can_start_and_stop_server() {
        // The server spawns its session task, so it needs a runtime
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let config = Config {
            transport: TransportKind::UnixSocket,
            socket_path: std::env::temp_dir()
                .join(format!("input_mcp_lib_{}.sock", std::process::id())),
            ..Config::default()
        };
        let socket_path = config.socket_path.clone();

        runtime.block_on(async {
            let handle = start_server_with_context(config, mock_context());
            assert!(handle.is_ok(), "Should be able to start MCP server");
            assert!(socket_path.exists());

            if let Ok(h) = handle {
                h.shutdown();
            }

            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        });
        assert!(!socket_path.exists(), "Socket is removed on shutdown");
    }

    #[test]
    fn can_serialize_tool_reply() {
        let reply = handle_line(
            &mock_context(),
            r#"{"jsonrpc":"2.0","id":11,"method":"tools/call","params":{"name":"mouse_click","arguments":{"x":1,"y":2,"button":"middle"}}}"#,
        )
        .expect("Should reply");
        let json = serde_json::to_string(&reply).expect("Should serialize");

        assert!(json.contains("middle"));
        assert!(json.contains("(1, 2)"));
        assert!(json.contains("\"id\":11"));
    }
}
