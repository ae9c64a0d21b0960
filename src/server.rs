//! MCP server implementation
//!
//! One JSON object per line in, one per line out. Requests are handled
//! strictly one at a time in arrival order; the server never writes anything
//! that was not a reply to a request.

use anyhow::{Context as _, Result};
use serde_json::{json, Value};
use std::future::Future;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::config::{init_logging, Config, TransportKind};
use crate::context::Context;
use crate::protocol::{
    CallToolParams, Capabilities, ErrorCode, ErrorObject, InitializeParams, InitializeResult,
    Request, Response, ServerInfo, ToolsCapability, ToolsListResult, JSONRPC_VERSION,
    PROTOCOL_VERSION,
};
use crate::tools;

pub const SERVER_NAME: &str = env!("CARGO_PKG_NAME");
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Why a session loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The peer closed its side of the stream
    Eof,
    /// The shutdown signal fired
    Shutdown,
}

/// Handle for controlling the MCP server
pub struct McpHandle {
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl McpHandle {
    /// Shutdown the server gracefully
    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Wait until the server stops on its own (end of input) or is shut down.
    pub async fn wait(mut self) -> Result<()> {
        if let Some(task) = self.task.take() {
            task.await.context("Server task panicked")?;
        }
        Ok(())
    }
}

impl Drop for McpHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Start the MCP server with the real OS backends.
///
/// Must be called from within a tokio runtime.
pub fn start_server(config: Config) -> Result<McpHandle> {
    init_logging(config.log_level);
    tracing::info!("Starting input MCP server");

    let context = Context::new(&config);
    start_server_with_context(config, context)
}

/// Start the MCP server on an already built context.
pub fn start_server_with_context(config: Config, context: Context) -> Result<McpHandle> {
    let context = Arc::new(context);
    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let task = match config.transport {
        TransportKind::Stdio => {
            let task = tokio::spawn(run_stdio_server(context, shutdown_rx));
            tracing::info!("Listening on stdio");
            task
        }
        TransportKind::UnixSocket => start_unix_socket(&config, context, shutdown_rx)?,
    };

    Ok(McpHandle {
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    })
}

#[cfg(unix)]
fn start_unix_socket(
    config: &Config,
    context: Arc<Context>,
    shutdown_rx: oneshot::Receiver<()>,
) -> Result<JoinHandle<()>> {
    let path = config.socket_path.clone();
    if path.exists() {
        std::fs::remove_file(&path)
            .with_context(|| format!("Failed to remove stale socket {}", path.display()))?;
    }
    let listener = tokio::net::UnixListener::bind(&path)
        .with_context(|| format!("Failed to bind {}", path.display()))?;
    tracing::info!("Listening on unix socket {}", path.display());

    Ok(tokio::spawn(run_unix_socket_server(
        context,
        listener,
        path,
        shutdown_rx,
    )))
}

#[cfg(not(unix))]
fn start_unix_socket(
    _config: &Config,
    _context: Arc<Context>,
    _shutdown_rx: oneshot::Receiver<()>,
) -> Result<JoinHandle<()>> {
    anyhow::bail!("Unix socket transport is not available on this platform");
}

/// Run the stdio-based MCP server
async fn run_stdio_server(context: Arc<Context>, mut shutdown_rx: oneshot::Receiver<()>) {
    let reader = BufReader::new(tokio::io::stdin());
    let writer = tokio::io::stdout();

    match serve(&context, reader, writer, &mut shutdown_rx).await {
        Ok(SessionEnd::Eof) => tracing::info!("Stdin closed, shutting down"),
        Ok(SessionEnd::Shutdown) => tracing::info!("Server shutting down"),
        Err(e) => tracing::error!("Stdio transport failed: {}", e),
    }
    context.shutdown();
}

/// Serve one client at a time so requests stay strictly sequential.
#[cfg(unix)]
async fn run_unix_socket_server(
    context: Arc<Context>,
    listener: tokio::net::UnixListener,
    path: std::path::PathBuf,
    mut shutdown_rx: oneshot::Receiver<()>,
) {
    loop {
        tokio::select! {
            _ = &mut shutdown_rx => {
                tracing::info!("Server shutting down");
                break;
            }
            accepted = listener.accept() => {
                let stream = match accepted {
                    Ok((stream, _)) => stream,
                    Err(e) => {
                        tracing::error!("Failed to accept connection: {}", e);
                        break;
                    }
                };
                tracing::info!("Client connected");

                let (read, write) = stream.into_split();
                match serve(&context, BufReader::new(read), write, &mut shutdown_rx).await {
                    Ok(SessionEnd::Eof) => tracing::info!("Client disconnected"),
                    Ok(SessionEnd::Shutdown) => {
                        tracing::info!("Server shutting down");
                        break;
                    }
                    Err(e) => tracing::warn!("Connection failed: {}", e),
                }
            }
        }
    }

    context.shutdown();
    let _ = std::fs::remove_file(&path);
}

/// Read requests from `reader` and write replies to `writer` until EOF or
/// until `shutdown` resolves.
pub async fn serve<R, W, S>(
    context: &Context,
    mut reader: R,
    mut writer: W,
    shutdown: S,
) -> io::Result<SessionEnd>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    S: Future,
{
    tokio::pin!(shutdown);
    let mut line = String::new();

    loop {
        line.clear();

        tokio::select! {
            _ = &mut shutdown => return Ok(SessionEnd::Shutdown),
            result = reader.read_line(&mut line) => {
                if result? == 0 {
                    return Ok(SessionEnd::Eof);
                }
                if let Some(response) = run_blocking(|| handle_line(context, &line)) {
                    write_response(&mut writer, &response).await?;
                }
            }
        }
    }
}

/// Tool handlers block on the OS (input sessions, screen grabs, hook
/// install). On a multi-thread runtime the worker hands its other tasks off
/// first; a current-thread runtime has no one to hand them to.
fn run_blocking<T>(f: impl FnOnce() -> T) -> T {
    match Handle::try_current().map(|handle| handle.runtime_flavor()) {
        Ok(RuntimeFlavor::MultiThread) => tokio::task::block_in_place(f),
        _ => f(),
    }
}

async fn write_response<W: AsyncWrite + Unpin>(writer: &mut W, response: &Response) -> io::Result<()> {
    let mut json = serde_json::to_vec(response)?;
    json.push(b'\n');
    writer.write_all(&json).await?;
    writer.flush().await
}

/// Handle a single line of input. Returns `None` when no reply is due
/// (blank lines and notifications).
pub fn handle_line(context: &Context, line: &str) -> Option<Response> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let value: Value = match serde_json::from_str(line) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("Failed to parse request: {}", e);
            return Some(Response::failure(
                json!(0),
                ErrorObject::new(ErrorCode::ParseError, format!("Parse error: {}", e)),
            ));
        }
    };

    let fallback_id = response_id(value.get("id").cloned());
    let request: Request = match serde_json::from_value(value) {
        Ok(request) => request,
        Err(e) => {
            return Some(Response::failure(
                fallback_id,
                ErrorObject::new(ErrorCode::InvalidRequest, format!("Invalid request: {}", e)),
            ));
        }
    };

    if let Some(version) = request.jsonrpc.as_deref() {
        if version != JSONRPC_VERSION {
            return Some(Response::failure(
                fallback_id,
                ErrorObject::new(
                    ErrorCode::InvalidRequest,
                    format!("Invalid JSON-RPC version: {}. Expected 2.0", version),
                ),
            ));
        }
    }

    if request.is_notification() {
        tracing::debug!("Notification {}", request.method);
        return None;
    }

    tracing::debug!("Request {}", request.method);
    let id = response_id(request.id);
    Some(match dispatch(context, &request.method, request.params) {
        Ok(result) => Response::success(id, result),
        Err(error) => Response::failure(id, error),
    })
}

fn response_id(id: Option<Value>) -> Value {
    match id {
        None | Some(Value::Null) => json!(0),
        Some(id) => id,
    }
}

fn dispatch(context: &Context, method: &str, params: Option<Value>) -> Result<Value, ErrorObject> {
    match method {
        "initialize" => handle_initialize(params),
        "initialized" | "notifications/initialized" => Ok(json!({})),
        "tools/list" => to_result(&ToolsListResult {
            tools: tools::catalog(),
        }),
        "tools/call" => handle_call_tool(context, params),
        other => Err(ErrorObject::new(
            ErrorCode::MethodNotFound,
            format!("Method not found: {}", other),
        )),
    }
}

fn handle_initialize(params: Option<Value>) -> Result<Value, ErrorObject> {
    let params: InitializeParams = match params {
        None | Some(Value::Null) => InitializeParams::default(),
        Some(value) => serde_json::from_value(value).map_err(|e| {
            ErrorObject::new(ErrorCode::InvalidParams, format!("Invalid params: {}", e))
        })?,
    };

    if let Some(client) = &params.client_info {
        tracing::info!(
            "Client {} {} connected (protocol {})",
            client.name,
            client.version.as_deref().unwrap_or("?"),
            params.protocol_version.as_deref().unwrap_or("?")
        );
    }

    to_result(&InitializeResult {
        protocol_version: PROTOCOL_VERSION.to_string(),
        capabilities: Capabilities {
            tools: ToolsCapability {
                list_changed: false,
            },
        },
        server_info: ServerInfo {
            name: SERVER_NAME.to_string(),
            version: SERVER_VERSION.to_string(),
        },
    })
}

fn handle_call_tool(context: &Context, params: Option<Value>) -> Result<Value, ErrorObject> {
    let params: CallToolParams = params
        .ok_or_else(|| ErrorObject::new(ErrorCode::InvalidParams, "Missing params"))
        .and_then(|value| {
            serde_json::from_value(value).map_err(|e| {
                ErrorObject::new(ErrorCode::InvalidParams, format!("Invalid params: {}", e))
            })
        })?;

    match tools::call_tool(context, &params.name, params.arguments) {
        Ok(result) => to_result(&result),
        Err(e) => {
            tracing::warn!("Tool {} failed: {}", params.name, e);
            Err(e.to_error_object())
        }
    }
}

fn to_result<T: serde::Serialize>(value: &T) -> Result<Value, ErrorObject> {
    serde_json::to_value(value)
        .map_err(|e| ErrorObject::new(ErrorCode::Internal, format!("Serialization failed: {}", e)))
}
