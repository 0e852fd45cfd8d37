//! Channel to a spawned MCP tool server (process lifecycle + request plumbing).

use std::collections::HashMap;
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::protocol::{
    CallToolParams, CallToolResult, InitializeParams, InitializeResult, ListToolsResult,
    RpcId, RpcNotification, RpcRequest, RpcResponse, Tool,
};

/// Deadline for a single request/response exchange.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Upper bound on one response line. Sized for large tool outputs.
pub const MAX_RESPONSE_BYTES: usize = 1024 * 1024;

/// How to launch the tool server subprocess.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    pub command: String,
    pub args: Vec<String>,
    pub env: HashMap<String, String>,
}

impl ChannelConfig {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            args: Vec::new(),
            env: HashMap::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

/// A live connection to one tool server.
///
/// All I/O goes through async mutexes, so `&self` methods are safe to hold
/// across await points; callers are expected to issue requests one at a
/// time (the session layer does).
#[derive(Debug)]
pub struct Channel {
    command: String,
    child: Mutex<Child>,
    stdin: Mutex<ChildStdin>,
    stdout: Mutex<BufReader<ChildStdout>>,
    next_id: AtomicI64,
    ready: AtomicBool,
}

impl Channel {
    /// Spawn the server subprocess and wire up its stdio.
    ///
    /// The child is killed when the `Channel` is dropped, so an early error
    /// return never leaks the process.
    pub fn spawn(config: ChannelConfig) -> Result<Self> {
        let mut cmd = Command::new(&config.command);
        cmd.args(&config.args)
            .envs(&config.env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(Error::Spawn)?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Spawn(std::io::Error::other("stdin not captured")))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Spawn(std::io::Error::other("stdout not captured")))?;

        info!(command = %config.command, args = ?config.args, "spawned tool server");

        Ok(Self {
            command: config.command,
            child: Mutex::new(child),
            stdin: Mutex::new(stdin),
            stdout: Mutex::new(BufReader::new(stdout)),
            next_id: AtomicI64::new(1),
            ready: AtomicBool::new(false),
        })
    }

    /// Perform the MCP handshake. Must complete before list/call.
    pub async fn initialize(&self) -> Result<InitializeResult> {
        let params = serde_json::to_value(InitializeParams::default())?;
        let result: InitializeResult = self.request("initialize", Some(params)).await?;

        self.notify(RpcNotification::new("notifications/initialized"))
            .await?;
        self.ready.store(true, Ordering::Release);

        info!(
            server = %result.server_info.name,
            version = result.server_info.version.as_deref().unwrap_or("unknown"),
            protocol = %result.protocol_version,
            "handshake complete"
        );
        Ok(result)
    }

    /// Fetch the server's current tool list.
    pub async fn list_tools(&self) -> Result<Vec<Tool>> {
        self.require_ready()?;
        let result: ListToolsResult = self.request("tools/list", None).await?;
        debug!(count = result.tools.len(), "listed tools");
        Ok(result.tools)
    }

    /// Invoke one tool. The result's `is_error` flag is returned untouched;
    /// interpreting it is the dispatcher's job.
    pub async fn call_tool(&self, name: &str, arguments: Option<Value>) -> Result<CallToolResult> {
        self.require_ready()?;
        let params = serde_json::to_value(CallToolParams {
            name: name.to_string(),
            arguments,
        })?;
        debug!(tool = name, "tools/call");
        self.request("tools/call", Some(params)).await
    }

    /// Whether the subprocess is still alive.
    pub async fn is_running(&self) -> bool {
        matches!(self.child.lock().await.try_wait(), Ok(None))
    }

    /// Kill the subprocess. Consumes the channel; drop covers paths that
    /// never reach this.
    pub async fn shutdown(self) -> Result<()> {
        let mut child = self.child.lock().await;
        let _ = child.kill().await;
        info!(command = %self.command, "tool server stopped");
        Ok(())
    }

    fn require_ready(&self) -> Result<()> {
        if self.ready.load(Ordering::Acquire) {
            Ok(())
        } else {
            Err(Error::NotInitialized)
        }
    }

    async fn request<R>(&self, method: &'static str, params: Option<Value>) -> Result<R>
    where
        R: serde::de::DeserializeOwned,
    {
        let id = RpcId::from(self.next_id.fetch_add(1, Ordering::SeqCst));
        let frame = RpcRequest::new(id.clone(), method, params);

        self.write_line(&serde_json::to_string(&frame)?).await?;

        let response = timeout(REQUEST_TIMEOUT, self.read_response())
            .await
            .map_err(|_| Error::Timeout(REQUEST_TIMEOUT))??;

        if response.id != id {
            return Err(Error::InvalidResponse(format!(
                "id mismatch: sent {id:?}, got {:?}",
                response.id
            )));
        }

        let payload = response.into_result()?;
        Ok(serde_json::from_value(payload)?)
    }

    async fn notify(&self, notification: RpcNotification) -> Result<()> {
        self.write_line(&serde_json::to_string(&notification)?).await
    }

    async fn write_line(&self, line: &str) -> Result<()> {
        let mut stdin = self.stdin.lock().await;
        stdin.write_all(line.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        Ok(())
    }

    async fn read_response(&self) -> Result<RpcResponse> {
        let mut stdout = self.stdout.lock().await;
        let mut line = String::new();

        if stdout.read_line(&mut line).await? == 0 {
            return Err(Error::ServerExited);
        }
        if line.len() > MAX_RESPONSE_BYTES {
            return Err(Error::OversizedResponse {
                size: line.len(),
                limit: MAX_RESPONSE_BYTES,
            });
        }

        Ok(serde_json::from_str(&line)?)
    }
}
