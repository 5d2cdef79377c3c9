//! `Session` backed by a JSON-RPC 2.0 connection over a child's piped
//! stdin/stdout.
//!
//! MCP's stable data shapes (`Tool`, `CallToolRequestParam`,
//! `Implementation`) come from `rmcp::model`; the request/response
//! multiplexing loop itself is hand-rolled rather than routed through
//! `rmcp`'s higher-level client runtime, so the wire framing stays
//! auditable end to end.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pgw_supervisor::{RemoteTool, Session, TransportError};
use rmcp::model::{CallToolRequestParam, Implementation, InitializeRequestParam, ProtocolVersion, Tool};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, ChildStdout};
use tokio::sync::{oneshot, Mutex as AsyncMutex, Notify};

use crate::protocol::Request;

type PendingMap = AsyncMutex<HashMap<u64, oneshot::Sender<Value>>>;

/// A live JSON-RPC session over a child process's stdio.
pub struct RmcpSession {
    writer: AsyncMutex<ChildStdin>,
    next_id: AtomicU64,
    pending: PendingMap,
    close_reason: std::sync::Mutex<Option<Option<String>>>,
    closed_notify: Notify,
}

impl RmcpSession {
    /// Perform the MCP `initialize` handshake and spawn the background
    /// reader loop that demultiplexes responses by correlation id
    /// (spec §5: "the underlying protocol multiplexes requests by
    /// correlation id; out-of-order responses are matched correctly").
    pub async fn handshake(
        stdin: ChildStdin,
        stdout: ChildStdout,
        handshake_deadline: Duration,
    ) -> Result<Arc<Self>, TransportError> {
        let session = Arc::new(Self {
            writer: AsyncMutex::new(stdin),
            next_id: AtomicU64::new(1),
            pending: AsyncMutex::new(HashMap::new()),
            close_reason: std::sync::Mutex::new(None),
            closed_notify: Notify::new(),
        });

        let reader_session = Arc::clone(&session);
        tokio::spawn(async move {
            reader_session.run_reader(stdout).await;
        });

        let init_params = InitializeRequestParam {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: Default::default(),
            client_info: Implementation {
                name: "provider-gateway".to_owned(),
                version: env!("CARGO_PKG_VERSION").to_owned(),
            },
        };
        session
            .request("initialize", Some(json!(init_params)), handshake_deadline)
            .await?;
        session.notify("notifications/initialized", None).await?;

        Ok(session)
    }

    async fn run_reader(self: Arc<Self>, stdout: ChildStdout) {
        let mut lines = BufReader::new(stdout).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    self.handle_line(&line).await;
                }
                Ok(None) => {
                    self.mark_closed(Some("peer closed stdout (EOF)".to_owned()));
                    break;
                }
                Err(e) => {
                    self.mark_closed(Some(format!("error reading from provider: {e}")));
                    break;
                }
            }
        }
        self.pending.lock().await.clear();
    }

    async fn handle_line(&self, line: &str) {
        let parsed: Result<crate::protocol::Response, _> = serde_json::from_str(line);
        let response = match parsed {
            Ok(r) => r,
            Err(e) => {
                pgw_domain::warn!("transport", "failed to parse provider message", format!("{e}: {line}"));
                return;
            }
        };

        let Some(id) = response.id else {
            // Notification; this gateway has no server-push consumers.
            if let Some(method) = response.method {
                pgw_domain::info!("transport", "ignoring provider notification", method);
            }
            return;
        };

        let sender = self.pending.lock().await.remove(&id);
        let Some(sender) = sender else { return };

        let outcome = if let Some(error) = response.error {
            json!({ "__rpc_error__": error.to_string() })
        } else {
            response.result.unwrap_or(Value::Null)
        };
        let _ = sender.send(outcome);
    }

    fn mark_closed(&self, reason: Option<String>) {
        let mut guard = self.close_reason.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        if guard.is_none() {
            *guard = Some(reason);
            self.closed_notify.notify_waiters();
        }
    }

    async fn request(&self, method: &str, params: Option<Value>, deadline: Duration) -> Result<Value, TransportError> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id, tx);

        let request = Request::new(id, method, params);
        let mut line = serde_json::to_string(&request)
            .map_err(|e| TransportError::new(format!("failed to encode request: {e}")))?;
        line.push('\n');

        {
            let mut writer = self.writer.lock().await;
            if let Err(e) = writer.write_all(line.as_bytes()).await {
                self.pending.lock().await.remove(&id);
                return Err(TransportError::new(format!("failed to write to provider: {e}")));
            }
            if let Err(e) = writer.flush().await {
                self.pending.lock().await.remove(&id);
                return Err(TransportError::new(format!("failed to flush to provider: {e}")));
            }
        }

        match tokio::time::timeout(deadline, rx).await {
            Ok(Ok(value)) => {
                if let Some(message) = value.get("__rpc_error__").and_then(Value::as_str) {
                    Err(TransportError::new(message.to_owned()))
                } else {
                    Ok(value)
                }
            }
            Ok(Err(_)) => Err(TransportError::new("session closed before response arrived")),
            Err(_) => {
                self.pending.lock().await.remove(&id);
                Err(TransportError::new(format!("'{method}' timed out")))
            }
        }
    }

    /// Send a notification (no response expected).
    async fn notify(&self, method: &str, params: Option<Value>) -> Result<(), TransportError> {
        #[derive(serde::Serialize)]
        struct Notification {
            jsonrpc: &'static str,
            method: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            params: Option<Value>,
        }
        let mut line = serde_json::to_string(&Notification {
            jsonrpc: "2.0",
            method: method.to_owned(),
            params,
        })
        .map_err(|e| TransportError::new(format!("failed to encode notification: {e}")))?;
        line.push('\n');

        let mut writer = self.writer.lock().await;
        writer
            .write_all(line.as_bytes())
            .await
            .map_err(|e| TransportError::new(format!("failed to write to provider: {e}")))?;
        writer
            .flush()
            .await
            .map_err(|e| TransportError::new(format!("failed to flush to provider: {e}")))
    }
}

#[async_trait]
impl Session for RmcpSession {
    async fn ping(&self, deadline: Duration) -> Result<bool, TransportError> {
        match self.request("ping", None, deadline).await {
            Ok(_) => Ok(true),
            Err(e) => Err(e),
        }
    }

    async fn list_tools(&self, deadline: Duration) -> Result<Vec<RemoteTool>, TransportError> {
        let value = self.request("tools/list", None, deadline).await?;
        let tools: Vec<Tool> = serde_json::from_value(
            value
                .get("tools")
                .cloned()
                .unwrap_or_else(|| json!([])),
        )
        .map_err(|e| TransportError::new(format!("malformed tools/list response: {e}")))?;

        Ok(tools
            .into_iter()
            .map(|tool| RemoteTool {
                name: tool.name.to_string(),
                description: tool.description.map(|d| d.to_string()).unwrap_or_default(),
                input_schema: serde_json::to_value(&tool.input_schema).unwrap_or(Value::Null),
                output_schema: tool
                    .output_schema
                    .as_ref()
                    .and_then(|schema| serde_json::to_value(schema).ok())
                    .unwrap_or(Value::Null),
            })
            .collect())
    }

    async fn call_tool(
        &self,
        tool_name: &str,
        arguments: Value,
        deadline: Duration,
    ) -> Result<Value, TransportError> {
        let params = CallToolRequestParam {
            name: tool_name.to_owned().into(),
            arguments: arguments.as_object().cloned(),
        };
        self.request("tools/call", Some(json!(params)), deadline).await
    }

    async fn close(&self) {
        self.mark_closed(None);
    }

    async fn await_close(&self) -> Option<String> {
        loop {
            let notified = self.closed_notify.notified();
            if let Some(reason) = self
                .close_reason
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .clone()
            {
                return reason;
            }
            notified.await;
        }
    }
}
