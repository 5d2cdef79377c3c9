//! In-memory `ProviderTransport` double for the HTTP-level tests in this
//! directory, standing in for `pgw-transport`'s real child-process
//! implementation (mirrors the one `pgw-supervisor` uses internally).

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pgw_domain::ProviderConfig;
use pgw_supervisor::{ChildProcess, ProviderTransport, RemoteTool, Session, TransportError};
use serde_json::Value;
use tokio::sync::Notify;

pub struct MockChildProcess {
    alive: AtomicBool,
}

impl MockChildProcess {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            alive: AtomicBool::new(true),
        })
    }
}

#[async_trait]
impl ChildProcess for MockChildProcess {
    async fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    async fn terminate(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    async fn kill(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    async fn wait(&self) {}

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

pub struct MockSession {
    catalogue: Vec<RemoteTool>,
    close_reason: Mutex<Option<Option<String>>>,
    closed_notify: Notify,
}

impl MockSession {
    pub fn new(catalogue: Vec<RemoteTool>) -> Arc<Self> {
        Arc::new(Self {
            catalogue,
            close_reason: Mutex::new(None),
            closed_notify: Notify::new(),
        })
    }
}

#[async_trait]
impl Session for MockSession {
    async fn ping(&self, _deadline: Duration) -> Result<bool, TransportError> {
        Ok(true)
    }

    async fn list_tools(&self, _deadline: Duration) -> Result<Vec<RemoteTool>, TransportError> {
        Ok(self.catalogue.clone())
    }

    async fn call_tool(
        &self,
        tool_name: &str,
        arguments: Value,
        _deadline: Duration,
    ) -> Result<Value, TransportError> {
        if tool_name == "boom" {
            return Err(TransportError::new("simulated tool failure"));
        }
        Ok(serde_json::json!({ "echo": arguments }))
    }

    async fn close(&self) {
        let mut reason = self.close_reason.lock().unwrap();
        if reason.is_none() {
            *reason = Some(None);
            self.closed_notify.notify_waiters();
        }
    }

    async fn await_close(&self) -> Option<String> {
        loop {
            let notified = self.closed_notify.notified();
            if let Some(reason) = self.close_reason.lock().unwrap().clone() {
                return reason;
            }
            notified.await;
        }
    }
}

/// Maps provider name to a pre-registered [`MockSession`], simulating
/// spawn + handshake without any real process.
pub struct MockTransport {
    sessions: Mutex<HashMap<String, Arc<MockSession>>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sessions: Mutex::new(HashMap::new()),
        })
    }

    pub fn register(&self, name: &str, session: Arc<MockSession>) {
        self.sessions.lock().unwrap().insert(name.to_owned(), session);
    }
}

#[async_trait]
impl ProviderTransport for MockTransport {
    async fn spawn(&self, _config: &ProviderConfig) -> Result<Arc<dyn ChildProcess>, TransportError> {
        Ok(MockChildProcess::new())
    }

    async fn handshake(
        &self,
        _process: &Arc<dyn ChildProcess>,
        config: &ProviderConfig,
    ) -> Result<Arc<dyn Session>, TransportError> {
        let session = self
            .sessions
            .lock()
            .unwrap()
            .get(&config.name)
            .cloned()
            .unwrap_or_else(|| MockSession::new(Vec::new()));
        Ok(session as Arc<dyn Session>)
    }
}

pub fn provider_config(name: &str) -> ProviderConfig {
    ProviderConfig {
        name: name.to_owned(),
        executable: "/bin/true".to_owned(),
        args: Vec::new(),
        envs: Vec::new(),
        timeout_ms: 5_000,
    }
}
