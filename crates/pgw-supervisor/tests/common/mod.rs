//! In-memory `ProviderTransport` double used by the scenario tests in
//! this directory, standing in for `pgw-transport`'s real child-process
//! implementation.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pgw_supervisor::{ChildProcess, ProviderTransport, RemoteTool, Session, TransportError};
use pgw_domain::ProviderConfig;
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

/// Scripted behavior for one provider's session.
pub struct MockSession {
    catalogue: Mutex<Option<Result<Vec<RemoteTool>, TransportError>>>,
    ping_queue: Mutex<VecDeque<Result<bool, TransportError>>>,
    ping_sticky: Mutex<Result<bool, TransportError>>,
    call_tool: Mutex<Box<dyn FnMut(&str, Value) -> Result<Value, TransportError> + Send>>,
    close_reason: Mutex<Option<Option<String>>>,
    closed_notify: Notify,
}

impl MockSession {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            catalogue: Mutex::new(Some(Ok(Vec::new()))),
            ping_queue: Mutex::new(VecDeque::new()),
            ping_sticky: Mutex::new(Ok(true)),
            call_tool: Mutex::new(Box::new(|_, _| Ok(Value::Null))),
            close_reason: Mutex::new(None),
            closed_notify: Notify::new(),
        })
    }

    pub fn with_catalogue(self: &Arc<Self>, tools: Vec<RemoteTool>) -> Arc<Self> {
        *self.catalogue.lock().unwrap() = Some(Ok(tools));
        Arc::clone(self)
    }

    /// Queue exact ping outcomes consumed in order; once exhausted, the
    /// last queued outcome (or `Ok(true)` if the queue was never set)
    /// repeats forever.
    pub fn with_ping_script(self: &Arc<Self>, script: Vec<Result<bool, TransportError>>) -> Arc<Self> {
        if let Some(last) = script.last() {
            *self.ping_sticky.lock().unwrap() = clone_result(last);
        }
        *self.ping_queue.lock().unwrap() = script.into_iter().collect();
        Arc::clone(self)
    }

    pub fn with_call_tool<F>(self: &Arc<Self>, f: F) -> Arc<Self>
    where
        F: FnMut(&str, Value) -> Result<Value, TransportError> + Send + 'static,
    {
        *self.call_tool.lock().unwrap() = Box::new(f);
        Arc::clone(self)
    }

    pub fn is_closed(&self) -> bool {
        self.close_reason.lock().unwrap().is_some()
    }
}

fn clone_result(r: &Result<bool, TransportError>) -> Result<bool, TransportError> {
    match r {
        Ok(b) => Ok(*b),
        Err(e) => Err(e.clone()),
    }
}

#[async_trait]
impl Session for MockSession {
    async fn ping(&self, _deadline: Duration) -> Result<bool, TransportError> {
        let next = self.ping_queue.lock().unwrap().pop_front();
        match next {
            Some(outcome) => outcome,
            None => clone_result(&self.ping_sticky.lock().unwrap()),
        }
    }

    async fn list_tools(&self, _deadline: Duration) -> Result<Vec<RemoteTool>, TransportError> {
        self.catalogue
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn call_tool(
        &self,
        tool_name: &str,
        arguments: Value,
        _deadline: Duration,
    ) -> Result<Value, TransportError> {
        (self.call_tool.lock().unwrap())(tool_name, arguments)
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
    handshake_should_fail: Mutex<std::collections::HashSet<String>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            sessions: Mutex::new(HashMap::new()),
            handshake_should_fail: Mutex::new(std::collections::HashSet::new()),
        })
    }

    pub fn register(&self, name: &str, session: Arc<MockSession>) {
        self.sessions.lock().unwrap().insert(name.to_owned(), session);
    }

    pub fn fail_handshake_for(&self, name: &str) {
        self.handshake_should_fail.lock().unwrap().insert(name.to_owned());
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
        if self.handshake_should_fail.lock().unwrap().contains(&config.name) {
            return Err(TransportError::new("simulated handshake failure"));
        }
        let session = self
            .sessions
            .lock()
            .unwrap()
            .get(&config.name)
            .cloned()
            .unwrap_or_else(MockSession::new);
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
